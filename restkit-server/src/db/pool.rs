//! Database connection pool management
//!
//! Wraps a sqlx PgPool with the limits read from configuration. The pool is
//! created lazily so an unreachable database never blocks startup; a single
//! check at initialization only reports reachability.

use std::fmt;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use sqlx::pool::PoolConnection;
use sqlx::postgres::{PgConnectOptions, PgConnection, PgPoolOptions};
use sqlx::{PgPool, Postgres};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use super::DbError;

/// Default maximum connections for the pool.
pub const DEFAULT_MAX_CONNECTIONS: u32 = 10;

/// Idle connections are closed after this long.
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_millis(30_000);

/// How long `acquire()` waits for a free connection.
pub const DEFAULT_CONNECTION_TIMEOUT: Duration = Duration::from_millis(2_000);

/// Connection settings for the PostgreSQL pool.
#[derive(Clone)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: String,
    pub max_connections: u32,
    pub idle_timeout: Duration,
    pub connection_timeout: Duration,
}

impl DatabaseConfig {
    fn connect_options(&self) -> PgConnectOptions {
        PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.user)
            .password(&self.password)
            .database(&self.database)
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5432,
            user: "postgres".to_string(),
            password: String::new(),
            database: "postgres".to_string(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
            connection_timeout: DEFAULT_CONNECTION_TIMEOUT,
        }
    }
}

// Hand-written so the password never reaches the logs.
impl fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("database", &self.database)
            .field("max_connections", &self.max_connections)
            .field("idle_timeout", &self.idle_timeout)
            .field("connection_timeout", &self.connection_timeout)
            .finish()
    }
}

/// Snapshot of pool counters, reported by `/health`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PoolStatus {
    pub closed: bool,
    /// Open connections, idle or borrowed
    pub size: u32,
    pub idle: usize,
}

/// A connection borrowed from [`Database`].
///
/// Dropping it hands the connection back and frees its borrow slot, which is
/// what `shutdown()` waits on.
pub struct PooledConnection {
    // Declared first so the connection goes back before the slot is freed.
    conn: PoolConnection<Postgres>,
    _borrow: OwnedSemaphorePermit,
}

impl Deref for PooledConnection {
    type Target = PgConnection;

    fn deref(&self) -> &PgConnection {
        &self.conn
    }
}

impl DerefMut for PooledConnection {
    fn deref_mut(&mut self) -> &mut PgConnection {
        &mut self.conn
    }
}

/// Bounded PostgreSQL connection pool.
///
/// Cloning is cheap and every clone shares the same pool.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
    /// One permit per connection a caller may hold at once
    borrows: Arc<Semaphore>,
    max_connections: u32,
}

impl Database {
    /// Create the pool and check the database once.
    ///
    /// A failed check is logged and otherwise ignored: the application boots
    /// without a database and every query fails until it becomes reachable.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let db = Database::initialize(&DatabaseConfig::default()).await;
    /// let rows = db.call_function("public.ft_obtener_bitacora", &[]).await?;
    /// ```
    pub async fn initialize(config: &DatabaseConfig) -> Self {
        tracing::info!(
            host = %config.host,
            port = config.port,
            database = %config.database,
            max_connections = config.max_connections,
            "Initializing PostgreSQL pool"
        );

        let db = Self::connect_lazy(config);

        match db.acquire().await {
            Ok(conn) => {
                db.release(conn);
                tracing::info!("PostgreSQL connection established");
            }
            Err(e) => {
                tracing::error!(error = %e, "Could not connect to PostgreSQL");
                tracing::warn!("Starting without a database connection");
                tracing::warn!("Check the DB_* settings in the environment or .env file");
            }
        }

        db
    }

    /// Create the pool without opening any connection.
    pub fn connect_lazy(config: &DatabaseConfig) -> Self {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .idle_timeout(config.idle_timeout)
            .acquire_timeout(config.connection_timeout)
            .connect_lazy_with(config.connect_options());

        Self::from_pool(pool)
    }

    /// Wrap an existing pool.
    pub fn from_pool(pool: PgPool) -> Self {
        let max_connections = pool.options().get_max_connections();
        Self {
            pool,
            borrows: Arc::new(Semaphore::new(max_connections as usize)),
            max_connections,
        }
    }

    /// Borrow a connection, waiting at most the configured connection timeout.
    pub async fn acquire(&self) -> Result<PooledConnection, DbError> {
        let conn = self.pool.acquire().await.map_err(DbError::from_acquire)?;
        // The pool never hands out more than `max_connections`, so a slot is free.
        let borrow = Arc::clone(&self.borrows)
            .acquire_owned()
            .await
            .map_err(|_| DbError::PoolClosed)?;

        Ok(PooledConnection {
            conn,
            _borrow: borrow,
        })
    }

    /// Return a borrowed connection to the pool.
    ///
    /// Dropping the connection has the same effect; this only makes the
    /// hand-back explicit at call sites.
    pub fn release(&self, conn: PooledConnection) {
        drop(conn);
    }

    /// Close the pool, waiting for borrowed connections to be returned.
    ///
    /// New `acquire()` calls fail with `PoolClosed` as soon as this starts.
    /// A connection dropped mid-query counts as returned here even though
    /// sqlx only closes it once the server finishes the statement.
    pub async fn shutdown(&self) {
        tracing::info!("Closing PostgreSQL pool");
        self.pool.close().await;

        let outstanding =
            (self.max_connections as usize).saturating_sub(self.borrows.available_permits());
        if outstanding > 0 {
            tracing::info!(outstanding, "Waiting for borrowed connections");
        }
        // Every slot free means every borrowed connection came back.
        if let Ok(all) = self.borrows.acquire_many(self.max_connections).await {
            drop(all);
        }
        tracing::info!("PostgreSQL pool closed");
    }

    pub fn is_closed(&self) -> bool {
        self.pool.is_closed()
    }

    /// Open connections, idle or borrowed.
    pub fn size(&self) -> u32 {
        self.pool.size()
    }

    pub fn num_idle(&self) -> usize {
        self.pool.num_idle()
    }

    pub fn status(&self) -> PoolStatus {
        PoolStatus {
            closed: self.is_closed(),
            size: self.size(),
            idle: self.num_idle(),
        }
    }

    /// The underlying sqlx pool, for callers that need sqlx directly.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Config for the `#[ignore]`d tests, read from the same DB_* variables the CLI uses.
#[cfg(test)]
pub(crate) fn config_from_env() -> DatabaseConfig {
    let var = |key: &str, default: &str| std::env::var(key).unwrap_or_else(|_| default.to_string());

    DatabaseConfig {
        host: var("DB_HOST", "localhost"),
        port: var("DB_PORT", "5432").parse().expect("DB_PORT must be a port number"),
        user: var("DB_USER", "postgres"),
        password: var("DB_PASSWORD", ""),
        database: var("DB_NAME", "postgres"),
        ..DatabaseConfig::default()
    }
}
