//! Parameterized query execution
//!
//! `QueryExecutor` is the seam services depend on. `Database` implements it
//! against the pool; tests substitute an in-memory executor.

use async_trait::async_trait;
use sqlx::postgres::PgTypeInfo;
use sqlx::{Either, Executor, Statement, TypeInfo};

use super::row::{bind_params, decode_row};
use super::{Database, DbError, Param, PoolStatus, Row};

/// Runs a SQL statement with positional parameters and returns its rows.
#[async_trait]
pub trait QueryExecutor: Send + Sync {
    async fn execute(&self, sql: &str, params: &[Param]) -> Result<Vec<Row>, DbError>;

    /// Types the server would give each parameter of `sql`, by position.
    ///
    /// Untyped parameters (text, null) are left for the server to resolve;
    /// `None` where no type is known. Executors without a server know nothing.
    async fn parameter_types(
        &self,
        _sql: &str,
        params: &[Param],
    ) -> Result<Vec<Option<String>>, DbError> {
        Ok(vec![None; params.len()])
    }

    /// Pool counters, when the executor is backed by a pool.
    fn pool_status(&self) -> Option<PoolStatus> {
        None
    }
}

#[async_trait]
impl QueryExecutor for Database {
    /// Borrow a connection, run the statement, hand the connection back.
    ///
    /// The connection is released before the result is inspected, so the
    /// error path returns it too. If the calling future is dropped mid-query
    /// the connection is returned as well, but only once the server has
    /// finished the statement; until then it still counts against the pool.
    async fn execute(&self, sql: &str, params: &[Param]) -> Result<Vec<Row>, DbError> {
        let mut conn = self.acquire().await.inspect_err(|e| {
            tracing::error!(sql, error = %e, "Could not get a connection for query");
        })?;

        tracing::debug!(sql, params = params.len(), "Executing query");
        let fetched = bind_params(sqlx::query(sql), params)
            .fetch_all(&mut *conn)
            .await;
        self.release(conn);

        let pg_rows = fetched.map_err(|e| {
            tracing::error!(sql, error = %e, "Query failed");
            DbError::query(e)
        })?;

        pg_rows
            .iter()
            .map(decode_row)
            .collect::<Result<Vec<_>, _>>()
            .inspect_err(|e| tracing::error!(sql, error = %e, "Could not decode query result"))
    }

    /// Prepares `sql` with untyped parameters declared as OID 0 and reads
    /// back the types the server resolved. A statement the server rejects
    /// yields no types; running it reports the real error.
    async fn parameter_types(
        &self,
        sql: &str,
        params: &[Param],
    ) -> Result<Vec<Option<String>>, DbError> {
        let mut conn = self.acquire().await?;

        let declared: Vec<PgTypeInfo> = params.iter().map(Param::declared_type).collect();
        let prepared = (&mut *conn)
            .prepare_with(sql, &declared)
            .await
            .map(|statement| match statement.parameters() {
                Some(Either::Left(types)) => types
                    .iter()
                    .map(|ty| Some(ty.name().to_owned()))
                    .collect::<Vec<_>>(),
                _ => Vec::new(),
            });
        self.release(conn);

        match prepared {
            Ok(types) if types.len() == params.len() => {
                tracing::debug!(sql, ?types, "Inferred parameter types");
                Ok(types)
            }
            Ok(_) => Ok(vec![None; params.len()]),
            Err(e) => {
                tracing::debug!(sql, error = %e, "Could not infer parameter types");
                Ok(vec![None; params.len()])
            }
        }
    }

    fn pool_status(&self) -> Option<PoolStatus> {
        Some(self.status())
    }
}

/// In-memory executor for unit tests: records every call and replays a
/// canned result.
#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Mutex;

    use super::*;

    pub(crate) struct RecordingExecutor {
        result: Mutex<Option<Result<Vec<Row>, DbError>>>,
        calls: Mutex<Vec<(String, Vec<Param>)>>,
        inferred: Vec<Option<String>>,
    }

    impl RecordingExecutor {
        pub(crate) fn returning(rows: Vec<serde_json::Value>) -> Self {
            let rows = rows
                .into_iter()
                .map(|row| match row {
                    serde_json::Value::Object(map) => map,
                    other => panic!("test rows must be objects, got {other}"),
                })
                .collect();
            Self {
                result: Mutex::new(Some(Ok(rows))),
                calls: Mutex::new(Vec::new()),
                inferred: Vec::new(),
            }
        }

        pub(crate) fn failing(err: DbError) -> Self {
            Self {
                result: Mutex::new(Some(Err(err))),
                calls: Mutex::new(Vec::new()),
                inferred: Vec::new(),
            }
        }

        /// Report these server-side parameter types.
        pub(crate) fn inferring(mut self, types: &[Option<&str>]) -> Self {
            self.inferred = types.iter().map(|t| t.map(str::to_owned)).collect();
            self
        }

        pub(crate) fn calls(&self) -> Vec<(String, Vec<Param>)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl QueryExecutor for RecordingExecutor {
        async fn execute(&self, sql: &str, params: &[Param]) -> Result<Vec<Row>, DbError> {
            self.calls
                .lock()
                .unwrap()
                .push((sql.to_owned(), params.to_vec()));
            self.result
                .lock()
                .unwrap()
                .take()
                .expect("RecordingExecutor called more than once")
        }

        async fn parameter_types(
            &self,
            _sql: &str,
            params: &[Param],
        ) -> Result<Vec<Option<String>>, DbError> {
            if self.inferred.is_empty() {
                Ok(vec![None; params.len()])
            } else {
                Ok(self.inferred.clone())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::db::DatabaseConfig;

    #[tokio::test]
    async fn execute_on_closed_pool_fails_fast() {
        let db = Database::connect_lazy(&DatabaseConfig::default());
        db.shutdown().await;

        let err = db.execute("SELECT 1", &[]).await.unwrap_err();
        assert!(matches!(err, DbError::PoolClosed));
    }

    #[tokio::test]
    async fn database_reports_pool_status() {
        let db = Database::connect_lazy(&DatabaseConfig::default());
        let status = db.pool_status().expect("database has a pool");
        assert!(!status.closed);
    }

    // Tests below need a reachable PostgreSQL.

    async fn settle() {
        tokio::time::sleep(Duration::from_millis(50)).await;
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn execute_binds_positionally() {
        let db = Database::initialize(&crate::db::pool::config_from_env()).await;
        let rows = db
            .execute(
                "SELECT $1::int4 AS n, $2::text AS s",
                &[Param::Int(10), Param::from("x")],
            )
            .await
            .expect("query failed");

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["n"], 10);
        assert_eq!(rows[0]["s"], "x");
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn connection_count_restored_after_success_and_failure() {
        let db = Database::initialize(&crate::db::pool::config_from_env()).await;
        settle().await;
        let idle_before = db.num_idle();

        db.execute("SELECT 1", &[]).await.expect("query failed");
        settle().await;
        assert_eq!(db.num_idle(), idle_before);

        let err = db.execute("SELEC nonsense", &[]).await.unwrap_err();
        assert!(matches!(err, DbError::Query { .. }));
        settle().await;
        assert_eq!(db.num_idle(), idle_before);
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn cancelled_query_returns_connection() {
        let config = DatabaseConfig {
            max_connections: 1,
            ..crate::db::pool::config_from_env()
        };
        let db = Database::initialize(&config).await;

        // Shorter than the 2s acquire timeout: the connection only comes back
        // once the server finishes the statement.
        let slow = db.execute("SELECT pg_sleep(0.5)", &[]);
        let timed_out = tokio::time::timeout(Duration::from_millis(100), slow).await;
        assert!(timed_out.is_err());

        let started = std::time::Instant::now();
        let conn = db.acquire().await.expect("connection leaked by cancelled query");
        assert!(started.elapsed() < config.connection_timeout);
        db.release(conn);
    }

    #[tokio::test]
    async fn parameter_types_on_closed_pool_fail_fast() {
        let db = Database::connect_lazy(&DatabaseConfig::default());
        db.shutdown().await;

        let err = db
            .parameter_types("SELECT $1", &[Param::from("x")])
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::PoolClosed));
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn server_infers_untyped_parameters() {
        let db = Database::initialize(&crate::db::pool::config_from_env()).await;
        let types = db
            .parameter_types(
                "SELECT $1::INT4 + 1, $2 = CURRENT_DATE",
                &[Param::Int(1), Param::from("2024-05-01")],
            )
            .await
            .expect("inference failed");

        assert_eq!(types[0].as_deref(), Some("INT4"));
        assert_eq!(types[1].as_deref(), Some("DATE"));
    }
}
