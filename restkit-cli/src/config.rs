//! Database connection arguments shared by every command
//!
//! Each flag falls back to its DB_* environment variable, which `main` may
//! have loaded from a `.env` file.

use std::time::Duration;

use clap::Args;
use restkit_server::db::pool::{
    DEFAULT_CONNECTION_TIMEOUT, DEFAULT_IDLE_TIMEOUT, DEFAULT_MAX_CONNECTIONS,
};
use restkit_server::DatabaseConfig;

#[derive(Args, Debug, Clone)]
pub struct DatabaseArgs {
    /// PostgreSQL host
    #[arg(long, env = "DB_HOST")]
    pub db_host: String,

    /// PostgreSQL port
    #[arg(long, env = "DB_PORT", default_value_t = 5432)]
    pub db_port: u16,

    /// PostgreSQL user
    #[arg(long, env = "DB_USER")]
    pub db_user: String,

    /// PostgreSQL password
    #[arg(long, env = "DB_PASSWORD", hide_env_values = true)]
    pub db_password: String,

    /// Database name
    #[arg(long, env = "DB_NAME")]
    pub db_name: String,

    /// Maximum pooled connections
    #[arg(long, env = "DB_MAX_CONNECTIONS", default_value_t = DEFAULT_MAX_CONNECTIONS)]
    pub db_max_connections: u32,

    /// Idle connection lifetime in milliseconds
    #[arg(long, env = "DB_IDLE_TIMEOUT", default_value_t = DEFAULT_IDLE_TIMEOUT.as_millis() as u64)]
    pub db_idle_timeout: u64,

    /// How long to wait for a free connection, in milliseconds
    #[arg(long, env = "DB_CONNECTION_TIMEOUT", default_value_t = DEFAULT_CONNECTION_TIMEOUT.as_millis() as u64)]
    pub db_connection_timeout: u64,
}

impl DatabaseArgs {
    pub fn to_config(&self) -> DatabaseConfig {
        DatabaseConfig {
            host: self.db_host.clone(),
            port: self.db_port,
            user: self.db_user.clone(),
            password: self.db_password.clone(),
            database: self.db_name.clone(),
            max_connections: self.db_max_connections,
            idle_timeout: Duration::from_millis(self.db_idle_timeout),
            connection_timeout: Duration::from_millis(self.db_connection_timeout),
        }
    }
}
