//! Database layer - connection pool, query execution, stored functions
//!
//! # Design Principles
//!
//! - One sqlx PgPool per process, created at startup and closed at shutdown
//! - Every borrowed connection goes back to the pool, including on error and cancellation
//! - Failures are logged with the statement or function name, then returned; no retries
//! - Services depend on the `QueryExecutor` trait, not on the pool

pub mod error;
pub mod executor;
pub mod functions;
pub mod pool;
pub mod row;

pub use error::DbError;
pub use executor::QueryExecutor;
pub use functions::{call_function, function_call_sql, unwrap_function_result};
pub use pool::{Database, DatabaseConfig, PoolStatus, PooledConnection};
pub use row::{Param, Row};
