//! restkit-server: REST API starter over a pooled PostgreSQL connection
//!
//! Wires an axum router, request validation, a static API description
//! and two demonstration modules: an in-memory sample CRUD resource and
//! read-only endpoints backed by stored database functions.

pub mod db;
pub mod http;
pub mod models;
pub mod samples;
pub mod services;

pub use db::{Database, DatabaseConfig, DbError, Param, PoolStatus, QueryExecutor, Row};
pub use http::{build_router, run_server, ApiError, AppState, ServerConfig};
pub use samples::{SampleStore, StoreError};
