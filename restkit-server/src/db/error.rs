//! Database error type

use thiserror::Error;

/// Errors raised by the pool, the query executor and the function invoker.
#[derive(Debug, Error)]
pub enum DbError {
    /// No connection became available within the acquisition timeout.
    #[error("timed out waiting for a database connection")]
    PoolTimeout,

    /// The pool was used after `shutdown()`.
    #[error("database pool is closed")]
    PoolClosed,

    /// Opening a new connection failed (unreachable host, bad credentials, ...).
    #[error("could not connect to database: {0}")]
    Connection(#[source] sqlx::Error),

    /// The driver or the server rejected the statement.
    #[error("query failed: {message}")]
    Query {
        message: String,
        #[source]
        source: sqlx::Error,
    },

    /// A column could not be converted to JSON.
    #[error("could not decode column '{column}': {source}")]
    Decode {
        column: String,
        #[source]
        source: sqlx::Error,
    },
}

impl DbError {
    /// Classify an error returned while acquiring a pooled connection.
    ///
    /// sqlx retries failed connects inside `acquire` until the acquire timeout
    /// and then reports `PoolTimedOut`, so a refused or unreachable server
    /// surfaces as `PoolTimeout` (503), not `Connection`. The cause only shows
    /// up in the sqlx `warn` logs.
    pub(crate) fn from_acquire(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::PoolTimedOut => Self::PoolTimeout,
            sqlx::Error::PoolClosed => Self::PoolClosed,
            other => Self::Connection(other),
        }
    }

    /// Wrap a driver failure, keeping the original error as the source.
    pub(crate) fn query(err: sqlx::Error) -> Self {
        Self::Query {
            message: err.to_string(),
            source: err,
        }
    }

    /// True when the pool itself could not hand out a connection.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::PoolTimeout | Self::PoolClosed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn acquire_errors_are_classified() {
        assert!(matches!(
            DbError::from_acquire(sqlx::Error::PoolTimedOut),
            DbError::PoolTimeout
        ));
        assert!(matches!(
            DbError::from_acquire(sqlx::Error::PoolClosed),
            DbError::PoolClosed
        ));
        assert!(matches!(
            DbError::from_acquire(sqlx::Error::Protocol("bad handshake".into())),
            DbError::Connection(_)
        ));
    }

    #[test]
    fn query_error_keeps_cause() {
        let err = DbError::query(sqlx::Error::Protocol("syntax error at or near".into()));
        assert!(err.to_string().contains("syntax error"));
        assert!(err.source().is_some());
    }

    #[test]
    fn unavailable_only_for_pool_errors() {
        assert!(DbError::PoolTimeout.is_unavailable());
        assert!(DbError::PoolClosed.is_unavailable());
        assert!(!DbError::query(sqlx::Error::RowNotFound).is_unavailable());
    }
}
