use std::borrow::Cow;

use deadpool::managed::TimeoutType;
use diesel::ConnectionError;
use diesel::result::Error as DieselError;
use diesel_async::pooled_connection::PoolError;
use diesel_async::pooled_connection::deadpool::PoolError as DeadpoolError;

use crate::TRACING_TARGET_CONNECTION;

/// Failure of the account database.
#[derive(Debug, thiserror::Error)]
#[must_use = "database errors should be handled"]
pub enum PgError {
    #[error("invalid database configuration: {0}")]
    Config(String),

    /// Waiting for, creating or recycling a pooled connection took too long.
    #[error("database {0:?} timed out")]
    Timeout(TimeoutType),

    #[error("database connection failed: {0}")]
    Connection(#[from] ConnectionError),

    #[error("database migration failed: {0}")]
    Migration(Box<dyn std::error::Error + Send + Sync>),

    #[error("database query failed: {0}")]
    Query(#[from] DieselError),

    #[error("{0}")]
    Unexpected(Cow<'static, str>),
}

impl PgError {
    /// Whether the same operation may succeed if simply retried.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Timeout(_) => true,
            Self::Connection(error) => matches!(error, ConnectionError::BadConnection(_)),
            _ => false,
        }
    }
}

impl From<DeadpoolError> for PgError {
    fn from(error: DeadpoolError) -> Self {
        match error {
            DeadpoolError::Timeout(timeout) => Self::Timeout(timeout),
            DeadpoolError::Backend(PoolError::ConnectionError(error)) => Self::Connection(error),
            DeadpoolError::Backend(PoolError::QueryError(error)) => Self::Query(error),
            DeadpoolError::Closed => Self::Unexpected("connection pool is closed".into()),
            other => {
                tracing::error!(
                    target: TRACING_TARGET_CONNECTION,
                    error = %other,
                    "Connection pool misbehaved"
                );
                Self::Unexpected(other.to_string().into())
            }
        }
    }
}

pub type PgResult<T, E = PgError> = Result<T, E>;
