//! Error types for bboard-postgres

use bboard_core::StoreError;
use sqlx::error::ErrorKind;
use thiserror::Error;
use tracing::debug;

/// SQLSTATE raised when `statement_timeout` cancels a query
const QUERY_CANCELED: &str = "57014";

/// Setup errors: configuration, pool creation, schema bootstrap
#[derive(Debug, Error)]
pub enum PgStoreError {
    #[error("invalid configuration value for {key}: '{value}'")]
    Config { key: &'static str, value: String },

    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),
}

/// Classify a sqlx error into the store error kinds the board understands.
pub(crate) fn classify(err: sqlx::Error) -> StoreError {
    match &err {
        sqlx::Error::Database(db) => {
            debug!(code = ?db.code(), message = db.message(), "database error");
            let constraint = || db.constraint().unwrap_or("unknown").to_owned();
            match db.kind() {
                ErrorKind::UniqueViolation => StoreError::UniqueViolation {
                    constraint: constraint(),
                },
                ErrorKind::ForeignKeyViolation => StoreError::ForeignKeyViolation {
                    constraint: constraint(),
                },
                _ if db.code().as_deref() == Some(QUERY_CANCELED) => StoreError::Unavailable {
                    message: db.message().to_owned(),
                },
                _ => StoreError::Backend {
                    message: db.message().to_owned(),
                },
            }
        }
        sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed
        | sqlx::Error::Io(_)
        | sqlx::Error::Tls(_) => {
            debug!(error = %err, "connection error");
            StoreError::Unavailable {
                message: err.to_string(),
            }
        }
        _ => {
            debug!(error = %err, "sqlx error");
            StoreError::Backend {
                message: err.to_string(),
            }
        }
    }
}
