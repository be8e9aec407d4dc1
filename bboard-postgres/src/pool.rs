//! Database connection pool management

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;

use crate::{PgStoreConfig, PgStoreError};

/// Create a PostgreSQL connection pool from configuration.
///
/// # Errors
///
/// Returns an error if the URL is malformed or the first connection fails.
pub async fn create_pool(config: &PgStoreConfig) -> Result<PgPool, PgStoreError> {
    let options = config.connect_options()?;
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(config.acquire_timeout)
        .connect_with(options)
        .await?;

    info!(
        max_connections = config.max_connections,
        statement_timeout = ?config.statement_timeout,
        "database pool ready"
    );
    Ok(pool)
}
