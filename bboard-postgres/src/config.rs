//! Store configuration from the environment
//!
//! Environment variables (`.env` is honored):
//!   DATABASE_URL                  # default: postgres://localhost/bboard
//!   BBOARD_MAX_CONNECTIONS        # default: 5
//!   BBOARD_ACQUIRE_TIMEOUT_SECS   # default: 10
//!   BBOARD_STATEMENT_TIMEOUT_MS   # default: 5000

use std::str::FromStr;
use std::time::Duration;

use sqlx::postgres::PgConnectOptions;

use crate::PgStoreError;

const DEFAULT_DATABASE_URL: &str = "postgres://localhost/bboard";

/// Kept low: every operation holds one connection for its whole unit of work.
const DEFAULT_MAX_CONNECTIONS: u32 = 5;

const DEFAULT_ACQUIRE_TIMEOUT: Duration = Duration::from_secs(10);

const DEFAULT_STATEMENT_TIMEOUT: Duration = Duration::from_millis(5000);

/// PostgreSQL store configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PgStoreConfig {
    pub database_url: String,
    pub max_connections: u32,
    pub acquire_timeout: Duration,
    /// Sent as the session `statement_timeout`; queries exceeding it fail
    pub statement_timeout: Duration,
}

impl Default for PgStoreConfig {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            acquire_timeout: DEFAULT_ACQUIRE_TIMEOUT,
            statement_timeout: DEFAULT_STATEMENT_TIMEOUT,
        }
    }
}

impl PgStoreConfig {
    /// Load from process environment, after reading `.env` if present.
    pub fn from_env() -> Result<Self, PgStoreError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary key lookup. Unset keys take their defaults;
    /// set but unparsable keys are errors.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, PgStoreError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        Ok(Self {
            database_url: lookup("DATABASE_URL").unwrap_or(defaults.database_url),
            max_connections: parse(&lookup, "BBOARD_MAX_CONNECTIONS")?
                .unwrap_or(defaults.max_connections),
            acquire_timeout: parse(&lookup, "BBOARD_ACQUIRE_TIMEOUT_SECS")?
                .map(Duration::from_secs)
                .unwrap_or(defaults.acquire_timeout),
            statement_timeout: parse(&lookup, "BBOARD_STATEMENT_TIMEOUT_MS")?
                .map(Duration::from_millis)
                .unwrap_or(defaults.statement_timeout),
        })
    }

    /// Connection options with the statement timeout applied.
    pub fn connect_options(&self) -> Result<PgConnectOptions, PgStoreError> {
        let timeout_ms = self.statement_timeout.as_millis().to_string();
        Ok(PgConnectOptions::from_str(&self.database_url)?
            .options([("statement_timeout", timeout_ms.as_str())]))
    }
}

fn parse<F, T>(lookup: &F, key: &'static str) -> Result<Option<T>, PgStoreError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| PgStoreError::Config { key, value }),
    }
}
