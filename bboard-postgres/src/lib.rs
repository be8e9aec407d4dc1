//! bboard-postgres: PostgreSQL adapter for the bboard store port
//!
//! [`PgStore`] opens one sqlx transaction per unit of work. Constraint
//! violations come back as classified [`bboard_core::StoreError`]s so the
//! board can tell conflicts and missing references from fatal failures.
//!
//! ```ignore
//! let config = PgStoreConfig::from_env()?;
//! let store = PgStore::connect(&config).await?;
//! schema::install(store.pool()).await?;
//! let board = bboard_core::Board::new(store);
//! ```

pub mod config;
pub mod error;
pub mod pool;
pub mod schema;
pub mod store;

pub use config::PgStoreConfig;
pub use error::PgStoreError;
pub use pool::create_pool;
pub use store::{PgStore, PgWork};
