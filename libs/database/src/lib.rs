//! Relational database connectivity shared by the services in this workspace.
//!
//! The backend is picked from the connection URL, so the same code talks to
//! PostgreSQL in production and SQLite for local runs and tests.
//!
//! # Features
//!
//! - `config` - `core_config::FromEnv` for [`sql::DatabaseConfig`]
//!
//! # Example
//!
//! ```ignore
//! use database::sql::{self, DatabaseConfig};
//! use migration::Migrator;
//!
//! let db = sql::connect_from_config_with_retry(DatabaseConfig::new("sqlite::memory:"), None).await?;
//! sql::run_migrations::<Migrator>(&db).await?;
//! sql::check_health(&db).await?;
//! ```

pub mod common;
pub mod sql;

pub use common::{DatabaseError, DatabaseResult};
