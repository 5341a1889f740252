//! SQLite test infrastructure
//!
//! Every `TestDatabase` is a private in-memory SQLite database with all
//! migrations applied, so tests never share state.

use database::sql::{DatabaseConfig, connect_from_config, run_migrations};
use migration::Migrator;
use sea_orm::DatabaseConnection;

/// Test database wrapper
///
/// The pool holds exactly one connection: each SQLite in-memory connection is
/// its own database. The database disappears when the last clone of the
/// connection is dropped.
pub struct TestDatabase {
    pub connection: DatabaseConnection,
}

impl TestDatabase {
    /// Create a new test database with migrations applied
    ///
    /// # Example
    ///
    /// ```no_run
    /// use test_utils::TestDatabase;
    ///
    /// # async fn example() {
    /// let db = TestDatabase::new().await;
    /// // Use db.connection() to create your repository
    /// # }
    /// ```
    pub async fn new() -> Self {
        let config = DatabaseConfig::new("sqlite::memory:").with_pool_size(1, 1);

        let connection = connect_from_config(config)
            .await
            .expect("Failed to open in-memory SQLite database");

        run_migrations::<Migrator>(&connection)
            .await
            .expect("Failed to run migrations");

        tracing::info!("Test database ready (SQLite in-memory)");

        Self { connection }
    }

    /// Get a clone of the connection
    pub fn connection(&self) -> DatabaseConnection {
        self.connection.clone()
    }
}
