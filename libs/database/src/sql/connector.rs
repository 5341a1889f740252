use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbErr};
use sea_orm_migration::MigratorTrait;
use tracing::info;

use super::DatabaseConfig;
use crate::common::{RetryConfig, retry, retry_with_backoff};

/// Connect with [`DatabaseConfig`] defaults.
pub async fn connect(database_url: &str) -> Result<DatabaseConnection, DbErr> {
    connect_from_config(DatabaseConfig::new(database_url)).await
}

pub async fn connect_from_config(config: DatabaseConfig) -> Result<DatabaseConnection, DbErr> {
    connect_with_options(config.into_connect_options()).await
}

pub async fn connect_with_options(options: ConnectOptions) -> Result<DatabaseConnection, DbErr> {
    let db = Database::connect(options).await?;
    info!(backend = ?db.get_database_backend(), "Connected to database");
    Ok(db)
}

/// Connect, retrying with exponential backoff while the database comes up.
///
/// `None` uses [`RetryConfig::default`].
///
/// ```ignore
/// let config = DatabaseConfig::from_env()?;
/// let db = connect_from_config_with_retry(config, Some(RetryConfig::new().with_max_retries(5))).await?;
/// ```
pub async fn connect_from_config_with_retry(
    config: DatabaseConfig,
    retry_config: Option<RetryConfig>,
) -> Result<DatabaseConnection, DbErr> {
    let options = config.into_connect_options();
    let attempt = || connect_with_options(options.clone());

    match retry_config {
        Some(retry_config) => retry_with_backoff(attempt, retry_config).await,
        None => retry(attempt).await,
    }
}

/// Apply all pending migrations of `M`.
pub async fn run_migrations<M: MigratorTrait>(db: &DatabaseConnection) -> Result<(), DbErr> {
    let pending = M::get_pending_migrations(db).await?.len();
    info!(pending, "Running database migrations");
    M::up(db, None).await?;
    info!("Database migrations complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use migration::Migrator;

    fn memory_config() -> DatabaseConfig {
        DatabaseConfig::new("sqlite::memory:").with_pool_size(1, 1)
    }

    #[tokio::test]
    async fn test_connect_sqlite_memory() {
        let db = connect_from_config(memory_config()).await.unwrap();
        assert_eq!(db.get_database_backend(), sea_orm::DatabaseBackend::Sqlite);
    }

    #[tokio::test]
    async fn test_connect_with_retry_gives_up_on_bad_url() {
        let config = DatabaseConfig::new("sqlite:///nonexistent-dir/users.db?mode=ro");
        let retry_config = RetryConfig::new()
            .with_max_retries(1)
            .with_initial_delay(1)
            .without_jitter();

        let result = connect_from_config_with_retry(config, Some(retry_config)).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_run_migrations_is_idempotent() {
        let db = connect_from_config(memory_config()).await.unwrap();

        run_migrations::<Migrator>(&db).await.unwrap();
        run_migrations::<Migrator>(&db).await.unwrap();

        assert!(Migrator::get_pending_migrations(&db).await.unwrap().is_empty());
    }
}
