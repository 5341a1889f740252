//! Configuration for Users API

use core_config::{app_info, env_parse_or_default, server::ServerConfig, AppInfo, FromEnv};
use database::sql::DatabaseConfig;
use std::time::Duration;

pub use core_config::Environment;

/// Application configuration
#[derive(Clone, Debug)]
pub struct Config {
    pub app: AppInfo,
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub environment: Environment,
    /// Apply pending migrations on startup (`RUN_MIGRATIONS`, default true)
    pub run_migrations: bool,
    /// Time allowed for cleanup after the listener drains (`SHUTDOWN_TIMEOUT_SECS`, default 30)
    pub shutdown_timeout: Duration,
}

impl Config {
    pub fn from_env() -> eyre::Result<Self> {
        let environment = Environment::from_env();
        let database = DatabaseConfig::from_env()?;
        let server = ServerConfig::from_env()?;
        let run_migrations = env_parse_or_default("RUN_MIGRATIONS", "true")?;
        let shutdown_timeout =
            Duration::from_secs(env_parse_or_default("SHUTDOWN_TIMEOUT_SECS", "30")?);

        Ok(Self {
            app: app_info!(),
            database,
            server,
            environment,
            run_migrations,
            shutdown_timeout,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        temp_env::with_vars(
            [
                ("DATABASE_URL", Some("sqlite://users.db?mode=rwc")),
                ("RUN_MIGRATIONS", None),
                ("SHUTDOWN_TIMEOUT_SECS", None),
                ("PORT", None),
                ("APP_ENV", None),
            ],
            || {
                let config = Config::from_env().unwrap();

                assert_eq!(config.app.name, "users_api");
                assert!(config.run_migrations);
                assert_eq!(config.shutdown_timeout, Duration::from_secs(30));
                assert_eq!(config.server.port, 8080);
                assert!(config.database.is_sqlite());
                assert!(config.environment.is_development());
            },
        );
    }

    #[test]
    fn test_config_overrides() {
        temp_env::with_vars(
            [
                ("DATABASE_URL", Some("postgres://localhost/users")),
                ("RUN_MIGRATIONS", Some("false")),
                ("SHUTDOWN_TIMEOUT_SECS", Some("5")),
                ("APP_ENV", Some("production")),
            ],
            || {
                let config = Config::from_env().unwrap();

                assert!(!config.run_migrations);
                assert_eq!(config.shutdown_timeout, Duration::from_secs(5));
                assert!(config.environment.is_production());
            },
        );
    }

    #[test]
    fn test_config_requires_database_url() {
        temp_env::with_var_unset("DATABASE_URL", || {
            assert!(Config::from_env().is_err());
        });
    }

    #[test]
    fn test_config_rejects_bad_flag() {
        temp_env::with_vars(
            [
                ("DATABASE_URL", Some("sqlite::memory:")),
                ("RUN_MIGRATIONS", Some("sometimes")),
            ],
            || {
                assert!(Config::from_env().is_err());
            },
        );
    }
}
