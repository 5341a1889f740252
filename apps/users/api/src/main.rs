//! Users API - REST server

use axum_helpers::server::{create_production_app, create_router, ShutdownCoordinator};
use core_config::tracing::{init_tracing, install_color_eyre};
use migration::Migrator;
use tracing::info;

mod api;
mod config;
mod state;

use config::Config;
use state::AppState;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    // Install color-eyre first for colored error output (before any fallible operations)
    install_color_eyre();

    let config = Config::from_env()?;
    init_tracing(&config.environment);

    info!(
        name = config.app.name,
        version = config.app.version,
        "Starting Users API"
    );

    let db = database::sql::connect_from_config_with_retry(config.database.clone(), None)
        .await
        .map_err(|e| eyre::eyre!("Database connection failed: {}", e))?;

    if config.run_migrations {
        database::sql::run_migrations::<Migrator>(&db).await?;
    } else {
        info!("Skipping migrations (RUN_MIGRATIONS=false)");
    }

    let shutdown = ShutdownCoordinator::new();
    let state = AppState {
        config: config.clone(),
        db: db.clone(),
        shutdown: shutdown.clone(),
    };

    let router = create_router(api::routes(&state), &config.server)?;

    create_production_app(
        router,
        &config.server,
        config.shutdown_timeout,
        shutdown,
        async move {
            info!("Shutting down: closing database pool");
            if let Err(e) = db.close().await {
                tracing::warn!("Failed to close database pool: {}", e);
            }
        },
    )
    .await
    .map_err(|e| eyre::eyre!("Server error: {}", e))?;

    info!("Users API shutdown complete");
    Ok(())
}
