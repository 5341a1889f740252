//! Server infrastructure: router layering, health endpoints and graceful shutdown.
//!
//! ```ignore
//! use axum_helpers::server::{ShutdownCoordinator, create_production_app, create_router, health_router};
//!
//! let router = create_router(health_router().merge(api_routes), &server_config)?;
//! create_production_app(router, &server_config, timeout, ShutdownCoordinator::new(), cleanup).await?;
//! ```

pub mod app;
pub mod health;
pub mod shutdown;

pub use app::{create_production_app, create_router, serve};
pub use health::{HealthCheckFuture, HealthResponse, health_router, run_health_checks};
pub use shutdown::{ShutdownCoordinator, shutdown_signal};
