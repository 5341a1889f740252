//! # Axum Helpers
//!
//! Shared building blocks for the Axum services in this workspace.
//!
//! ## Modules
//!
//! - **[`server`]**: Router layering, health checks, graceful shutdown
//! - **[`http`]**: CORS configuration
//! - **[`errors`]**: JSON error responses with error codes
//! - **[`extractors`]**: JSON body, integer id path and request cancellation extractors
//!
//! ## Quick Start
//!
//! ```ignore
//! use axum::Router;
//! use axum_helpers::server::{ShutdownCoordinator, create_production_app, create_router, health_router};
//! use core_config::{FromEnv, server::ServerConfig};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> eyre::Result<()> {
//!     let config = ServerConfig::from_env()?;
//!     let router = create_router(health_router(), &config)?;
//!
//!     create_production_app(router, &config, Duration::from_secs(30), ShutdownCoordinator::new(), async {})
//!         .await?;
//!     Ok(())
//! }
//! ```

pub mod errors;
pub mod extractors;
pub mod http;
pub mod server;

pub use server::{
    HealthCheckFuture, HealthResponse, ShutdownCoordinator, create_production_app, create_router,
    health_router, run_health_checks, shutdown_signal,
};

pub use http::create_cors_layer;

pub use errors::{AppError, ErrorCode, ErrorResponse, FieldErrors};

pub use extractors::{IdPath, JsonBody, RequestCancellation};
