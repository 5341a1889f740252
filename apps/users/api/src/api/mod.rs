//! API routes module

pub mod health;
pub mod users;

use axum::Router;
use axum_helpers::server::health_router;

use crate::state::AppState;

/// Create all API routes
pub fn routes(state: &AppState) -> Router {
    Router::new()
        .merge(users::router(state))
        .merge(health_router())
        .merge(health::router(state.clone()))
}
