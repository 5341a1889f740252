//! Users routes backed by the SQL repository

use axum::Router;
use domain_users::{handlers, SqlUserRepository, UserService, UsersState};

use crate::state::AppState;

pub fn router(state: &AppState) -> Router {
    let repository = SqlUserRepository::new(state.db.clone());
    let users_state =
        UsersState::new(UserService::new(repository)).with_shutdown(state.shutdown.token());

    handlers::router_with_state(users_state)
}
