use axum::{
    Json, Router,
    extract::{FromRef, State},
    http::{StatusCode, header},
    response::IntoResponse,
    routing::get,
};
use axum_helpers::{IdPath, JsonBody, RequestCancellation};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::error::{UserError, UserResult};
use crate::models::{CreateUser, UpdateUser, UserResponse};
use crate::repository::UserRepository;
use crate::service::UserService;
use crate::validation::{CreateUserValidator, UpdateUserValidator, Validator};

pub const USERS_PATH: &str = "/users";

/// Validators applied before the service is called.
#[derive(Clone)]
pub struct UserValidators {
    pub create: Arc<dyn Validator<CreateUser>>,
    pub update: Arc<dyn Validator<UpdateUser>>,
}

impl Default for UserValidators {
    fn default() -> Self {
        Self {
            create: Arc::new(CreateUserValidator::new()),
            update: Arc::new(UpdateUserValidator::new()),
        }
    }
}

/// Router state for the users endpoints.
pub struct UsersState<R: UserRepository> {
    pub service: Arc<UserService<R>>,
    pub validators: UserValidators,
    /// Root token; each request works on a child of it
    pub shutdown: CancellationToken,
}

impl<R: UserRepository> UsersState<R> {
    pub fn new(service: UserService<R>) -> Self {
        Self {
            service: Arc::new(service),
            validators: UserValidators::default(),
            shutdown: CancellationToken::new(),
        }
    }

    pub fn with_validators(mut self, validators: UserValidators) -> Self {
        self.validators = validators;
        self
    }

    pub fn with_shutdown(mut self, token: CancellationToken) -> Self {
        self.shutdown = token;
        self
    }
}

impl<R: UserRepository> Clone for UsersState<R> {
    fn clone(&self) -> Self {
        Self {
            service: Arc::clone(&self.service),
            validators: self.validators.clone(),
            shutdown: self.shutdown.clone(),
        }
    }
}

impl<R: UserRepository> FromRef<UsersState<R>> for CancellationToken {
    fn from_ref(state: &UsersState<R>) -> Self {
        state.shutdown.clone()
    }
}

/// Create the users router with default validators and no shutdown wiring
pub fn router<R: UserRepository + 'static>(service: UserService<R>) -> Router {
    router_with_state(UsersState::new(service))
}

/// Create the users router with all HTTP endpoints
pub fn router_with_state<R: UserRepository + 'static>(state: UsersState<R>) -> Router {
    Router::new()
        .route(USERS_PATH, get(list_users).post(create_user))
        .route(
            &format!("{}/{{id}}", USERS_PATH),
            get(get_user).put(update_user).delete(delete_user),
        )
        .with_state(state)
}

/// GET /users
async fn list_users<R: UserRepository>(
    State(state): State<UsersState<R>>,
    RequestCancellation(token): RequestCancellation,
) -> UserResult<Json<Vec<UserResponse>>> {
    let users = state.service.list(&token).await?;
    Ok(Json(users))
}

/// GET /users/{id}
async fn get_user<R: UserRepository>(
    State(state): State<UsersState<R>>,
    IdPath(id): IdPath,
    RequestCancellation(token): RequestCancellation,
) -> UserResult<Json<UserResponse>> {
    let user = state
        .service
        .get(id, &token)
        .await?
        .ok_or(UserError::NotFound(id))?;
    Ok(Json(user))
}

/// POST /users
///
/// Validation, then the email check, then the insert.
async fn create_user<R: UserRepository>(
    State(state): State<UsersState<R>>,
    RequestCancellation(token): RequestCancellation,
    JsonBody(input): JsonBody<CreateUser>,
) -> UserResult<impl IntoResponse> {
    state
        .validators
        .create
        .validate(&input)
        .into_result()
        .map_err(UserError::Validation)?;

    if state.service.email_taken(&input.email, &token).await? {
        return Err(UserError::DuplicateEmail(input.email));
    }

    let user = state.service.create(input, &token).await?;
    let location = format!("{}/{}", USERS_PATH, user.id);

    Ok((StatusCode::CREATED, [(header::LOCATION, location)], Json(user)))
}

/// PUT /users/{id}
async fn update_user<R: UserRepository>(
    State(state): State<UsersState<R>>,
    IdPath(id): IdPath,
    RequestCancellation(token): RequestCancellation,
    JsonBody(input): JsonBody<UpdateUser>,
) -> UserResult<Json<UserResponse>> {
    state
        .validators
        .update
        .validate(&input)
        .into_result()
        .map_err(UserError::Validation)?;

    let user = state.service.update(id, input, &token).await?;
    Ok(Json(user))
}

/// DELETE /users/{id} (soft delete)
async fn delete_user<R: UserRepository>(
    State(state): State<UsersState<R>>,
    IdPath(id): IdPath,
    RequestCancellation(token): RequestCancellation,
) -> UserResult<StatusCode> {
    if state.service.soft_delete(id, &token).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(UserError::NotFound(id))
    }
}
