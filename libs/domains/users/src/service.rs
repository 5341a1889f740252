use chrono::Utc;
use std::future::Future;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::error::{UserError, UserResult};
use crate::models::{CreateUser, NewUser, UpdateUser, UserResponse, normalize_email};
use crate::repository::UserRepository;
use crate::validation::ValidationErrors;

/// Service layer for User business logic.
///
/// Every operation races its storage work against `token`; a cancelled token
/// wins and the operation returns [`UserError::Cancelled`]. Writes that have
/// not been saved are then discarded with the session.
pub struct UserService<R: UserRepository> {
    repository: Arc<R>,
}

impl<R: UserRepository> Clone for UserService<R> {
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
        }
    }
}

async fn cancellable<T>(
    token: &CancellationToken,
    op: impl Future<Output = UserResult<T>>,
) -> UserResult<T> {
    tokio::select! {
        biased;
        _ = token.cancelled() => {
            tracing::warn!("User operation cancelled");
            Err(UserError::Cancelled)
        }
        result = op => result,
    }
}

fn missing(field: &str, message: &str) -> UserError {
    let mut errors = ValidationErrors::new();
    errors.add(field, message);
    UserError::Validation(errors)
}

impl<R: UserRepository> UserService<R> {
    pub fn new(repository: R) -> Self {
        Self {
            repository: Arc::new(repository),
        }
    }

    /// All users, inactive ones included
    pub async fn list(&self, token: &CancellationToken) -> UserResult<Vec<UserResponse>> {
        cancellable(token, async {
            let session = self.repository.begin();
            let users = self.repository.get_all(&session).await?;
            Ok(users.into_iter().map(UserResponse::from).collect())
        })
        .await
    }

    /// `None` if no user has this id
    pub async fn get(&self, id: i32, token: &CancellationToken) -> UserResult<Option<UserResponse>> {
        cancellable(token, async {
            let session = self.repository.begin();
            let user = self.repository.get_by_id(&session, id).await?;
            Ok(user.map(UserResponse::from))
        })
        .await
    }

    /// Create an active user with a normalized email.
    ///
    /// Email uniqueness is not pre-checked here; call [`email_taken`](Self::email_taken)
    /// first. A collision that slips through fails with `DuplicateEmail`.
    pub async fn create(
        &self,
        input: CreateUser,
        token: &CancellationToken,
    ) -> UserResult<UserResponse> {
        let birth_date = input
            .birth_date
            .ok_or_else(|| missing("birthDate", "Birth date is required."))?;

        let new_user = NewUser {
            name: input.name,
            email: normalize_email(&input.email),
            password: input.password,
            birth_date,
            phone: input.phone,
            active: true,
            created_at: Utc::now(),
        };

        cancellable(token, async {
            let mut session = self.repository.begin();
            let user = self.repository.add(&mut session, new_user).await?;
            self.repository.save_changes(session).await?;
            Ok(user.into())
        })
        .await
    }

    /// Overwrite every mutable field of an existing user.
    ///
    /// The response echoes the original `createdAt`.
    pub async fn update(
        &self,
        id: i32,
        input: UpdateUser,
        token: &CancellationToken,
    ) -> UserResult<UserResponse> {
        let birth_date = input
            .birth_date
            .ok_or_else(|| missing("birthDate", "Birth date is required."))?;
        let active = input
            .active
            .ok_or_else(|| missing("active", "Active is required."))?;

        cancellable(token, async {
            let mut session = self.repository.begin();
            let mut user = self
                .repository
                .get_by_id(&session, id)
                .await?
                .ok_or(UserError::NotFound(id))?;

            user.name = input.name;
            user.email = normalize_email(&input.email);
            user.birth_date = birth_date;
            user.phone = input.phone;
            user.active = active;
            user.updated_at = Some(Utc::now());

            self.repository.update(&mut session, user.clone()).await?;
            self.repository.save_changes(session).await?;
            Ok(user.into())
        })
        .await
    }

    /// Mark a user inactive. Returns `false` if no user has this id.
    pub async fn soft_delete(&self, id: i32, token: &CancellationToken) -> UserResult<bool> {
        cancellable(token, async {
            let mut session = self.repository.begin();
            let Some(mut user) = self.repository.get_by_id(&session, id).await? else {
                return Ok(false);
            };

            user.active = false;
            user.updated_at = Some(Utc::now());

            self.repository.update(&mut session, user).await?;
            self.repository.save_changes(session).await?;
            tracing::info!(user_id = id, "Soft-deleted user");
            Ok(true)
        })
        .await
    }

    /// Whether any user holds this email once normalized
    pub async fn email_taken(&self, email: &str, token: &CancellationToken) -> UserResult<bool> {
        let email = normalize_email(email);
        cancellable(token, async {
            let session = self.repository.begin();
            self.repository.email_exists(&session, &email).await
        })
        .await
    }
}
