use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicI32, Ordering};
use tokio::sync::RwLock;

use crate::error::{UserError, UserResult};
use crate::models::{NewUser, User};

/// Repository trait for User persistence.
///
/// Writes are staged on a [`Session`](UserRepository::Session) and only
/// become visible once [`save_changes`](UserRepository::save_changes) commits
/// them. Dropping a session without saving discards its writes. Reads return
/// detached copies.
#[cfg_attr(test, mockall::automock(type Session = ();))]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Per-request unit of work
    type Session: Send + Sync;

    /// Open a new session
    fn begin(&self) -> Self::Session;

    /// All users, ordered by id
    async fn get_all(&self, session: &Self::Session) -> UserResult<Vec<User>>;

    async fn get_by_id(&self, session: &Self::Session, id: i32) -> UserResult<Option<User>>;

    /// Lookup by normalized email
    async fn get_by_email(&self, session: &Self::Session, email: &str) -> UserResult<Option<User>>;

    /// Stage an insert. The returned user carries the id it will be stored under.
    async fn add(&self, session: &mut Self::Session, user: NewUser) -> UserResult<User>;

    /// Stage a full overwrite of an existing user
    async fn update(&self, session: &mut Self::Session, user: User) -> UserResult<()>;

    /// Stage a hard delete
    async fn remove(&self, session: &mut Self::Session, id: i32) -> UserResult<()>;

    /// Exact match against the stored (normalized) email
    async fn email_exists(&self, session: &Self::Session, email: &str) -> UserResult<bool>;

    /// Commit staged writes, returning the number of affected rows
    async fn save_changes(&self, session: Self::Session) -> UserResult<u64>;
}

/// A write staged on an [`InMemorySession`].
#[derive(Debug, Clone)]
enum Change {
    Insert(User),
    Update(User),
    Remove(i32),
}

/// Session for [`InMemoryUserRepository`].
#[derive(Debug, Default)]
pub struct InMemorySession {
    changes: Vec<Change>,
}

/// In-memory implementation of UserRepository (for development/testing)
#[derive(Debug, Clone)]
pub struct InMemoryUserRepository {
    users: Arc<RwLock<BTreeMap<i32, User>>>,
    next_id: Arc<AtomicI32>,
}

impl Default for InMemoryUserRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self {
            users: Arc::new(RwLock::new(BTreeMap::new())),
            next_id: Arc::new(AtomicI32::new(1)),
        }
    }
}

fn email_taken_by_other(users: &BTreeMap<i32, User>, email: &str, id: i32) -> bool {
    users.values().any(|u| u.id != id && u.email == email)
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    type Session = InMemorySession;

    fn begin(&self) -> InMemorySession {
        InMemorySession::default()
    }

    async fn get_all(&self, _session: &InMemorySession) -> UserResult<Vec<User>> {
        let users = self.users.read().await;
        Ok(users.values().cloned().collect())
    }

    async fn get_by_id(&self, _session: &InMemorySession, id: i32) -> UserResult<Option<User>> {
        let users = self.users.read().await;
        Ok(users.get(&id).cloned())
    }

    async fn get_by_email(&self, _session: &InMemorySession, email: &str) -> UserResult<Option<User>> {
        let users = self.users.read().await;
        Ok(users.values().find(|u| u.email == email).cloned())
    }

    async fn add(&self, session: &mut InMemorySession, user: NewUser) -> UserResult<User> {
        // Ids are taken eagerly; an unsaved session leaves a gap.
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let user = user.into_user(id);
        session.changes.push(Change::Insert(user.clone()));
        Ok(user)
    }

    async fn update(&self, session: &mut InMemorySession, user: User) -> UserResult<()> {
        session.changes.push(Change::Update(user));
        Ok(())
    }

    async fn remove(&self, session: &mut InMemorySession, id: i32) -> UserResult<()> {
        session.changes.push(Change::Remove(id));
        Ok(())
    }

    async fn email_exists(&self, _session: &InMemorySession, email: &str) -> UserResult<bool> {
        let users = self.users.read().await;
        Ok(users.values().any(|u| u.email == email))
    }

    async fn save_changes(&self, session: InMemorySession) -> UserResult<u64> {
        if session.changes.is_empty() {
            return Ok(0);
        }

        let mut users = self.users.write().await;

        // Apply to a copy so a failing change leaves the store untouched.
        let mut staged = users.clone();
        for change in &session.changes {
            match change {
                Change::Insert(user) => {
                    if email_taken_by_other(&staged, &user.email, user.id) {
                        return Err(UserError::DuplicateEmail(user.email.clone()));
                    }
                    staged.insert(user.id, user.clone());
                }
                Change::Update(user) => {
                    let Some(existing) = staged.get(&user.id) else {
                        return Err(UserError::NotFound(user.id));
                    };
                    if email_taken_by_other(&staged, &user.email, user.id) {
                        return Err(UserError::DuplicateEmail(user.email.clone()));
                    }
                    let created_at = existing.created_at;
                    staged.insert(
                        user.id,
                        User {
                            created_at,
                            ..user.clone()
                        },
                    );
                }
                Change::Remove(id) => {
                    if staged.remove(id).is_none() {
                        return Err(UserError::NotFound(*id));
                    }
                }
            }
        }

        *users = staged;

        for change in &session.changes {
            match change {
                Change::Insert(user) => {
                    tracing::info!(user_id = user.id, email = %user.email, "Created user")
                }
                Change::Update(user) => tracing::info!(user_id = user.id, "Updated user"),
                Change::Remove(id) => tracing::info!(user_id = *id, "Removed user"),
            }
        }

        Ok(session.changes.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};

    fn new_user(email: &str) -> NewUser {
        NewUser {
            name: "Ana Silva".to_string(),
            email: email.to_string(),
            password: "secret1".to_string(),
            birth_date: NaiveDate::from_ymd_opt(2000, 1, 1).unwrap(),
            phone: None,
            active: true,
            created_at: Utc::now(),
        }
    }

    async fn insert(repo: &InMemoryUserRepository, email: &str) -> User {
        let mut session = repo.begin();
        let user = repo.add(&mut session, new_user(email)).await.unwrap();
        assert_eq!(repo.save_changes(session).await.unwrap(), 1);
        user
    }

    #[tokio::test]
    async fn test_add_is_invisible_until_saved() {
        let repo = InMemoryUserRepository::new();

        let mut session = repo.begin();
        let user = repo.add(&mut session, new_user("ana@ex.com")).await.unwrap();

        let reader = repo.begin();
        assert!(repo.get_by_id(&reader, user.id).await.unwrap().is_none());

        repo.save_changes(session).await.unwrap();
        let found = repo.get_by_id(&reader, user.id).await.unwrap().unwrap();
        assert_eq!(found, user);
    }

    #[tokio::test]
    async fn test_dropped_session_discards_writes() {
        let repo = InMemoryUserRepository::new();

        let mut session = repo.begin();
        repo.add(&mut session, new_user("ana@ex.com")).await.unwrap();
        drop(session);

        let reader = repo.begin();
        assert!(repo.get_all(&reader).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_ids_are_never_reused() {
        let repo = InMemoryUserRepository::new();
        let first = insert(&repo, "a@ex.com").await;

        let mut session = repo.begin();
        repo.remove(&mut session, first.id).await.unwrap();
        repo.save_changes(session).await.unwrap();

        let second = insert(&repo, "b@ex.com").await;
        assert!(second.id > first.id);
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected_on_save() {
        let repo = InMemoryUserRepository::new();
        insert(&repo, "ana@ex.com").await;

        let mut session = repo.begin();
        repo.add(&mut session, new_user("ana@ex.com")).await.unwrap();
        let err = repo.save_changes(session).await.unwrap_err();

        assert!(matches!(err, UserError::DuplicateEmail(email) if email == "ana@ex.com"));
        assert_eq!(repo.get_all(&repo.begin()).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_failed_save_applies_nothing() {
        let repo = InMemoryUserRepository::new();
        let existing = insert(&repo, "ana@ex.com").await;

        let mut session = repo.begin();
        repo.add(&mut session, new_user("bia@ex.com")).await.unwrap();
        repo.remove(&mut session, 999).await.unwrap();
        let err = repo.save_changes(session).await.unwrap_err();

        assert!(matches!(err, UserError::NotFound(999)));
        let all = repo.get_all(&repo.begin()).await.unwrap();
        assert_eq!(all, vec![existing]);
    }

    #[tokio::test]
    async fn test_update_keeps_created_at() {
        let repo = InMemoryUserRepository::new();
        let user = insert(&repo, "ana@ex.com").await;

        let mut changed = user.clone();
        changed.name = "Ana Souza".to_string();
        changed.created_at = Utc::now() + chrono::Duration::days(1);
        changed.updated_at = Some(Utc::now());

        let mut session = repo.begin();
        repo.update(&mut session, changed).await.unwrap();
        repo.save_changes(session).await.unwrap();

        let stored = repo.get_by_id(&repo.begin(), user.id).await.unwrap().unwrap();
        assert_eq!(stored.name, "Ana Souza");
        assert_eq!(stored.created_at, user.created_at);
        assert!(stored.updated_at.is_some());
    }

    #[tokio::test]
    async fn test_update_missing_user_fails() {
        let repo = InMemoryUserRepository::new();
        let ghost = new_user("ghost@ex.com").into_user(42);

        let mut session = repo.begin();
        repo.update(&mut session, ghost).await.unwrap();

        assert!(matches!(
            repo.save_changes(session).await,
            Err(UserError::NotFound(42))
        ));
    }

    #[tokio::test]
    async fn test_email_lookups_are_exact() {
        let repo = InMemoryUserRepository::new();
        let user = insert(&repo, "ana@ex.com").await;
        let session = repo.begin();

        assert!(repo.email_exists(&session, "ana@ex.com").await.unwrap());
        assert!(!repo.email_exists(&session, "ANA@EX.COM").await.unwrap());
        assert_eq!(
            repo.get_by_email(&session, "ana@ex.com").await.unwrap(),
            Some(user)
        );
    }

    #[tokio::test]
    async fn test_get_all_is_ordered_by_id() {
        let repo = InMemoryUserRepository::new();
        for email in ["c@ex.com", "a@ex.com", "b@ex.com"] {
            insert(&repo, email).await;
        }

        let ids: Vec<i32> = repo
            .get_all(&repo.begin())
            .await
            .unwrap()
            .into_iter()
            .map(|u| u.id)
            .collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_save_without_changes_is_noop() {
        let repo = InMemoryUserRepository::new();
        assert_eq!(repo.save_changes(repo.begin()).await.unwrap(), 0);
    }
}
