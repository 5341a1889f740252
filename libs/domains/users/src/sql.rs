use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DatabaseTransaction, DbErr,
    EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, SqlErr, TransactionTrait,
};

use crate::{
    entity,
    error::{UserError, UserResult},
    models::{NewUser, User},
    repository::UserRepository,
};

/// sea-orm backed repository (Postgres or SQLite).
#[derive(Debug, Clone)]
pub struct SqlUserRepository {
    db: DatabaseConnection,
}

impl SqlUserRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

/// Session for [`SqlUserRepository`].
///
/// The transaction is opened by the first write, so read-only requests never
/// hold one. Until then reads go straight to the pool.
pub struct SqlSession {
    db: DatabaseConnection,
    txn: Option<DatabaseTransaction>,
    affected: u64,
}

impl SqlSession {
    async fn txn(&mut self) -> UserResult<&DatabaseTransaction> {
        if self.txn.is_none() {
            let txn = self.db.begin().await.map_err(map_db_err)?;
            tracing::debug!("Opened write transaction");
            self.txn = Some(txn);
        }
        self.txn
            .as_ref()
            .ok_or_else(|| DbErr::Custom("write transaction unavailable".to_string()).into())
    }
}

fn map_db_err(err: DbErr) -> UserError {
    tracing::error!("Database error: {:?}", err);
    UserError::Database(err)
}

/// The only unique column is `email`, so a unique violation on write is a
/// duplicate email lost to a concurrent request.
fn map_write_err(err: DbErr, email: &str) -> UserError {
    if let Some(SqlErr::UniqueConstraintViolation(detail)) = err.sql_err() {
        tracing::info!(email = %email, detail = %detail, "Unique constraint violated");
        return UserError::DuplicateEmail(email.to_string());
    }
    map_db_err(err)
}

async fn find_all<C: ConnectionTrait>(conn: &C) -> Result<Vec<entity::Model>, DbErr> {
    entity::Entity::find()
        .order_by_asc(entity::Column::Id)
        .all(conn)
        .await
}

async fn find_by_id<C: ConnectionTrait>(conn: &C, id: i32) -> Result<Option<entity::Model>, DbErr> {
    entity::Entity::find_by_id(id).one(conn).await
}

async fn find_by_email<C: ConnectionTrait>(
    conn: &C,
    email: &str,
) -> Result<Option<entity::Model>, DbErr> {
    entity::Entity::find()
        .filter(entity::Column::Email.eq(email))
        .one(conn)
        .await
}

async fn count_by_email<C: ConnectionTrait>(conn: &C, email: &str) -> Result<u64, DbErr> {
    entity::Entity::find()
        .filter(entity::Column::Email.eq(email))
        .count(conn)
        .await
}

#[async_trait]
impl UserRepository for SqlUserRepository {
    type Session = SqlSession;

    fn begin(&self) -> SqlSession {
        SqlSession {
            db: self.db.clone(),
            txn: None,
            affected: 0,
        }
    }

    async fn get_all(&self, session: &SqlSession) -> UserResult<Vec<User>> {
        let models = match &session.txn {
            Some(txn) => find_all(txn).await,
            None => find_all(&session.db).await,
        }
        .map_err(map_db_err)?;

        Ok(models.into_iter().map(User::from).collect())
    }

    async fn get_by_id(&self, session: &SqlSession, id: i32) -> UserResult<Option<User>> {
        let model = match &session.txn {
            Some(txn) => find_by_id(txn, id).await,
            None => find_by_id(&session.db, id).await,
        }
        .map_err(map_db_err)?;

        Ok(model.map(User::from))
    }

    async fn get_by_email(&self, session: &SqlSession, email: &str) -> UserResult<Option<User>> {
        let model = match &session.txn {
            Some(txn) => find_by_email(txn, email).await,
            None => find_by_email(&session.db, email).await,
        }
        .map_err(map_db_err)?;

        Ok(model.map(User::from))
    }

    async fn add(&self, session: &mut SqlSession, user: NewUser) -> UserResult<User> {
        let email = user.email.clone();
        let active_model: entity::ActiveModel = user.into();

        let txn = session.txn().await?;
        let model = active_model
            .insert(txn)
            .await
            .map_err(|e| map_write_err(e, &email))?;
        session.affected += 1;

        tracing::info!(user_id = model.id, email = %model.email, "Created user");
        Ok(model.into())
    }

    async fn update(&self, session: &mut SqlSession, user: User) -> UserResult<()> {
        let id = user.id;
        let email = user.email.clone();
        let active_model: entity::ActiveModel = user.into();

        let txn = session.txn().await?;
        active_model.update(txn).await.map_err(|e| match e {
            DbErr::RecordNotUpdated => UserError::NotFound(id),
            e => map_write_err(e, &email),
        })?;
        session.affected += 1;

        tracing::info!(user_id = id, "Updated user");
        Ok(())
    }

    async fn remove(&self, session: &mut SqlSession, id: i32) -> UserResult<()> {
        let txn = session.txn().await?;
        let result = entity::Entity::delete_by_id(id)
            .exec(txn)
            .await
            .map_err(map_db_err)?;

        if result.rows_affected == 0 {
            return Err(UserError::NotFound(id));
        }
        session.affected += result.rows_affected;

        tracing::info!(user_id = id, "Removed user");
        Ok(())
    }

    async fn email_exists(&self, session: &SqlSession, email: &str) -> UserResult<bool> {
        let count = match &session.txn {
            Some(txn) => count_by_email(txn, email).await,
            None => count_by_email(&session.db, email).await,
        }
        .map_err(map_db_err)?;

        Ok(count > 0)
    }

    async fn save_changes(&self, session: SqlSession) -> UserResult<u64> {
        let Some(txn) = session.txn else {
            return Ok(0);
        };

        txn.commit().await.map_err(map_db_err)?;
        tracing::debug!(affected = session.affected, "Committed write transaction");
        Ok(session.affected)
    }
}
