use sea_orm::ActiveValue::{NotSet, Set};
use sea_orm::entity::prelude::*;

use crate::models::{NewUser, User};

/// Sea-ORM Entity for the users table
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    #[sea_orm(unique)]
    pub email: String,
    #[sea_orm(column_type = "Text")]
    pub password: String,
    pub birth_date: Date,
    pub phone: Option<String>,
    pub active: bool,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for User {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            email: model.email,
            password: model.password,
            birth_date: model.birth_date,
            phone: model.phone,
            active: model.active,
            created_at: model.created_at.to_utc(),
            updated_at: model.updated_at.map(|ts| ts.to_utc()),
        }
    }
}

impl From<NewUser> for ActiveModel {
    fn from(input: NewUser) -> Self {
        ActiveModel {
            id: NotSet,
            name: Set(input.name),
            email: Set(input.email),
            password: Set(input.password),
            birth_date: Set(input.birth_date),
            phone: Set(input.phone),
            active: Set(input.active),
            created_at: Set(input.created_at.into()),
            updated_at: Set(None),
        }
    }
}

// Every mutable column is written; `created_at` is left untouched.
impl From<User> for ActiveModel {
    fn from(user: User) -> Self {
        ActiveModel {
            id: Set(user.id),
            name: Set(user.name),
            email: Set(user.email),
            password: Set(user.password),
            birth_date: Set(user.birth_date),
            phone: Set(user.phone),
            active: Set(user.active),
            created_at: NotSet,
            updated_at: Set(user.updated_at.map(Into::into)),
        }
    }
}
