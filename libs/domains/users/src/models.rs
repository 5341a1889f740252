use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// User entity - matches the `users` table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    /// Assigned by storage, never reused
    pub id: i32,
    pub name: String,
    /// Always stored normalized (see [`normalize_email`])
    pub email: String,
    /// Stored as received
    // TODO: hash with argon2 once clients stop relying on plaintext round-trips
    pub password: String,
    pub birth_date: NaiveDate,
    pub phone: Option<String>,
    /// `false` once soft-deleted
    pub active: bool,
    pub created_at: DateTime<Utc>,
    /// Set on every update or soft delete
    pub updated_at: Option<DateTime<Utc>>,
}

/// A user about to be inserted; storage assigns the id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password: String,
    pub birth_date: NaiveDate,
    pub phone: Option<String>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

impl NewUser {
    pub fn into_user(self, id: i32) -> User {
        User {
            id,
            name: self.name,
            email: self.email,
            password: self.password,
            birth_date: self.birth_date,
            phone: self.phone,
            active: self.active,
            created_at: self.created_at,
            updated_at: None,
        }
    }
}

/// Read projection. The password is never part of it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub birth_date: NaiveDate,
    pub phone: Option<String>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            birth_date: user.birth_date,
            phone: user.phone,
            active: user.active,
            created_at: user.created_at,
        }
    }
}

/// DTO for creating a new user.
///
/// Missing fields deserialize as empty so that the validator, not the JSON
/// extractor, reports them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CreateUser {
    pub name: String,
    pub email: String,
    pub password: String,
    pub birth_date: Option<NaiveDate>,
    pub phone: Option<String>,
}

/// DTO for updating a user. Every mutable field is overwritten.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdateUser {
    pub name: String,
    pub email: String,
    pub birth_date: Option<NaiveDate>,
    pub phone: Option<String>,
    pub active: Option<bool>,
}

/// Trim and lowercase. Idempotent.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_normalize_email_is_idempotent() {
        let once = normalize_email("  Ana@Ex.COM ");
        assert_eq!(once, "ana@ex.com");
        assert_eq!(normalize_email(&once), once);
    }

    #[test]
    fn test_response_omits_password_and_uses_camel_case() {
        let user = NewUser {
            name: "Ana Silva".to_string(),
            email: "ana@ex.com".to_string(),
            password: "secret1".to_string(),
            birth_date: NaiveDate::from_ymd_opt(2000, 1, 1).unwrap(),
            phone: None,
            active: true,
            created_at: Utc::now(),
        }
        .into_user(7);

        let value = serde_json::to_value(UserResponse::from(user)).unwrap();

        assert_eq!(value["id"], 7);
        assert_eq!(value["birthDate"], "2000-01-01");
        assert!(value.get("createdAt").is_some());
        assert!(value.get("password").is_none());
    }

    #[test]
    fn test_create_dto_tolerates_missing_and_unknown_fields() {
        let dto: CreateUser = serde_json::from_value(json!({
            "name": "Ana",
            "birthDate": "1990-05-17",
            "nickname": "ignored"
        }))
        .unwrap();

        assert_eq!(dto.email, "");
        assert_eq!(dto.birth_date, NaiveDate::from_ymd_opt(1990, 5, 17));
        assert!(dto.phone.is_none());
    }
}
