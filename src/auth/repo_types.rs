use thiserror::Error;

use crate::auth::password::HashedPassword;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record not found")]
    NotFound,
    #[error("phone number already registered")]
    Conflict,
    #[error("{0}")]
    Unavailable(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => StoreError::NotFound,
            sqlx::Error::Database(db) if db.is_unique_violation() => StoreError::Conflict,
            _ => StoreError::Unavailable(err.to_string()),
        }
    }
}

/// Input for `UserStore::create`.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub full_name: String,
    pub password_hash: HashedPassword,
    pub phone_number: String,
}

/// What login needs to check a password.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserCredentials {
    pub user_id: i64,
    pub phone_number: String,
    pub password_hash: HashedPassword,
}

/// Public part of the user record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserProfile {
    pub user_id: i64,
    pub phone_number: String,
    pub full_name: String,
}

/// Mutable columns of a user row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub user_id: i64,
    pub full_name: String,
    pub phone_number: String,
    pub password_hash: HashedPassword,
}

impl From<UserRecord> for UserProfile {
    fn from(r: UserRecord) -> Self {
        Self {
            user_id: r.user_id,
            phone_number: r.phone_number,
            full_name: r.full_name,
        }
    }
}

/// Partial update. `None` or an empty string keeps the current value.
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub full_name: Option<String>,
    pub password_hash: Option<HashedPassword>,
    pub phone_number: Option<String>,
}

impl UserChanges {
    pub fn apply_to(self, record: &mut UserRecord) {
        if let Some(name) = self.full_name.filter(|v| !v.is_empty()) {
            record.full_name = name;
        }
        if let Some(hash) = self.password_hash.filter(|v| !v.as_str().is_empty()) {
            record.password_hash = hash;
        }
        if let Some(phone) = self.phone_number.filter(|v| !v.is_empty()) {
            record.phone_number = phone;
        }
    }
}
