use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use crate::error::AppError;
use crate::validation::require;

/// A user row as stored in the `users` table.
///
/// The password hash and the pending verify token are never serialized.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct User {
    pub id: i32,
    pub email: String,
    /// bcrypt hash; empty for accounts provisioned through OAuth.
    #[serde(skip_serializing)]
    pub password: String,
    pub firstname: String,
    pub lastname: String,
    pub active: bool,
    /// Single-use token proving control of `email`; empty when nothing is pending.
    #[serde(skip_serializing)]
    pub verify_token: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl User {
    pub fn has_local_password(&self) -> bool {
        !self.password.is_empty()
    }
}

/// Values for a user insert.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub firstname: String,
    pub lastname: String,
    pub active: bool,
    pub verify_token: String,
}

/// Changes applied by a profile update.
#[derive(Debug, Clone)]
pub struct ProfileUpdate {
    pub firstname: String,
    pub lastname: String,
    /// New address together with the verify token that must confirm it.
    pub email_change: Option<(String, String)>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[serde(default)]
    #[validate(email)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub firstname: String,
    #[serde(default)]
    pub lastname: String,
}

impl RegisterRequest {
    pub fn check(&self) -> Result<(), AppError> {
        require(&[
            ("email", self.email.as_str()),
            ("password", self.password.as_str()),
            ("firstname", self.firstname.as_str()),
            ("lastname", self.lastname.as_str()),
        ])?;
        self.validate()?;
        Ok(())
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateUserRequest {
    #[serde(default)]
    #[validate(email)]
    pub email: String,
    #[serde(default)]
    pub firstname: String,
    #[serde(default)]
    pub lastname: String,
}

impl UpdateUserRequest {
    pub fn check(&self) -> Result<(), AppError> {
        require(&[
            ("email", self.email.as_str()),
            ("firstname", self.firstname.as_str()),
            ("lastname", self.lastname.as_str()),
        ])?;
        self.validate()?;
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdatePasswordRequest {
    #[serde(default)]
    pub old_password: String,
    #[serde(default)]
    pub new_password: String,
}

#[derive(Debug, Deserialize)]
pub struct PasswordRecoveryRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub token: String,
    #[serde(default)]
    pub new_password: String,
}

#[derive(Debug, Deserialize)]
pub struct DeleteUserRequest {
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct EmailQuery {
    pub email: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ConfirmQuery {
    pub email: Option<String>,
    pub token: Option<String>,
}
