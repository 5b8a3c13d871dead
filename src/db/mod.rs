//! Persistence behind two repository traits.
//!
//! Handlers only see `UserRepository` and `TaskRepository`; `PgStore` implements them on
//! Postgres and `MemoryStore` implements them in process for tests. Both exclude
//! soft-deleted rows from every read and reject a second live user with the same email
//! by returning `AppError::Conflict`.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};

use crate::config::Config;
use crate::error::AppError;
use crate::models::{NewUser, ProfileUpdate, Task, TaskInput, User};

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Inserts a user; a duplicate live email yields `AppError::Conflict`.
    async fn create(&self, user: NewUser) -> Result<User, AppError>;

    async fn find_by_id(&self, id: i32) -> Result<Option<User>, AppError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError>;

    async fn email_exists(&self, email: &str) -> Result<bool, AppError> {
        Ok(self.find_by_email(email).await?.is_some())
    }

    /// Activates the user holding this email + verify token pair and clears the token.
    ///
    /// Returns `None` when the pair does not match; an empty token never matches.
    async fn confirm(&self, email: &str, token: &str) -> Result<Option<User>, AppError>;

    async fn set_verify_token(&self, id: i32, token: &str) -> Result<(), AppError>;

    /// Replaces the password hash of the user holding this email + verify token pair and
    /// clears the token. Same matching rules as `confirm`.
    async fn reset_password(
        &self,
        email: &str,
        token: &str,
        password_hash: &str,
    ) -> Result<Option<User>, AppError>;

    async fn update_password(&self, id: i32, password_hash: &str) -> Result<(), AppError>;

    /// Applies a profile update. Changing the email deactivates the account and stores the
    /// new verify token; a duplicate email yields `AppError::Conflict`.
    async fn update_profile(&self, id: i32, update: ProfileUpdate) -> Result<User, AppError>;

    /// Soft-deletes the user together with their tasks.
    async fn soft_delete(&self, id: i32) -> Result<(), AppError>;
}

#[async_trait]
pub trait TaskRepository: Send + Sync {
    async fn create(&self, user_id: i32, input: &TaskInput) -> Result<Task, AppError>;

    async fn find_by_id(&self, id: i32) -> Result<Option<Task>, AppError>;

    /// Every live task of the user, newest first.
    async fn list_by_user(&self, user_id: i32) -> Result<Vec<Task>, AppError>;

    async fn update(&self, id: i32, input: &TaskInput) -> Result<Task, AppError>;

    async fn soft_delete(&self, id: i32) -> Result<Task, AppError>;
}

/// Opens the connection pool described by the configuration.
pub async fn connect(config: &Config) -> Result<PgPool, AppError> {
    let options = config
        .database
        .connect_options()
        .map_err(|e| AppError::InternalServerError(e.to_string()))?;

    let pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .connect_with(options)
        .await?;

    Ok(pool)
}

/// Applies the embedded `migrations/` directory.
pub async fn migrate(pool: &PgPool) -> Result<(), AppError> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Migration failed: {}", e)))?;
    log::info!("database migrations applied");
    Ok(())
}
