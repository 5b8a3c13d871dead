use async_trait::async_trait;
use sqlx::PgPool;

use super::{TaskRepository, UserRepository};
use crate::error::AppError;
use crate::messages;
use crate::models::{NewUser, ProfileUpdate, Task, TaskInput, User};

const USER_COLUMNS: &str = "id, email, password, firstname, lastname, active, verify_token, \
                            created_at, updated_at, deleted_at";
const TASK_COLUMNS: &str =
    "id, title, description, completed, user_id, created_at, updated_at, deleted_at";

/// Postgres-backed repositories sharing one connection pool.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Maps the live-email unique index violation (SQLSTATE 23505) to a 409.
fn email_conflict(error: sqlx::Error) -> AppError {
    match &error {
        sqlx::Error::Database(db_error) if db_error.code().as_deref() == Some("23505") => {
            AppError::Conflict(messages::USER_EXISTS.into())
        }
        _ => AppError::from(error),
    }
}

#[async_trait]
impl UserRepository for PgStore {
    async fn create(&self, user: NewUser) -> Result<User, AppError> {
        let sql = format!(
            "INSERT INTO users (email, password, firstname, lastname, active, verify_token) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING {}",
            USER_COLUMNS
        );
        sqlx::query_as::<_, User>(&sql)
            .bind(&user.email)
            .bind(&user.password_hash)
            .bind(&user.firstname)
            .bind(&user.lastname)
            .bind(user.active)
            .bind(&user.verify_token)
            .fetch_one(&self.pool)
            .await
            .map_err(email_conflict)
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<User>, AppError> {
        let sql = format!(
            "SELECT {} FROM users WHERE id = $1 AND deleted_at IS NULL",
            USER_COLUMNS
        );
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let sql = format!(
            "SELECT {} FROM users WHERE email = $1 AND deleted_at IS NULL",
            USER_COLUMNS
        );
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn confirm(&self, email: &str, token: &str) -> Result<Option<User>, AppError> {
        let sql = format!(
            "UPDATE users SET active = TRUE, verify_token = '', updated_at = NOW() \
             WHERE email = $1 AND verify_token = $2 AND verify_token <> '' \
             AND deleted_at IS NULL RETURNING {}",
            USER_COLUMNS
        );
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(email)
            .bind(token)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn set_verify_token(&self, id: i32, token: &str) -> Result<(), AppError> {
        let result = sqlx::query(
            "UPDATE users SET verify_token = $2, updated_at = NOW() \
             WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .bind(token)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(messages::USER_INVALID.into()));
        }
        Ok(())
    }

    async fn reset_password(
        &self,
        email: &str,
        token: &str,
        password_hash: &str,
    ) -> Result<Option<User>, AppError> {
        let sql = format!(
            "UPDATE users SET password = $3, verify_token = '', updated_at = NOW() \
             WHERE email = $1 AND verify_token = $2 AND verify_token <> '' \
             AND deleted_at IS NULL RETURNING {}",
            USER_COLUMNS
        );
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(email)
            .bind(token)
            .bind(password_hash)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn update_password(&self, id: i32, password_hash: &str) -> Result<(), AppError> {
        let result = sqlx::query(
            "UPDATE users SET password = $2, updated_at = NOW() \
             WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .bind(password_hash)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(messages::USER_INVALID.into()));
        }
        Ok(())
    }

    async fn update_profile(&self, id: i32, update: ProfileUpdate) -> Result<User, AppError> {
        let user = match update.email_change {
            Some((email, token)) => {
                let sql = format!(
                    "UPDATE users SET firstname = $2, lastname = $3, email = $4, \
                     active = FALSE, verify_token = $5, updated_at = NOW() \
                     WHERE id = $1 AND deleted_at IS NULL RETURNING {}",
                    USER_COLUMNS
                );
                sqlx::query_as::<_, User>(&sql)
                    .bind(id)
                    .bind(&update.firstname)
                    .bind(&update.lastname)
                    .bind(&email)
                    .bind(&token)
                    .fetch_optional(&self.pool)
                    .await
                    .map_err(email_conflict)?
            }
            None => {
                let sql = format!(
                    "UPDATE users SET firstname = $2, lastname = $3, updated_at = NOW() \
                     WHERE id = $1 AND deleted_at IS NULL RETURNING {}",
                    USER_COLUMNS
                );
                sqlx::query_as::<_, User>(&sql)
                    .bind(id)
                    .bind(&update.firstname)
                    .bind(&update.lastname)
                    .fetch_optional(&self.pool)
                    .await?
            }
        };

        user.ok_or_else(|| AppError::NotFound(messages::USER_INVALID.into()))
    }

    async fn soft_delete(&self, id: i32) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            "UPDATE users SET deleted_at = NOW() WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(messages::USER_INVALID.into()));
        }

        sqlx::query(
            "UPDATE tasks SET deleted_at = NOW() WHERE user_id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }
}

#[async_trait]
impl TaskRepository for PgStore {
    async fn create(&self, user_id: i32, input: &TaskInput) -> Result<Task, AppError> {
        let sql = format!(
            "INSERT INTO tasks (title, description, completed, user_id) \
             VALUES ($1, $2, $3, $4) RETURNING {}",
            TASK_COLUMNS
        );
        let task = sqlx::query_as::<_, Task>(&sql)
            .bind(&input.title)
            .bind(&input.description)
            .bind(input.completed)
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(task)
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<Task>, AppError> {
        let sql = format!(
            "SELECT {} FROM tasks WHERE id = $1 AND deleted_at IS NULL",
            TASK_COLUMNS
        );
        let task = sqlx::query_as::<_, Task>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(task)
    }

    async fn list_by_user(&self, user_id: i32) -> Result<Vec<Task>, AppError> {
        let sql = format!(
            "SELECT {} FROM tasks WHERE user_id = $1 AND deleted_at IS NULL \
             ORDER BY created_at DESC, id DESC",
            TASK_COLUMNS
        );
        let tasks = sqlx::query_as::<_, Task>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(tasks)
    }

    async fn update(&self, id: i32, input: &TaskInput) -> Result<Task, AppError> {
        let sql = format!(
            "UPDATE tasks SET title = $2, description = $3, completed = $4, updated_at = NOW() \
             WHERE id = $1 AND deleted_at IS NULL RETURNING {}",
            TASK_COLUMNS
        );
        sqlx::query_as::<_, Task>(&sql)
            .bind(id)
            .bind(&input.title)
            .bind(&input.description)
            .bind(input.completed)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(messages::TASK_NOT_FOUND.into()))
    }

    async fn soft_delete(&self, id: i32) -> Result<Task, AppError> {
        let sql = format!(
            "UPDATE tasks SET deleted_at = NOW() WHERE id = $1 AND deleted_at IS NULL \
             RETURNING {}",
            TASK_COLUMNS
        );
        sqlx::query_as::<_, Task>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(messages::TASK_NOT_FOUND.into()))
    }
}
