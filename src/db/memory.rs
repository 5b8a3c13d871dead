use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;

use super::{TaskRepository, UserRepository};
use crate::error::AppError;
use crate::messages;
use crate::models::{NewUser, ProfileUpdate, Task, TaskInput, User};

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    tasks: Vec<Task>,
    next_user_id: i32,
    next_task_id: i32,
}

impl Tables {
    fn live_user_mut(&mut self, id: i32) -> Option<&mut User> {
        self.users
            .iter_mut()
            .find(|u| u.id == id && u.deleted_at.is_none())
    }

    fn live_email_taken(&self, email: &str, except_id: Option<i32>) -> bool {
        self.users.iter().any(|u| {
            u.email == email && u.deleted_at.is_none() && Some(u.id) != except_id
        })
    }

    fn user_by_token_mut(&mut self, email: &str, token: &str) -> Option<&mut User> {
        if token.is_empty() {
            return None;
        }
        self.users.iter_mut().find(|u| {
            u.email == email && u.verify_token == token && u.deleted_at.is_none()
        })
    }

    fn live_task_mut(&mut self, id: i32) -> Option<&mut Task> {
        self.tasks
            .iter_mut()
            .find(|t| t.id == id && t.deleted_at.is_none())
    }
}

/// In-process repositories with the same uniqueness and soft-delete rules as `PgStore`.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> Result<MutexGuard<'_, Tables>, AppError> {
        self.tables
            .lock()
            .map_err(|_| AppError::InternalServerError("memory store lock poisoned".into()))
    }

    /// Number of user rows ever inserted, soft-deleted ones included.
    pub fn user_count(&self) -> usize {
        self.tables().map(|t| t.users.len()).unwrap_or(0)
    }

    /// Looks a user up by id regardless of soft deletion.
    pub fn raw_user(&self, id: i32) -> Option<User> {
        self.tables()
            .ok()
            .and_then(|t| t.users.iter().find(|u| u.id == id).cloned())
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn create(&self, user: NewUser) -> Result<User, AppError> {
        let mut tables = self.tables()?;
        if tables.live_email_taken(&user.email, None) {
            return Err(AppError::Conflict(messages::USER_EXISTS.into()));
        }

        tables.next_user_id += 1;
        let now = Utc::now();
        let row = User {
            id: tables.next_user_id,
            email: user.email,
            password: user.password_hash,
            firstname: user.firstname,
            lastname: user.lastname,
            active: user.active,
            verify_token: user.verify_token,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        tables.users.push(row.clone());
        Ok(row)
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<User>, AppError> {
        Ok(self.tables()?.live_user_mut(id).map(|u| u.clone()))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let tables = self.tables()?;
        Ok(tables
            .users
            .iter()
            .find(|u| u.email == email && u.deleted_at.is_none())
            .cloned())
    }

    async fn confirm(&self, email: &str, token: &str) -> Result<Option<User>, AppError> {
        let mut tables = self.tables()?;
        Ok(tables.user_by_token_mut(email, token).map(|user| {
            user.active = true;
            user.verify_token.clear();
            user.updated_at = Utc::now();
            user.clone()
        }))
    }

    async fn set_verify_token(&self, id: i32, token: &str) -> Result<(), AppError> {
        let mut tables = self.tables()?;
        let user = tables
            .live_user_mut(id)
            .ok_or_else(|| AppError::NotFound(messages::USER_INVALID.into()))?;
        user.verify_token = token.to_string();
        user.updated_at = Utc::now();
        Ok(())
    }

    async fn reset_password(
        &self,
        email: &str,
        token: &str,
        password_hash: &str,
    ) -> Result<Option<User>, AppError> {
        let mut tables = self.tables()?;
        Ok(tables.user_by_token_mut(email, token).map(|user| {
            user.password = password_hash.to_string();
            user.verify_token.clear();
            user.updated_at = Utc::now();
            user.clone()
        }))
    }

    async fn update_password(&self, id: i32, password_hash: &str) -> Result<(), AppError> {
        let mut tables = self.tables()?;
        let user = tables
            .live_user_mut(id)
            .ok_or_else(|| AppError::NotFound(messages::USER_INVALID.into()))?;
        user.password = password_hash.to_string();
        user.updated_at = Utc::now();
        Ok(())
    }

    async fn update_profile(&self, id: i32, update: ProfileUpdate) -> Result<User, AppError> {
        let mut tables = self.tables()?;
        if let Some((email, _)) = &update.email_change {
            if tables.live_email_taken(email, Some(id)) {
                return Err(AppError::Conflict(messages::USER_EXISTS.into()));
            }
        }

        let user = tables
            .live_user_mut(id)
            .ok_or_else(|| AppError::NotFound(messages::USER_INVALID.into()))?;
        user.firstname = update.firstname;
        user.lastname = update.lastname;
        if let Some((email, token)) = update.email_change {
            user.email = email;
            user.active = false;
            user.verify_token = token;
        }
        user.updated_at = Utc::now();
        Ok(user.clone())
    }

    async fn soft_delete(&self, id: i32) -> Result<(), AppError> {
        let mut tables = self.tables()?;
        let now = Utc::now();
        let user = tables
            .live_user_mut(id)
            .ok_or_else(|| AppError::NotFound(messages::USER_INVALID.into()))?;
        user.deleted_at = Some(now);

        for task in tables
            .tasks
            .iter_mut()
            .filter(|t| t.user_id == id && t.deleted_at.is_none())
        {
            task.deleted_at = Some(now);
        }
        Ok(())
    }
}

#[async_trait]
impl TaskRepository for MemoryStore {
    async fn create(&self, user_id: i32, input: &TaskInput) -> Result<Task, AppError> {
        let mut tables = self.tables()?;
        tables.next_task_id += 1;
        let now = Utc::now();
        let task = Task {
            id: tables.next_task_id,
            title: input.title.clone(),
            description: input.description.clone(),
            completed: input.completed,
            user_id,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        tables.tasks.push(task.clone());
        Ok(task)
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<Task>, AppError> {
        Ok(self.tables()?.live_task_mut(id).map(|t| t.clone()))
    }

    async fn list_by_user(&self, user_id: i32) -> Result<Vec<Task>, AppError> {
        let tables = self.tables()?;
        let mut tasks: Vec<Task> = tables
            .tasks
            .iter()
            .filter(|t| t.user_id == user_id && t.deleted_at.is_none())
            .cloned()
            .collect();
        tasks.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(tasks)
    }

    async fn update(&self, id: i32, input: &TaskInput) -> Result<Task, AppError> {
        let mut tables = self.tables()?;
        let task = tables
            .live_task_mut(id)
            .ok_or_else(|| AppError::NotFound(messages::TASK_NOT_FOUND.into()))?;
        task.title = input.title.clone();
        task.description = input.description.clone();
        task.completed = input.completed;
        task.updated_at = Utc::now();
        Ok(task.clone())
    }

    async fn soft_delete(&self, id: i32) -> Result<Task, AppError> {
        let mut tables = self.tables()?;
        let task = tables
            .live_task_mut(id)
            .ok_or_else(|| AppError::NotFound(messages::TASK_NOT_FOUND.into()))?;
        task.deleted_at = Some(Utc::now());
        Ok(task.clone())
    }
}
