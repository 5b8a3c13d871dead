use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use crate::error::AppError;
use crate::validation::require;

/// Input structure for creating or updating a task.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct TaskInput {
    /// Required, at most 200 characters.
    #[serde(default)]
    #[validate(length(max = 200))]
    pub title: String,

    /// At most 1000 characters.
    #[serde(default)]
    #[validate(length(max = 1000))]
    pub description: String,

    #[serde(default)]
    pub completed: bool,
}

impl TaskInput {
    pub fn check(&self) -> Result<(), AppError> {
        require(&[("title", self.title.as_str())])?;
        self.validate()?;
        Ok(())
    }
}

/// Represents a task as stored in the `tasks` table and returned by the API.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Task {
    pub id: i32,
    pub title: String,
    pub description: String,
    pub completed: bool,
    /// Owner of the task.
    #[serde(rename = "userid")]
    pub user_id: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Task {
    pub fn is_owned_by(&self, user_id: i32) -> bool {
        self.user_id == user_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(title: &str, description: &str) -> TaskInput {
        TaskInput {
            title: title.to_string(),
            description: description.to_string(),
            completed: false,
        }
    }

    #[test]
    fn test_task_input_check() {
        assert!(input("Buy milk", "").check().is_ok());

        match input("", "Test Description").check() {
            Err(AppError::BadRequest(msg)) => assert_eq!(msg, "Missing: title"),
            other => panic!("unexpected result: {:?}", other),
        }

        assert!(input(&"a".repeat(201), "").check().is_err());
        assert!(input("Valid title", &"b".repeat(1001)).check().is_err());
    }

    #[test]
    fn test_task_serializes_owner_as_userid() {
        let now = Utc::now();
        let task = Task {
            id: 7,
            title: "Test Task".into(),
            description: String::new(),
            completed: false,
            user_id: 3,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        let json = serde_json::to_value(&task).unwrap();
        assert_eq!(json["userid"], 3);
        assert!(json.get("user_id").is_none());
        assert!(task.is_owned_by(3));
        assert!(!task.is_owned_by(4));
    }
}
