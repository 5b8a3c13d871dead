//!
//! # Custom Error Handling
//!
//! This module defines the custom error type `AppError` used throughout the application.
//! Every handler, repository and auth helper returns it, so a single `ResponseError`
//! implementation decides the HTTP status and the JSON envelope of every failure.
//!
//! Client errors that are about the request itself (400, 403, 500) are reported under an
//! `error` key, while authentication, lookup and conflict outcomes (401, 404, 409) are
//! reported under a `message` key.

use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use serde_json::json;
use thiserror::Error;
use validator::ValidationErrors;

/// Represents all possible errors that can occur while serving a request.
#[derive(Debug, Error)]
pub enum AppError {
    /// Missing or malformed input (HTTP 400).
    #[error("Bad Request: {0}")]
    BadRequest(String),
    /// The caller is not authenticated or presented bad credentials (HTTP 401).
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
    /// The caller is authenticated but may not touch the resource (HTTP 403).
    #[error("Forbidden: {0}")]
    Forbidden(String),
    /// The requested resource does not exist (HTTP 404).
    #[error("Not Found: {0}")]
    NotFound(String),
    /// The request collides with existing state, e.g. a duplicate email (HTTP 409).
    #[error("Conflict: {0}")]
    Conflict(String),
    /// Unexpected server-side failure (HTTP 500).
    #[error("Internal Server Error: {0}")]
    InternalServerError(String),
    /// Failure reported by the database driver (HTTP 500).
    /// The detail is logged but never sent to the client.
    #[error("Database Error: {0}")]
    DatabaseError(String),
    /// The notifier could not deliver a mail (HTTP 500).
    #[error("Mail Error: {0}")]
    MailError(String),
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::InternalServerError(_)
            | AppError::DatabaseError(_)
            | AppError::MailError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let body = match self {
            AppError::Unauthorized(msg) | AppError::NotFound(msg) | AppError::Conflict(msg) => {
                json!({ "message": msg })
            }
            AppError::BadRequest(msg)
            | AppError::Forbidden(msg)
            | AppError::InternalServerError(msg) => json!({ "error": msg }),
            AppError::DatabaseError(detail) => {
                log::error!("database error: {}", detail);
                json!({ "error": "Database error" })
            }
            AppError::MailError(detail) => {
                log::error!("mail delivery failed: {}", detail);
                json!({ "error": crate::messages::MAIL_SEND_FAILED })
            }
        };
        HttpResponse::build(self.status_code()).json(body)
    }
}

/// `RowNotFound` becomes a 404, every other driver error a generic 500.
impl From<sqlx::Error> for AppError {
    fn from(error: sqlx::Error) -> AppError {
        match error {
            sqlx::Error::RowNotFound => AppError::NotFound("Record not found".into()),
            _ => AppError::DatabaseError(error.to_string()),
        }
    }
}

/// Reports the names of the offending fields, sorted, e.g. `Invalid: email`.
impl From<ValidationErrors> for AppError {
    fn from(error: ValidationErrors) -> AppError {
        let mut fields: Vec<&str> = error.field_errors().keys().copied().collect();
        fields.sort_unstable();
        AppError::BadRequest(format!("Invalid: {}", fields.join(", ")))
    }
}

impl From<jsonwebtoken::errors::Error> for AppError {
    fn from(error: jsonwebtoken::errors::Error) -> AppError {
        AppError::Unauthorized(format!("Invalid token: {}", error))
    }
}

impl From<bcrypt::BcryptError> for AppError {
    fn from(error: bcrypt::BcryptError) -> AppError {
        AppError::InternalServerError(error.to_string())
    }
}
