use crate::error::AppError;
use bcrypt::{hash, verify};

pub fn hash_password(password: &str, cost: u32) -> Result<String, AppError> {
    hash(password, cost)
        .map_err(|e| AppError::InternalServerError(format!("Failed to hash password: {}", e)))
}

/// Checks `password` against a stored bcrypt hash.
///
/// An empty hash belongs to an account without a local password and never matches.
pub fn verify_password(password: &str, hashed_password: &str) -> Result<bool, AppError> {
    if hashed_password.is_empty() {
        return Ok(false);
    }
    verify(password, hashed_password)
        .map_err(|e| AppError::InternalServerError(format!("Failed to verify password: {}", e)))
}
