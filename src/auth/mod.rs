pub mod authenticator;
pub mod extractors;
pub mod middleware;
pub mod oauth;
pub mod password;
pub mod token;
pub mod verification;

use serde::{Deserialize, Serialize};

pub use extractors::CurrentUser;
pub use middleware::AuthMiddleware;
pub use password::{hash_password, verify_password};
pub use token::{Claims, IssuedToken, TokenIssuer};
pub use verification::generate_verify_token;

/// Body of an email login.
///
/// Absent fields deserialize as empty strings and are rejected by the authenticator.
#[derive(Debug, Default, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Query string of `POST /v1/login` and of the OAuth callback.
#[derive(Debug, Default, Deserialize)]
pub struct LoginQuery {
    #[serde(rename = "type")]
    pub auth_type: Option<String>,
    pub code: Option<String>,
    pub state: Option<String>,
}

/// How a login request proves the caller's identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthType {
    Email,
    Google,
}

impl LoginQuery {
    pub fn auth_type(&self) -> Result<AuthType, crate::error::AppError> {
        use crate::{error::AppError, messages};

        match self.auth_type.as_deref().map(str::trim) {
            None | Some("") => Err(AppError::Unauthorized(messages::MISSING_AUTH_TYPE.into())),
            Some("email") => Ok(AuthType::Email),
            Some("google") => Ok(AuthType::Google),
            Some(_) => Err(AppError::Unauthorized(messages::INVALID_AUTH_TYPE.into())),
        }
    }
}

/// Response after a successful login or token refresh.
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub expire: chrono::DateTime<chrono::Utc>,
    pub token: String,
}

impl From<IssuedToken> for TokenResponse {
    fn from(issued: IssuedToken) -> Self {
        Self {
            expire: issued.expire,
            token: issued.token,
        }
    }
}
