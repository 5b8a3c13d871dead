use crate::error::AppError;
use crate::messages;
use chrono::{DateTime, Duration, TimeZone, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// Represents the claims encoded within a bearer token.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Claims {
    /// The acting user's id, the only identity claim.
    pub id: i32,
    /// Expiration timestamp (seconds since epoch).
    pub exp: i64,
    /// When the login or the last refresh happened (seconds since epoch).
    pub orig_iat: i64,
}

/// A freshly signed token and the instant it stops being accepted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssuedToken {
    pub token: String,
    pub expire: DateTime<Utc>,
}

/// Signs, verifies and refreshes HS256 bearer tokens.
///
/// Built once from configuration and shared by every request.
#[derive(Clone)]
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    timeout: Duration,
    max_refresh: Duration,
}

impl TokenIssuer {
    /// # Arguments
    /// * `secret` - HMAC key.
    /// * `timeout` - Lifetime of an issued token.
    /// * `max_refresh` - How long after `orig_iat` a token may still be refreshed.
    pub fn new(secret: &[u8], timeout: Duration, max_refresh: Duration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            timeout,
            max_refresh,
        }
    }

    /// Issues a token for `user_id`, valid for the configured timeout.
    ///
    /// Returns `AppError::InternalServerError` if encoding fails.
    pub fn issue(&self, user_id: i32) -> Result<IssuedToken, AppError> {
        let now = Utc::now();
        let expire = now
            .checked_add_signed(self.timeout)
            .ok_or_else(|| AppError::InternalServerError("Token lifetime out of range".into()))?;
        let claims = Claims {
            id: user_id,
            exp: expire.timestamp(),
            orig_iat: now.timestamp(),
        };

        let token = encode(&Header::default(), &claims, &self.encoding_key).map_err(|e| {
            AppError::InternalServerError(format!("Failed to generate token: {}", e))
        })?;

        Ok(IssuedToken {
            token,
            expire: Utc
                .timestamp_opt(claims.exp, 0)
                .single()
                .unwrap_or(expire),
        })
    }

    /// Verifies signature and expiration and returns the decoded claims.
    ///
    /// Returns `AppError::Unauthorized` if the token is malformed, its signature is invalid,
    /// or it has expired.
    pub fn verify(&self, token: &str) -> Result<Claims, AppError> {
        decode::<Claims>(token, &self.decoding_key, &Validation::default())
            .map(|data| data.claims)
            .map_err(AppError::from)
    }

    /// Exchanges a token for a new one.
    ///
    /// The presented token may already be expired; only its signature and the refresh
    /// window measured from `orig_iat` are checked.
    pub fn refresh(&self, token: &str) -> Result<IssuedToken, AppError> {
        let mut validation = Validation::default();
        validation.validate_exp = false;

        let claims = decode::<Claims>(token, &self.decoding_key, &validation)?.claims;

        let oldest_allowed = Utc::now()
            .checked_sub_signed(self.max_refresh)
            .ok_or_else(|| AppError::InternalServerError("Refresh window out of range".into()))?
            .timestamp();
        if claims.orig_iat < oldest_allowed {
            return Err(AppError::Unauthorized(messages::TOKEN_EXPIRED.into()));
        }

        self.issue(claims.id)
    }
}
