//! Google OAuth 2.0 authorization-code flow.

use std::fs;
use std::path::Path;

use serde::Deserialize;
use subtle::ConstantTimeEq;
use url::Url;

use crate::auth::verification::generate_verify_token;
use crate::error::AppError;
use crate::messages;

const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/auth";
const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const GOOGLE_USERINFO_URL: &str = "https://www.googleapis.com/oauth2/v3/userinfo";
const GOOGLE_SCOPES: [&str; 2] = [
    "https://www.googleapis.com/auth/userinfo.email",
    "https://www.googleapis.com/auth/userinfo.profile",
];

/// Contents of the client credentials file.
#[derive(Debug, Clone, Deserialize)]
pub struct Credentials {
    pub cid: String,
    pub csecret: String,
}

/// Immutable provider settings, built once at startup.
#[derive(Debug, Clone)]
pub struct OAuthConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_url: String,
    pub auth_url: String,
    pub token_url: String,
    pub userinfo_url: String,
    pub scopes: Vec<String>,
}

impl OAuthConfig {
    /// Google endpoints, redirecting back to `{public_url}auth/oauth`.
    pub fn google(credentials: Credentials, public_url: &str) -> Self {
        Self {
            client_id: credentials.cid,
            client_secret: credentials.csecret,
            redirect_url: format!("{}auth/oauth", public_url),
            auth_url: GOOGLE_AUTH_URL.to_string(),
            token_url: GOOGLE_TOKEN_URL.to_string(),
            userinfo_url: GOOGLE_USERINFO_URL.to_string(),
            scopes: GOOGLE_SCOPES.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn from_credentials_file(
        path: impl AsRef<Path>,
        public_url: &str,
    ) -> Result<Self, AppError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|e| {
            AppError::InternalServerError(format!(
                "Failed to read OAuth credentials {}: {}",
                path.display(),
                e
            ))
        })?;
        let credentials: Credentials = serde_json::from_str(&raw).map_err(|e| {
            AppError::InternalServerError(format!("Invalid OAuth credentials file: {}", e))
        })?;
        Ok(Self::google(credentials, public_url))
    }

    /// The consent page URL carrying `state`.
    pub fn authorize_url(&self, state: &str) -> Result<String, AppError> {
        let mut url = Url::parse(&self.auth_url)
            .map_err(|e| AppError::InternalServerError(format!("Invalid OAuth URL: {}", e)))?;
        url.query_pairs_mut()
            .append_pair("client_id", &self.client_id)
            .append_pair("redirect_uri", &self.redirect_url)
            .append_pair("response_type", "code")
            .append_pair("scope", &self.scopes.join(" "))
            .append_pair("state", state);
        Ok(url.to_string())
    }
}

/// Profile returned by the provider's userinfo endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct OAuthUser {
    pub sub: String,
    pub name: String,
    pub given_name: String,
    pub family_name: String,
    pub picture: String,
    pub email: String,
    pub email_verified: bool,
    pub locale: String,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

pub struct OAuthClient {
    config: OAuthConfig,
    http: reqwest::Client,
    state: String,
}

impl OAuthClient {
    /// Creates a client with a random per-process `state` value.
    pub fn new(config: OAuthConfig) -> Self {
        Self::with_state(config, generate_verify_token())
    }

    pub fn with_state(config: OAuthConfig, state: String) -> Self {
        Self {
            config,
            http: reqwest::Client::new(),
            state,
        }
    }

    pub fn consent_url(&self) -> Result<String, AppError> {
        self.config.authorize_url(&self.state)
    }

    pub fn state_matches(&self, state: &str) -> bool {
        !state.is_empty() && bool::from(state.as_bytes().ct_eq(self.state.as_bytes()))
    }

    /// Trades an authorization code for the user's profile.
    ///
    /// Any provider failure is reported as `AppError::Unauthorized`.
    pub async fn exchange_code(&self, code: &str) -> Result<OAuthUser, AppError> {
        let response = self
            .http
            .post(&self.config.token_url)
            .form(&[
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
                ("redirect_uri", self.config.redirect_url.as_str()),
                ("code", code),
                ("grant_type", "authorization_code"),
            ])
            .send()
            .await
            .map_err(|e| provider_error("token exchange", e))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            log::warn!("OAuth token exchange failed: {} {}", status, body);
            return Err(AppError::Unauthorized(messages::FAILED_AUTHENTICATION.into()));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| provider_error("token response", e))?;

        let response = self
            .http
            .get(&self.config.userinfo_url)
            .bearer_auth(&token.access_token)
            .send()
            .await
            .map_err(|e| provider_error("userinfo request", e))?;

        if !response.status().is_success() {
            log::warn!("OAuth userinfo request failed: {}", response.status());
            return Err(AppError::Unauthorized(messages::FAILED_AUTHENTICATION.into()));
        }

        response
            .json::<OAuthUser>()
            .await
            .map_err(|e| provider_error("userinfo response", e))
    }
}

fn provider_error(step: &str, error: reqwest::Error) -> AppError {
    log::warn!("OAuth {} failed: {}", step, error);
    AppError::Unauthorized(messages::FAILED_AUTHENTICATION.into())
}
