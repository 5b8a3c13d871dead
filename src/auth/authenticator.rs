//! Resolves login attempts to users.

use crate::auth::oauth::{OAuthClient, OAuthUser};
use crate::auth::password::verify_password;
use crate::db::UserRepository;
use crate::error::AppError;
use crate::messages;
use crate::models::{NewUser, User};

fn failed() -> AppError {
    AppError::Unauthorized(messages::FAILED_AUTHENTICATION.into())
}

/// Checks email and password in order: the user must exist, be active, and the password must
/// match the stored hash. A pending verify token is cleared on success.
///
/// Accounts provisioned through OAuth have no local password and can never log in here.
pub async fn authenticate_email(
    users: &dyn UserRepository,
    email: &str,
    password: &str,
) -> Result<User, AppError> {
    let email = email.trim();
    if email.is_empty() || password.is_empty() {
        return Err(AppError::Unauthorized(messages::MISSING_LOGIN_VALUES.into()));
    }

    let mut user = match users.find_by_email(email).await? {
        Some(user) => user,
        None => {
            log::warn!("login failed: unknown email {}", email);
            return Err(failed());
        }
    };

    if !user.active {
        return Err(AppError::Unauthorized(messages::USER_NOT_CONFIRMED.into()));
    }

    if !verify_password(password, &user.password)? {
        log::warn!("login failed: wrong password for user {}", user.id);
        return Err(failed());
    }

    if !user.verify_token.is_empty() {
        users.set_verify_token(user.id, "").await?;
        user.verify_token.clear();
    }

    Ok(user)
}

/// Exchanges an OAuth authorization code and resolves the provider profile to a user.
pub async fn authenticate_oauth(
    users: &dyn UserRepository,
    oauth: &OAuthClient,
    code: &str,
) -> Result<User, AppError> {
    if code.trim().is_empty() {
        return Err(AppError::Unauthorized(messages::MISSING_LOGIN_VALUES.into()));
    }

    let profile = oauth.exchange_code(code).await?;
    let user = provision_oauth_user(users, profile).await?;

    if !user.active {
        return Err(AppError::Unauthorized(messages::USER_NOT_CONFIRMED.into()));
    }
    Ok(user)
}

/// Returns the live user with the profile's email, creating an active one without a local
/// password when none exists.
///
/// Only an email the provider has verified is trusted: an unverified profile neither resolves
/// to an existing account nor reserves the address.
pub async fn provision_oauth_user(
    users: &dyn UserRepository,
    profile: OAuthUser,
) -> Result<User, AppError> {
    let email = profile.email.trim().to_string();
    if email.is_empty() {
        return Err(failed());
    }
    if !profile.email_verified {
        log::warn!("OAuth login rejected: provider did not verify {}", email);
        return Err(failed());
    }

    if let Some(user) = users.find_by_email(&email).await? {
        return Ok(user);
    }

    let user = users
        .create(NewUser {
            email,
            password_hash: String::new(),
            firstname: profile.given_name,
            lastname: profile.family_name,
            active: true,
            verify_token: String::new(),
        })
        .await?;
    log::info!("provisioned user {} from OAuth profile", user.id);
    Ok(user)
}
