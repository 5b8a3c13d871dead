use actix_web::{delete, get, post, put, web, HttpResponse, Responder};
use serde_json::json;

use crate::{
    auth::{generate_verify_token, hash_password, verify_password, AuthMiddleware, CurrentUser},
    error::AppError,
    messages,
    models::{
        ConfirmQuery, DeleteUserRequest, EmailQuery, NewUser, PasswordRecoveryRequest,
        ProfileUpdate, RegisterRequest, UpdatePasswordRequest, UpdateUserRequest, User,
    },
    state::AppState,
    validation::require,
};

fn message(text: &str) -> HttpResponse {
    HttpResponse::Ok().json(json!({ "message": text }))
}

/// Looks up the user named by `?email=`, failing with 400 when it is absent or unknown.
async fn user_from_query(state: &AppState, query: &EmailQuery) -> Result<User, AppError> {
    let email = query
        .email
        .as_deref()
        .map(str::trim)
        .filter(|email| !email.is_empty())
        .ok_or_else(|| AppError::BadRequest(messages::MISSING_EMAIL.into()))?;

    state
        .users
        .find_by_email(email)
        .await?
        .ok_or_else(|| AppError::BadRequest(messages::USER_INVALID.into()))
}

/// Stores a fresh verify token on `user` and returns the updated copy.
async fn renew_verify_token(state: &AppState, mut user: User) -> Result<User, AppError> {
    let token = generate_verify_token();
    state.users.set_verify_token(user.id, &token).await?;
    user.verify_token = token;
    Ok(user)
}

/// Register a new user
///
/// Creates an inactive account and mails the confirmation link.
#[post("/register")]
pub async fn register(
    state: web::Data<AppState>,
    payload: web::Json<RegisterRequest>,
) -> Result<impl Responder, AppError> {
    payload.check()?;

    if state.users.email_exists(&payload.email).await? {
        return Err(AppError::Conflict(messages::USER_EXISTS.into()));
    }

    let password_hash = hash_password(&payload.password, state.password_cost)?;
    let payload = payload.into_inner();
    let user = state
        .users
        .create(NewUser {
            email: payload.email,
            password_hash,
            firstname: payload.firstname,
            lastname: payload.lastname,
            active: false,
            verify_token: generate_verify_token(),
        })
        .await?;
    log::info!("registered user {}", user.id);

    state.notifier.send_confirmation(&user).await?;

    Ok(HttpResponse::Created().json(json!({ "message": messages::USER_CREATED })))
}

#[get("/confirm")]
pub async fn confirm(
    state: web::Data<AppState>,
    query: web::Query<ConfirmQuery>,
) -> Result<impl Responder, AppError> {
    let email = query.email.as_deref().unwrap_or_default();
    let token = query.token.as_deref().unwrap_or_default();
    require(&[("email", email), ("token", token)])?;

    let user = state
        .users
        .confirm(email, token)
        .await?
        .ok_or_else(|| AppError::BadRequest(messages::CONFIRMATION_INVALID.into()))?;
    log::info!("user {} confirmed", user.id);

    Ok(message(messages::USER_CONFIRMED))
}

#[get("/sendConfirmAgain")]
pub async fn send_confirmation_again(
    state: web::Data<AppState>,
    query: web::Query<EmailQuery>,
) -> Result<impl Responder, AppError> {
    let user = user_from_query(&state, &query).await?;
    if user.active {
        return Err(AppError::BadRequest(messages::USER_ALREADY_CONFIRMED.into()));
    }

    let user = renew_verify_token(&state, user).await?;
    state.notifier.send_confirmation(&user).await?;

    Ok(message(messages::USER_CONFIRMATION_SENT_AGAIN))
}

#[get("/requestPasswordRecovery")]
pub async fn request_password_recovery(
    state: web::Data<AppState>,
    query: web::Query<EmailQuery>,
) -> Result<impl Responder, AppError> {
    let user = user_from_query(&state, &query).await?;
    if !user.active {
        return Err(AppError::BadRequest(messages::USER_NOT_CONFIRMED.into()));
    }

    let user = renew_verify_token(&state, user).await?;
    state.notifier.send_password_recovery(&user).await?;

    Ok(message(messages::PASSWORD_RECOVERY_MAIL_SENT))
}

#[post("/executePasswordRecovery")]
pub async fn execute_password_recovery(
    state: web::Data<AppState>,
    payload: web::Json<PasswordRecoveryRequest>,
) -> Result<impl Responder, AppError> {
    require(&[
        ("email", payload.email.as_str()),
        ("token", payload.token.as_str()),
        ("new_password", payload.new_password.as_str()),
    ])?;

    let password_hash = hash_password(&payload.new_password, state.password_cost)?;
    let user = state
        .users
        .reset_password(&payload.email, &payload.token, &password_hash)
        .await?
        .ok_or_else(|| AppError::BadRequest(messages::PASSWORD_RECOVERY_ERROR.into()))?;
    log::info!("password of user {} reset", user.id);

    Ok(message(messages::PASSWORD_UPDATED))
}

#[post("/updatePassword", wrap = "AuthMiddleware")]
pub async fn update_password(
    state: web::Data<AppState>,
    CurrentUser(user): CurrentUser,
    payload: web::Json<UpdatePasswordRequest>,
) -> Result<impl Responder, AppError> {
    require(&[
        ("old_password", payload.old_password.as_str()),
        ("new_password", payload.new_password.as_str()),
    ])?;

    if !verify_password(&payload.old_password, &user.password)? {
        return Err(AppError::BadRequest(messages::WRONG_PASSWORD.into()));
    }

    let password_hash = hash_password(&payload.new_password, state.password_cost)?;
    state.users.update_password(user.id, &password_hash).await?;

    Ok(message(messages::PASSWORD_UPDATED))
}

#[get("/user", wrap = "AuthMiddleware")]
pub async fn fetch_user(CurrentUser(user): CurrentUser) -> impl Responder {
    HttpResponse::Ok().json(user)
}

/// Updates name and email. A new email deactivates the account until it is confirmed again.
#[put("/updateUser", wrap = "AuthMiddleware")]
pub async fn update_user(
    state: web::Data<AppState>,
    CurrentUser(user): CurrentUser,
    payload: web::Json<UpdateUserRequest>,
) -> Result<impl Responder, AppError> {
    payload.check()?;

    let payload = payload.into_inner();
    let email_change = if payload.email != user.email {
        if state.users.email_exists(&payload.email).await? {
            return Err(AppError::Conflict(messages::USER_EXISTS.into()));
        }
        Some((payload.email, generate_verify_token()))
    } else {
        None
    };
    let email_changed = email_change.is_some();

    let updated = state
        .users
        .update_profile(
            user.id,
            ProfileUpdate {
                firstname: payload.firstname,
                lastname: payload.lastname,
                email_change,
            },
        )
        .await?;

    if email_changed {
        log::info!("user {} changed email, confirmation required", updated.id);
        state.notifier.send_confirmation(&updated).await?;
    }

    Ok(message(messages::USER_UPDATED))
}

/// Soft-deletes the account and its tasks after re-checking the password.
#[delete("/deleteUser", wrap = "AuthMiddleware")]
pub async fn delete_user(
    state: web::Data<AppState>,
    CurrentUser(user): CurrentUser,
    payload: web::Json<DeleteUserRequest>,
) -> Result<impl Responder, AppError> {
    require(&[("password", payload.password.as_str())])?;

    if !verify_password(&payload.password, &user.password)? {
        return Err(AppError::BadRequest(messages::WRONG_PASSWORD.into()));
    }

    state.users.soft_delete(user.id).await?;
    log::info!("user {} deleted", user.id);

    Ok(HttpResponse::Ok().json(json!({
        "message": messages::USER_DELETED,
        "user": user,
    })))
}
