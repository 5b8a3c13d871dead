use actix_web::{get, post, web, HttpRequest, HttpResponse, Responder};
use serde_json::json;

use crate::{
    auth::{
        authenticator::{authenticate_email, authenticate_oauth},
        middleware::bearer_token,
        oauth::OAuthClient,
        AuthType, LoginQuery, LoginRequest, TokenResponse,
    },
    error::AppError,
    messages,
    models::User,
    state::AppState,
};

fn oauth_client(state: &AppState) -> Result<&OAuthClient, AppError> {
    state
        .oauth
        .as_deref()
        .ok_or_else(|| AppError::Unauthorized(messages::OAUTH_DISABLED.into()))
}

fn token_response(state: &AppState, user: &User) -> Result<HttpResponse, AppError> {
    let issued = state.tokens.issue(user.id)?;
    Ok(HttpResponse::Ok().json(TokenResponse::from(issued)))
}

/// Login user
///
/// `?type=email` reads `{email, password}` from the body, `?type=google` exchanges the
/// `code` query parameter at the OAuth provider. Responds with `{expire, token}`.
#[post("/login")]
pub async fn login(
    state: web::Data<AppState>,
    query: web::Query<LoginQuery>,
    body: web::Bytes,
) -> Result<impl Responder, AppError> {
    let user = match query.auth_type()? {
        AuthType::Email => {
            let credentials: LoginRequest = serde_json::from_slice(&body)
                .map_err(|_| AppError::Unauthorized(messages::MISSING_LOGIN_VALUES.into()))?;
            authenticate_email(
                state.users.as_ref(),
                &credentials.email,
                &credentials.password,
            )
            .await?
        }
        AuthType::Google => {
            let oauth = oauth_client(&state)?;
            let code = query.code.as_deref().unwrap_or_default();
            authenticate_oauth(state.users.as_ref(), oauth, code).await?
        }
    };

    log::info!("user {} logged in", user.id);
    token_response(&state, &user)
}

/// Tokens are stateless, so logging out only acknowledges the request.
#[post("/logout")]
pub async fn logout() -> impl Responder {
    HttpResponse::Ok().json(json!({ "code": 200 }))
}

/// Issues a new token for a valid, possibly expired, token still inside the refresh window.
#[get("/refresh_token")]
pub async fn refresh_token(
    state: web::Data<AppState>,
    req: HttpRequest,
) -> Result<impl Responder, AppError> {
    let token = bearer_token(req.headers(), req.query_string())
        .ok_or_else(|| AppError::Unauthorized(messages::MISSING_TOKEN.into()))?;
    let issued = state.tokens.refresh(&token)?;
    Ok(HttpResponse::Ok().json(TokenResponse::from(issued)))
}

/// Provider consent page to which the client should redirect the user.
#[get("/oauth/url")]
pub async fn oauth_url(state: web::Data<AppState>) -> Result<impl Responder, AppError> {
    let oauth = state
        .oauth
        .as_deref()
        .ok_or_else(|| AppError::NotFound(messages::OAUTH_DISABLED.into()))?;
    Ok(HttpResponse::Ok().json(json!({ "url": oauth.consent_url()? })))
}

/// Redirect target of the OAuth provider.
#[get("/oauth")]
pub async fn oauth_callback(
    state: web::Data<AppState>,
    query: web::Query<LoginQuery>,
) -> Result<impl Responder, AppError> {
    let oauth = oauth_client(&state)?;
    if !oauth.state_matches(query.state.as_deref().unwrap_or_default()) {
        log::warn!("OAuth callback with mismatching state");
        return Err(AppError::Unauthorized(messages::OAUTH_STATE_MISMATCH.into()));
    }

    let code = query.code.as_deref().unwrap_or_default();
    let user = authenticate_oauth(state.users.as_ref(), oauth, code).await?;

    log::info!("user {} logged in through OAuth", user.id);
    token_response(&state, &user)
}
