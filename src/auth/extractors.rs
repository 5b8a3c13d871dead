use actix_web::dev::Payload;
use actix_web::{web, Error as ActixError, FromRequest, HttpMessage, HttpRequest};
use futures::future::LocalBoxFuture;

use crate::auth::token::Claims;
use crate::error::AppError;
use crate::messages;
use crate::models::User;
use crate::state::AppState;

/// The live, active user behind the bearer token.
///
/// Requires `AuthMiddleware` to have stored the token's `Claims`; without them the request
/// is rejected with 401. A user that no longer exists or is not active yields 403.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

impl FromRequest for CurrentUser {
    type Error = ActixError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let claims = req.extensions().get::<Claims>().cloned();
        let state = req.app_data::<web::Data<AppState>>().cloned();

        Box::pin(async move {
            let claims = claims.ok_or_else(|| {
                AppError::Unauthorized(messages::MISSING_TOKEN.to_string())
            })?;
            let state = state.ok_or_else(|| {
                AppError::InternalServerError("application state is not configured".into())
            })?;

            match state.users.find_by_id(claims.id).await? {
                Some(user) if user.active => Ok(CurrentUser(user)),
                _ => Err(AppError::Forbidden(messages::PERMISSION_DENIED.into()).into()),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::oauth::OAuthClient;
    use crate::auth::token::TokenIssuer;
    use crate::db::{MemoryStore, UserRepository};
    use crate::mail::{LogNotifier, MailTemplates};
    use crate::models::NewUser;
    use actix_web::http::StatusCode;
    use actix_web::test;
    use std::sync::Arc;

    fn state(store: Arc<MemoryStore>) -> web::Data<AppState> {
        web::Data::new(AppState {
            users: store.clone(),
            tasks: store,
            notifier: Arc::new(LogNotifier::new(
                MailTemplates::new("http://localhost:8080/").unwrap(),
            )),
            tokens: TokenIssuer::new(
                b"secret",
                chrono::Duration::hours(1),
                chrono::Duration::hours(1),
            ),
            oauth: None::<Arc<OAuthClient>>,
            password_cost: 4,
        })
    }

    async fn user(store: &MemoryStore, email: &str, active: bool) -> User {
        UserRepository::create(
            store,
            NewUser {
                email: email.into(),
                password_hash: String::new(),
                firstname: "Ada".into(),
                lastname: "Lovelace".into(),
                active,
                verify_token: String::new(),
            },
        )
        .await
        .unwrap()
    }

    fn claims(id: i32) -> Claims {
        Claims {
            id,
            exp: 0,
            orig_iat: 0,
        }
    }

    #[actix_rt::test]
    async fn test_current_user_extractor_success() {
        let store = Arc::new(MemoryStore::new());
        let active = user(&store, "a@b.ch", true).await;

        let req = test::TestRequest::default()
            .app_data(state(store))
            .to_http_request();
        req.extensions_mut().insert(claims(active.id));

        let mut payload = Payload::None;
        let current = CurrentUser::from_request(&req, &mut payload).await.unwrap();
        assert_eq!(current.0.id, active.id);
    }

    #[actix_rt::test]
    async fn test_current_user_extractor_without_claims() {
        let store = Arc::new(MemoryStore::new());
        let req = test::TestRequest::default()
            .app_data(state(store))
            .to_http_request();

        let mut payload = Payload::None;
        let err = CurrentUser::from_request(&req, &mut payload)
            .await
            .unwrap_err();
        assert_eq!(err.error_response().status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_rt::test]
    async fn test_current_user_extractor_rejects_inactive_and_deleted() {
        let store = Arc::new(MemoryStore::new());
        let inactive = user(&store, "inactive@b.ch", false).await;
        let deleted = user(&store, "deleted@b.ch", true).await;
        UserRepository::soft_delete(&*store, deleted.id).await.unwrap();

        for id in [inactive.id, deleted.id, 999] {
            let req = test::TestRequest::default()
                .app_data(state(store.clone()))
                .to_http_request();
            req.extensions_mut().insert(claims(id));

            let mut payload = Payload::None;
            let err = CurrentUser::from_request(&req, &mut payload)
                .await
                .unwrap_err();
            assert_eq!(err.error_response().status(), StatusCode::FORBIDDEN);
        }
    }
}
