#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use actix_web::body::{to_bytes, MessageBody};
use actix_web::dev::{Service, ServiceResponse};
use actix_web::http::StatusCode;
use actix_web::{test, web};
use async_trait::async_trait;
use chrono::Duration;
use serde_json::{json, Value};

use todo_api::auth::oauth::OAuthClient;
use todo_api::auth::{hash_password, TokenIssuer};
use todo_api::db::{MemoryStore, UserRepository};
use todo_api::mail::Notifier;
use todo_api::models::{NewUser, User};
use todo_api::{AppError, AppState};

pub const PASSWORD: &str = "Password123!";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MailKind {
    Confirmation,
    PasswordRecovery,
}

#[derive(Debug, Clone)]
pub struct SentMail {
    pub kind: MailKind,
    pub email: String,
    pub token: String,
}

/// Keeps every mail instead of sending it; can be switched to fail every delivery.
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<SentMail>>,
    failing: bool,
}

impl RecordingNotifier {
    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Default::default()
        }
    }

    pub fn sent(&self) -> Vec<SentMail> {
        self.sent.lock().unwrap().clone()
    }

    pub fn last(&self) -> SentMail {
        self.sent().last().cloned().expect("no mail was sent")
    }

    fn record(&self, kind: MailKind, user: &User) -> Result<(), AppError> {
        if self.failing {
            return Err(AppError::MailError("relay refused the message".into()));
        }
        self.sent.lock().unwrap().push(SentMail {
            kind,
            email: user.email.clone(),
            token: user.verify_token.clone(),
        });
        Ok(())
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send_confirmation(&self, user: &User) -> Result<(), AppError> {
        self.record(MailKind::Confirmation, user)
    }

    async fn send_password_recovery(&self, user: &User) -> Result<(), AppError> {
        self.record(MailKind::PasswordRecovery, user)
    }
}

pub struct TestContext {
    pub store: Arc<MemoryStore>,
    pub notifier: Arc<RecordingNotifier>,
    pub state: web::Data<AppState>,
}

pub fn tokens() -> TokenIssuer {
    TokenIssuer::new(b"test-secret", Duration::hours(24), Duration::minutes(60))
}

fn build(notifier: RecordingNotifier, oauth: Option<OAuthClient>) -> TestContext {
    let store = Arc::new(MemoryStore::new());
    let notifier = Arc::new(notifier);
    let state = web::Data::new(AppState {
        users: store.clone(),
        tasks: store.clone(),
        notifier: notifier.clone(),
        tokens: tokens(),
        oauth: oauth.map(Arc::new),
        password_cost: 4,
    });
    TestContext {
        store,
        notifier,
        state,
    }
}

pub fn context() -> TestContext {
    build(RecordingNotifier::default(), None)
}

pub fn context_with_failing_mail() -> TestContext {
    build(RecordingNotifier::failing(), None)
}

pub fn context_with_oauth(client: OAuthClient) -> TestContext {
    build(RecordingNotifier::default(), Some(client))
}

/// Initializes the full route tree on top of a `TestContext`.
#[macro_export]
macro_rules! test_app {
    ($ctx:expr) => {
        actix_web::test::init_service(
            actix_web::App::new()
                .app_data($ctx.state.clone())
                .configure(todo_api::routes::config),
        )
        .await
    };
}

pub async fn seed_user(ctx: &TestContext, email: &str, active: bool) -> User {
    UserRepository::create(
        &*ctx.store,
        NewUser {
            email: email.to_string(),
            password_hash: hash_password(PASSWORD, 4).unwrap(),
            firstname: "Test".to_string(),
            lastname: "User".to_string(),
            active,
            verify_token: if active { String::new() } else { "pending-token".to_string() },
        },
    )
    .await
    .unwrap()
}

pub fn bearer(user: &User) -> (&'static str, String) {
    ("Authorization", format!("Bearer {}", tokens().issue(user.id).unwrap().token))
}

/// Sends a request and returns the status with the body parsed as JSON (`Null` if it is not).
pub async fn send(
    app: &impl Service<
        actix_http::Request,
        Response = ServiceResponse<impl MessageBody>,
        Error = actix_web::Error,
    >,
    req: test::TestRequest,
) -> (StatusCode, Value) {
    // Middleware rejections surface as service errors rather than responses.
    let (status, body) = match test::try_call_service(app, req.to_request()).await {
        Ok(resp) => {
            let status = resp.status();
            (status, test::read_body(resp).await)
        }
        Err(err) => {
            let resp = err.error_response();
            let status = resp.status();
            (status, to_bytes(resp.into_body()).await.unwrap())
        }
    };
    (status, serde_json::from_slice(&body).unwrap_or(Value::Null))
}

pub async fn login(
    app: &impl Service<
        actix_http::Request,
        Response = ServiceResponse<impl MessageBody>,
        Error = actix_web::Error,
    >,
    email: &str,
    password: &str,
) -> (StatusCode, Value) {
    send(
        app,
        test::TestRequest::post()
            .uri("/v1/login?type=email")
            .set_json(json!({ "email": email, "password": password })),
    )
    .await
}
