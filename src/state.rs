use std::sync::Arc;

use crate::auth::oauth::OAuthClient;
use crate::auth::token::TokenIssuer;
use crate::db::{TaskRepository, UserRepository};
use crate::mail::Notifier;

/// Collaborators shared by every request, registered once as `web::Data<AppState>`.
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserRepository>,
    pub tasks: Arc<dyn TaskRepository>,
    pub notifier: Arc<dyn Notifier>,
    pub tokens: TokenIssuer,
    /// `None` when no OAuth credentials file is configured.
    pub oauth: Option<Arc<OAuthClient>>,
    /// bcrypt work factor for newly stored passwords.
    pub password_cost: u32,
}
