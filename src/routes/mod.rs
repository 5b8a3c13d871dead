pub mod auth;
pub mod health;
pub mod tasks;
pub mod users;

use actix_web::web;

use crate::auth::AuthMiddleware;
use crate::error::AppError;

/// Malformed JSON bodies answer 400 with the usual error envelope.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .error_handler(|err, _req| AppError::BadRequest(err.to_string()).into())
}

/// Registers every route. Expects `web::Data<AppState>` to be provided by the app.
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config())
        .service(health::welcome)
        .service(health::health)
        .service(
            web::scope("/auth")
                .service(auth::refresh_token)
                .service(auth::oauth_callback),
        )
        .service(
            web::scope("/v1")
                .service(auth::login)
                .service(auth::logout)
                .service(auth::oauth_url)
                .service(users::register)
                .service(users::confirm)
                .service(users::send_confirmation_again)
                .service(users::request_password_recovery)
                .service(users::execute_password_recovery)
                .service(users::update_password)
                .service(users::fetch_user)
                .service(users::update_user)
                .service(users::delete_user)
                .service(
                    web::scope("/todo")
                        .wrap(AuthMiddleware)
                        .service(tasks::create_task)
                        .service(tasks::get_tasks)
                        .service(tasks::get_task)
                        .service(tasks::update_task)
                        .service(tasks::delete_task),
                ),
        );
}
