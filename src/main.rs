use std::io;
use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use chrono::Duration;

use todo_api::auth::oauth::{OAuthClient, OAuthConfig};
use todo_api::auth::TokenIssuer;
use todo_api::config::Config;
use todo_api::db::{self, PgStore};
use todo_api::mail::{LogNotifier, MailTemplates, Notifier, SmtpNotifier};
use todo_api::{routes, AppState};

fn startup_error(context: &str, error: impl std::fmt::Display) -> io::Error {
    io::Error::new(io::ErrorKind::Other, format!("{}: {}", context, error))
}

async fn build_state(config: &Config) -> io::Result<AppState> {
    let pool = db::connect(config)
        .await
        .map_err(|e| startup_error("Failed to connect to database", e))?;
    db::migrate(&pool)
        .await
        .map_err(|e| startup_error("Failed to migrate database", e))?;
    let store = Arc::new(PgStore::new(pool));

    let templates = MailTemplates::new(&config.public_url)
        .map_err(|e| startup_error("Invalid URL", e))?;
    let notifier: Arc<dyn Notifier> = match &config.smtp {
        Some(smtp) => Arc::new(
            SmtpNotifier::new(smtp, templates)
                .map_err(|e| startup_error("Invalid SMTP configuration", e))?,
        ),
        None => {
            log::warn!("SMTP_SERVER is not set, mails will only be logged");
            Arc::new(LogNotifier::new(templates))
        }
    };

    let oauth = match &config.oauth_credentials_file {
        Some(path) => {
            let oauth_config = OAuthConfig::from_credentials_file(path, &config.public_url)
                .map_err(|e| startup_error("Invalid OAuth configuration", e))?;
            Some(Arc::new(OAuthClient::new(oauth_config)))
        }
        None => {
            log::info!("OAUTH_CREDENTIALS_FILE is not set, OAuth login is disabled");
            None
        }
    };

    Ok(AppState {
        users: store.clone(),
        tasks: store,
        notifier,
        tokens: TokenIssuer::new(
            config.jwt_secret.as_bytes(),
            Duration::hours(config.jwt_timeout_hours),
            Duration::minutes(config.jwt_max_refresh_minutes),
        ),
        oauth,
        password_cost: config.bcrypt_cost,
    })
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::from_env().map_err(|e| startup_error("Invalid configuration", e))?;
    let state = web::Data::new(build_state(&config).await?);

    log::info!("Starting Todo API server at {}", config.server_url());
    HttpServer::new(move || {
        App::new()
            .wrap(Cors::permissive())
            .wrap(Logger::default())
            .app_data(state.clone())
            .configure(routes::config)
    })
    .bind((config.server_host.as_str(), config.server_port))?
    .run()
    .await
}
