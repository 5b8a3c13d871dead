use std::env;
use std::ops::RangeInclusive;
use std::str::FromStr;

use sqlx::postgres::{PgConnectOptions, PgSslMode};
use thiserror::Error;

/// One year.
const MAX_JWT_TIMEOUT_HOURS: i64 = 24 * 365;
const MAX_JWT_REFRESH_MINUTES: i64 = 60 * 24 * 365;

/// Problems found while reading the environment at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{name} has an invalid value: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// Where the Postgres server lives: either a full DSN or its components.
#[derive(Debug, Clone, PartialEq)]
pub enum DatabaseConfig {
    Url(String),
    Components {
        host: String,
        port: u16,
        user: String,
        password: String,
        name: String,
        ssl_mode: String,
    },
}

impl DatabaseConfig {
    pub fn connect_options(&self) -> Result<PgConnectOptions, ConfigError> {
        match self {
            DatabaseConfig::Url(url) => {
                PgConnectOptions::from_str(url).map_err(|e| ConfigError::Invalid {
                    name: "DATABASE_URL",
                    reason: e.to_string(),
                })
            }
            DatabaseConfig::Components {
                host,
                port,
                user,
                password,
                name,
                ssl_mode,
            } => {
                let ssl_mode =
                    PgSslMode::from_str(ssl_mode).map_err(|e| ConfigError::Invalid {
                        name: "DB_SSLMODE",
                        reason: e.to_string(),
                    })?;
                Ok(PgConnectOptions::new()
                    .host(host)
                    .port(*port)
                    .username(user)
                    .password(password)
                    .database(name)
                    .ssl_mode(ssl_mode))
            }
        }
    }
}

/// Outbound mail relay settings.
#[derive(Debug, Clone, PartialEq)]
pub struct SmtpConfig {
    pub server: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub from: String,
}

pub struct Config {
    pub database: DatabaseConfig,
    pub database_max_connections: u32,
    pub server_host: String,
    pub server_port: u16,
    /// Public base URL, always ending with `/`.
    pub public_url: String,
    pub jwt_secret: String,
    pub jwt_timeout_hours: i64,
    pub jwt_max_refresh_minutes: i64,
    pub bcrypt_cost: u32,
    pub smtp: Option<SmtpConfig>,
    pub oauth_credentials_file: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from any key/value source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let database = match get("DATABASE_URL") {
            Some(url) => DatabaseConfig::Url(url),
            None => DatabaseConfig::Components {
                host: get("DB_HOST").unwrap_or_else(|| "localhost".to_string()),
                port: parse_or(get("DB_PORT"), "DB_PORT", 5432)?,
                user: get("DB_USER").ok_or(ConfigError::Missing("DB_USER"))?,
                password: get("DB_PASSWORD").unwrap_or_default(),
                name: get("DB_NAME").ok_or(ConfigError::Missing("DB_NAME"))?,
                ssl_mode: get("DB_SSLMODE").unwrap_or_else(|| "disable".to_string()),
            },
        };

        let server_port = match get("PORT") {
            Some(port) => parse_or(Some(port), "PORT", 8080)?,
            None => parse_or(get("SERVER_PORT"), "SERVER_PORT", 8080)?,
        };

        let mut public_url =
            get("URL").unwrap_or_else(|| format!("http://localhost:{}/", server_port));
        if !public_url.ends_with('/') {
            public_url.push('/');
        }

        let smtp = match get("SMTP_SERVER") {
            Some(server) => {
                let username = get("SMTP_USERNAME").unwrap_or_default();
                Some(SmtpConfig {
                    server,
                    port: parse_or(get("SMTP_PORT"), "SMTP_PORT", 587)?,
                    password: get("SMTP_PASSWORD").unwrap_or_default(),
                    from: get("SMTP_FROM").unwrap_or_else(|| username.clone()),
                    username,
                })
            }
            None => None,
        };

        Ok(Self {
            database,
            database_max_connections: parse_or(
                get("DB_MAX_CONNECTIONS"),
                "DB_MAX_CONNECTIONS",
                5,
            )?,
            server_host: get("SERVER_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            server_port,
            public_url,
            jwt_secret: get("JWT_SECRET").ok_or(ConfigError::Missing("JWT_SECRET"))?,
            jwt_timeout_hours: in_range(
                parse_or(get("JWT_TIMEOUT_HOURS"), "JWT_TIMEOUT_HOURS", 24)?,
                "JWT_TIMEOUT_HOURS",
                1..=MAX_JWT_TIMEOUT_HOURS,
            )?,
            jwt_max_refresh_minutes: in_range(
                parse_or(get("JWT_MAX_REFRESH_MINUTES"), "JWT_MAX_REFRESH_MINUTES", 60)?,
                "JWT_MAX_REFRESH_MINUTES",
                1..=MAX_JWT_REFRESH_MINUTES,
            )?,
            bcrypt_cost: in_range(
                parse_or(get("BCRYPT_COST"), "BCRYPT_COST", bcrypt::DEFAULT_COST)?,
                "BCRYPT_COST",
                4..=31,
            )?,
            smtp,
            oauth_credentials_file: get("OAUTH_CREDENTIALS_FILE"),
        })
    }

    pub fn server_url(&self) -> String {
        format!("http://{}:{}", self.server_host, self.server_port)
    }
}

fn in_range<T>(value: T, name: &'static str, range: RangeInclusive<T>) -> Result<T, ConfigError>
where
    T: PartialOrd + std::fmt::Display,
{
    if range.contains(&value) {
        Ok(value)
    } else {
        Err(ConfigError::Invalid {
            name,
            reason: format!("{} is outside {}..={}", value, range.start(), range.end()),
        })
    }
}

fn parse_or<T>(value: Option<String>, name: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match value {
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            name,
            reason: e.to_string(),
        }),
        None => Ok(default),
    }
}
