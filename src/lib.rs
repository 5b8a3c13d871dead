#![doc = "The `todo_api` library crate."]
#![doc = ""]
#![doc = "Domain models, persistence, authentication, mail and routing for the Todo API."]
#![doc = "The binary (`main.rs`) wires these together into an `HttpServer`; the integration"]
#![doc = "tests build the same app on top of the in-memory store."]

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod mail;
pub mod messages;
pub mod models;
pub mod routes;
pub mod state;
pub mod validation;

pub use error::AppError;
pub use state::AppState;
