use actix_web::{get, HttpResponse, Responder};
use chrono::Utc;
use serde_json::json;

use crate::messages;

#[get("/")]
pub async fn welcome() -> impl Responder {
    HttpResponse::Ok()
        .content_type("text/plain; charset=utf-8")
        .body(messages::WELCOME)
}

/// Health check endpoint
///
/// Returns the current status of the API and timestamp.
#[get("/health")]
pub async fn health() -> impl Responder {
    HttpResponse::Ok().json(json!({
        "status": "ok",
        "timestamp": Utc::now()
    }))
}
