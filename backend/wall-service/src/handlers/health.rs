use actix_web::{get, web, HttpResponse, Responder};
use serde::Serialize;

use crate::AppState;

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
    database: String,
}

/// GET /api/health
/// Health check with a storage probe.
#[get("/health")]
pub async fn health(state: web::Data<AppState>) -> impl Responder {
    let db_status = match state.store.ping().await {
        Ok(_) => "healthy",
        Err(_) => "unhealthy",
    };

    HttpResponse::Ok().json(HealthResponse {
        status: if db_status == "healthy" {
            "ok"
        } else {
            "degraded"
        }
        .to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        database: db_status.to_string(),
    })
}

/// GET /api/health/live
/// Liveness probe, no dependencies touched.
#[get("/health/live")]
pub async fn liveness() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({"alive": true}))
}
