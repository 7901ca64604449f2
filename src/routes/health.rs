use axum::routing::get;
use axum::{Json, Router};
use chrono::{Local, Utc};
use tracing::info;

use crate::models::{ApiStatus, HealthStatus};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/test", get(test_connection))
}

async fn health() -> Json<HealthStatus> {
    info!("GET /api/health - Health check");
    Json(HealthStatus {
        status: "healthy".to_string(),
        timestamp: Utc::now().to_rfc3339(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        server_time: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
    })
}

async fn test_connection() -> Json<ApiStatus> {
    info!("GET /api/test - Connectivity probe");
    Json(ApiStatus {
        status: "API is working".to_string(),
        message: "Successfully connected to the backend server".to_string(),
    })
}
