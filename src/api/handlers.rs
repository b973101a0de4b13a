//! API Handlers
//!
//! Health probe handlers. None of them inspect a dependency: a 200 only
//! means the process is running and can answer HTTP.

use axum::Json;

use crate::models::HealthResponse;

/// Handler for GET /api/health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}

/// Handler for GET /api/health/readiness
pub async fn readiness_handler() -> Json<HealthResponse> {
    Json(HealthResponse::ready())
}

/// Handler for GET /api/health/liveness
pub async fn liveness_handler() -> Json<HealthResponse> {
    Json(HealthResponse::alive())
}
