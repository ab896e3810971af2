//! Health and status API handlers

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use uidmap_core::dto::status::StatusResponse;

use crate::state::AppState;

/// GET /health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, Json(serde_json::json!({ "status": "ok" })))
}

/// GET /status
/// Service, job and connection summary for the console header
pub async fn status(State(state): State<AppState>) -> Json<StatusResponse> {
    let snapshot = state.registry.snapshot();
    let connection = state.connection.current();

    Json(StatusResponse {
        status: "online".to_string(),
        mapping_active: snapshot.status.is_active(),
        config_verified: connection.verified,
        uia_url: connection.endpoint.clone(),
        job_status: snapshot.status,
    })
}
