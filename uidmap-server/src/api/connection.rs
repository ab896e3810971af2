//! Connection API Handlers
//!
//! Endpoint verification and certificate presence checks.

use axum::{Json, extract::State};
use uidmap_core::dto::status::{CertStatus, ConnectionTestRequest, MessageResponse};

use crate::agent::http::{CLIENT_CERT_FILE, CLIENT_KEY_FILE, ROOT_CA_FILE, SERVER_BUNDLE_FILE};
use crate::api::error::{ApiError, ApiResult};
use crate::state::AppState;

/// POST /test-connection
/// Probes the endpoint and saves it as the verified agent
///
/// With `force` the probe is skipped and the endpoint saved anyway.
pub async fn test_connection(
    State(state): State<AppState>,
    Json(req): Json<ConnectionTestRequest>,
) -> ApiResult<Json<MessageResponse>> {
    let endpoint = req.uia_url.trim();
    if endpoint.is_empty() {
        return Err(ApiError::BadRequest("uia_url is required".to_string()));
    }

    if req.force {
        let saved = state.connection.force(endpoint)?;
        return Ok(Json(MessageResponse::new(format!(
            "Saved {} without verification",
            saved.endpoint
        ))));
    }

    let verified = state
        .connection
        .verify(state.agent.as_ref(), endpoint)
        .await?;
    Ok(Json(MessageResponse::new(format!(
        "Connection to {} verified and saved",
        verified.endpoint
    ))))
}

/// GET /cert-status
pub async fn cert_status(State(state): State<AppState>) -> Json<CertStatus> {
    let dir = &state.config.cert_dir;
    let has = |name: &str| dir.join(name).is_file();

    let has_ca = has(ROOT_CA_FILE);
    let has_client = has(CLIENT_CERT_FILE) && has(CLIENT_KEY_FILE);

    Json(CertStatus {
        has_certs: has_ca && has_client,
        has_client,
        has_ca,
        has_server: has(SERVER_BUNDLE_FILE),
        cert_dir: dir.display().to_string(),
    })
}
