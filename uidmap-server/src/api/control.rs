//! Job control and observation handlers

use axum::{
    Json,
    extract::{Query, State},
};
use uidmap_core::domain::job::{JobSnapshot, Progress};
use uidmap_core::dto::job::StopQuery;
use uidmap_core::dto::status::{LogsQuery, LogsResponse, MessageResponse};

use crate::state::AppState;

const DEFAULT_LOG_LIMIT: usize = 50;

/// POST /stop-mapping
/// Cooperative stop of the running job; always acknowledged
pub async fn stop_mapping(
    State(state): State<AppState>,
    Query(query): Query<StopQuery>,
) -> Json<MessageResponse> {
    let target = match query.target() {
        Ok(target) => target,
        Err(raw) => {
            return Json(MessageResponse::new(format!("No running job with id {}", raw)));
        }
    };

    let message = if state.registry.stop(target) {
        "Stop requested; the job halts after its current item"
    } else {
        "No running job to stop"
    };
    Json(MessageResponse::new(message))
}

/// POST /emergency-stop
pub async fn emergency_stop(State(state): State<AppState>) -> Json<MessageResponse> {
    let message = if state.registry.emergency_stop().await {
        "Emergency stop executed; all operations halted"
    } else {
        "Emergency stop executed; no job was running"
    };
    Json(MessageResponse::new(message))
}

/// GET /progress
pub async fn progress(State(state): State<AppState>) -> Json<Progress> {
    Json(state.registry.progress())
}

/// GET /job
/// Full snapshot of the most recent job
pub async fn job(State(state): State<AppState>) -> Json<JobSnapshot> {
    Json(state.registry.snapshot())
}

/// GET /get-logs
/// Most recent activity lines, oldest first
pub async fn get_logs(
    State(state): State<AppState>,
    Query(query): Query<LogsQuery>,
) -> Json<LogsResponse> {
    let limit = query.limit.unwrap_or(DEFAULT_LOG_LIMIT);
    let logs = state
        .logs
        .recent(limit)
        .into_iter()
        .rev()
        .map(|entry| entry.to_string())
        .collect();
    Json(LogsResponse { logs })
}
