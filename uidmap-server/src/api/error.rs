//! API Error Handling
//!
//! Unified error types and conversion for API responses.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use uidmap_core::error::{BatchError, EndpointError};

use crate::agent::{AgentError, ProbeError};
use crate::service::{ConnectionError, RegistryError, SingleOpError};

/// API error type
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Conflict(String),
    ConfigUnverified(String),
    AgentFailure(String),
    InternalError(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            ApiError::ConfigUnverified(msg) => (StatusCode::PRECONDITION_FAILED, msg),
            ApiError::AgentFailure(msg) => {
                tracing::warn!("Agent failure: {}", msg);
                (StatusCode::BAD_GATEWAY, msg)
            }
            ApiError::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };

        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

impl From<BatchError> for ApiError {
    fn from(err: BatchError) -> Self {
        ApiError::BadRequest(err.to_string())
    }
}

impl From<EndpointError> for ApiError {
    fn from(err: EndpointError) -> Self {
        ApiError::BadRequest(err.to_string())
    }
}

impl From<ConnectionError> for ApiError {
    fn from(err: ConnectionError) -> Self {
        ApiError::ConfigUnverified(err.to_string())
    }
}

impl From<RegistryError> for ApiError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::AlreadyRunning(_) => ApiError::Conflict(err.to_string()),
            RegistryError::ConfigUnverified(err) => err.into(),
        }
    }
}

impl From<SingleOpError> for ApiError {
    fn from(err: SingleOpError) -> Self {
        match err {
            SingleOpError::Connection(err) => err.into(),
            SingleOpError::Halted => ApiError::Conflict(err.to_string()),
            SingleOpError::Agent(err) => err.into(),
        }
    }
}

impl From<AgentError> for ApiError {
    fn from(err: AgentError) -> Self {
        match err {
            AgentError::Misconfigured(msg) => ApiError::InternalError(msg),
            other => ApiError::AgentFailure(other.to_string()),
        }
    }
}

impl From<ProbeError> for ApiError {
    fn from(err: ProbeError) -> Self {
        ApiError::AgentFailure(format!("Verification failed: {}", err))
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
