//! Status, log and connection DTOs

use serde::{Deserialize, Serialize};

use crate::domain::job::JobStatus;

/// Generic acknowledgement
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LogsQuery {
    pub limit: Option<usize>,
}

/// Rendered activity log lines, oldest first
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogsResponse {
    pub logs: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: String,
    pub mapping_active: bool,
    pub config_verified: bool,
    pub uia_url: String,
    pub job_status: JobStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionTestRequest {
    pub uia_url: String,
    /// Save the endpoint as verified without probing it
    #[serde(default)]
    pub force: bool,
}

/// Presence of the TLS material in the certificate directory
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CertStatus {
    pub has_certs: bool,
    pub has_client: bool,
    pub has_ca: bool,
    pub has_server: bool,
    pub cert_dir: String,
}
