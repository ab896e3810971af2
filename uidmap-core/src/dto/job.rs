//! Job control DTOs

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::job::JobKind;

/// Returned when a batch is admitted as a job
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitResponse {
    pub message: String,
    pub job_id: Uuid,
    pub kind: JobKind,
    pub total: usize,
}

/// Optional target of a stop request
///
/// The id is kept raw so a malformed one can be acknowledged like any other
/// id that does not name the running job.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StopQuery {
    pub job_id: Option<String>,
}

impl StopQuery {
    /// The job the stop is aimed at, or the raw id if it is not a UUID
    pub fn target(&self) -> Result<Option<Uuid>, &str> {
        match self.job_id.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(raw) => raw.parse().map(Some).map_err(|_| raw),
        }
    }
}
