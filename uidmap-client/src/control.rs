//! Job control and observation endpoints

use crate::ConsoleClient;
use crate::error::Result;
use uidmap_core::domain::job::{JobSnapshot, Progress};
use uidmap_core::dto::status::{LogsResponse, MessageResponse, StatusResponse};
use uuid::Uuid;

impl ConsoleClient {
    // =============================================================================
    // Control
    // =============================================================================

    /// Ask the running job to stop after its current item
    ///
    /// With `job_id` the stop only applies if that job is the running one.
    pub async fn stop(&self, job_id: Option<Uuid>) -> Result<MessageResponse> {
        let mut request = self.client.post(self.url("/stop-mapping"));
        if let Some(id) = job_id {
            request = request.query(&[("job_id", id.to_string())]);
        }
        let response = request.send().await?;

        self.handle_response(response).await
    }

    /// Halt every job and in-flight operation
    pub async fn emergency_stop(&self) -> Result<MessageResponse> {
        let response = self.client.post(self.url("/emergency-stop")).send().await?;

        self.handle_response(response).await
    }

    // =============================================================================
    // Observation
    // =============================================================================

    pub async fn progress(&self) -> Result<Progress> {
        let response = self.client.get(self.url("/progress")).send().await?;

        self.handle_response(response).await
    }

    /// Full snapshot of the most recent job
    pub async fn job(&self) -> Result<JobSnapshot> {
        let response = self.client.get(self.url("/job")).send().await?;

        self.handle_response(response).await
    }

    /// Most recent activity lines, oldest first
    pub async fn logs(&self, limit: Option<usize>) -> Result<Vec<String>> {
        let mut request = self.client.get(self.url("/get-logs"));
        if let Some(limit) = limit {
            request = request.query(&[("limit", limit)]);
        }
        let response = request.send().await?;

        let logs: LogsResponse = self.handle_response(response).await?;
        Ok(logs.logs)
    }

    pub async fn status(&self) -> Result<StatusResponse> {
        let response = self.client.get(self.url("/status")).send().await?;

        self.handle_response(response).await
    }
}
