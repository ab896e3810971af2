//! Agent connection endpoints

use crate::ConsoleClient;
use crate::error::Result;
use uidmap_core::dto::status::{CertStatus, ConnectionTestRequest, MessageResponse};

impl ConsoleClient {
    /// Verify an agent endpoint and make it the active one
    ///
    /// With `force` the server skips the probe and saves the endpoint anyway.
    /// A failed probe comes back as status 502 with the failing stage in the
    /// message.
    pub async fn test_connection(&self, uia_url: &str, force: bool) -> Result<MessageResponse> {
        let req = ConnectionTestRequest {
            uia_url: uia_url.to_string(),
            force,
        };
        let response = self
            .client
            .post(self.url("/test-connection"))
            .json(&req)
            .send()
            .await?;

        self.handle_response(response).await
    }

    pub async fn cert_status(&self) -> Result<CertStatus> {
        let response = self.client.get(self.url("/cert-status")).send().await?;

        self.handle_response(response).await
    }
}
