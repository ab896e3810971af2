//! Mapping endpoints

use crate::ConsoleClient;
use crate::error::Result;
use uidmap_core::dto::job::SubmitResponse;
use uidmap_core::dto::mapping::{BulkMappingRequest, SingleMappingRequest, SubnetMappingRequest};
use uidmap_core::dto::status::MessageResponse;

impl ConsoleClient {
    /// Send one mapping immediately, outside any job
    pub async fn single_mapping(&self, req: &SingleMappingRequest) -> Result<MessageResponse> {
        let response = self
            .client
            .post(self.url("/single-mapping"))
            .json(req)
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Start a count-based bulk mapping job
    ///
    /// Fails with status 409 while another job is running.
    pub async fn bulk_mapping(&self, req: &BulkMappingRequest) -> Result<SubmitResponse> {
        let response = self
            .client
            .post(self.url("/bulk-mapping"))
            .json(req)
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Start a job mapping every host address of a subnet
    pub async fn map_subnet(&self, req: &SubnetMappingRequest) -> Result<SubmitResponse> {
        let response = self
            .client
            .post(self.url("/map-subnet"))
            .json(req)
            .send()
            .await?;

        self.handle_response(response).await
    }
}
