//! Tag endpoints

use crate::ConsoleClient;
use crate::error::Result;
use uidmap_core::dto::job::SubmitResponse;
use uidmap_core::dto::tag::{IpTagRequest, UserTagRequest};

impl ConsoleClient {
    /// Start an address-tag job
    pub async fn update_ip_tags(&self, req: &IpTagRequest) -> Result<SubmitResponse> {
        let response = self
            .client
            .post(self.url("/update-ip-tags"))
            .json(req)
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Start a user-tag job
    pub async fn update_user_tags(&self, req: &UserTagRequest) -> Result<SubmitResponse> {
        let response = self
            .client
            .post(self.url("/update-tags"))
            .json(req)
            .send()
            .await?;

        self.handle_response(response).await
    }
}
