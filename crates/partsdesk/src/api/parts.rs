//! Part verification and part image endpoints.

use std::path::Path;

use reqwest::Method;

use crate::api::client::ApiClient;
use crate::api::error::ApiError;
use crate::api::upload::file_form;
use crate::models::{Message, PartImage, VerifyRequest};

impl ApiClient {
    /// Submits a verification. The response body is not relied upon; callers
    /// mirror the accepted request locally.
    pub async fn verify_part(&self, part_id: &str, request: &VerifyRequest) -> Result<(), ApiError> {
        let http = self
            .request(Method::POST, &format!("/parts/{}/verify", part_id))
            .json(request);
        self.execute_unit("verify part", http).await?;
        log::info!(
            "Verified part {}{}",
            part_id,
            if request.enriched_corrected_data.is_some() {
                " with corrections"
            } else {
                ""
            }
        );
        Ok(())
    }

    pub async fn add_part_image(&self, part_id: &str, file: &Path) -> Result<PartImage, ApiError> {
        let request = self
            .request(Method::POST, &format!("/parts/images/{}", part_id))
            .multipart(file_form(file).await?);
        self.execute_json("add part image", request).await
    }

    /// Swaps the content of an image; its identifier stays the same.
    pub async fn replace_part_image(
        &self,
        image_id: &str,
        file: &Path,
    ) -> Result<PartImage, ApiError> {
        let request = self
            .request(Method::PUT, &format!("/parts/images/{}", image_id))
            .multipart(file_form(file).await?);
        self.execute_json("replace part image", request).await
    }

    pub async fn delete_part_image(&self, image_id: &str) -> Result<Message, ApiError> {
        let request = self.request(Method::DELETE, &format!("/parts/images/{}", image_id));
        self.execute_json("delete part image", request).await
    }
}
