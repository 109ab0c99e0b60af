//! Client for the depth estimation service.

use reqwest::multipart::Form;
use serde_json::Value;

use crate::config::ServiceConfig;
use crate::error::ServiceResult;
use crate::http::{endpoint, read_json, ImageUpload};

#[derive(Debug, Clone)]
pub struct DepthClient {
    base_url: String,
    client: reqwest::Client,
}

impl DepthClient {
    pub fn new(base_url: impl Into<String>, client: reqwest::Client) -> Self {
        Self {
            base_url: base_url.into(),
            client,
        }
    }

    pub fn from_config(config: &ServiceConfig) -> ServiceResult<Self> {
        Ok(Self::new(&config.depth_url, config.http_client()?))
    }

    /// Estimate the real surface area covered by `mask` in `image`.
    ///
    /// Uploads both as multipart fields `image` and `mask` to
    /// `/api/depth/masked`.
    pub async fn masked_surface_area(
        &self,
        image: ImageUpload,
        mask: ImageUpload,
    ) -> ServiceResult<Value> {
        let url = endpoint(&self.base_url, "/api/depth/masked");
        let form = Form::new()
            .part("image", image.into_part()?)
            .part("mask", mask.into_part()?);
        let response = self.client.post(&url).multipart(form).send().await?;
        read_json(response).await
    }
}
