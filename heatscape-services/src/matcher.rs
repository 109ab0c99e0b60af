//! Client for the reference-image frame matcher.
//!
//! The matcher pulls frames from the camera stream itself; the station only
//! tells it where the stream is and polls for the latest match.
//!
//! ```text
//! set_reference(image)      POST /api/set_reference   (multipart "image")
//! start_stream(camera_url)  POST /api/start_stream    {"url": ...}
//! next_frame()              GET  /api/next_frame      -> MatchReport
//! stop_stream()             POST /api/stop_stream
//! ```

use heatscape_link::align::{FrameMatcher, MatchReport};
use reqwest::multipart::Form;
use serde_json::{json, Value};

use crate::config::ServiceConfig;
use crate::error::{ServiceError, ServiceResult};
use crate::http::{endpoint, read_json, ImageUpload};

#[derive(Debug, Clone)]
pub struct MatcherClient {
    base_url: String,
    client: reqwest::Client,
}

impl MatcherClient {
    pub fn new(base_url: impl Into<String>, client: reqwest::Client) -> Self {
        Self {
            base_url: base_url.into(),
            client,
        }
    }

    pub fn from_config(config: &ServiceConfig) -> ServiceResult<Self> {
        Ok(Self::new(&config.matcher_url, config.http_client()?))
    }

    /// Upload the scene the camera should be aligned to.
    pub async fn set_reference(&self, image: ImageUpload) -> ServiceResult<Value> {
        let url = endpoint(&self.base_url, "/api/set_reference");
        let form = Form::new().part("image", image.into_part()?);
        let response = self.client.post(&url).multipart(form).send().await?;
        read_json(response).await
    }

    /// Point the matcher at the camera stream.
    pub async fn start_stream(&self, camera_url: &str) -> ServiceResult<Value> {
        let url = endpoint(&self.base_url, "/api/start_stream");
        #[cfg(feature = "tracing")]
        tracing::info!("Matcher: starting stream from {}", camera_url);

        let response = self
            .client
            .post(&url)
            .json(&json!({ "url": camera_url }))
            .send()
            .await?;
        read_json(response).await
    }

    pub async fn stop_stream(&self) -> ServiceResult<Value> {
        let url = endpoint(&self.base_url, "/api/stop_stream");
        let response = self.client.post(&url).send().await?;
        read_json(response).await
    }

    /// Latest match result for the live stream.
    pub async fn next_frame(&self) -> ServiceResult<MatchReport> {
        let url = endpoint(&self.base_url, "/api/next_frame");
        let response = self.client.get(&url).send().await?;
        read_json(response).await
    }
}

impl FrameMatcher for MatcherClient {
    type Error = ServiceError;

    async fn next_frame(&self) -> ServiceResult<MatchReport> {
        MatcherClient::next_frame(self).await
    }
}
