//! Client for the hotspot inference service.

use reqwest::multipart::Form;
use serde_json::Value;

use crate::config::ServiceConfig;
use crate::error::ServiceResult;
use crate::http::{endpoint, read_json, ImageUpload};

/// `POST /predict` (multipart image) and `POST /recommend` (JSON).
#[derive(Debug, Clone)]
pub struct InferenceClient {
    base_url: String,
    client: reqwest::Client,
}

impl InferenceClient {
    pub fn new(base_url: impl Into<String>, client: reqwest::Client) -> Self {
        Self {
            base_url: base_url.into(),
            client,
        }
    }

    pub fn from_config(config: &ServiceConfig) -> ServiceResult<Self> {
        Ok(Self::new(&config.inference_url, config.http_client()?))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Classify a thermal image. The response is passed through as-is.
    pub async fn predict(&self, image: ImageUpload) -> ServiceResult<Value> {
        let url = endpoint(&self.base_url, "/predict");
        #[cfg(feature = "tracing")]
        tracing::debug!("Inference: predict {} ({} bytes)", image.file_name, image.bytes.len());

        let form = Form::new().part("file", image.into_part()?);
        let response = self.client.post(&url).multipart(form).send().await?;
        read_json(response).await
    }

    /// Ask for a recommendation given a previous prediction (or any JSON the
    /// service accepts).
    pub async fn recommend(&self, request: &Value) -> ServiceResult<Value> {
        let url = endpoint(&self.base_url, "/recommend");
        let response = self.client.post(&url).json(request).send().await?;
        read_json(response).await
    }
}
