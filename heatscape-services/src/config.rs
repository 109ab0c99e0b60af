//! Service endpoint configuration
//!
//! ```toml
//! [services]
//! inference_url = "http://localhost:5000"
//! depth_url = "http://localhost:5001"
//! matcher_url = "http://localhost:5002"
//! request_timeout_ms = 10000
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ServiceResult;

/// Base URLs of the companion HTTP services
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Hotspot classifier and recommendation service
    pub inference_url: String,
    /// Depth estimation service
    pub depth_url: String,
    /// Reference-image frame matcher
    pub matcher_url: String,
    /// Per-request timeout; `None` waits indefinitely
    pub request_timeout_ms: Option<u64>,
}

impl Default for ServiceConfig {
    /// # Defaults
    /// - Inference: `http://localhost:5000`
    /// - Depth: `http://localhost:5001`
    /// - Matcher: `http://localhost:5002`
    /// - No request timeout
    fn default() -> Self {
        Self {
            inference_url: "http://localhost:5000".to_string(),
            depth_url: "http://localhost:5001".to_string(),
            matcher_url: "http://localhost:5002".to_string(),
            request_timeout_ms: None,
        }
    }
}

impl ServiceConfig {
    pub fn with_inference_url(mut self, url: impl Into<String>) -> Self {
        self.inference_url = url.into();
        self
    }

    pub fn with_depth_url(mut self, url: impl Into<String>) -> Self {
        self.depth_url = url.into();
        self
    }

    pub fn with_matcher_url(mut self, url: impl Into<String>) -> Self {
        self.matcher_url = url.into();
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout_ms = Some(timeout.as_millis() as u64);
        self
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_ms.map(Duration::from_millis)
    }

    /// Build the shared HTTP client used by every service client.
    pub fn http_client(&self) -> ServiceResult<reqwest::Client> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = self.request_timeout() {
            builder = builder.timeout(timeout);
        }
        Ok(builder.build()?)
    }
}
