//! HTTP clients for the HeatScape companion services.
//!
//! - [`InferenceClient`]: hotspot classification and recommendations
//! - [`DepthClient`]: masked surface-area estimation
//! - [`MatcherClient`]: reference-image matching, the
//!   [`FrameMatcher`](heatscape_link::FrameMatcher) behind camera alignment
//!
//! Payloads other than the matcher's frame report are opaque JSON and are
//! returned as [`serde_json::Value`].

pub mod config;
pub mod depth;
pub mod error;
pub mod http;
pub mod inference;
pub mod matcher;

pub use config::ServiceConfig;
pub use depth::DepthClient;
pub use error::{ServiceError, ServiceResult};
pub use http::ImageUpload;
pub use inference::InferenceClient;
pub use matcher::MatcherClient;
