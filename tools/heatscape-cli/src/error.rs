//! CLI Error Types
//!
//! Every error carries a hint the operator can act on.

use std::fmt;
use std::path::Path;

use heatscape_link::LinkError;
use heatscape_services::ServiceError;
use thiserror::Error;

/// Result type for CLI operations
pub type CliResult<T> = Result<T, CliError>;

/// CLI-specific errors with helpful messages and hints
#[derive(Debug, Error)]
pub enum CliError {
    /// The device link never opened
    #[error("Could not connect to the vehicle at {url} within {secs}s\n  Hint: Check that the controller is powered and on this network, or pass --device-url")]
    ConnectTimeout { url: String, secs: u64 },

    /// The device did not answer in time
    #[error("No {what} from the vehicle within {secs}s\n  Hint: The link is up but the controller did not reply; check the operator log with 'heatscape monitor'")]
    NoReply { what: String, secs: u64 },

    /// Device link error
    #[error("Device link error: {0}")]
    Link(#[from] LinkError),

    /// A companion service call failed
    #[error("{service} service error: {source}\n  Hint: Check that the service is running and --{service}-url points at it")]
    Service {
        service: &'static str,
        #[source]
        source: ServiceError,
    },

    /// Alignment needs the camera stream address
    #[error("Camera address unknown\n  Hint: The vehicle did not report CAM_IP; pass --camera-url")]
    NoCameraAddress,

    /// Invalid JSON provided as input
    #[error("Invalid JSON value: {input}\n  Error: {error}\n  Hint: Use single quotes around JSON: heatscape recommend '{{\"label\":\"hotspot\"}}'")]
    InvalidJson { input: String, error: String },

    /// Config file could not be parsed
    #[error("Invalid config file {path}\n  Error: {error}\n  Hint: Expected [link], [services] and [align] tables")]
    InvalidConfig { path: String, error: String },

    /// I/O error occurred
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error
    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl CliError {
    /// Create a connect timeout error
    pub fn connect_timeout(url: impl Into<String>, secs: u64) -> Self {
        Self::ConnectTimeout {
            url: url.into(),
            secs,
        }
    }

    /// Create a no-reply error
    pub fn no_reply(what: impl Into<String>, secs: u64) -> Self {
        Self::NoReply {
            what: what.into(),
            secs,
        }
    }

    /// Wrap a service error with the service name used in the hint
    pub fn service(service: &'static str) -> impl FnOnce(ServiceError) -> Self {
        move |source| Self::Service { service, source }
    }

    /// Create an invalid JSON error
    pub fn invalid_json(input: impl Into<String>, error: impl fmt::Display) -> Self {
        Self::InvalidJson {
            input: input.into(),
            error: error.to_string(),
        }
    }

    /// Create an invalid config error
    pub fn invalid_config(path: &Path, error: impl fmt::Display) -> Self {
        Self::InvalidConfig {
            path: path.display().to_string(),
            error: error.to_string(),
        }
    }
}
