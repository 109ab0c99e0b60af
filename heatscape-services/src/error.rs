//! Error types for the service clients

use thiserror::Error;

/// Result type for service calls
pub type ServiceResult<T> = Result<T, ServiceError>;

/// Errors from the inference, depth and matcher services
#[derive(Error, Debug)]
pub enum ServiceError {
    /// Transport failure, timeout, or malformed request
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The service answered with a non-success status
    #[error("Service returned {code}: {body}")]
    Status { code: u16, body: String },

    /// The response body was not the expected JSON
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Reading an upload from disk failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ServiceError {
    /// Create a status error
    pub fn status(code: u16, body: impl Into<String>) -> Self {
        Self::Status {
            code,
            body: body.into(),
        }
    }
}
