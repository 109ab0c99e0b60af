//! Error types for the device link

use thiserror::Error;

/// Result type for device link operations
pub type LinkResult<T> = Result<T, LinkError>;

/// Errors surfaced to callers of the device link
#[derive(Error, Debug)]
pub enum LinkError {
    /// The socket is not open; the command was not sent
    #[error("Device not connected ({url}); command '{command}' was not sent")]
    NotConnected { url: String, command: String },

    /// The link supervisor has shut down
    #[error("Device link is shut down")]
    Closed,
}

impl LinkError {
    /// Create a not-connected error
    pub fn not_connected(url: impl Into<String>, command: impl Into<String>) -> Self {
        Self::NotConnected {
            url: url.into(),
            command: command.into(),
        }
    }
}
