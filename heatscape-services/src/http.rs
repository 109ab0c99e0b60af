//! Request helpers shared by the service clients.

use std::path::Path;

use reqwest::multipart::Part;
use reqwest::Response;
use serde::de::DeserializeOwned;

use crate::error::{ServiceError, ServiceResult};

/// An image (or mask) to upload as a multipart file field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageUpload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl ImageUpload {
    pub fn new(file_name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes: bytes.into(),
        }
    }

    /// Read an image from disk, keeping its file name for the upload.
    pub async fn from_path(path: impl AsRef<Path>) -> ServiceResult<Self> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "image".to_string());
        Ok(Self { file_name, bytes })
    }

    /// MIME type guessed from the file extension.
    pub fn mime_type(&self) -> &'static str {
        let ext = self
            .file_name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase());
        match ext.as_deref() {
            Some("jpg" | "jpeg") => "image/jpeg",
            Some("png") => "image/png",
            Some("bmp") => "image/bmp",
            Some("webp") => "image/webp",
            _ => "application/octet-stream",
        }
    }

    pub(crate) fn into_part(self) -> ServiceResult<Part> {
        let mime = self.mime_type();
        Ok(Part::bytes(self.bytes)
            .file_name(self.file_name)
            .mime_str(mime)?)
    }
}

/// Join a base URL and an absolute path without doubling the slash.
pub(crate) fn endpoint(base: &str, path: &str) -> String {
    format!("{}{}", base.trim_end_matches('/'), path)
}

/// Check the status, then decode the body as JSON.
///
/// Non-success responses keep their body text in the error.
pub(crate) async fn read_json<T: DeserializeOwned>(response: Response) -> ServiceResult<T> {
    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
        #[cfg(feature = "tracing")]
        tracing::warn!("Service responded {}: {}", status, body);
        return Err(ServiceError::status(status.as_u16(), body));
    }
    Ok(serde_json::from_str(&body)?)
}
