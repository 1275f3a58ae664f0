use std::path::{Path, PathBuf};

use async_trait::async_trait;
use reqwest::{multipart, Client};
pub use shared::domain::UploadResult;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("media upload request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("media service rejected upload with status {status}: {message}")]
    Rejected { status: u16, message: String },
    #[error("could not read source image {path}: {source}")]
    UnreadableSource {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("media upload endpoint is not configured")]
    NotConfigured,
}

/// Handle for the media upload endpoint, passed explicitly to each upload.
/// Authentication is an unsigned upload preset carried in the form body.
#[derive(Clone)]
pub struct MediaSession {
    http: Client,
    upload_url: String,
    upload_preset: String,
}

impl MediaSession {
    pub fn new(upload_url: impl Into<String>, upload_preset: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            upload_url: upload_url.into(),
            upload_preset: upload_preset.into(),
        }
    }

    /// One multipart POST: the image bytes plus the preset field. No retry,
    /// no chunking; a non-2xx answer surfaces the service's error body.
    pub async fn upload(&self, path: &Path) -> Result<UploadResult, UploadError> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|source| UploadError::UnreadableSource {
                path: path.to_path_buf(),
                source,
            })?;
        let filename = path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("capture.jpg")
            .to_string();

        let form = multipart::Form::new()
            .text("upload_preset", self.upload_preset.clone())
            .part("file", multipart::Part::bytes(bytes).file_name(filename));

        let response = self
            .http
            .post(&self.upload_url)
            .multipart(form)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(UploadError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        let result: UploadResult = response.json().await?;
        debug!(public_id = %result.public_id, "media: upload accepted");
        Ok(result)
    }
}

/// Seam the capture controller uploads through.
#[async_trait]
pub trait ImageUploader: Send + Sync {
    async fn upload(&self, path: &Path) -> Result<UploadResult, UploadError>;
}

#[async_trait]
impl ImageUploader for MediaSession {
    async fn upload(&self, path: &Path) -> Result<UploadResult, UploadError> {
        MediaSession::upload(self, path).await
    }
}

pub struct MissingUploader;

#[async_trait]
impl ImageUploader for MissingUploader {
    async fn upload(&self, _path: &Path) -> Result<UploadResult, UploadError> {
        Err(UploadError::NotConfigured)
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
