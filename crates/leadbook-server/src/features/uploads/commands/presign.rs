use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::storage::Storage;

pub const MAX_FILENAME_LENGTH: usize = 255;

#[derive(Debug, Clone, Deserialize)]
pub struct PresignUploadCommand {
    pub filename: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PresignUploadResponse {
    pub url: String,
    pub key: String,
    /// Seconds.
    pub expires_in: u64,
}

#[derive(Debug, thiserror::Error)]
pub enum PresignUploadError {
    #[error("Filename is required and cannot be empty")]
    FilenameRequired,
    #[error("Filename must not exceed 255 characters")]
    FilenameLength,
    #[error("Filename must not contain path segments")]
    FilenamePath,
    #[error("Storage error: {0}")]
    Storage(#[from] anyhow::Error),
}

impl PresignUploadCommand {
    pub fn validate(&self) -> Result<(), PresignUploadError> {
        let filename = self.filename.trim();
        if filename.is_empty() {
            return Err(PresignUploadError::FilenameRequired);
        }
        if filename.len() > MAX_FILENAME_LENGTH {
            return Err(PresignUploadError::FilenameLength);
        }
        if filename.contains("..") || filename.starts_with('/') || filename.contains('\\') {
            return Err(PresignUploadError::FilenamePath);
        }
        Ok(())
    }

    /// Each upload lands under its own prefix so equal filenames never collide.
    pub fn object_key(&self) -> String {
        format!("uploads/{}/{}", Uuid::new_v4(), self.filename.trim())
    }
}

#[tracing::instrument(skip(storage))]
pub async fn handle(
    storage: &Storage,
    command: PresignUploadCommand,
) -> Result<PresignUploadResponse, PresignUploadError> {
    command.validate()?;

    let upload = storage.presign_put(&command.object_key()).await?;
    tracing::info!(key = %upload.key, "Issued presigned upload URL");

    Ok(PresignUploadResponse {
        url: upload.url,
        key: upload.key,
        expires_in: upload.expires_in.as_secs(),
    })
}
