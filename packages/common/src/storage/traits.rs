use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::error::StorageError;
use super::id::BlobId;

/// Descriptive metadata kept alongside every stored blob.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlobInfo {
    pub id: BlobId,
    /// Filename supplied at upload time.
    pub filename: String,
    /// MIME type guessed from the filename.
    pub content_type: String,
    pub length: u64,
    /// SHA-256 of the content, lowercase hex.
    pub checksum: String,
    pub uploaded_at: DateTime<Utc>,
}

impl BlobInfo {
    /// Describe `data` as it is about to be stored under `id`.
    pub fn describe(id: BlobId, filename: &str, data: &[u8]) -> Self {
        let content_type = mime_guess::from_path(filename)
            .first()
            .map(|m| m.to_string())
            .unwrap_or_else(|| "application/octet-stream".to_string());
        Self {
            id,
            filename: filename.to_string(),
            content_type,
            length: data.len() as u64,
            checksum: hex::encode(Sha256::digest(data)),
            uploaded_at: Utc::now(),
        }
    }
}

/// A blob read back from the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Blob {
    pub info: BlobInfo,
    pub data: Vec<u8>,
}

/// Storage for opaque binary objects addressed by an id assigned at store
/// time. No referential integrity is kept with whatever points at a blob.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store bytes under a fresh id.
    async fn put(&self, data: &[u8], filename: &str) -> Result<BlobId, StorageError>;

    /// Metadata for a stored blob.
    async fn info(&self, id: &BlobId) -> Result<BlobInfo, StorageError>;

    /// Raw content of a stored blob.
    async fn read(&self, id: &BlobId) -> Result<Vec<u8>, StorageError>;

    /// Metadata and content together. Fails with [`StorageError::NotFound`]
    /// when the id does not resolve.
    async fn get(&self, id: &BlobId) -> Result<Blob, StorageError> {
        let info = self.info(id).await?;
        let data = self.read(id).await?;
        Ok(Blob { info, data })
    }
}
