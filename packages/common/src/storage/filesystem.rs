use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;

use super::error::StorageError;
use super::id::BlobId;
use super::traits::{BlobInfo, BlobStore};

/// Filesystem-backed blob store.
///
/// Content lives at `{base_path}/{first 2 hex chars}/{remaining 30 hex chars}`
/// with a `.json` sidecar holding the [`BlobInfo`]. The sidecar is written
/// last, so a blob without one is treated as absent.
pub struct FilesystemBlobStore {
    base_path: PathBuf,
    max_size: u64,
}

impl FilesystemBlobStore {
    /// Create a new filesystem blob store.
    pub async fn new(base_path: PathBuf, max_size: u64) -> Result<Self, StorageError> {
        fs::create_dir_all(&base_path).await?;
        fs::create_dir_all(base_path.join(".tmp")).await?;
        Ok(Self {
            base_path,
            max_size,
        })
    }

    fn blob_path(&self, id: &BlobId) -> PathBuf {
        self.base_path.join(id.shard_prefix()).join(id.shard_suffix())
    }

    fn info_path(&self, id: &BlobId) -> PathBuf {
        self.blob_path(id).with_extension("json")
    }

    fn temp_path(&self) -> PathBuf {
        self.base_path
            .join(".tmp")
            .join(uuid::Uuid::new_v4().to_string())
    }

    /// Write through a temp file and rename into place.
    async fn write_atomic(&self, target: &Path, contents: &[u8]) -> Result<(), StorageError> {
        let temp_path = self.temp_path();
        if let Err(e) = fs::write(&temp_path, contents).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e.into());
        }

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).await?;
        }

        if let Err(e) = fs::rename(&temp_path, target).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e.into());
        }
        Ok(())
    }
}

#[async_trait]
impl BlobStore for FilesystemBlobStore {
    async fn put(&self, data: &[u8], filename: &str) -> Result<BlobId, StorageError> {
        if data.len() as u64 > self.max_size {
            return Err(StorageError::SizeLimitExceeded {
                actual: data.len() as u64,
                limit: self.max_size,
            });
        }

        let id = BlobId::generate();
        let info = BlobInfo::describe(id, filename, data);

        self.write_atomic(&self.blob_path(&id), data).await?;
        let sidecar = serde_json::to_vec(&info)?;
        if let Err(e) = self.write_atomic(&self.info_path(&id), &sidecar).await {
            let _ = fs::remove_file(self.blob_path(&id)).await;
            return Err(e);
        }

        tracing::debug!(blob_id = %id, size = info.length, "Stored blob");
        Ok(id)
    }

    async fn info(&self, id: &BlobId) -> Result<BlobInfo, StorageError> {
        match fs::read(self.info_path(id)).await {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(StorageError::NotFound(id.to_string())),
            Err(e) => Err(e.into()),
        }
    }

    async fn read(&self, id: &BlobId) -> Result<Vec<u8>, StorageError> {
        match fs::read(self.blob_path(id)).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(StorageError::NotFound(id.to_string())),
            Err(e) => Err(e.into()),
        }
    }
}
