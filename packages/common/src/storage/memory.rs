use async_trait::async_trait;
use dashmap::DashMap;

use super::error::StorageError;
use super::id::BlobId;
use super::traits::{Blob, BlobInfo, BlobStore};

/// In-process blob store, for tests and throwaway runs.
#[derive(Default)]
pub struct MemoryBlobStore {
    blobs: DashMap<BlobId, Blob>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.blobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blobs.is_empty()
    }

    /// Drop a blob, leaving any reference to it dangling.
    pub fn remove(&self, id: &BlobId) -> bool {
        self.blobs.remove(id).is_some()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn put(&self, data: &[u8], filename: &str) -> Result<BlobId, StorageError> {
        let id = BlobId::generate();
        let blob = Blob {
            info: BlobInfo::describe(id, filename, data),
            data: data.to_vec(),
        };
        self.blobs.insert(id, blob);
        Ok(id)
    }

    async fn info(&self, id: &BlobId) -> Result<BlobInfo, StorageError> {
        self.blobs
            .get(id)
            .map(|b| b.info.clone())
            .ok_or_else(|| StorageError::NotFound(id.to_string()))
    }

    async fn read(&self, id: &BlobId) -> Result<Vec<u8>, StorageError> {
        self.blobs
            .get(id)
            .map(|b| b.data.clone())
            .ok_or_else(|| StorageError::NotFound(id.to_string()))
    }
}
