use async_trait::async_trait;
use common::Record;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{RecordStore, StoreError};

/// In-process record store with the same uniqueness rule as the SQL store.
#[derive(Default)]
pub struct MemoryRecordStore {
    records: RwLock<Vec<Record>>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn find_one(&self, barcode: &str) -> Result<Option<Record>, StoreError> {
        let records = self.records.read().await;
        Ok(records.iter().find(|r| r.barcode == barcode).cloned())
    }

    async fn find_all(&self) -> Result<Vec<Record>, StoreError> {
        Ok(self.records.read().await.clone())
    }

    async fn find_first(&self) -> Result<Option<Record>, StoreError> {
        Ok(self.records.read().await.first().cloned())
    }

    async fn insert_one(&self, record: Record) -> Result<String, StoreError> {
        let mut stored = Record::from_document(record.to_document())
            .map_err(|e| StoreError::Corrupt(e.to_string()))?;

        let mut records = self.records.write().await;
        if records.iter().any(|r| r.barcode == stored.barcode) {
            return Err(StoreError::DuplicateBarcode(stored.barcode));
        }

        let id = Uuid::now_v7().to_string();
        stored.id = Some(id.clone());
        records.push(stored);
        Ok(id)
    }

    async fn delete_one(&self, barcode: &str) -> Result<u64, StoreError> {
        let mut records = self.records.write().await;
        let before = records.len();
        records.retain(|r| r.barcode != barcode);
        Ok((before - records.len()) as u64)
    }
}
