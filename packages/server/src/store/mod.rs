//! Record store client: exact-key access to the record collection.

mod memory;
mod sql;

use async_trait::async_trait;
use common::Record;

pub use memory::MemoryRecordStore;
pub use sql::SqlRecordStore;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The unique constraint on `barcode` rejected an insert.
    #[error("barcode already exists: {0}")]
    DuplicateBarcode(String),
    #[error("record store unavailable: {0}")]
    Unavailable(String),
    /// A stored document no longer parses as a record.
    #[error("corrupt record document: {0}")]
    Corrupt(String),
}

/// Records keyed by a unique barcode.
///
/// Documents cross this boundary with every extended-JSON id wrapper already
/// flattened to a plain string (see [`common::record::normalize_ids`]), and
/// with `_id` set to the store-assigned identifier.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn find_one(&self, barcode: &str) -> Result<Option<Record>, StoreError>;

    /// Every record, oldest first.
    async fn find_all(&self) -> Result<Vec<Record>, StoreError>;

    /// The oldest record, if any.
    async fn find_first(&self) -> Result<Option<Record>, StoreError>;

    /// Persist `record`, ignoring any `_id` it carries, and return the
    /// assigned id.
    async fn insert_one(&self, record: Record) -> Result<String, StoreError>;

    /// Number of records removed.
    async fn delete_one(&self, barcode: &str) -> Result<u64, StoreError>;
}
