//! Record service: the policy layer between the HTTP surface and the two
//! stores.
//!
//! Blob references are not kept consistent with the blob store. A record may
//! point at a blob that no longer exists, and deleting a record leaves its
//! blob in place. Reads treat both as ordinary not-found conditions.

use std::sync::Arc;

use chrono::{SecondsFormat, Utc};
use common::record::DocumentError;
use common::storage::{Blob, BlobId, BlobStore, StorageError};
use common::{Attachment, Metadata, Record};
use serde_json::Value;
use tracing::{info, instrument, warn};

use crate::store::{RecordStore, StoreError};

#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    #[error("barcode already exists: {0}")]
    Conflict(String),
    #[error(transparent)]
    NotFound(#[from] NotFound),
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    StoreUnavailable(String),
}

#[derive(Debug, thiserror::Error)]
pub enum NotFound {
    #[error("no record with barcode {0}")]
    Record(String),
    #[error("no image for barcode {barcode}: {failure}")]
    Image {
        barcode: String,
        failure: ImageLookupFailure,
    },
    #[error("blob {id} not found: {source}")]
    Blob {
        id: String,
        #[source]
        source: StorageError,
    },
}

/// Where image resolution stopped. Every variant surfaces as
/// [`RecordError::NotFound`]; the distinction is kept for diagnostics.
#[derive(Debug, thiserror::Error)]
pub enum ImageLookupFailure {
    #[error("record does not exist")]
    UnknownBarcode,
    #[error("record has no data sequence")]
    MissingDataField,
    #[error("no blob attachment in data")]
    NoBlobAttachment,
    #[error("blob attachment has no file_id")]
    MissingFileId,
    #[error("blob could not be read: {0}")]
    BlobUnreadable(#[source] StorageError),
}

impl ImageLookupFailure {
    /// Resolution stage that failed: record, data, attachment or blob.
    pub fn stage(&self) -> &'static str {
        match self {
            Self::UnknownBarcode => "record",
            Self::MissingDataField => "data",
            Self::NoBlobAttachment | Self::MissingFileId => "attachment",
            Self::BlobUnreadable(_) => "blob",
        }
    }
}

impl From<StoreError> for RecordError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateBarcode(barcode) => RecordError::Conflict(barcode),
            other => RecordError::StoreUnavailable(other.to_string()),
        }
    }
}

impl From<DocumentError> for RecordError {
    fn from(err: DocumentError) -> Self {
        RecordError::Validation(err.to_string())
    }
}

/// Metadata fields as submitted by the insertion form. Blank values count as
/// absent.
#[derive(Debug, Clone, Default)]
pub struct MetadataForm {
    pub cow_id: Option<String>,
    pub birth_date: Option<String>,
    pub breed: Option<String>,
    pub weight: Option<String>,
}

impl MetadataForm {
    fn into_metadata(self, timestamp: String) -> Result<Metadata, RecordError> {
        let weight = match non_blank(self.weight) {
            Some(w) => Some(w.parse::<i64>().map_err(|_| {
                RecordError::Validation(format!("Weight must be a whole number, got {w:?}"))
            })?),
            None => None,
        };
        Ok(Metadata {
            cow_id: non_blank(self.cow_id),
            birth_date: non_blank(self.birth_date),
            breed: non_blank(self.breed),
            weight,
            timestamp: Some(timestamp),
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// An image submitted with the insertion form.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub filename: String,
    pub bytes: Vec<u8>,
}

#[derive(Clone)]
pub struct RecordService {
    records: Arc<dyn RecordStore>,
    blobs: Arc<dyn BlobStore>,
}

impl RecordService {
    pub fn new(records: Arc<dyn RecordStore>, blobs: Arc<dyn BlobStore>) -> Self {
        Self { records, blobs }
    }

    /// Insert a record built from form fields, storing `image` first.
    ///
    /// A failed image write aborts before any record is written. An empty
    /// image counts as no image.
    #[instrument(skip(self, form, image))]
    pub async fn insert_form(
        &self,
        barcode: &str,
        form: MetadataForm,
        image: Option<ImageUpload>,
    ) -> Result<Record, RecordError> {
        let barcode = validate_barcode(barcode)?;
        if self.records.find_one(barcode).await?.is_some() {
            return Err(RecordError::Conflict(barcode.to_string()));
        }

        let timestamp = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);
        let meta = form.into_metadata(timestamp)?;

        let data = match image.filter(|i| !i.bytes.is_empty()) {
            Some(image) => {
                let filename = if image.filename.trim().is_empty() {
                    barcode.to_string()
                } else {
                    image.filename
                };
                let file_id = self
                    .blobs
                    .put(&image.bytes, &filename)
                    .await
                    .map_err(blob_write_error)?;
                info!(%file_id, size = image.bytes.len(), "Stored image");
                vec![Attachment::blob(
                    file_id.to_string(),
                    format!("Image for barcode {barcode}"),
                )]
            }
            None => Vec::new(),
        };

        let mut record = Record::new(barcode, meta.to_value(), data);
        let id = self.records.insert_one(record.clone()).await?;
        record.id = Some(id);
        info!(id = ?record.id, "Inserted record");
        Ok(record)
    }

    /// Persist an externally prepared document as-is.
    ///
    /// Unlike [`insert_form`](Self::insert_form) there is no existence check
    /// before the write and no metadata defaulting. Duplicate barcodes are
    /// still rejected, by the store's unique constraint. The barcode is
    /// trimmed the same way as on the form path.
    #[instrument(skip(self, document))]
    pub async fn insert_raw(&self, document: Value) -> Result<Record, RecordError> {
        let mut record = Record::from_document(document)?;
        record.barcode = validate_barcode(&record.barcode)?.to_string();

        let id = self
            .records
            .insert_one(record.clone())
            .await
            .map_err(RecordError::from)
            .inspect_err(|e| {
                if let RecordError::Conflict(barcode) = e {
                    warn!(%barcode, "Raw insert hit an existing barcode");
                }
            })?;
        record.id = Some(id);
        info!(barcode = %record.barcode, id = ?record.id, "Inserted raw record");
        Ok(record)
    }

    /// Look up one record. `meta` is always present in the result.
    pub async fn get(&self, barcode: &str) -> Result<Record, RecordError> {
        let mut record = self
            .records
            .find_one(barcode)
            .await?
            .ok_or_else(|| NotFound::Record(barcode.to_string()))?;
        record.fill_missing_meta();
        Ok(record)
    }

    pub async fn list_all(&self) -> Result<Vec<Record>, RecordError> {
        Ok(self.records.find_all().await?)
    }

    /// Resolve a record's image: record, then `data`, then the first blob
    /// attachment, then the blob itself.
    #[instrument(skip(self))]
    pub async fn get_image(&self, barcode: &str) -> Result<Blob, RecordError> {
        let outcome = match self.records.find_one(barcode).await? {
            Some(record) => self.resolve_image(&record).await,
            None => Err(ImageLookupFailure::UnknownBarcode),
        };

        outcome.map_err(|failure| {
            warn!(stage = failure.stage(), error = %failure, "Image lookup failed");
            RecordError::NotFound(NotFound::Image {
                barcode: barcode.to_string(),
                failure,
            })
        })
    }

    async fn resolve_image(&self, record: &Record) -> Result<Blob, ImageLookupFailure> {
        let attachments = record
            .attachments()
            .ok_or(ImageLookupFailure::MissingDataField)?;

        let file_id = attachments
            .into_iter()
            .find_map(|a| match a {
                Attachment::Blob { file_id, .. } => Some(file_id),
                Attachment::Other(_) => None,
            })
            .ok_or(ImageLookupFailure::NoBlobAttachment)?
            .ok_or(ImageLookupFailure::MissingFileId)?;

        let id = BlobId::parse(&file_id).map_err(ImageLookupFailure::BlobUnreadable)?;
        self.blobs
            .get(&id)
            .await
            .map_err(ImageLookupFailure::BlobUnreadable)
    }

    /// Fetch a blob directly by id.
    pub async fn get_blob(&self, file_id: &str) -> Result<Blob, RecordError> {
        let not_found = |source: StorageError| NotFound::Blob {
            id: file_id.to_string(),
            source,
        };
        let id = BlobId::parse(file_id).map_err(not_found)?;
        match self.blobs.get(&id).await {
            Ok(blob) => Ok(blob),
            Err(err @ StorageError::NotFound(_)) => Err(not_found(err).into()),
            Err(err) => Err(RecordError::StoreUnavailable(err.to_string())),
        }
    }

    /// Delete by barcode. The referenced blob, if any, is left in the blob
    /// store.
    #[instrument(skip(self))]
    pub async fn delete(&self, barcode: &str) -> Result<u64, RecordError> {
        let deleted = self.records.delete_one(barcode).await?;
        if deleted == 0 {
            return Err(NotFound::Record(barcode.to_string()).into());
        }
        info!(deleted, "Deleted record");
        Ok(deleted)
    }

    /// Read one record to check that the record store answers.
    pub async fn probe(&self) -> Result<Option<Record>, RecordError> {
        Ok(self.records.find_first().await?)
    }
}

fn validate_barcode(barcode: &str) -> Result<&str, RecordError> {
    let barcode = barcode.trim();
    if barcode.is_empty() {
        return Err(RecordError::Validation("Barcode must not be empty".into()));
    }
    Ok(barcode)
}

fn blob_write_error(err: StorageError) -> RecordError {
    match err {
        StorageError::SizeLimitExceeded { .. } => RecordError::Validation(err.to_string()),
        other => RecordError::StoreUnavailable(format!("Failed to store image: {other}")),
    }
}
