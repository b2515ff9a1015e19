use axum::body::Bytes;
use axum_typed_multipart::{FieldData, TryFromMultipart};
use common::{Attachment, Record};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::service::{ImageUpload, MetadataForm};

/// Shape of a stored record, for the API docs. Documents inserted through
/// `/insert_json` may carry further top-level fields, which are returned
/// unchanged.
#[derive(Serialize, utoipa::ToSchema)]
pub struct RecordDoc {
    /// Store-assigned identifier.
    #[serde(rename = "_id")]
    #[schema(example = "0192f0c4-6a1e-7c3b-9d2e-5f4a3b2c1d0e")]
    pub id: String,
    #[schema(example = "8801234567890")]
    pub barcode: String,
    /// Metadata mapping (`cow_id`, `birth_date`, `breed`, `weight`,
    /// `timestamp`). Single-record reads replace a missing value with
    /// `{"message": "No metadata available"}`.
    #[schema(value_type = Object)]
    pub meta: Value,
    /// Attachment descriptors. Blob references look like
    /// `{"type": "blob", "file_id": "...", "description": "..."}`.
    #[schema(value_type = Vec<Object>)]
    pub data: Value,
}

#[derive(Debug, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct UploadRecordQuery {
    /// Barcode of the new record.
    pub barcode: String,
}

/// Multipart body of the insertion form. Every field is optional.
#[derive(TryFromMultipart)]
pub struct UploadRecordForm {
    pub cow_id: Option<String>,
    pub birth_date: Option<String>,
    pub breed: Option<String>,
    pub weight: Option<String>,
    #[form_data(limit = "unlimited")]
    pub image_file: Option<FieldData<Bytes>>,
}

impl UploadRecordForm {
    pub fn into_parts(self) -> (MetadataForm, Option<ImageUpload>) {
        let image = self.image_file.map(|field| ImageUpload {
            filename: field.metadata.file_name.unwrap_or_default(),
            bytes: field.contents.to_vec(),
        });
        let form = MetadataForm {
            cow_id: self.cow_id,
            birth_date: self.birth_date,
            breed: self.breed,
            weight: self.weight,
        };
        (form, image)
    }
}

/// Summary returned after a form insert.
#[derive(Serialize, utoipa::ToSchema)]
pub struct UploadRecordResponse {
    #[schema(example = "Record inserted successfully")]
    pub message: String,
    pub barcode: String,
    /// Store-assigned record id.
    pub id: Option<String>,
    /// Blob id of the stored image, when one was uploaded.
    pub file_id: Option<String>,
}

impl From<&Record> for UploadRecordResponse {
    fn from(record: &Record) -> Self {
        let file_id = record.attachments().and_then(|attachments| {
            attachments.into_iter().find_map(|a| match a {
                Attachment::Blob { file_id, .. } => file_id,
                Attachment::Other(_) => None,
            })
        });
        Self {
            message: "Record inserted successfully".into(),
            barcode: record.barcode.clone(),
            id: record.id.clone(),
            file_id,
        }
    }
}

#[derive(Serialize, Deserialize, utoipa::ToSchema)]
pub struct DeleteRecordResponse {
    #[schema(example = 1)]
    pub deleted_count: u64,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct StoreProbeResponse {
    #[schema(example = "success")]
    pub status: &'static str,
    /// The oldest stored record, or null when the store is empty.
    #[schema(value_type = Option<Object>)]
    pub data: Option<Record>,
}
