use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_typed_multipart::TypedMultipartError;
use serde::Serialize;

use crate::service::{NotFound, RecordError};

/// Structured error response returned by all endpoints on failure.
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorBody {
    /// Machine-readable error code. One of: `VALIDATION_ERROR`, `NOT_FOUND`,
    /// `BARCODE_TAKEN`, `INTERNAL_ERROR`.
    #[schema(example = "NOT_FOUND")]
    pub code: &'static str,
    /// Human-readable error description.
    #[schema(example = "Data not found for this barcode.")]
    pub message: String,
}

/// Application-level error type.
#[derive(Debug)]
pub enum AppError {
    Validation(String),
    NotFound(String),
    /// An insert named a barcode that is already stored.
    BarcodeTaken(String),
    Internal(String),
}

impl AppError {
    fn status_and_body(self) -> (StatusCode, ErrorBody) {
        match self {
            AppError::Validation(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    code: "VALIDATION_ERROR",
                    message: msg,
                },
            ),
            AppError::NotFound(msg) => (
                StatusCode::NOT_FOUND,
                ErrorBody {
                    code: "NOT_FOUND",
                    message: msg,
                },
            ),
            AppError::BarcodeTaken(barcode) => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    code: "BARCODE_TAKEN",
                    message: format!("Barcode already exists: {barcode}"),
                },
            ),
            AppError::Internal(detail) => {
                tracing::error!("Internal error: {}", detail);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody {
                        code: "INTERNAL_ERROR",
                        message: "An unexpected error occurred".into(),
                    },
                )
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = self.status_and_body();
        (status, Json(body)).into_response()
    }
}

impl From<RecordError> for AppError {
    fn from(err: RecordError) -> Self {
        match err {
            RecordError::Conflict(barcode) => AppError::BarcodeTaken(barcode),
            RecordError::Validation(msg) => AppError::Validation(msg),
            RecordError::NotFound(not_found) => AppError::NotFound(not_found_message(&not_found)),
            RecordError::StoreUnavailable(detail) => AppError::Internal(detail),
        }
    }
}

/// Client-facing wording per lookup stage. All of them are plain 404s.
fn not_found_message(err: &NotFound) -> String {
    use crate::service::ImageLookupFailure::*;

    match err {
        NotFound::Record(_) => "Data not found.".into(),
        NotFound::Image { failure, .. } => match failure {
            UnknownBarcode => "Data not found for this barcode.".into(),
            MissingDataField => "No data field found for this barcode.".into(),
            NoBlobAttachment | MissingFileId => "No image found in data field.".into(),
            BlobUnreadable(e) => format!("Image file not found: {e}"),
        },
        NotFound::Blob { source, .. } => format!("Image not found: {source}"),
    }
}

impl From<TypedMultipartError> for AppError {
    fn from(err: TypedMultipartError) -> Self {
        AppError::Validation(err.to_string())
    }
}
