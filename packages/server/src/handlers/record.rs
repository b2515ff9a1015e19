use axum::Json;
use axum::body::Body;
use axum::extract::{DefaultBodyLimit, Path, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum_typed_multipart::BaseMultipart;
use common::Record;
use common::storage::Blob;
use tracing::instrument;

use crate::error::{AppError, ErrorBody};
use crate::extractors::document::JsonDocument;
use crate::extractors::query::QueryParams;
use crate::models::record::*;
use crate::state::AppState;

pub fn upload_body_limit(max_blob_size: u64) -> DefaultBodyLimit {
    // Headroom for the text fields and multipart framing.
    let limit = usize::try_from(max_blob_size).unwrap_or(usize::MAX);
    DefaultBodyLimit::max(limit.saturating_add(64 * 1024))
}

#[utoipa::path(
    get,
    path = "/retrieve_all",
    tag = "Records",
    operation_id = "retrieveAll",
    summary = "List every record",
    description = "Returns all stored records, oldest first, with identifiers in string form. \
        An empty store yields an empty array.",
    responses(
        (status = 200, description = "All records", body = Vec<RecordDoc>),
        (status = 500, description = "Record store unavailable (INTERNAL_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn retrieve_all(State(state): State<AppState>) -> Result<Json<Vec<Record>>, AppError> {
    Ok(Json(state.records.list_all().await?))
}

#[utoipa::path(
    get,
    path = "/retrieve/{barcode}",
    tag = "Records",
    operation_id = "retrieveRecord",
    summary = "Get a record by barcode",
    description = "Returns one record. A record stored without a metadata mapping is returned \
        with `meta` set to `{\"message\": \"No metadata available\"}`.",
    params(("barcode" = String, Path, description = "Record barcode")),
    responses(
        (status = 200, description = "Record", body = RecordDoc),
        (status = 404, description = "Unknown barcode (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn retrieve(
    State(state): State<AppState>,
    Path(barcode): Path<String>,
) -> Result<Json<Record>, AppError> {
    Ok(Json(state.records.get(&barcode).await?))
}

#[utoipa::path(
    get,
    path = "/retrieve_image/{barcode}",
    tag = "Records",
    operation_id = "retrieveImage",
    summary = "Get the image attached to a record",
    description = "Streams the blob referenced by the first `blob` entry in the record's `data`. \
        Returns 404 when the barcode is unknown, `data` is missing or not a list, no blob entry \
        with a `file_id` exists, or the referenced blob cannot be read.",
    params(("barcode" = String, Path, description = "Record barcode")),
    responses(
        (status = 200, description = "Image content"),
        (status = 404, description = "No image available (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn retrieve_image(
    State(state): State<AppState>,
    Path(barcode): Path<String>,
) -> Result<Response, AppError> {
    let blob = state.records.get_image(&barcode).await?;
    blob_response(blob)
}

#[utoipa::path(
    get,
    path = "/stream_image/{file_id}",
    tag = "Records",
    operation_id = "streamImage",
    summary = "Get a blob by id",
    params(("file_id" = String, Path, description = "Blob id from a record's `data` entry")),
    responses(
        (status = 200, description = "Blob content"),
        (status = 404, description = "Unknown or malformed id (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn stream_image(
    State(state): State<AppState>,
    Path(file_id): Path<String>,
) -> Result<Response, AppError> {
    let blob = state.records.get_blob(&file_id).await?;
    blob_response(blob)
}

#[utoipa::path(
    post,
    path = "/upload_image_gridfs",
    tag = "Records",
    operation_id = "uploadRecord",
    summary = "Insert a record from form fields",
    description = "Creates a record from the multipart fields `cow_id`, `birth_date`, `breed` and \
        `weight`, all optional, plus an optional `image_file`. The image is stored before the \
        record, and the record's `data` references it. Blank fields take default values.",
    params(UploadRecordQuery),
    request_body(content_type = "multipart/form-data", description = "Metadata fields with optional image"),
    responses(
        (status = 200, description = "Record inserted", body = UploadRecordResponse),
        (status = 400, description = "Barcode exists (BARCODE_TAKEN), or missing barcode or bad input (VALIDATION_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, query, form), fields(barcode = %query.barcode))]
pub async fn upload_image_gridfs(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<UploadRecordQuery>,
    form: BaseMultipart<UploadRecordForm, AppError>,
) -> Result<Json<UploadRecordResponse>, AppError> {
    let (fields, image) = form.data.into_parts();
    let record = state
        .records
        .insert_form(&query.barcode, fields, image)
        .await?;
    Ok(Json(UploadRecordResponse::from(&record)))
}

#[utoipa::path(
    post,
    path = "/insert_json",
    tag = "Records",
    operation_id = "insertJson",
    summary = "Insert a prepared document",
    description = "Stores an arbitrary JSON object verbatim. It must carry a non-empty string \
        `barcode`. No metadata defaults are applied. A barcode that already exists is rejected.",
    request_body(content = Object, description = "Record document"),
    responses(
        (status = 200, description = "Record inserted", body = RecordDoc),
        (status = 400, description = "Not a valid record (VALIDATION_ERROR) or barcode exists (BARCODE_TAKEN)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, document))]
pub async fn insert_json(
    State(state): State<AppState>,
    JsonDocument(document): JsonDocument,
) -> Result<Json<Record>, AppError> {
    Ok(Json(state.records.insert_raw(document).await?))
}

#[utoipa::path(
    delete,
    path = "/delete/{barcode}",
    tag = "Records",
    operation_id = "deleteRecord",
    summary = "Delete a record",
    description = "Removes the record. Its image blob is not deleted and stays reachable through \
        `/stream_image/{file_id}`.",
    params(("barcode" = String, Path, description = "Record barcode")),
    responses(
        (status = 200, description = "Record deleted", body = DeleteRecordResponse),
        (status = 404, description = "Unknown barcode (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn delete_record(
    State(state): State<AppState>,
    Path(barcode): Path<String>,
) -> Result<Json<DeleteRecordResponse>, AppError> {
    let deleted_count = state.records.delete(&barcode).await?;
    Ok(Json(DeleteRecordResponse { deleted_count }))
}

#[utoipa::path(
    get,
    path = "/test_store",
    tag = "Health",
    operation_id = "testStore",
    summary = "Check record store connectivity",
    responses(
        (status = 200, description = "Store reachable", body = StoreProbeResponse),
        (status = 500, description = "Store unreachable (INTERNAL_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn test_store(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let data = state.records.probe().await?;
    Ok((
        StatusCode::OK,
        Json(StoreProbeResponse {
            status: "success",
            data,
        }),
    ))
}

fn blob_response(blob: Blob) -> Result<Response, AppError> {
    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, &blob.info.content_type)
        .header(header::CONTENT_LENGTH, blob.data.len().to_string())
        .header(
            header::CONTENT_DISPOSITION,
            content_disposition_value(&blob.info.filename),
        )
        .header(header::ETAG, format!("\"{}\"", blob.info.checksum))
        .body(Body::from(blob.data))
        .map_err(|e| AppError::Internal(format!("Failed to build response: {e}")))
}

/// `inline` disposition with an ASCII-only filename.
fn content_disposition_value(filename: &str) -> String {
    let safe: String = filename
        .chars()
        .filter(|c| c.is_ascii_graphic() && !matches!(c, '"' | ';' | '\\'))
        .collect();
    if safe.is_empty() {
        "inline".to_string()
    } else {
        format!("inline; filename=\"{safe}\"")
    }
}
