use axum::Form;
use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::response::Html;
use axum_typed_multipart::{FieldData, TryFromMultipart, TypedMultipart};
use serde::Deserialize;
use serde_json::Value;
use tracing::{instrument, warn};

use crate::client::{ImageFile, NewRecord};
use crate::error::DashboardError;
use crate::state::AppState;
use crate::views::{DetailView, Flash, PageView};

type PageResult = Result<Html<String>, DashboardError>;

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub barcode: Option<String>,
}

#[derive(TryFromMultipart)]
pub struct InsertForm {
    pub barcode: String,
    pub cow_id: Option<String>,
    pub birth_date: Option<String>,
    pub breed: Option<String>,
    pub weight: Option<String>,
    #[form_data(limit = "unlimited")]
    pub image_file: Option<FieldData<Bytes>>,
}

#[derive(Debug, Deserialize)]
pub struct RawForm {
    pub document: String,
}

#[derive(Debug, Deserialize)]
pub struct DeleteForm {
    pub barcode: String,
}

#[instrument(skip(state))]
pub async fn index(State(state): State<AppState>, Query(query): Query<PageQuery>) -> PageResult {
    render(&state, query.barcode, None).await
}

#[instrument(skip_all)]
pub async fn create_record(
    State(state): State<AppState>,
    TypedMultipart(form): TypedMultipart<InsertForm>,
) -> PageResult {
    let barcode = form.barcode.trim().to_string();
    // Browsers send an empty part when no file was chosen.
    let image = form
        .image_file
        .filter(|f| !f.contents.is_empty())
        .map(|f| ImageFile {
            filename: f.metadata.file_name.unwrap_or_default(),
            bytes: f.contents.to_vec(),
        });
    let record = NewRecord {
        barcode: barcode.clone(),
        cow_id: form.cow_id,
        birth_date: form.birth_date,
        breed: form.breed,
        weight: form.weight,
    };

    match state.api.upload_record(record, image).await {
        Ok(summary) => {
            let flash = Flash::success(format!("{}: {}", summary.message, summary.barcode));
            render(&state, Some(summary.barcode), Some(flash)).await
        }
        Err(e) => {
            warn!(%barcode, error = %e, "Insert failed");
            render(&state, None, Some(Flash::error(e.to_string()))).await
        }
    }
}

#[instrument(skip_all)]
pub async fn insert_raw(State(state): State<AppState>, Form(form): Form<RawForm>) -> PageResult {
    let document: Value = match serde_json::from_str(&form.document) {
        Ok(document) => document,
        Err(e) => {
            let flash = Flash::error(format!("Invalid JSON: {e}"));
            return render(&state, None, Some(flash)).await;
        }
    };

    match state.api.insert_raw(&document).await {
        Ok(record) => {
            let flash = Flash::success(format!("Document inserted: {}", record.barcode));
            render(&state, Some(record.barcode), Some(flash)).await
        }
        Err(e) => {
            warn!(error = %e, "Raw insert failed");
            render(&state, None, Some(Flash::error(e.to_string()))).await
        }
    }
}

#[instrument(skip(state))]
pub async fn delete_record(
    State(state): State<AppState>,
    Form(form): Form<DeleteForm>,
) -> PageResult {
    let flash = match state.api.delete_record(&form.barcode).await {
        Ok(count) => Flash::success(format!("Deleted {count} record(s) for {}", form.barcode)),
        Err(e) => {
            warn!(barcode = %form.barcode, error = %e, "Delete failed");
            Flash::error(e.to_string())
        }
    };
    render(&state, None, Some(flash)).await
}

/// Fetch the listing and the selected record, then render the page.
/// Selection falls back to the first listed barcode.
async fn render(state: &AppState, selected: Option<String>, flash: Option<Flash>) -> PageResult {
    let mut page = match state.api.list_records().await {
        Ok(records) => {
            let selected = selected
                .filter(|b| !b.is_empty())
                .or_else(|| records.first().map(|r| r.barcode.clone()));
            let mut page = PageView::new(&records, selected.as_deref());
            if let Some(barcode) = selected {
                page.detail = Some(detail(state, barcode).await);
            }
            page
        }
        Err(e) => {
            warn!(error = %e, "Failed to list records");
            PageView::unavailable(format!("Failed to fetch data: {e}"))
        }
    };
    page.flash = flash;
    Ok(Html(state.views.render_page(&page)?))
}

async fn detail(state: &AppState, barcode: String) -> DetailView {
    let (record, image) = tokio::join!(
        state.api.get_record(&barcode),
        state.api.get_image(&barcode)
    );

    let mut view = DetailView::new(barcode);
    view = match record {
        Ok(record) => view.with_meta(&record),
        Err(e) => {
            view.meta_notice = Some(format!("Failed to fetch metadata: {e}"));
            view
        }
    };
    match image {
        Ok(image) => view.with_image(&image),
        Err(e) if e.is_not_found() => {
            view.image_notice = Some(format!("No image available for this barcode. {e}"));
            view
        }
        Err(e) => {
            view.image_notice = Some(format!("Failed to fetch image: {e}"));
            view
        }
    }
}
