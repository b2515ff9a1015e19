use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use common::{Metadata, Record};
use handlebars::Handlebars;
use serde::Serialize;
use serde_json::json;

use crate::client::Image;

const PAGE: &str = "page";

pub const TITLE: &str = "Cow Data Viewer";

/// Compiled page templates.
pub struct Views {
    registry: Handlebars<'static>,
}

impl Views {
    pub fn new() -> Result<Self, handlebars::TemplateError> {
        let mut registry = Handlebars::new();
        registry.set_strict_mode(true);
        registry.register_partial("header", include_str!("../templates/partials/header.hbs"))?;
        registry.register_partial("footer", include_str!("../templates/partials/footer.hbs"))?;
        registry.register_template_string(PAGE, include_str!("../templates/page.hbs"))?;
        Ok(Self { registry })
    }

    pub fn render_page(&self, page: &PageView) -> Result<String, handlebars::RenderError> {
        self.registry.render(PAGE, page)
    }
}

#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FlashKind {
    Success,
    Error,
}

#[derive(Debug, Serialize)]
pub struct Flash {
    pub kind: FlashKind,
    pub message: String,
}

impl Flash {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: FlashKind::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: FlashKind::Error,
            message: message.into(),
        }
    }
}

/// One line of the summary table.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct MetadataRow {
    pub barcode: String,
    pub cow_id: String,
    pub birth_date: String,
    pub breed: String,
    pub weight: i64,
    pub timestamp: String,
}

impl From<&Record> for MetadataRow {
    fn from(record: &Record) -> Self {
        let meta = record.metadata().unwrap_or_default();
        Self {
            barcode: record.barcode.clone(),
            cow_id: meta.cow_id().to_string(),
            birth_date: meta.birth_date().to_string(),
            breed: meta.breed().to_string(),
            weight: meta.weight(),
            timestamp: meta.timestamp().to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct BarcodeOption {
    pub value: String,
    pub selected: bool,
}

#[derive(Debug, Serialize, Default)]
pub struct DetailView {
    pub barcode: String,
    pub meta_json: Option<String>,
    pub meta_notice: Option<String>,
    /// `data:` URI of the record's image.
    pub image_src: Option<String>,
    pub image_notice: Option<String>,
}

impl DetailView {
    pub fn new(barcode: impl Into<String>) -> Self {
        Self {
            barcode: barcode.into(),
            ..Default::default()
        }
    }

    pub fn with_meta(mut self, record: &Record) -> Self {
        let meta = record.meta.clone().unwrap_or_else(|| json!({}));
        self.meta_json = serde_json::to_string_pretty(&meta).ok();
        self
    }

    pub fn with_image(mut self, image: &Image) -> Self {
        self.image_src = Some(data_uri(image));
        self
    }
}

#[derive(Debug, Serialize)]
pub struct PageView {
    pub title: &'static str,
    pub flash: Option<Flash>,
    /// Set when the listing could not be fetched.
    pub error: Option<String>,
    pub count: usize,
    pub rows: Vec<MetadataRow>,
    pub barcodes: Vec<BarcodeOption>,
    pub detail: Option<DetailView>,
    pub raw_document: String,
}

impl PageView {
    pub fn new(records: &[Record], selected: Option<&str>) -> Self {
        Self {
            title: TITLE,
            flash: None,
            error: None,
            count: records.len(),
            rows: records.iter().map(MetadataRow::from).collect(),
            barcodes: records
                .iter()
                .map(|r| BarcodeOption {
                    value: r.barcode.clone(),
                    selected: Some(r.barcode.as_str()) == selected,
                })
                .collect(),
            detail: None,
            raw_document: raw_document_example(),
        }
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        let mut page = Self::new(&[], None);
        page.error = Some(message.into());
        page
    }
}

fn raw_document_example() -> String {
    let example = json!({
        "barcode": "",
        "meta": Metadata::default().to_value(),
        "data": [],
    });
    serde_json::to_string_pretty(&example).unwrap_or_default()
}

pub fn data_uri(image: &Image) -> String {
    format!(
        "data:{};base64,{}",
        image.content_type,
        STANDARD.encode(&image.bytes)
    )
}
