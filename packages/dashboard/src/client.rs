//! HTTP client for the records API.

use std::time::Duration;

use common::Record;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response, StatusCode, Url};
use serde::Deserialize;
use serde_json::Value;

use crate::config::ApiConfig;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("invalid API base URL: {0}")]
    BaseUrl(String),
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    /// The API answered with an error body.
    #[error("{message}")]
    Server {
        status: StatusCode,
        code: String,
        message: String,
    },
}

impl ApiError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::Server { status, .. } if *status == StatusCode::NOT_FOUND)
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    code: String,
    message: String,
}

/// Summary returned by the form insert.
#[derive(Debug, Deserialize)]
pub struct UploadSummary {
    pub message: String,
    pub barcode: String,
    pub file_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DeleteSummary {
    deleted_count: u64,
}

/// Text fields of the insertion form, forwarded as given.
#[derive(Debug, Default, Clone)]
pub struct NewRecord {
    pub barcode: String,
    pub cow_id: Option<String>,
    pub birth_date: Option<String>,
    pub breed: Option<String>,
    pub weight: Option<String>,
}

pub struct ImageFile {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// Image bytes fetched from the API.
#[derive(Debug, Clone)]
pub struct Image {
    pub content_type: String,
    pub bytes: Vec<u8>,
}

#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    base: Url,
}

impl ApiClient {
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        let base = Url::parse(&config.base_url).map_err(|e| ApiError::BaseUrl(e.to_string()))?;
        if base.cannot_be_a_base() {
            return Err(ApiError::BaseUrl(config.base_url.clone()));
        }
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { http, base })
    }

    /// Base URL joined with percent-encoded path segments.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    pub async fn list_records(&self) -> Result<Vec<Record>, ApiError> {
        let res = self.http.get(self.endpoint(&["retrieve_all"])).send().await?;
        Ok(check(res).await?.json().await?)
    }

    pub async fn get_record(&self, barcode: &str) -> Result<Record, ApiError> {
        let res = self
            .http
            .get(self.endpoint(&["retrieve", barcode]))
            .send()
            .await?;
        Ok(check(res).await?.json().await?)
    }

    pub async fn get_image(&self, barcode: &str) -> Result<Image, ApiError> {
        let res = self
            .http
            .get(self.endpoint(&["retrieve_image", barcode]))
            .send()
            .await?;
        let res = check(res).await?;
        let content_type = res
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("application/octet-stream")
            .to_string();
        let bytes = res.bytes().await?.to_vec();
        Ok(Image {
            content_type,
            bytes,
        })
    }

    pub async fn upload_record(
        &self,
        record: NewRecord,
        image: Option<ImageFile>,
    ) -> Result<UploadSummary, ApiError> {
        let mut url = self.endpoint(&["upload_image_gridfs"]);
        url.query_pairs_mut().append_pair("barcode", &record.barcode);

        let mut form = Form::new();
        for (name, value) in [
            ("cow_id", record.cow_id),
            ("birth_date", record.birth_date),
            ("breed", record.breed),
            ("weight", record.weight),
        ] {
            if let Some(value) = value {
                form = form.text(name, value);
            }
        }
        if let Some(image) = image {
            form = form.part("image_file", Part::bytes(image.bytes).file_name(image.filename));
        }

        let res = self.http.post(url).multipart(form).send().await?;
        Ok(check(res).await?.json().await?)
    }

    pub async fn insert_raw(&self, document: &Value) -> Result<Record, ApiError> {
        let res = self
            .http
            .post(self.endpoint(&["insert_json"]))
            .json(document)
            .send()
            .await?;
        Ok(check(res).await?.json().await?)
    }

    pub async fn delete_record(&self, barcode: &str) -> Result<u64, ApiError> {
        let res = self
            .http
            .delete(self.endpoint(&["delete", barcode]))
            .send()
            .await?;
        let summary: DeleteSummary = check(res).await?.json().await?;
        Ok(summary.deleted_count)
    }
}

/// Turn a non-success response into [`ApiError::Server`].
async fn check(res: Response) -> Result<Response, ApiError> {
    let status = res.status();
    if status.is_success() {
        return Ok(res);
    }
    let text = res.text().await.unwrap_or_default();
    let (code, message) = match serde_json::from_str::<ErrorBody>(&text) {
        Ok(body) => (body.code, body.message),
        Err(_) if text.is_empty() => ("HTTP_ERROR".to_string(), status.to_string()),
        Err(_) => ("HTTP_ERROR".to_string(), text),
    };
    Err(ApiError::Server {
        status,
        code,
        message,
    })
}
