use axum::{
    Json,
    extract::{FromRequest, Request, rejection::JsonRejection},
};
use serde_json::Value;

use crate::error::AppError;

/// A JSON request body that must be an object. Parse failures and other
/// top-level shapes become `AppError::Validation`, so clients always get a
/// structured error body.
pub struct JsonDocument(pub Value);

impl<S> FromRequest<S> for JsonDocument
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value): Json<Value> = Json::from_request(req, state)
            .await
            .map_err(|e: JsonRejection| AppError::Validation(e.body_text()))?;

        if !value.is_object() {
            return Err(AppError::Validation(
                "Request body must be a JSON object".into(),
            ));
        }
        Ok(JsonDocument(value))
    }
}
