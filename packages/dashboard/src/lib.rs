pub mod client;
pub mod config;
pub mod error;
pub mod handlers;
pub mod state;
pub mod views;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Largest accepted insertion form, image included.
const UPLOAD_LIMIT: usize = 32 * 1024 * 1024;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route(
            "/records",
            post(handlers::create_record).layer(DefaultBodyLimit::max(UPLOAD_LIMIT)),
        )
        .route("/records/raw", post(handlers::insert_raw))
        .route("/records/delete", post(handlers::delete_record))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}
