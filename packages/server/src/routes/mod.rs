use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::config::AppConfig;
use crate::handlers::record;
use crate::state::AppState;

pub fn api_routes(config: &AppConfig) -> OpenApiRouter<AppState> {
    let reads = OpenApiRouter::new()
        .routes(routes!(record::retrieve_all))
        .routes(routes!(record::retrieve))
        .routes(routes!(record::retrieve_image))
        .routes(routes!(record::stream_image))
        .routes(routes!(record::test_store));

    let writes = OpenApiRouter::new()
        .routes(routes!(record::insert_json))
        .routes(routes!(record::delete_record));

    let upload = OpenApiRouter::new()
        .routes(routes!(record::upload_image_gridfs))
        .layer(record::upload_body_limit(config.storage.max_blob_size));

    reads.merge(writes).merge(upload)
}
