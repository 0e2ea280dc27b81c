use axum::Router;
use axum::routing::{get, post};

use crate::config::AppConfig;
use crate::error::AppError;
use crate::handlers;
use crate::state::AppState;

/// Static route table, built once per worker at startup. Anything outside
/// the table (unknown path or unhandled method alike) is "not found".
pub fn routes(config: &AppConfig) -> Router<AppState> {
    let upload = Router::new()
        .route(
            "/upload/",
            post(handlers::image::upload_image).get(handlers::image::list_images),
        )
        .layer(handlers::image::upload_body_limit(
            config.storage.max_file_size,
        ));

    Router::new()
        .route("/", get(handlers::health::liveness))
        .route(
            "/upload/{filename}",
            get(handlers::image::get_image).delete(handlers::image::delete_image),
        )
        .merge(upload)
        .fallback(unmatched)
        .method_not_allowed_fallback(unmatched)
}

async fn unmatched() -> AppError {
    AppError::NotFound("Not found".into())
}
