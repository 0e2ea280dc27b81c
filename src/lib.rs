pub mod config;
pub mod database;
pub mod entity;
pub mod error;
pub mod handlers;
pub mod models;
pub mod repository;
pub mod routes;
pub mod state;
pub mod storage;
pub mod supervisor;
pub mod utils;

use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable as ScalarServable};

use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Imagebin API",
        version = "1.0.0",
        description = "Image upload, listing and deletion backend"
    ),
    paths(
        handlers::health::liveness,
        handlers::image::upload_image,
        handlers::image::list_images,
        handlers::image::get_image,
        handlers::image::delete_image,
    ),
    components(schemas(
        error::ErrorBody,
        entity::image::ImageFormat,
        models::image::UploadResponse,
        models::image::ImageResponse,
        models::image::ImageListResponse,
        models::pagination::Pagination,
    )),
    tags(
        (name = "Images", description = "Upload, list, inspect and delete images"),
        (name = "Health", description = "Worker liveness"),
    ),
)]
struct ApiDoc;

/// Build one worker's application router.
pub fn build_router(state: AppState) -> axum::Router {
    routes::routes(&state.config)
        .with_state(state)
        .merge(Scalar::with_url("/scalar", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
}
