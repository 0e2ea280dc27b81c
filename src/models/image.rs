use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::entity::image::{self, ImageFormat};
use crate::models::pagination::Pagination;

/// Relative path under which the external proxy serves a stored file.
pub fn image_url(filename: &str) -> String {
    format!("/images/{filename}")
}

/// Response DTO for a successful upload.
#[derive(Serialize, utoipa::ToSchema)]
pub struct UploadResponse {
    /// Generated storage filename.
    #[schema(example = "cat_4a9f1c3e-0b1d-4b8e-9a2f-6d1a2b3c4d5e.png")]
    pub filename: String,
    /// Relative URL the image is served from.
    #[schema(example = "/images/cat_4a9f1c3e-0b1d-4b8e-9a2f-6d1a2b3c4d5e.png")]
    pub url: String,
}

/// Response DTO for a single image record.
#[derive(Serialize, utoipa::ToSchema)]
pub struct ImageResponse {
    pub id: i32,
    pub filename: String,
    /// Client-supplied name at upload time.
    #[schema(example = "cat.png")]
    pub original_name: String,
    /// Size in bytes.
    #[schema(example = 524288)]
    pub size: i64,
    pub upload_time: DateTime<Utc>,
    pub file_type: ImageFormat,
    pub url: String,
}

impl From<image::Model> for ImageResponse {
    fn from(model: image::Model) -> Self {
        let url = image_url(&model.filename);
        Self {
            id: model.id,
            filename: model.filename,
            original_name: model.original_name,
            size: model.size,
            upload_time: model.upload_time,
            file_type: model.file_type,
            url,
        }
    }
}

/// Response DTO for the paginated listing.
#[derive(Serialize, utoipa::ToSchema)]
pub struct ImageListResponse {
    pub items: Vec<ImageResponse>,
    pub pagination: Pagination,
}
