use axum::Json;
use axum::extract::multipart::MultipartError;
use axum::extract::{DefaultBodyLimit, Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use chrono::Utc;
use tracing::instrument;

use crate::entity::image::ImageFormat;
use crate::error::{AppError, ErrorBody};
use crate::models::image::{ImageListResponse, ImageResponse, UploadResponse, image_url};
use crate::models::pagination::ListQuery;
use crate::repository::{ImageRepository, NewImage, RepositoryError};
use crate::state::AppState;
use crate::storage::ImageStore;
use crate::utils::filename::{is_safe_filename, storage_filename};

/// Body limit for the upload route: a few multiples of the file cap, so
/// that an oversized file still reaches the handler and gets a proper 400
/// instead of a bare 413 from the framing layer.
pub fn upload_body_limit(max_file_size: u64) -> DefaultBodyLimit {
    DefaultBodyLimit::max((max_file_size as usize).saturating_mul(4))
}

/// A validated upload, fully buffered but not yet written anywhere.
struct PendingUpload {
    original_name: String,
    format: ImageFormat,
    bytes: Vec<u8>,
}

#[utoipa::path(
    post,
    path = "/upload/",
    tag = "Images",
    operation_id = "uploadImage",
    summary = "Upload a single image",
    description = "Accepts one multipart `file` field of type image/jpeg, image/png or \
        image/gif, up to the configured size limit (1 MiB by default). The stored \
        filename is generated server-side; the image is then served at the returned URL \
        by the front proxy.",
    request_body(content_type = "multipart/form-data", description = "Single image file"),
    responses(
        (status = 201, description = "Image stored", body = UploadResponse),
        (status = 400, description = "Invalid content type or size", body = ErrorBody),
        (status = 500, description = "Storage or database failure", body = ErrorBody),
    ),
)]
#[instrument(skip(state, multipart))]
pub async fn upload_image(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    // All validation happens before any filesystem or database write.
    let upload = read_single_file(&mut multipart, state.config.storage.max_file_size).await?;

    let repo = ImageRepository::new(&*state.db);
    let size = upload.bytes.len() as i64;
    let new_image = |filename: &str| NewImage {
        filename: filename.to_string(),
        original_name: upload.original_name.clone(),
        size,
        file_type: upload.format,
        upload_time: Utc::now(),
    };

    // File first, row second. The filesystem cannot join the database
    // transaction, so a failed insert is compensated by deleting the file.
    let mut filename = storage_filename(&upload.original_name, upload.format);
    state.store.save(&filename, &upload.bytes).await?;

    let mut attempt = repo.insert(new_image(&filename)).await;
    if matches!(attempt, Err(RepositoryError::Conflict(_))) {
        // Vanishingly rare with UUID names; retry once with a fresh one.
        tracing::warn!(%filename, "generated filename collided, retrying with a fresh name");
        discard_file(&state.store, &filename).await;
        filename = storage_filename(&upload.original_name, upload.format);
        state.store.save(&filename, &upload.bytes).await?;
        attempt = repo.insert(new_image(&filename)).await;
    }

    match attempt {
        Ok(model) => {
            tracing::info!(filename = %model.filename, size, "image uploaded");
            Ok((
                StatusCode::CREATED,
                Json(UploadResponse {
                    url: image_url(&model.filename),
                    filename: model.filename,
                }),
            ))
        }
        Err(err) => {
            tracing::error!(%filename, error = %err, "metadata insert failed after file write");
            discard_file(&state.store, &filename).await;
            Err(err.into())
        }
    }
}

#[utoipa::path(
    get,
    path = "/upload/",
    tag = "Images",
    operation_id = "listImages",
    summary = "List images, newest first",
    description = "Paginated listing ordered by upload time. Invalid pagination \
        parameters fall back to defaults; an empty store yields an empty page, never \
        an error.",
    params(ListQuery),
    responses((status = 200, description = "One page of images", body = ImageListResponse)),
)]
#[instrument(skip(state, query))]
pub async fn list_images(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ImageListResponse>, AppError> {
    let req = query.resolve();
    let repo = ImageRepository::new(&*state.db);
    let (models, pagination) = repo.paginate(req).await?;

    tracing::info!(
        page = pagination.page,
        per_page = pagination.per_page,
        total = pagination.total,
        "listed images"
    );

    Ok(Json(ImageListResponse {
        items: models.into_iter().map(ImageResponse::from).collect(),
        pagination,
    }))
}

#[utoipa::path(
    get,
    path = "/upload/{filename}",
    tag = "Images",
    operation_id = "getImage",
    summary = "Fetch metadata for a stored image",
    params(("filename" = String, Path, description = "Generated storage filename")),
    responses(
        (status = 200, description = "Image record", body = ImageResponse),
        (status = 404, description = "Unknown filename", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn get_image(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<Json<ImageResponse>, AppError> {
    // Generated names are always flat and visible; anything else was
    // never stored, so it is simply not found.
    if !is_safe_filename(&filename) {
        return Err(not_found());
    }

    let repo = ImageRepository::new(&*state.db);
    let model = repo
        .find_by_filename(&filename)
        .await?
        .ok_or_else(not_found)?;

    Ok(Json(ImageResponse::from(model)))
}

#[utoipa::path(
    delete,
    path = "/upload/{filename}",
    tag = "Images",
    operation_id = "deleteImage",
    summary = "Delete an image",
    description = "Removes the metadata row first, then the file. Deleting the same \
        filename twice returns 404 the second time.",
    params(("filename" = String, Path, description = "Generated storage filename")),
    responses(
        (status = 204, description = "Image deleted"),
        (status = 404, description = "Unknown filename", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn delete_image(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    if !is_safe_filename(&filename) {
        return Err(not_found());
    }

    // Row first: once the row is gone the image is logically deleted, even
    // if the physical removal below fails. Under concurrent deletes at most
    // one request sees a removed row; the rest get 404.
    let repo = ImageRepository::new(&*state.db);
    let removed = repo.delete_by_filename(&filename).await?;
    if removed == 0 {
        return Err(not_found());
    }

    if let Err(err) = state.store.remove(&filename).await {
        tracing::warn!(%filename, error = %err, "row deleted but file removal failed, orphan left for cleanup");
    }

    tracing::info!(%filename, "image deleted");
    Ok(StatusCode::NO_CONTENT)
}

fn not_found() -> AppError {
    AppError::NotFound("Image not found".into())
}

/// Reads and validates the one multipart `file` field without touching
/// disk. A second file field, a missing or unsupported content type, an
/// empty payload or one over `max_size` all fail here, before any I/O.
async fn read_single_file(
    multipart: &mut Multipart,
    max_size: u64,
) -> Result<PendingUpload, AppError> {
    let mut upload: Option<PendingUpload> = None;

    while let Some(mut field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some("file") {
            continue; // Ignore unknown fields.
        }
        if upload.is_some() {
            return Err(AppError::Validation(
                "Only one file may be uploaded per request".into(),
            ));
        }

        let content_type = field
            .content_type()
            .map(str::to_owned)
            .ok_or_else(|| AppError::Validation("File field must declare a content type".into()))?;
        let format = ImageFormat::from_mime(&content_type).ok_or_else(|| {
            AppError::Validation(
                "Unsupported content type: expected image/jpeg, image/png or image/gif".into(),
            )
        })?;
        let original_name = field.file_name().unwrap_or("upload").to_string();

        let mut bytes = Vec::new();
        while let Some(chunk) = field.chunk().await.map_err(multipart_error)? {
            if (bytes.len() + chunk.len()) as u64 > max_size {
                return Err(AppError::Validation(format!(
                    "File exceeds maximum size of {max_size} bytes"
                )));
            }
            bytes.extend_from_slice(&chunk);
        }
        if bytes.is_empty() {
            return Err(AppError::Validation("Uploaded file is empty".into()));
        }

        upload = Some(PendingUpload {
            original_name,
            format,
            bytes,
        });
    }

    upload.ok_or_else(|| AppError::Validation("Missing 'file' field".into()))
}

/// Multipart failures are the client's doing, including the body-limit cut
/// on the upload route; all of them answer with the structured error body.
fn multipart_error(err: MultipartError) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::Validation("Request body too large".into())
    } else {
        AppError::Validation(format!("Multipart error: {err}"))
    }
}

async fn discard_file(store: &ImageStore, filename: &str) {
    if let Err(err) = store.remove(filename).await {
        tracing::warn!(%filename, error = %err, "failed to clean up file after aborted upload");
    }
}
