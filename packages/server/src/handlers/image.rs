use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{StatusCode, header};
use axum::response::Response;
use tokio_util::io::ReaderStream;
use tracing::instrument;
use uuid::Uuid;

use crate::error::{AppError, ErrorBody};
use crate::state::AppState;
use crate::utils::image;

/// Blob-backed images are immutable, so clients may cache them for a year.
const IMAGE_CACHE_CONTROL: &str = "public, max-age=31536000";

#[utoipa::path(
    get,
    path = "/portfolio/image/{fileId}",
    tag = "Images",
    operation_id = "getImage",
    summary = "Download an uploaded image",
    description = "Streams the image bytes with their stored content type. Malformed, \
        unknown or unreadable references all return 404.",
    params(("fileId" = String, Path, description = "Image ID (UUID) from `imageId`")),
    responses(
        (status = 200, description = "Image content"),
        (status = 404, description = "Image not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state), fields(file_id = %file_id))]
pub async fn get_image(
    State(state): State<AppState>,
    Path(file_id): Path<String>,
) -> Result<Response, AppError> {
    let id = Uuid::parse_str(&file_id)
        .map_err(|_| AppError::NotFound("Image not found".into()))?;

    let stored = image::open(&state.db, &*state.blob_store, id).await?;
    let body = Body::from_stream(ReaderStream::new(stored.reader));

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, stored.content_type)
        .header(header::CONTENT_LENGTH, stored.size.to_string())
        .header(header::CACHE_CONTROL, IMAGE_CACHE_CONTROL)
        .body(body)
        .map_err(|e| AppError::Internal(format!("Failed to build response: {e}")))
}
