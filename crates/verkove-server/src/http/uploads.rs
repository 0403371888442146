use axum::extract::multipart::MultipartRejection;
use axum::extract::rejection::PathRejection;
use axum::extract::{Multipart, Path, State};
use axum::http::header;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::{json, Value};
use tracing::info;
use verkove_core::images::mime_for;

use crate::{ApiError, AppState};

const FIELD: &str = "image";
const SVG: &str = "image/svg+xml";

/// Accepts one raster `image/*` file in the `image` field.
pub(crate) async fn upload_image(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<Value>, ApiError> {
    let mut multipart = multipart?;
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(FIELD) {
            continue;
        }
        let mime = field.content_type().unwrap_or_default().to_string();
        if !mime.starts_with("image/") {
            return Err(ApiError::UnsupportedMedia(
                "Only image files are allowed".to_string(),
            ));
        }
        // Scriptable, so never stored.
        if mime.starts_with(SVG) {
            return Err(ApiError::UnsupportedMedia(
                "SVG images are not allowed".to_string(),
            ));
        }
        let bytes = field.bytes().await?;
        if bytes.len() > state.config.max_upload_bytes {
            return Err(ApiError::PayloadTooLarge(format!(
                "File exceeds the {} byte upload limit",
                state.config.max_upload_bytes
            )));
        }
        let size = bytes.len();
        let image_url = state
            .images
            .save_async("upload", bytes.to_vec(), &mime)
            .await?;
        info!(image_url = %image_url, bytes = size, "image uploaded");
        return Ok(Json(json!({ "success": true, "imageUrl": image_url })));
    }
    Err(ApiError::BadRequest("No image file provided".to_string()))
}

pub(crate) async fn serve_upload(
    State(state): State<AppState>,
    file: Result<Path<String>, PathRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Path(file) = file?;
    let bytes = state.images.read_async(&file).await?;
    let mime = mime_for(&file);
    let disposition = if mime.starts_with(SVG) {
        "attachment"
    } else {
        "inline"
    };
    Ok((
        [
            (header::CONTENT_TYPE, mime),
            (header::X_CONTENT_TYPE_OPTIONS, "nosniff".to_string()),
            (header::CONTENT_DISPOSITION, disposition.to_string()),
        ],
        bytes,
    ))
}
