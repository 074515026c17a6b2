use crate::auth;
use crate::cloudinary::UploadOptions;
use crate::error::{AppError, Result};
use crate::handlers::read_upload_form;
use crate::models::ImageUploadResponse;
use crate::state::AppState;
use axum::extract::{Multipart, State};
use axum::http::HeaderMap;
use axum::Json;
use std::sync::Arc;

// POST /api/image-upload
//
// Forwards the posted file to the provider's image-upload folder. Creates
// one remote object; nothing is persisted locally.
pub async fn image_upload_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    multipart: Multipart,
) -> Result<Json<ImageUploadResponse>> {
    if auth::authenticate(&state.auth, &headers).is_none() {
        return Err(AppError::Unauthorized);
    }

    let form = read_upload_form(multipart).await.map_err(|err| {
        tracing::error!("reading image upload form failed: {}", err);
        AppError::UploadFailed("Upload image failed")
    })?;
    let (filename, bytes) = form
        .file
        .ok_or_else(|| AppError::BadRequest("File not found".to_string()))?;

    let provider = state.provider.as_ref().ok_or_else(|| {
        tracing::error!("image upload attempted with no provider credentials configured");
        AppError::UploadFailed("Upload image failed")
    })?;

    match provider.upload(bytes, filename, UploadOptions::image()).await {
        Ok(result) => Ok(Json(ImageUploadResponse {
            public_id: result.public_id,
        })),
        Err(err) => {
            tracing::error!("image upload to provider failed: {}", err);
            Err(AppError::UploadFailed("Upload image failed"))
        }
    }
}
