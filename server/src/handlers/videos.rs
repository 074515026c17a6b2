use crate::auth;
use crate::cloudinary::UploadOptions;
use crate::db;
use crate::error::{AppError, Result};
use crate::handlers::read_upload_form;
use crate::models::{NewVideoRecord, VideoRecord};
use crate::state::AppState;
use axum::extract::{Multipart, State};
use axum::http::HeaderMap;
use axum::Json;
use std::sync::Arc;

// POST /api/video-upload
//
// Provider upload then row insert, in that order and not atomic: a
// provider success followed by an insert failure leaves an orphaned remote
// object and no local record. There is no compensating cleanup.
pub async fn video_upload_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    multipart: Multipart,
) -> Result<Json<VideoRecord>> {
    if auth::authenticate(&state.auth, &headers).is_none() {
        return Err(AppError::Unauthorized);
    }

    let provider = state.provider.as_ref().ok_or_else(|| {
        AppError::Configuration("Media provider credentials are missing".to_string())
    })?;

    let form = read_upload_form(multipart).await.map_err(|err| {
        tracing::error!("reading video upload form failed: {}", err);
        AppError::UploadFailed("Upload video failed")
    })?;
    let title = form.text_field("title");
    let description = form.text_field("description");
    let original_size = form.text_field("originalSize");
    let (filename, bytes) = form
        .file
        .ok_or_else(|| AppError::BadRequest("File not found".to_string()))?;

    let result = provider
        .upload(bytes, filename, UploadOptions::video())
        .await
        .map_err(|err| {
            tracing::error!("video upload to provider failed: {}", err);
            AppError::UploadFailed("Upload video failed")
        })?;

    let record = NewVideoRecord {
        title,
        description,
        public_id: result.public_id,
        original_size,
        compressed_size: result.bytes.to_string(),
        duration: result.duration.unwrap_or(0.0),
        url: result.secure_url,
    };

    let stored = db::insert_video(state.pool.clone(), &record)
        .await
        .map_err(|err| {
            tracing::error!(
                "persisting video record failed after provider upload of {}: {}",
                record.public_id,
                err
            );
            AppError::UploadFailed("Upload video failed")
        })?;

    Ok(Json(stored))
}

// GET /api/videos — public, unfiltered, unpaginated
pub async fn list_videos_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<VideoRecord>>> {
    let videos = db::list_videos(state.pool.clone()).await.map_err(|err| {
        tracing::error!("listing videos failed: {}", err);
        AppError::Internal
    })?;

    Ok(Json(videos))
}
