//! Review tool handlers.

use axum::body::Body;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::header;
use axum::response::Response;
use axum::Json;
use serde::Serialize;
use tracing::info;

use huriwake_models::{FolderSummary, ImageEntry, MoveOutcome, MoveRequest};

use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::security::is_valid_drive_id;
use crate::state::AppState;

fn validate_id(id: &str, what: &str) -> ApiResult<()> {
    if is_valid_drive_id(id) {
        Ok(())
    } else {
        Err(ApiError::bad_request(format!("Invalid {} format", what)))
    }
}

/// Classification folders with image counts.
pub async fn list_folders(
    State(state): State<AppState>,
    _user: AuthUser,
) -> ApiResult<Json<Vec<FolderSummary>>> {
    Ok(Json(state.review.folder_summaries().await?))
}

/// Images in one folder.
pub async fn list_folder_images(
    State(state): State<AppState>,
    Path(folder_id): Path<String>,
    _user: AuthUser,
) -> ApiResult<Json<Vec<ImageEntry>>> {
    validate_id(&folder_id, "folder ID")?;
    Ok(Json(state.review.list_images(&folder_id).await?))
}

/// Full-resolution image bytes.
pub async fn get_image(
    State(state): State<AppState>,
    Path(file_id): Path<String>,
    _user: AuthUser,
) -> ApiResult<Response> {
    validate_id(&file_id, "file ID")?;
    let download = state.review.fetch_image(&file_id).await?;

    Response::builder()
        .header(header::CONTENT_TYPE, download.content_type)
        .header(header::CACHE_CONTROL, "private, max-age=300")
        .body(Body::from(download.bytes))
        .map_err(|e| ApiError::internal(format!("Failed to build response: {}", e)))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveResponse {
    pub success: bool,
    pub file_id: String,
    pub new_parent: String,
    pub message: String,
}

/// Approve, reject or reclassify an image.
///
/// Fails with 409 when the image is no longer in the folder the reviewer saw.
pub async fn move_image(
    State(state): State<AppState>,
    user: AuthUser,
    payload: Result<Json<MoveRequest>, JsonRejection>,
) -> ApiResult<Json<MoveResponse>> {
    let Json(request) = payload.map_err(|e| ApiError::bad_request(e.body_text()))?;
    validate_id(&request.file_id, "file ID")?;
    validate_id(&request.source_folder_id, "folder ID")?;

    match state.review.move_file(&request).await? {
        MoveOutcome::Moved {
            file_id,
            new_parent,
        } => {
            info!(user = %user.sub, file_id = %file_id, action = %request.action, "Review move");
            Ok(Json(MoveResponse {
                success: true,
                file_id,
                new_parent,
                message: "File moved".to_string(),
            }))
        }
        MoveOutcome::Conflict { .. } => Err(ApiError::conflict(
            "The file was already moved by someone else. Reload the folder and try again.",
        )),
    }
}

#[derive(Debug, Serialize)]
pub struct CacheRefreshResponse {
    pub success: bool,
    pub cleared: usize,
}

/// Forget cached folder listings so folders created elsewhere become visible.
pub async fn refresh_folder_cache(
    State(state): State<AppState>,
    user: AuthUser,
) -> ApiResult<Json<CacheRefreshResponse>> {
    let cleared = state.resolver.cache().clear().await;
    info!(user = %user.sub, cleared, "Folder cache cleared");
    Ok(Json(CacheRefreshResponse {
        success: true,
        cleared,
    }))
}
