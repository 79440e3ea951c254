//! Screenshot upload handler.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::debug;

use huriwake_models::Bucket;

use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::security::{decode_image_payload, sanitize_file_name};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadScreenshotRequest {
    /// Data URL or raw base64 image
    pub image: String,
    pub file_name: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadScreenshotResponse {
    pub success: bool,
    pub file_id: String,
    pub bucket: Bucket,
    pub count: u32,
    pub message: String,
}

/// Classify a captured frame by person count and store it in its bucket folder.
pub async fn upload_screenshot(
    State(state): State<AppState>,
    user: AuthUser,
    payload: Result<Json<UploadScreenshotRequest>, JsonRejection>,
) -> ApiResult<Json<UploadScreenshotResponse>> {
    let Json(request) = payload.map_err(|e| ApiError::bad_request(e.body_text()))?;

    let file_name = sanitize_file_name(&request.file_name)
        .ok_or_else(|| ApiError::bad_request("Invalid file name"))?;
    let image = decode_image_payload(&request.image).map_err(ApiError::bad_request)?;

    debug!(user = %user.sub, file_name = %file_name, bytes = image.len(), "Screenshot received");

    let filed = state.filer.file_screenshot(image, &file_name).await?;

    Ok(Json(UploadScreenshotResponse {
        success: true,
        message: format!(
            "Saved to \"{}\" ({} people detected)",
            filed.folder_name, filed.count
        ),
        file_id: filed.file_id,
        bucket: filed.bucket,
        count: filed.count,
    }))
}
