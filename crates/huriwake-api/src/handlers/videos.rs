//! Video metadata handlers for the capture page.

use axum::extract::{Path, State};
use axum::Json;

use huriwake_models::{parse_video_ref, PopularVideo, VideoInfo};

use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Title of an embeddable video. Accepts a bare id or a YouTube URL.
pub async fn get_video_info(
    State(state): State<AppState>,
    Path(video_ref): Path<String>,
    _user: AuthUser,
) -> ApiResult<Json<VideoInfo>> {
    let video_id = parse_video_ref(&video_ref)
        .map_err(|e| ApiError::bad_request(format!("Invalid video reference: {}", e)))?;

    Ok(Json(state.youtube.video_info(&video_id).await?))
}

/// Most-popular chart for the configured region.
pub async fn get_popular_videos(
    State(state): State<AppState>,
    _user: AuthUser,
) -> ApiResult<Json<Vec<PopularVideo>>> {
    Ok(Json(state.youtube.popular_videos().await?))
}
