use crate::AppState;
use crate::api::error::AppError;
use axum::{Json, extract::State};

use super::types::VideoSummary;

#[utoipa::path(
    get,
    path = "/api/get-videos",
    responses(
        (status = 200, description = "All videos, newest first", body = Vec<VideoSummary>),
        (status = 500, description = "Metadata store unavailable")
    ),
    tag = "videos"
)]
pub async fn get_videos(
    State(state): State<AppState>,
) -> Result<Json<Vec<VideoSummary>>, AppError> {
    let videos = state.store.get_all_videos().await?;
    Ok(Json(videos))
}
