use crate::AppState;
use crate::api::error::AppError;
use crate::services::video_storage::PLAY_URL_TTL;
use axum::{
    Json,
    extract::{Query, State, rejection::QueryRejection},
};
use uuid::Uuid;

use super::types::{WatchQuery, WatchResponse};

#[utoipa::path(
    get,
    path = "/api/watch-api",
    params(WatchQuery),
    responses(
        (status = 200, description = "Video details with a signed playback URL", body = WatchResponse),
        (status = 400, description = "Missing or malformed id"),
        (status = 404, description = "Unknown id")
    ),
    tag = "videos"
)]
pub async fn watch_video(
    State(state): State<AppState>,
    query: Result<Query<WatchQuery>, QueryRejection>,
) -> Result<Json<WatchResponse>, AppError> {
    let Query(query) = query.map_err(|e| AppError::BadRequest(e.body_text()))?;
    let raw_id = query
        .id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| AppError::BadRequest("id required".to_string()))?;

    // Ids are always UUIDs; anything else cannot exist.
    let Ok(id) = Uuid::parse_str(raw_id) else {
        return Err(AppError::NotFound("not found".to_string()));
    };

    let video = state
        .store
        .get_video_by_id(&id.to_string())
        .await?
        .ok_or_else(|| AppError::NotFound("not found".to_string()))?;

    // Minted per request, never cached: each caller gets a fresh expiry.
    let play_url = state.storage.signed_url(&video.s3_key, PLAY_URL_TTL).await?;

    Ok(Json(WatchResponse {
        id: video.id,
        title: video.title,
        description: video.description.unwrap_or_default(),
        play_url,
    }))
}
