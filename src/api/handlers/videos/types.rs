use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

pub use crate::services::video_store::VideoSummary;

#[derive(Serialize, Deserialize, ToSchema)]
pub struct UploadResponse {
    pub id: String,
    pub title: String,
}

/// Multipart body of `POST /api/upload`. Text fields must precede `file`.
#[allow(dead_code)]
#[derive(ToSchema)]
pub struct UploadVideoForm {
    pub title: String,
    pub description: Option<String>,
    #[schema(value_type = String, format = Binary)]
    pub file: Vec<u8>,
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct WatchQuery {
    /// Video identifier returned by the upload
    pub id: Option<String>,
}

#[derive(Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WatchResponse {
    pub id: String,
    pub title: String,
    pub description: String,
    /// Time-limited signed URL for playback
    pub play_url: String,
}
