use crate::AppState;
use crate::api::error::AppError;
use crate::services::upload_service::{StoredVideo, UploadMetadata};
use axum::{
    Json,
    extract::{Multipart, State, multipart::MultipartError},
    http::StatusCode,
};
use futures::TryStreamExt;
use tokio_util::io::StreamReader;

use super::types::UploadResponse;

fn multipart_error(e: MultipartError) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge("Request body exceeds the maximum allowed limit".to_string())
    } else {
        AppError::BadRequest(e.body_text())
    }
}

#[utoipa::path(
    post,
    path = "/api/upload",
    request_body(content = super::types::UploadVideoForm, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Video stored and registered", body = UploadResponse),
        (status = 400, description = "Missing title or file, or not a video"),
        (status = 413, description = "File exceeds the size limit"),
        (status = 500, description = "Storage or database failure")
    ),
    tag = "videos"
)]
pub async fn upload_video(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<UploadResponse>), AppError> {
    let mut title: Option<String> = None;
    let mut description: Option<String> = None;
    let mut stored: Option<StoredVideo> = None;

    let result: Result<(StoredVideo, UploadMetadata), AppError> = async {
        while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
            let name = field.name().unwrap_or_default().to_string();

            match name.as_str() {
                "title" => title = Some(field.text().await.map_err(multipart_error)?),
                "description" => description = Some(field.text().await.map_err(multipart_error)?),
                "file" => {
                    if stored.is_some() {
                        return Err(AppError::BadRequest(
                            "only one file may be uploaded".to_string(),
                        ));
                    }

                    let original_name = field.file_name().unwrap_or_default().to_string();
                    let content_type = field.content_type().map(|s| s.to_string());
                    let reader = StreamReader::new(field.map_err(std::io::Error::other));

                    stored = Some(
                        state
                            .uploads
                            .store_file(&original_name, content_type.as_deref(), reader)
                            .await?,
                    );
                }
                other => tracing::debug!("Ignoring multipart field {:?}", other),
            }
        }

        // Fields may arrive in any order, so the text is checked once the
        // whole form has been read. A stored file is discarded on failure.
        let metadata = UploadMetadata::normalize(title.as_deref(), description.as_deref())?;
        let stored = stored
            .take()
            .ok_or_else(|| AppError::BadRequest("file is required".to_string()))?;
        Ok((stored, metadata))
    }
    .await;

    match result {
        Ok((stored, metadata)) => {
            let video = state.uploads.register(stored, metadata).await?;
            Ok((
                StatusCode::CREATED,
                Json(UploadResponse {
                    id: video.id,
                    title: video.title,
                }),
            ))
        }
        Err(e) => {
            if let Some(stored) = stored.take() {
                state.uploads.discard(&stored).await;
            }

            // Drain the rest of the body so the client sees our response
            // instead of a connection reset.
            tracing::warn!("Upload rejected: {}. Consuming remaining stream...", e);
            while let Ok(Some(mut field)) = multipart.next_field().await {
                while let Ok(Some(_)) = field.chunk().await {}
            }
            Err(e)
        }
    }
}
