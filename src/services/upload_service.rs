use crate::api::error::AppError;
use crate::entities::videos;
use crate::services::video_storage::VideoStorage;
use crate::services::video_store::{NewVideo, VideoStore};
use crate::utils::keys::VideoKey;
use chrono::Utc;
use tokio::io::AsyncRead;
use validator::Validate;

pub const DEFAULT_MIME_TYPE: &str = "application/octet-stream";

/// Title and description after trimming and defaulting.
#[derive(Debug, Clone, PartialEq, Validate)]
pub struct UploadMetadata {
    #[validate(length(min = 1, max = 255, message = "title must be at most 255 characters"))]
    pub title: String,
    #[validate(length(max = 5000, message = "description must be at most 5000 characters"))]
    pub description: String,
}

impl UploadMetadata {
    /// Trims both fields, defaults a missing description to empty and
    /// rejects a blank title.
    pub fn normalize(title: Option<&str>, description: Option<&str>) -> Result<Self, AppError> {
        let title = title.map(str::trim).unwrap_or_default();
        if title.is_empty() {
            return Err(AppError::BadRequest("title is required".to_string()));
        }

        let metadata = Self {
            title: title.to_string(),
            description: description.map(str::trim).unwrap_or_default().to_string(),
        };
        metadata.validate().map_err(|e| {
            let reason = e
                .field_errors()
                .values()
                .flat_map(|errs| errs.iter())
                .find_map(|err| err.message.as_ref().map(|m| m.to_string()))
                .unwrap_or_else(|| e.to_string());
            AppError::BadRequest(reason)
        })?;
        Ok(metadata)
    }
}

/// An object that reached storage but has no metadata row yet.
#[derive(Debug, Clone)]
pub struct StoredVideo {
    pub key: VideoKey,
    pub mime_type: String,
    pub original_name: String,
    pub size: u64,
}

/// Intake pipeline: the file goes to object storage first and the metadata
/// row is written only once that transfer completed.
#[derive(Clone)]
pub struct UploadService {
    store: VideoStore,
    storage: VideoStorage,
}

impl UploadService {
    pub fn new(store: VideoStore, storage: VideoStorage) -> Self {
        Self { store, storage }
    }

    pub async fn store_file<'a>(
        &self,
        original_name: &str,
        content_type: Option<&str>,
        reader: impl AsyncRead + Unpin + Send + 'a,
    ) -> Result<StoredVideo, AppError> {
        let mime_type = content_type
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(DEFAULT_MIME_TYPE)
            .to_string();
        let key = VideoKey::generate(original_name);

        tracing::info!(
            "Streaming upload {} ({}) to {}",
            original_name,
            mime_type,
            key.storage_key
        );

        let size = self
            .storage
            .put(&key.storage_key, reader, &mime_type)
            .await
            .map_err(|e| {
                tracing::warn!("Storing {} failed: {}", key.storage_key, e);
                AppError::from(e)
            })?;

        Ok(StoredVideo {
            key,
            mime_type,
            original_name: original_name.to_string(),
            size,
        })
    }

    /// Writes the metadata row for a stored object. If the row cannot be
    /// written the object is discarded before the error is returned.
    pub async fn register(
        &self,
        stored: StoredVideo,
        metadata: UploadMetadata,
    ) -> Result<videos::Model, AppError> {
        let record = NewVideo {
            id: stored.key.id.to_string(),
            title: metadata.title,
            description: metadata.description,
            filename: stored.key.filename().to_string(),
            s3_key: stored.key.storage_key.clone(),
            mime_type: stored.mime_type.clone(),
            original_name: stored.original_name.clone(),
            uploaded_at: Utc::now(),
        };

        match self.store.create_video(record).await {
            Ok(video) => {
                tracing::info!(
                    "Registered video {} ({} bytes, {})",
                    video.id,
                    stored.size,
                    video.s3_key
                );
                Ok(video)
            }
            Err(e) => {
                tracing::error!("Metadata write for {} failed: {}", stored.key.storage_key, e);
                self.discard(&stored).await;
                Err(e)
            }
        }
    }

    /// Best-effort removal of an object whose upload will not be registered.
    /// Anything left behind is picked up by the orphan sweeper.
    pub async fn discard(&self, stored: &StoredVideo) {
        match self.storage.delete(&stored.key.storage_key).await {
            Ok(()) => tracing::info!("Discarded unregistered object {}", stored.key.storage_key),
            Err(e) => tracing::warn!(
                "Could not discard {}, leaving it for the orphan sweeper: {}",
                stored.key.storage_key,
                e
            ),
        }
    }
}
