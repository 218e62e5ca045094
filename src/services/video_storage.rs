use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncRead;

use crate::services::storage::{StorageError, StorageResult, StorageService, StoredObject};
use crate::utils::keys::VIDEO_PREFIX;
use crate::utils::limited_reader::LimitedReader;

/// Validity window of a playback URL.
pub const PLAY_URL_TTL: Duration = Duration::from_secs(60 * 60);

/// Object storage for video payloads: gates media type and size in front of
/// the provider binding.
#[derive(Clone)]
pub struct VideoStorage {
    backend: Arc<dyn StorageService>,
    max_file_size: u64,
}

impl VideoStorage {
    pub fn new(backend: Arc<dyn StorageService>, max_file_size: u64) -> Self {
        Self {
            backend,
            max_file_size,
        }
    }

    /// Streams `reader` to `key`. Returns the number of bytes stored.
    pub async fn put<'a>(
        &self,
        key: &str,
        reader: impl AsyncRead + Unpin + Send + 'a,
        mime_type: &str,
    ) -> StorageResult<u64> {
        ensure_video_mime(mime_type)?;

        let limited = LimitedReader::new(reader, self.max_file_size);
        let result = self
            .backend
            .upload_stream(key, mime_type, Box::new(limited))
            .await?;
        Ok(result.size)
    }

    /// Mints a fresh time-limited read URL for `key`.
    pub async fn signed_url(&self, key: &str, ttl: Duration) -> StorageResult<String> {
        self.backend.presigned_get_url(key, ttl).await
    }

    pub async fn delete(&self, key: &str) -> StorageResult<()> {
        self.backend.delete_file(key).await
    }

    /// Every object under the video namespace.
    pub async fn list_videos(&self) -> StorageResult<Vec<StoredObject>> {
        self.backend.list_objects(VIDEO_PREFIX).await
    }
}

/// Accepts any `video/*` media type, parameters allowed.
pub fn ensure_video_mime(mime_type: &str) -> StorageResult<()> {
    match mime_type.parse::<mime::Mime>() {
        Ok(parsed) if parsed.type_() == mime::VIDEO => Ok(()),
        _ => Err(StorageError::UnsupportedMedia(mime_type.to_string())),
    }
}
