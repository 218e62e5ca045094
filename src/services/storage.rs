use async_trait::async_trait;
use aws_sdk_s3::Client;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{CompletedMultipartUpload, CompletedPart};
use chrono::{DateTime, Utc};
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::utils::limited_reader::SizeLimitExceeded;

/// S3 requires every multipart part but the last to be at least 5 MiB.
const PART_SIZE: usize = 10 * 1024 * 1024;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Only video files are allowed (got {0})")]
    UnsupportedMedia(String),

    #[error("File exceeds the {limit} byte limit")]
    PayloadTooLarge { limit: u64 },

    #[error("Storage backend error: {0}")]
    Backend(String),

    #[error("I/O error while streaming: {0}")]
    Io(std::io::Error),
}

impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        match err.get_ref().and_then(|e| e.downcast_ref::<SizeLimitExceeded>()) {
            Some(exceeded) => StorageError::PayloadTooLarge {
                limit: exceeded.limit,
            },
            None => StorageError::Io(err),
        }
    }
}

impl StorageError {
    pub fn backend(err: impl std::fmt::Display) -> Self {
        StorageError::Backend(err.to_string())
    }
}

pub type StorageResult<T> = Result<T, StorageError>;

#[derive(Debug)]
pub struct UploadResult {
    pub size: u64,
}

#[derive(Debug, Clone)]
pub struct StoredObject {
    pub key: String,
    pub last_modified: Option<DateTime<Utc>>,
}

/// Provider-side object operations. Implementations own no policy; media
/// type and size rules live in `VideoStorage`.
#[async_trait]
pub trait StorageService: Send + Sync {
    async fn upload_stream<'a>(
        &self,
        key: &str,
        content_type: &str,
        reader: Box<dyn AsyncRead + Unpin + Send + 'a>,
    ) -> StorageResult<UploadResult>;
    async fn presigned_get_url(&self, key: &str, expires_in: Duration) -> StorageResult<String>;
    async fn delete_file(&self, key: &str) -> StorageResult<()>;
    async fn list_objects(&self, prefix: &str) -> StorageResult<Vec<StoredObject>>;
}

pub struct S3StorageService {
    client: Client,
    bucket: String,
}

impl S3StorageService {
    pub fn new(client: Client, bucket: String) -> Self {
        Self { client, bucket }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }
}

/// Aborts an unfinished multipart upload when dropped, so a failed or
/// cancelled transfer leaves no parts behind.
struct PendingMultipart {
    client: Client,
    bucket: String,
    key: String,
    upload_id: String,
    completed: bool,
}

impl Drop for PendingMultipart {
    fn drop(&mut self) {
        if self.completed {
            return;
        }
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            tracing::warn!("No runtime to abort multipart upload for {}", self.key);
            return;
        };

        let client = self.client.clone();
        let bucket = std::mem::take(&mut self.bucket);
        let key = std::mem::take(&mut self.key);
        let upload_id = std::mem::take(&mut self.upload_id);
        handle.spawn(async move {
            match client
                .abort_multipart_upload()
                .bucket(&bucket)
                .key(&key)
                .upload_id(&upload_id)
                .send()
                .await
            {
                Ok(_) => tracing::info!("Aborted multipart upload for {}", key),
                Err(e) => tracing::warn!("Failed to abort multipart upload for {}: {}", key, e),
            }
        });
    }
}

#[async_trait]
impl StorageService for S3StorageService {
    async fn upload_stream<'a>(
        &self,
        key: &str,
        content_type: &str,
        mut reader: Box<dyn AsyncRead + Unpin + Send + 'a>,
    ) -> StorageResult<UploadResult> {
        let multipart_upload_res = self
            .client
            .create_multipart_upload()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| StorageError::backend(DisplayErrorContext(e)))?;

        let upload_id = multipart_upload_res
            .upload_id()
            .ok_or_else(|| StorageError::Backend("No upload ID".to_string()))?;

        let mut pending = PendingMultipart {
            client: self.client.clone(),
            bucket: self.bucket.clone(),
            key: key.to_string(),
            upload_id: upload_id.to_string(),
            completed: false,
        };

        let mut part_number = 1;
        let mut completed_parts = Vec::new();
        let mut total_size: u64 = 0;
        let mut buffer = vec![0u8; PART_SIZE];

        loop {
            let mut n = 0;
            while n < PART_SIZE {
                let read = reader.read(&mut buffer[n..]).await?;
                if read == 0 {
                    break;
                }
                n += read;
            }

            // An empty body still needs one (empty) part to complete.
            if n == 0 && part_number > 1 {
                break;
            }

            total_size += n as u64;
            let upload_part_res = self
                .client
                .upload_part()
                .bucket(&self.bucket)
                .key(key)
                .upload_id(upload_id)
                .body(ByteStream::from(buffer[..n].to_vec()))
                .part_number(part_number)
                .send()
                .await
                .map_err(|e| StorageError::backend(DisplayErrorContext(e)))?;

            completed_parts.push(
                CompletedPart::builder()
                    .e_tag(upload_part_res.e_tag().unwrap_or_default())
                    .part_number(part_number)
                    .build(),
            );
            part_number += 1;

            if n < PART_SIZE {
                break;
            }
        }

        let completed_multipart_upload = CompletedMultipartUpload::builder()
            .set_parts(Some(completed_parts))
            .build();

        self.client
            .complete_multipart_upload()
            .bucket(&self.bucket)
            .key(key)
            .upload_id(upload_id)
            .multipart_upload(completed_multipart_upload)
            .send()
            .await
            .map_err(|e| StorageError::backend(DisplayErrorContext(e)))?;
        pending.completed = true;

        tracing::debug!("Stored {} bytes at {}/{}", total_size, self.bucket, key);

        Ok(UploadResult { size: total_size })
    }

    async fn presigned_get_url(&self, key: &str, expires_in: Duration) -> StorageResult<String> {
        let presigning_config =
            PresigningConfig::expires_in(expires_in).map_err(StorageError::backend)?;

        let presigned_request = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .presigned(presigning_config)
            .await
            .map_err(|e| StorageError::backend(DisplayErrorContext(e)))?;

        Ok(presigned_request.uri().to_string())
    }

    async fn delete_file(&self, key: &str) -> StorageResult<()> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| StorageError::backend(DisplayErrorContext(e)))?;
        Ok(())
    }

    async fn list_objects(&self, prefix: &str) -> StorageResult<Vec<StoredObject>> {
        let mut objects = Vec::new();
        let mut continuation_token = None;

        loop {
            let res = self
                .client
                .list_objects_v2()
                .bucket(&self.bucket)
                .prefix(prefix)
                .set_continuation_token(continuation_token)
                .send()
                .await
                .map_err(|e| StorageError::backend(DisplayErrorContext(e)))?;

            for object in res.contents.unwrap_or_default() {
                if let Some(key) = object.key {
                    let last_modified = object
                        .last_modified
                        .and_then(|d| DateTime::from_timestamp(d.secs(), d.subsec_nanos()));
                    objects.push(StoredObject { key, last_modified });
                }
            }

            if res.is_truncated.unwrap_or(false) {
                continuation_token = res.next_continuation_token;
            } else {
                break;
            }
        }

        Ok(objects)
    }
}
