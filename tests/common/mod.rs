#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use chrono::{DateTime, Utc};
use http_body_util::BodyExt;
use rust_video_backend::config::AppConfig;
use rust_video_backend::infrastructure::database;
use rust_video_backend::services::storage::{
    StorageError, StorageResult, StorageService, StoredObject, UploadResult,
};
use rust_video_backend::services::video_storage::VideoStorage;
use rust_video_backend::services::video_store::VideoStore;
use rust_video_backend::{AppState, create_app};
use sea_orm::{Database, DatabaseConnection};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt};
use tower::ServiceExt;

pub const MOCK_HOST: &str = "https://mock-bucket.s3.us-east-1.amazonaws.com";

pub struct MockObject {
    pub data: Vec<u8>,
    pub content_type: String,
    pub last_modified: DateTime<Utc>,
}

/// In-memory stand-in for the object storage provider.
#[derive(Default)]
pub struct MockStorageService {
    pub files: Mutex<HashMap<String, MockObject>>,
    pub presigned: Mutex<Vec<String>>,
    pub fail_uploads: Mutex<bool>,
}

impl MockStorageService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn keys(&self) -> Vec<String> {
        self.files.lock().unwrap().keys().cloned().collect()
    }

    pub fn object_count(&self) -> usize {
        self.files.lock().unwrap().len()
    }

    pub fn presign_count(&self) -> usize {
        self.presigned.lock().unwrap().len()
    }

    pub fn insert_object(&self, key: &str, data: Vec<u8>, last_modified: DateTime<Utc>) {
        self.files.lock().unwrap().insert(
            key.to_string(),
            MockObject {
                data,
                content_type: "video/mp4".to_string(),
                last_modified,
            },
        );
    }
}

#[async_trait]
impl StorageService for MockStorageService {
    async fn upload_stream<'a>(
        &self,
        key: &str,
        content_type: &str,
        mut reader: Box<dyn AsyncRead + Unpin + Send + 'a>,
    ) -> StorageResult<UploadResult> {
        if *self.fail_uploads.lock().unwrap() {
            return Err(StorageError::Backend("simulated outage".to_string()));
        }

        let mut data = Vec::new();
        reader.read_to_end(&mut data).await?;
        let size = data.len() as u64;

        self.files.lock().unwrap().insert(
            key.to_string(),
            MockObject {
                data,
                content_type: content_type.to_string(),
                last_modified: Utc::now(),
            },
        );

        Ok(UploadResult { size })
    }

    async fn presigned_get_url(&self, key: &str, expires_in: Duration) -> StorageResult<String> {
        let url = format!(
            "{}/{}?X-Amz-Date={}&X-Amz-Expires={}",
            MOCK_HOST,
            key,
            Utc::now().format("%Y%m%dT%H%M%S%.9fZ"),
            expires_in.as_secs()
        );
        self.presigned.lock().unwrap().push(url.clone());
        Ok(url)
    }

    async fn delete_file(&self, key: &str) -> StorageResult<()> {
        self.files.lock().unwrap().remove(key);
        Ok(())
    }

    async fn list_objects(&self, prefix: &str) -> StorageResult<Vec<StoredObject>> {
        let files = self.files.lock().unwrap();
        Ok(files
            .iter()
            .filter(|(k, _)| k.starts_with(prefix))
            .map(|(k, v)| StoredObject {
                key: k.clone(),
                last_modified: Some(v.last_modified),
            })
            .collect())
    }
}

pub async fn setup_test_db() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    database::init_schema(&db).await.unwrap();
    db
}

pub struct TestApp {
    pub app: Router,
    pub db: DatabaseConnection,
    pub store: VideoStore,
    pub storage: VideoStorage,
    pub mock: Arc<MockStorageService>,
}

pub async fn setup_app() -> TestApp {
    setup_app_with(AppConfig::development()).await
}

pub async fn setup_app_with(config: AppConfig) -> TestApp {
    let db = setup_test_db().await;
    let mock = Arc::new(MockStorageService::new());
    let store = VideoStore::new(db.clone());
    let storage = VideoStorage::new(mock.clone(), config.max_file_size as u64);
    let state = AppState::new(store.clone(), storage.clone(), config);

    TestApp {
        app: create_app(state),
        db,
        store,
        storage,
        mock,
    }
}

pub const BOUNDARY: &str = "---------------------------123456789012345678901234567";

/// One multipart part.
pub enum Part<'a> {
    Text {
        name: &'a str,
        value: &'a str,
    },
    File {
        name: &'a str,
        filename: &'a str,
        content_type: Option<&'a str>,
        data: &'a [u8],
    },
}

pub fn text<'a>(name: &'a str, value: &'a str) -> Part<'a> {
    Part::Text { name, value }
}

pub fn file<'a>(filename: &'a str, content_type: &'a str, data: &'a [u8]) -> Part<'a> {
    Part::File {
        name: "file",
        filename,
        content_type: Some(content_type),
        data,
    }
}

pub fn untyped_file<'a>(filename: &'a str, data: &'a [u8]) -> Part<'a> {
    Part::File {
        name: "file",
        filename,
        content_type: None,
        data,
    }
}

pub fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        match part {
            Part::Text { name, value } => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name)
                        .as_bytes(),
                );
                body.extend_from_slice(value.as_bytes());
            }
            Part::File {
                name,
                filename,
                content_type,
                data,
            } => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
                        name, filename
                    )
                    .as_bytes(),
                );
                if let Some(content_type) = content_type {
                    body.extend_from_slice(
                        format!("Content-Type: {}\r\n", content_type).as_bytes(),
                    );
                }
                body.extend_from_slice(b"\r\n");
                body.extend_from_slice(data);
            }
        }
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

pub async fn upload(app: &Router, parts: &[Part<'_>]) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/upload")
                .header(
                    "Content-Type",
                    format!("multipart/form-data; boundary={}", BOUNDARY),
                )
                .body(Body::from(multipart_body(parts)))
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, json)
}

pub async fn get(app: &Router, uri: &str) -> (StatusCode, Vec<u8>) {
    let response = app
        .clone()
        .oneshot(Request::builder().method("GET").uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    (status, body.to_vec())
}

pub async fn get_json(app: &Router, uri: &str) -> (StatusCode, Value) {
    let (status, body) = get(app, uri).await;
    (status, serde_json::from_slice(&body).unwrap_or(Value::Null))
}
