use crate::api::error::AppError;
use crate::entities::{prelude::*, *};
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, DatabaseConnection, DbErr, EntityTrait, FromQueryResult, PaginatorTrait,
    QueryOrder, QuerySelect, Set, SqlErr,
};
use serde::Serialize;
use utoipa::ToSchema;

/// Row to insert for a freshly stored video.
#[derive(Debug, Clone)]
pub struct NewVideo {
    pub id: String,
    pub title: String,
    pub description: String,
    pub filename: String,
    pub s3_key: String,
    pub mime_type: String,
    pub original_name: String,
    pub uploaded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema, FromQueryResult)]
pub struct VideoSummary {
    pub id: String,
    pub title: String,
    #[serde(serialize_with = "empty_if_none")]
    #[schema(value_type = String)]
    pub description: Option<String>,
}

fn empty_if_none<S: serde::Serializer>(
    value: &Option<String>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(value.as_deref().unwrap_or_default())
}

/// Metadata persistence for videos. Each call is a single query.
#[derive(Clone)]
pub struct VideoStore {
    db: DatabaseConnection,
}

impl VideoStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub fn connection(&self) -> &DatabaseConnection {
        &self.db
    }

    pub async fn create_video(&self, video: NewVideo) -> Result<videos::Model, AppError> {
        let record = videos::ActiveModel {
            id: Set(video.id.clone()),
            title: Set(video.title),
            description: Set(Some(video.description)),
            filename: Set(video.filename),
            s3_key: Set(video.s3_key),
            mime_type: Set(Some(video.mime_type)),
            original_name: Set(Some(video.original_name)),
            uploaded_at: Set(video.uploaded_at),
            created_at: Set(video.uploaded_at),
            updated_at: Set(video.uploaded_at),
        };

        record.insert(&self.db).await.map_err(|e| match e.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => {
                AppError::Conflict(format!("video {} already exists", video.id))
            }
            _ => AppError::Database(e),
        })
    }

    /// Summaries of every video, most recently uploaded first.
    pub async fn get_all_videos(&self) -> Result<Vec<VideoSummary>, DbErr> {
        Videos::find()
            .select_only()
            .column(videos::Column::Id)
            .column(videos::Column::Title)
            .column(videos::Column::Description)
            .order_by_desc(videos::Column::UploadedAt)
            .into_model::<VideoSummary>()
            .all(&self.db)
            .await
    }

    pub async fn get_video_by_id(&self, id: &str) -> Result<Option<videos::Model>, DbErr> {
        Videos::find_by_id(id.to_string()).one(&self.db).await
    }

    pub async fn video_exists(&self, id: &str) -> Result<bool, DbErr> {
        let count = Videos::find_by_id(id.to_string()).count(&self.db).await?;
        Ok(count > 0)
    }
}
