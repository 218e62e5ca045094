mod common;

use axum::http::StatusCode;
use common::*;
use rust_video_backend::config::AppConfig;
use sea_orm::ConnectionTrait;

async fn video_count(test: &TestApp) -> usize {
    test.store.get_all_videos().await.unwrap().len()
}

#[tokio::test]
async fn test_upload_without_title_is_rejected() {
    let test = setup_app().await;

    for title in ["", "   "] {
        let (status, json) = upload(
            &test.app,
            &[text("title", title), file("cat.mp4", "video/mp4", b"frames")],
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "title is required");
    }

    let (status, json) = upload(&test.app, &[file("cat.mp4", "video/mp4", b"frames")]).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "title is required");

    assert_eq!(test.mock.object_count(), 0);
    assert_eq!(video_count(&test).await, 0);
}

#[tokio::test]
async fn test_upload_without_file_is_rejected() {
    let test = setup_app().await;

    let (status, json) = upload(
        &test.app,
        &[text("title", "No file"), text("description", "nothing attached")],
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "file is required");
    assert_eq!(video_count(&test).await, 0);
}

#[tokio::test]
async fn test_fields_after_file_are_accepted() {
    let test = setup_app().await;

    let (status, json) = upload(
        &test.app,
        &[
            file("cat.mp4", "video/mp4", b"frames"),
            text("title", "Cat video"),
            text("description", "sent last"),
        ],
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", json);
    assert_eq!(json["title"], "Cat video");

    let id = json["id"].as_str().unwrap();
    let row = test.store.get_video_by_id(id).await.unwrap().unwrap();
    assert_eq!(row.description.as_deref(), Some("sent last"));
    assert_eq!(test.mock.object_count(), 1);
}

#[tokio::test]
async fn test_blank_title_after_file_discards_object() {
    let test = setup_app().await;

    let (status, json) = upload(
        &test.app,
        &[file("cat.mp4", "video/mp4", b"frames"), text("title", "  ")],
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "title is required");
    assert_eq!(test.mock.object_count(), 0);
    assert_eq!(video_count(&test).await, 0);
}

#[tokio::test]
async fn test_non_video_is_rejected() {
    let test = setup_app().await;

    let (status, json) = upload(
        &test.app,
        &[text("title", "Slides"), file("deck.pdf", "application/pdf", b"%PDF-1.7")],
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "Only video files are allowed");

    let (status, _) = upload(
        &test.app,
        &[text("title", "Mystery"), untyped_file("clip.mp4", b"frames")],
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    assert_eq!(test.mock.object_count(), 0);
    assert_eq!(video_count(&test).await, 0);
}

#[tokio::test]
async fn test_second_file_discards_first() {
    let test = setup_app().await;

    let (status, json) = upload(
        &test.app,
        &[
            text("title", "Twice"),
            file("a.mp4", "video/mp4", b"first"),
            file("b.mp4", "video/mp4", b"second"),
        ],
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "only one file may be uploaded");
    assert_eq!(test.mock.object_count(), 0);
    assert_eq!(video_count(&test).await, 0);
}

#[tokio::test]
async fn test_unknown_fields_are_ignored() {
    let test = setup_app().await;

    let (status, json) = upload(
        &test.app,
        &[
            text("title", "Extras"),
            text("tags", "cats,funny"),
            file("cat.mp4", "video/mp4", b"frames"),
        ],
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["title"], "Extras");
    assert_eq!(test.mock.object_count(), 1);
}

#[tokio::test]
async fn test_title_and_description_are_trimmed() {
    let test = setup_app().await;

    let (status, json) = upload(
        &test.app,
        &[
            text("title", "  Padded  "),
            text("description", "\n spaced out \t"),
            file("cat.mp4", "video/mp4", b"frames"),
        ],
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["title"], "Padded");

    let id = json["id"].as_str().unwrap();
    let row = test.store.get_video_by_id(id).await.unwrap().unwrap();
    assert_eq!(row.description.as_deref(), Some("spaced out"));
}

#[tokio::test]
async fn test_overlong_title_is_rejected() {
    let test = setup_app().await;
    let title = "t".repeat(256);

    let (status, json) = upload(
        &test.app,
        &[text("title", &title), file("cat.mp4", "video/mp4", b"frames")],
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "title must be at most 255 characters");
    assert_eq!(test.mock.object_count(), 0);
}

#[tokio::test]
async fn test_oversized_file_is_rejected() {
    let mut config = AppConfig::development();
    config.max_file_size = 1024;
    let test = setup_app_with(config).await;

    let payload = vec![1u8; 4096];
    let (status, _) = upload(
        &test.app,
        &[text("title", "Too big"), file("big.mp4", "video/mp4", &payload)],
    )
    .await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(test.mock.object_count(), 0);
    assert_eq!(video_count(&test).await, 0);

    // Exactly at the limit is fine
    let payload = vec![1u8; 1024];
    let (status, _) = upload(
        &test.app,
        &[text("title", "Just right"), file("ok.mp4", "video/mp4", &payload)],
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn test_storage_outage_leaves_no_row() {
    let test = setup_app().await;
    *test.mock.fail_uploads.lock().unwrap() = true;

    let (status, json) = upload(
        &test.app,
        &[text("title", "Doomed"), file("cat.mp4", "video/mp4", b"frames")],
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["error"], "Internal Server Error");
    assert_eq!(video_count(&test).await, 0);
}

#[tokio::test]
async fn test_metadata_failure_discards_object() {
    let test = setup_app().await;
    test.db
        .execute_unprepared("DROP TABLE videos")
        .await
        .unwrap();

    let (status, json) = upload(
        &test.app,
        &[text("title", "Orphan"), file("cat.mp4", "video/mp4", b"frames")],
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["error"], "Internal Server Error");
    assert_eq!(test.mock.object_count(), 0);
}
