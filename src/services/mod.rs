pub mod storage;
pub mod upload_service;
pub mod video_storage;
pub mod video_store;
pub mod worker;
