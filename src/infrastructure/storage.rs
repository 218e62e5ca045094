use crate::config::StorageConfig;
use crate::services::storage::S3StorageService;
use aws_sdk_s3::config::{Credentials, Region};
use std::sync::Arc;
use tracing::info;

pub async fn setup_storage(config: &StorageConfig) -> anyhow::Result<Arc<S3StorageService>> {
    let bucket = config
        .bucket
        .clone()
        .ok_or_else(|| anyhow::anyhow!("S3_BUCKET_NAME must be set"))?;

    info!(
        "☁️  S3 Storage: region {} (Bucket: {})",
        config.region, bucket
    );

    let mut loader = aws_config::from_env().region(Region::new(config.region.clone()));

    if let (Some(access_key), Some(secret_key)) =
        (&config.access_key_id, &config.secret_access_key)
    {
        loader = loader.credentials_provider(Credentials::new(
            access_key.clone(),
            secret_key.clone(),
            config.session_token.clone(),
            None,
            "static",
        ));
    }

    if let Some(endpoint) = &config.endpoint {
        info!("☁️  Using custom S3 endpoint {}", endpoint);
        loader = loader.endpoint_url(endpoint);
    }

    let aws_config = loader.load().await;

    let s3_config = aws_sdk_s3::config::Builder::from(&aws_config)
        .force_path_style(config.endpoint.is_some())
        .build();

    let s3_client = aws_sdk_s3::Client::from_conf(s3_config);

    Ok(Arc::new(S3StorageService::new(s3_client, bucket)))
}
