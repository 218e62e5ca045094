use crate::config::DatabaseConfig;
use crate::entities::videos;
use anyhow::Context;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Schema, Statement};
use std::time::Duration;
use tracing::info;

pub async fn setup_database(config: &DatabaseConfig) -> anyhow::Result<DatabaseConnection> {
    let db_url = config.connection_url()?;

    info!("📂 Database: {}", config.redacted_url());

    let mut opt = ConnectOptions::new(&db_url);
    opt.max_connections(config.max_connections)
        .min_connections(1)
        .connect_timeout(Duration::from_secs(2))
        .acquire_timeout(Duration::from_secs(30))
        .idle_timeout(Duration::from_secs(30))
        .max_lifetime(Duration::from_secs(1800))
        .sqlx_logging(true)
        .sqlx_logging_level(log::LevelFilter::Debug);

    let db = Database::connect(opt)
        .await
        .context("failed to connect to the metadata database")?;

    info!("✅ Database connected successfully");

    init_schema(&db).await?;

    Ok(db)
}

/// Creates the `videos` table and its ordering index if they are missing.
/// Safe to run on every start.
pub async fn init_schema(db: &DatabaseConnection) -> anyhow::Result<()> {
    info!("🔄 Ensuring videos schema...");
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);

    let create_table = schema
        .create_table_from_entity(videos::Entity)
        .if_not_exists()
        .to_owned();
    db.execute(builder.build(&create_table))
        .await
        .context("failed to create videos table")?;

    db.execute(Statement::from_string(
        builder,
        "CREATE INDEX IF NOT EXISTS idx_videos_uploaded_at ON videos(uploaded_at DESC);"
            .to_string(),
    ))
    .await
    .context("failed to create videos index")?;

    info!("✅ Database initialized successfully");
    Ok(())
}
