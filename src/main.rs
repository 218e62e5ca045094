use clap::{Parser, ValueEnum};
use dotenvy::dotenv;
use rust_video_backend::config::AppConfig;
use rust_video_backend::infrastructure::{database, storage};
use rust_video_backend::services::video_storage::VideoStorage;
use rust_video_backend::services::video_store::VideoStore;
use rust_video_backend::services::worker::OrphanSweeper;
use rust_video_backend::{AppState, create_app};
use std::net::SocketAddr;
use tokio::signal;
use tokio::sync::watch;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum Mode {
    /// HTTP API only
    Api,
    /// Orphan sweeper only
    Worker,
    /// Both
    All,
}

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Service type to run
    #[arg(short, long, value_enum, default_value_t = Mode::All)]
    mode: Mode,

    /// Port for the API server (defaults to PORT or 4000)
    #[arg(short, long, env = "PORT")]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Environment & logging
    dotenv().ok();
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rust_video_backend=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut config = AppConfig::from_env();
    if let Some(port) = args.port {
        config.port = port;
    }

    info!("🚀 Starting video backend [Mode: {:?}]...", args.mode);
    info!(
        "🎞️  Upload limit: {}MB, CORS: {:?}",
        config.max_file_size / 1024 / 1024,
        config.allowed_origins
    );

    // 2. Injected handles: one DB pool and one storage client for the process
    let db = database::setup_database(&config.database).await?;
    let s3 = storage::setup_storage(&config.storage).await?;
    info!("🔗 Using presigned S3 URLs for playback (bucket {})", s3.bucket());

    let store = VideoStore::new(db.clone());
    let video_storage = VideoStorage::new(s3, config.max_file_size as u64);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // 3. Orphan sweeper
    let worker_handle = if matches!(args.mode, Mode::Worker | Mode::All) {
        let sweeper = OrphanSweeper::new(
            store.clone(),
            video_storage.clone(),
            config.orphan_sweep_interval,
            config.orphan_min_age,
            shutdown_rx.clone(),
        );
        info!("👷 Orphan sweeper initialized.");
        Some(tokio::spawn(sweeper.run()))
    } else {
        None
    };

    // 4. API server
    if matches!(args.mode, Mode::Api | Mode::All) {
        let state = AppState::new(store, video_storage, config.clone());

        let app = create_app(state);
        let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
        let listener = tokio::net::TcpListener::bind(addr).await?;

        info!("✅ API Server listening on: http://0.0.0.0:{}", config.port);
        info!(
            "📖 Swagger UI documentation: http://localhost:{}/swagger-ui",
            config.port
        );

        let mut server_shutdown = shutdown_rx.clone();
        let server_handle = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    let _ = server_shutdown.changed().await;
                })
                .await
        });

        shutdown_signal().await;
        let _ = shutdown_tx.send(true);

        // 5. Bounded grace for in-flight requests, then abandon them
        match tokio::time::timeout(config.shutdown_grace, server_handle).await {
            Ok(Ok(Ok(()))) => info!("HTTP server closed"),
            Ok(Ok(Err(e))) => error!("❌ Server runtime error: {}", e),
            Ok(Err(e)) => error!("❌ Server task failed: {}", e),
            Err(_) => warn!(
                "⏱️  In-flight requests still running after {:?}, forcing shutdown",
                config.shutdown_grace
            ),
        }
    } else {
        shutdown_signal().await;
        let _ = shutdown_tx.send(true);
    }

    info!("🛑 Shutting down backend services...");

    if let Some(handle) = worker_handle {
        let _ = handle.await;
    }

    if let Err(e) = db.close().await {
        warn!("Failed to close database pool cleanly: {}", e);
    }

    info!("👋 Backend exited cleanly.");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("⌨️  Ctrl+C received, initiating graceful shutdown...");
        },
        _ = terminate => {
            info!("💤 SIGTERM received, initiating graceful shutdown...");
        },
    }
}
