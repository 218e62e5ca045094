pub mod api;
pub mod config;
pub mod entities;
pub mod infrastructure;
pub mod services;
pub mod utils;

use crate::api::middleware::request_id::REQUEST_ID_HEADER;
use crate::config::{AppConfig, CorsOrigins};
use crate::services::upload_service::UploadService;
use crate::services::video_storage::VideoStorage;
use crate::services::video_store::VideoStore;
use axum::{
    Router,
    body::Body,
    extract::{DefaultBodyLimit, Request},
    http::{HeaderValue, Method, header},
    middleware::from_fn,
    response::Response,
    routing::{get, post},
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Slack on top of the file limit for multipart boundaries and text fields.
const MULTIPART_OVERHEAD: usize = 10 * 1024 * 1024;

#[derive(OpenApi)]
#[openapi(
    paths(
        api::handlers::health::health_check,
        api::handlers::health::health_details,
        api::handlers::videos::upload::upload_video,
        api::handlers::videos::list::get_videos,
        api::handlers::videos::watch::watch_video,
    ),
    components(
        schemas(
            api::handlers::health::HealthResponse,
            api::handlers::videos::UploadResponse,
            api::handlers::videos::UploadVideoForm,
            api::handlers::videos::VideoSummary,
            api::handlers::videos::WatchResponse,
        )
    ),
    tags(
        (name = "videos", description = "Video upload, listing and playback"),
        (name = "system", description = "Health probes")
    )
)]
pub struct ApiDoc;

#[derive(Clone)]
pub struct AppState {
    pub store: VideoStore,
    pub storage: VideoStorage,
    pub uploads: Arc<UploadService>,
    pub config: AppConfig,
}

impl AppState {
    pub fn new(store: VideoStore, storage: VideoStorage, config: AppConfig) -> Self {
        let uploads = Arc::new(UploadService::new(store.clone(), storage.clone()));
        Self {
            store,
            storage,
            uploads,
            config,
        }
    }
}

fn cors_layer(origins: &CorsOrigins) -> CorsLayer {
    let methods = [Method::GET, Method::POST, Method::OPTIONS];
    match origins {
        CorsOrigins::Any => CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(methods)
            .allow_headers(Any),
        CorsOrigins::List(list) => {
            let allowed: Vec<HeaderValue> = list
                .iter()
                .filter_map(|origin| match HeaderValue::from_str(origin) {
                    Ok(value) => Some(value),
                    Err(_) => {
                        tracing::warn!("Ignoring invalid CORS origin {:?}", origin);
                        None
                    }
                })
                .collect();
            CorsLayer::new()
                .allow_origin(allowed)
                .allow_methods(methods)
                .allow_headers([header::CONTENT_TYPE, REQUEST_ID_HEADER.clone()])
                .expose_headers([REQUEST_ID_HEADER.clone()])
                .allow_credentials(true)
        }
    }
}

pub fn create_app(state: AppState) -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/health", get(api::handlers::health::health_check))
        .route("/health/details", get(api::handlers::health::health_details))
        .route(
            "/api/upload",
            post(api::handlers::videos::upload_video).layer(DefaultBodyLimit::max(
                state.config.max_file_size.saturating_add(MULTIPART_OVERHEAD),
            )),
        )
        .route("/api/get-videos", get(api::handlers::videos::get_videos))
        .route("/api/watch-api", get(api::handlers::videos::watch_video))
        .layer(cors_layer(&state.config.allowed_origins))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request<Body>| {
                    let request_id = request
                        .headers()
                        .get(&REQUEST_ID_HEADER)
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or("unknown");
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id = %request_id,
                    )
                })
                .on_request(|request: &Request<Body>, _span: &tracing::Span| {
                    tracing::info!("📥 {} {}", request.method(), request.uri());
                })
                .on_response(
                    |response: &Response<Body>, latency: Duration, _span: &tracing::Span| {
                        tracing::info!(
                            "📤 Finished in {:?} with status {}",
                            latency,
                            response.status()
                        );
                    },
                ),
        )
        .layer(from_fn(api::middleware::request_id::request_id_middleware))
        .with_state(state)
}
