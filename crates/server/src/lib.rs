//! HTTP surface for the bill amount detection pipeline.
//!
//! One route does the work: `POST /api/detect-amounts` takes a
//! multipart image upload and returns the staged detection report.
//! The pipeline's two cloud backends are injected through the state,
//! so the whole server runs against mocks in tests.

mod config;
mod handlers;

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tally_extract::BillPipeline;
use tally_genai::TextGenerator;
use tally_ocr::TextRecognizer;
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

pub use config::ServerConfig;
pub use handlers::{detect_amounts, health};

/// Uploads above this size are rejected before any processing.
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Shared server state: one pipeline serves all requests.
pub struct AppState<R, G> {
    pub pipeline: Arc<BillPipeline<R, G>>,
}

impl<R, G> Clone for AppState<R, G> {
    fn clone(&self) -> Self {
        Self { pipeline: Arc::clone(&self.pipeline) }
    }
}

impl<R: TextRecognizer, G: TextGenerator> AppState<R, G> {
    pub fn new(pipeline: BillPipeline<R, G>) -> Self {
        Self { pipeline: Arc::new(pipeline) }
    }
}

/// Build the router with all endpoints and middleware.
pub fn build_router<R, G>(state: AppState<R, G>) -> Router
where
    R: TextRecognizer + 'static,
    G: TextGenerator + 'static,
{
    Router::new()
        .route("/health", get(handlers::health))
        .route("/api/detect-amounts", post(handlers::detect_amounts::<R, G>))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(RequestBodyLimitLayer::new(MAX_UPLOAD_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Bind and serve until shutdown.
pub async fn start_server<R, G>(addr: &str, state: AppState<R, G>) -> std::io::Result<()>
where
    R: TextRecognizer + 'static,
    G: TextGenerator + 'static,
{
    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await
}
