//! HTTP surface: upload, redact and download endpoints.
//!
//! Handlers are thin. They sanitize names, hand requests to the
//! [`RequestValidator`](crate::domain::RequestValidator), and run jobs on
//! tokio's blocking pool through the shared [`RedactionService`].

mod error;
mod handlers;

pub use error::{AppError, ErrorResponse};
pub use handlers::{
    download_file, health_check, redact_file, upload_file, RedactResponse, UploadResponse,
};

use crate::config::ServerConfig;
use crate::domain::StorageLayout;
use crate::redaction::{MarkStyle, MupdfEngine, PdfEngine, RedactionService};
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Shared, immutable per-process state.
pub struct AppState {
    pub layout: StorageLayout,
    pub service: RedactionService,
    pub placeholder: String,
}

impl AppState {
    /// Builds state from configuration with the given engine.
    pub fn new(config: &ServerConfig, engine: Box<dyn PdfEngine>) -> Self {
        let layout = config.layout();
        let style = MarkStyle::new(config.fill_color, config.placeholder_label.clone());
        Self {
            service: RedactionService::new(engine, layout.outputs_dir(), style),
            layout,
            placeholder: config.placeholder_label.clone(),
        }
    }

    /// Builds state backed by MuPDF.
    pub fn with_mupdf(config: &ServerConfig) -> Self {
        Self::new(
            config,
            Box::new(MupdfEngine::new().with_max_hits(config.max_hits)),
        )
    }
}

/// Build the application router with all routes configured
pub fn app(state: Arc<AppState>, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/upload", post(upload_file))
        .route("/redact", post(redact_file))
        .route("/redact/", post(redact_file))
        .route("/download/{filename}", get(download_file))
        .route("/health", get(health_check))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Creates the storage directories and serves the API until shutdown.
pub async fn serve(config: ServerConfig) -> anyhow::Result<()> {
    use anyhow::Context;

    let state = AppState::with_mupdf(&config);
    state
        .layout
        .ensure_dirs()
        .context("Failed to create storage directories")?;

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    tracing::info!(
        %addr,
        uploads = %state.layout.uploads_dir().display(),
        outputs = %state.layout.outputs_dir().display(),
        engine = state.service.engine_name(),
        "pdfredact API listening"
    );

    axum::serve(listener, app(Arc::new(state), config.max_upload_bytes))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        tracing::info!("shutdown signal received");
    }
}
