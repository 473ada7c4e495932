//! HTTP server for exposing Prometheus metrics.
//!
//! This module provides an Axum-based HTTP server that serves the `/metrics`
//! endpoint for Prometheus scraping and a `/health` endpoint for health checks.
//! Scrapes only render the registry; polling happens in the scheduler.

use crate::error::{ExporterError, Result};
use crate::metrics::BackupMetrics;
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use prometheus::{Encoder, TextEncoder};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};

/// Shared application state.
#[derive(Clone)]
struct AppState {
    metrics: Arc<BackupMetrics>,
}

/// Build the exporter's router.
pub fn router(metrics: Arc<BackupMetrics>) -> Router {
    Router::new()
        .route("/metrics", get(metrics_handler))
        .route("/health", get(health_handler))
        .route("/", get(root_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(AppState { metrics })
}

/// Serve on an already bound listener until the server fails.
pub async fn serve(listener: TcpListener, metrics: Arc<BackupMetrics>) -> Result<()> {
    axum::serve(listener, router(metrics))
        .await
        .map_err(|e| ExporterError::Server(e.to_string()))
}

/// Start the HTTP server.
///
/// # Arguments
///
/// * `listen_address` - Address to bind to (e.g., "0.0.0.0:9231")
/// * `metrics` - Registry rendered on every scrape
///
/// # Examples
///
/// ```no_run
/// use pg_probackup_exporter::metrics::BackupMetrics;
/// use pg_probackup_exporter::server::start_server;
/// use std::sync::Arc;
///
/// #[tokio::main]
/// async fn main() {
///     let metrics = Arc::new(BackupMetrics::new().unwrap());
///     start_server("0.0.0.0:9231", metrics).await.unwrap();
/// }
/// ```
pub async fn start_server(listen_address: &str, metrics: Arc<BackupMetrics>) -> Result<()> {
    info!("Starting HTTP server on {}", listen_address);

    let listener = TcpListener::bind(listen_address).await?;
    serve(listener, metrics).await
}

/// Handler for /metrics endpoint.
async fn metrics_handler(State(state): State<AppState>) -> Response {
    debug!("Received metrics scrape request");

    match state.metrics.encode() {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, TextEncoder::new().format_type().to_string())],
            body,
        )
            .into_response(),
        Err(e) => {
            warn!("Failed to encode metrics: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to encode metrics: {}", e),
            )
                .into_response()
        }
    }
}

/// Handler for /health endpoint.
async fn health_handler() -> Response {
    (StatusCode::OK, "OK").into_response()
}

/// Handler for root endpoint.
async fn root_handler() -> Response {
    let html = r#"
<!DOCTYPE html>
<html>
<head>
    <title>pg_probackup Exporter</title>
    <style>
        body { font-family: Arial, sans-serif; margin: 40px; }
        h1 { color: #333; }
        a { color: #0066cc; text-decoration: none; }
        a:hover { text-decoration: underline; }
    </style>
</head>
<body>
    <h1>pg_probackup Exporter</h1>
    <ul>
        <li><a href="/metrics">/metrics</a> - Prometheus metrics</li>
        <li><a href="/health">/health</a> - Health check</li>
    </ul>
</body>
</html>
"#;

    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
        html,
    )
        .into_response()
}
