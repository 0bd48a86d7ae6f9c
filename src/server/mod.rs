//! HTTP API: ingestion, stats, one-shot queries and exploration sessions.

pub mod handlers;
pub mod sessions;
pub mod state;
pub mod types;

pub use state::{AppState, LoadedGraph};

use axum::{
    extract::DefaultBodyLimit,
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::db::Db;
use crate::error::{RelgraphError, Result};
use crate::graph::RelationshipStore;

/// Largest accepted CSV upload
const MAX_UPLOAD_BYTES: usize = 32 * 1024 * 1024;

impl RelgraphError {
    /// HTTP status reported for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            RelgraphError::UnknownEntity(_) | RelgraphError::UnknownSession(_) => StatusCode::NOT_FOUND,
            RelgraphError::InvalidDepth { .. }
            | RelgraphError::InvalidInput(_)
            | RelgraphError::MissingColumns(_)
            | RelgraphError::Csv(_)
            | RelgraphError::NoGraphLoaded => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable machine-readable error code
    pub fn code(&self) -> &'static str {
        match self {
            RelgraphError::Database(_) => "database_error",
            RelgraphError::Io(_) => "io_error",
            RelgraphError::Csv(_) => "invalid_csv",
            RelgraphError::Config(_) => "config_error",
            RelgraphError::InvalidInput(_) => "invalid_input",
            RelgraphError::MissingColumns(_) => "missing_columns",
            RelgraphError::NoGraphLoaded => "no_graph_loaded",
            RelgraphError::UnknownEntity(_) => "unknown_entity",
            RelgraphError::UnknownSession(_) => "unknown_session",
            RelgraphError::InvalidDepth { .. } => "invalid_depth",
            RelgraphError::DuplicateNode(_) => "duplicate_node",
        }
    }
}

impl IntoResponse for RelgraphError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            log::error!("Request failed: {}", self);
        } else {
            log::debug!("Request rejected: {}", self);
        }
        (
            status,
            Json(serde_json::json!({
                "error": self.code(),
                "detail": self.to_string(),
            })),
        )
            .into_response()
    }
}

/// Check if a port is available by attempting to bind to it
async fn check_port_available(host: &str, port: u16) -> bool {
    tokio::net::TcpListener::bind((host, port)).await.is_ok()
}

/// Build the router over `state`.
///
/// CORS follows `http_server.allowed_origins`: empty allows any origin.
pub fn router(state: AppState) -> Router {
    let allowed_origins = &state.config.http_server.allowed_origins;
    let cors = if allowed_origins.is_empty() {
        CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any)
    } else {
        let origins: Vec<HeaderValue> = allowed_origins.iter().filter_map(|o| o.parse().ok()).collect();
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(Any)
            .allow_headers(Any)
    };

    Router::new()
        .route(
            "/api/upload",
            post(handlers::upload).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .route("/api/entities", get(handlers::entities))
        .route("/api/stats", get(handlers::stats))
        .route("/api/legend", get(handlers::legend))
        .route("/api/graph/interactive", post(handlers::interactive))
        .route("/api/graph/radial", post(handlers::radial))
        .route("/api/sessions", post(sessions::start))
        .route("/api/sessions/:id", get(sessions::show).delete(sessions::remove))
        .route("/api/sessions/:id/click", post(sessions::click))
        .route("/api/sessions/:id/reset", post(sessions::reset))
        .route("/api/sessions/:id/depth", post(sessions::depth))
        .route("/api/sessions/:id/mode", post(sessions::mode))
        .route("/api/sessions/:id/root", post(sessions::root))
        .route("/api/sessions/:id/drag", post(sessions::drag))
        .route("/api/sessions/:id/stream", get(sessions::stream))
        .route("/health", get(handlers::health))
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()).layer(cors))
        .with_state(state)
}

/// HTTP server for the relationship explorer
pub struct HttpServer {
    state: AppState,
}

impl HttpServer {
    /// `store` is the table loaded at startup, if one was uploaded before
    pub fn new(db: Db, config: Config, store: Option<RelationshipStore>) -> Self {
        Self {
            state: AppState::new(db, config, store),
        }
    }

    /// Run the HTTP server until it fails
    pub async fn run(&self) -> Result<()> {
        let host = self.state.config.http_server.host.clone();
        let port = self.state.config.http_server.port;
        let addr = format!("{}:{}", host, port);

        if !check_port_available(&host, port).await {
            return Err(RelgraphError::Config(format!(
                "Port {} is already in use on {}. Stop the other process or set http_server.port in config.toml",
                port, host
            )));
        }

        let listener = tokio::net::TcpListener::bind(&addr).await.map_err(|e| {
            RelgraphError::Io(std::io::Error::new(e.kind(), format!("Failed to bind to {}: {}", addr, e)))
        })?;

        log::info!("Starting relgraph HTTP server on http://{}", addr);

        axum::serve(listener, router(self.state.clone()))
            .await
            .map_err(|e| RelgraphError::Io(std::io::Error::new(std::io::ErrorKind::Other, format!("HTTP server error: {}", e))))?;

        Ok(())
    }
}
