//! HTTP entry point
//!
//! A small axum API in front of the tree walker:
//! - `POST /api/thumbnail/generate?path=...` walks a path and reports a summary
//! - `GET /api/thumbnail/stats` returns aggregated dispatch metrics
//! - `GET /health`

mod error;
mod routes;
#[cfg(test)]
mod tests;

pub use error::{ServerError, PATH_DOES_NOT_EXIST};
pub use routes::{GenerateParams, GenerateResponse, GENERATED_MESSAGE};

use axum::http::Method;
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::core::config::ServerConfig;
use crate::dispatch::DispatchMetrics;
use crate::walker::TreeWalker;

/// Shared state for the handlers
#[derive(Clone)]
pub struct ServerState {
    pub walker: TreeWalker,
    pub metrics: Arc<DispatchMetrics>,
    /// Fired on shutdown; running walks stop dispatching
    pub shutdown: CancellationToken,
}

impl ServerState {
    pub fn new(walker: TreeWalker, metrics: Arc<DispatchMetrics>) -> Self {
        Self {
            walker,
            metrics,
            shutdown: CancellationToken::new(),
        }
    }
}

/// HTTP server wrapping the walker
pub struct ThumbnailServer {
    state: ServerState,
    config: ServerConfig,
}

impl ThumbnailServer {
    pub fn new(config: ServerConfig, state: ServerState) -> Self {
        Self { state, config }
    }

    pub fn state(&self) -> &ServerState {
        &self.state
    }

    /// Token that stops the server and cancels running walks
    pub fn shutdown_token(&self) -> CancellationToken {
        self.state.shutdown.clone()
    }

    /// Build the router with all routes and middleware
    pub fn build_router(&self) -> Router {
        let cors = CorsLayer::new()
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers(Any)
            .allow_origin(Any);

        Router::new()
            .route("/api/thumbnail/generate", post(routes::generate))
            .route("/api/thumbnail/stats", get(routes::stats))
            .route("/health", get(routes::health))
            .layer(TraceLayer::new_for_http())
            .layer(cors)
            .with_state(self.state.clone())
    }

    /// Serve until the shutdown token fires
    pub async fn start(&self) -> Result<(), ServerError> {
        let addr = format!("{}:{}", self.config.host, self.config.port);
        let router = self.build_router();

        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .map_err(|e| ServerError::BindFailed {
                reason: format!("{}: {}", addr, e),
            })?;

        tracing::info!("Thumbnail server listening on {}", addr);

        let shutdown = self.state.shutdown.clone();
        axum::serve(listener, router)
            .with_graceful_shutdown(async move { shutdown.cancelled().await })
            .await
            .map_err(|e| ServerError::Internal {
                reason: e.to_string(),
            })?;

        tracing::info!("Thumbnail server stopped");
        Ok(())
    }
}
