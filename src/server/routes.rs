//! HTTP handlers

use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::error::ServerError;
use super::ServerState;
use crate::dispatch::MetricsSnapshot;
use crate::walker::WalkSummary;

/// Message returned once a walk has finished
pub const GENERATED_MESSAGE: &str = "Thumbnails generated successfully.";

/// Query parameters of the generate endpoint
#[derive(Debug, Deserialize)]
pub struct GenerateParams {
    pub path: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GenerateResponse {
    pub message: String,
    pub summary: WalkSummary,
}

/// Thumbnail a file or directory tree and wait for the walk to finish
///
/// Route: POST /api/thumbnail/generate?path=<path>
pub async fn generate(
    State(state): State<ServerState>,
    Query(params): Query<GenerateParams>,
) -> Result<Json<GenerateResponse>, ServerError> {
    let path = match params.path.as_deref().map(str::trim) {
        Some(p) if !p.is_empty() => PathBuf::from(p),
        _ => return Err(ServerError::MissingPath),
    };

    if !tokio::fs::try_exists(&path).await.unwrap_or(false) {
        return Err(ServerError::PathNotFound {
            path: path.display().to_string(),
        });
    }

    let summary = state.walker.walk_with_cancel(&path, &state.shutdown).await;

    Ok(Json(GenerateResponse {
        message: GENERATED_MESSAGE.to_string(),
        summary,
    }))
}

/// Aggregated dispatch metrics since startup
///
/// Route: GET /api/thumbnail/stats
pub async fn stats(State(state): State<ServerState>) -> Json<MetricsSnapshot> {
    Json(state.metrics.snapshot())
}

/// Route: GET /health
pub async fn health() -> &'static str {
    "ok"
}
