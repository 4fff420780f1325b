//! HTTP server error types

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// Body of every rejected generate request
pub const PATH_DOES_NOT_EXIST: &str = "Path does not exist.";

/// HTTP server error type
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("No path given")]
    MissingPath,

    #[error("Path not found: {path}")]
    PathNotFound { path: String },

    #[error("Server bind failed: {reason}")]
    BindFailed { reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal server error: {reason}")]
    Internal { reason: String },
}

impl ServerError {
    /// Whether this error should result in a 400 Bad Request response
    pub fn is_bad_request(&self) -> bool {
        matches!(self, ServerError::MissingPath | ServerError::PathNotFound { .. })
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        if self.is_bad_request() {
            tracing::debug!(error = %self, "Rejected generate request");
            return (StatusCode::BAD_REQUEST, PATH_DOES_NOT_EXIST).into_response();
        }

        tracing::error!(error = %self, "Request failed");
        (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()).into_response()
    }
}
