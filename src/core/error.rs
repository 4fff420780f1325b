//! Error types for Thumbsmith
//!
//! Every strategy-level error is absorbed by the dispatcher's recovery policy.
//! Only `PlaceholderError` escapes a dispatch, as a `Failed` outcome.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Result type alias for Thumbsmith operations
pub type Result<T> = std::result::Result<T, ThumbnailError>;

/// Main error type for Thumbsmith
#[derive(Error, Debug)]
pub enum ThumbnailError {
    #[error("Classification error: {0}")]
    Classification(#[from] ClassificationError),

    #[error("Strategy error: {0}")]
    Strategy(#[from] StrategyError),

    #[error("Placeholder error: {0}")]
    Placeholder(#[from] PlaceholderError),

    #[error("Process error: {0}")]
    Process(#[from] ProcessError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// The file could not be opened or read for sniffing.
///
/// Distinct from an `Unknown` classification, which is a successful result.
#[derive(Error, Debug)]
#[error("Cannot read {path} for classification: {source}")]
pub struct ClassificationError {
    pub path: PathBuf,
    #[source]
    pub source: std::io::Error,
}

/// Failures raised by a render strategy
#[derive(Error, Debug)]
pub enum StrategyError {
    #[error("Decode failed: {reason}")]
    Decode { reason: String },

    #[error("External process failed: {0}")]
    ExternalProcess(#[from] ProcessError),

    #[error("Document locked: {reason}")]
    Encryption { reason: String },

    #[error("Extraction failed: {reason}")]
    Extraction { reason: String },

    #[error("Failed to write thumbnail {path}: {reason}")]
    Write { path: PathBuf, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl StrategyError {
    /// Name of the pipeline stage that failed, for structured logging
    pub fn stage(&self) -> &'static str {
        match self {
            StrategyError::Decode { .. } => "decode",
            StrategyError::ExternalProcess(err) => err.stage(),
            StrategyError::Encryption { .. } => "unlock",
            StrategyError::Extraction { .. } => "extract",
            StrategyError::Write { .. } => "write",
            StrategyError::Io(_) => "io",
        }
    }
}

/// Failures of a spawned converter or frame extractor
#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("Failed to spawn {program}: {reason}")]
    Spawn { program: String, reason: String },

    #[error("{program} exited with status {code:?}")]
    NonZeroExit { program: String, code: Option<i32> },

    #[error("{program} succeeded but produced no output at {expected}")]
    MissingOutput { program: String, expected: PathBuf },

    #[error("{program} timed out after {timeout:?}")]
    Timeout { program: String, timeout: Duration },

    #[error("{program} was cancelled")]
    Cancelled { program: String },

    #[error("Interrupted while waiting for {program}: {reason}")]
    Interrupted { program: String, reason: String },
}

impl ProcessError {
    /// Name of the process stage that failed
    pub fn stage(&self) -> &'static str {
        match self {
            ProcessError::Spawn { .. } => "spawn",
            ProcessError::NonZeroExit { .. } | ProcessError::MissingOutput { .. } => "process",
            ProcessError::Timeout { .. } => "timeout",
            ProcessError::Cancelled { .. } | ProcessError::Interrupted { .. } => "cancelled",
        }
    }
}

/// The placeholder itself could not be produced. Terminal for a file.
#[derive(Error, Debug)]
pub enum PlaceholderError {
    #[error("Failed to encode placeholder: {reason}")]
    Encode { reason: String },

    #[error("Failed to write placeholder {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Configuration loading and validation errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strategy_error_stage() {
        let decode = StrategyError::Decode { reason: "bad".to_string() };
        assert_eq!(decode.stage(), "decode");

        let timeout = StrategyError::ExternalProcess(ProcessError::Timeout {
            program: "ffmpeg".to_string(),
            timeout: Duration::from_secs(1),
        });
        assert_eq!(timeout.stage(), "timeout");

        let missing = StrategyError::ExternalProcess(ProcessError::MissingOutput {
            program: "ffmpeg".to_string(),
            expected: PathBuf::from("/tmp/x.jpg"),
        });
        assert_eq!(missing.stage(), "process");
    }

    #[test]
    fn test_error_display() {
        let err = ProcessError::NonZeroExit {
            program: "soffice".to_string(),
            code: Some(1),
        };
        assert_eq!(err.to_string(), "soffice exited with status Some(1)");

        let wrapped: ThumbnailError = err.into();
        assert!(wrapped.to_string().starts_with("Process error:"));
    }
}
