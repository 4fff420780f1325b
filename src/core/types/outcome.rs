//! Per-file dispatch result

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Final status of one dispatch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutcomeStatus {
    /// The selected strategy produced the thumbnail
    Success,
    /// The strategy failed or degraded; a placeholder was written instead
    Fallback,
    /// Even the placeholder could not be written
    Failed,
}

impl OutcomeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutcomeStatus::Success => "success",
            OutcomeStatus::Fallback => "fallback",
            OutcomeStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for OutcomeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of dispatching one source file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderOutcome {
    /// Final status
    pub status: OutcomeStatus,
    /// Where the thumbnail was (or would have been) written
    pub output_path: PathBuf,
    /// Why the primary strategy did not produce the thumbnail
    pub cause: Option<String>,
}

impl RenderOutcome {
    pub fn success(output_path: PathBuf) -> Self {
        Self {
            status: OutcomeStatus::Success,
            output_path,
            cause: None,
        }
    }

    pub fn fallback(output_path: PathBuf, cause: impl Into<String>) -> Self {
        Self {
            status: OutcomeStatus::Fallback,
            output_path,
            cause: Some(cause.into()),
        }
    }

    pub fn failed(output_path: PathBuf, cause: impl Into<String>) -> Self {
        Self {
            status: OutcomeStatus::Failed,
            output_path,
            cause: Some(cause.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == OutcomeStatus::Success
    }
}
