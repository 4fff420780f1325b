//! External process execution
//!
//! Frame extraction and document conversion shell out to heavyweight tools. Every
//! invocation goes through [`ProcessRunner`], which:
//! - caps how many tools run at once
//! - enforces a wall-clock timeout
//! - kills the child when the walk is cancelled
//! - never inherits stdin, so a tool waiting for input cannot hang the pipeline

#[cfg(test)]
mod tests;

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;

use crate::core::error::ProcessError;

/// Bytes of stderr kept for diagnostics
const STDERR_TAIL: usize = 1024;

/// A program plus its arguments
#[derive(Debug, Clone)]
pub struct ExternalCommand {
    program: PathBuf,
    args: Vec<OsString>,
}

impl ExternalCommand {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    pub fn get_args(&self) -> &[OsString] {
        &self.args
    }

    /// Short program name for errors and logs
    pub fn display_name(&self) -> String {
        self.program
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.program.display().to_string())
    }
}

/// Runs external commands under a shared concurrency cap and timeout
#[derive(Debug, Clone)]
pub struct ProcessRunner {
    permits: Arc<Semaphore>,
    timeout: Duration,
}

impl ProcessRunner {
    pub fn new(max_concurrent: usize, timeout: Duration) -> Self {
        Self {
            permits: Arc::new(Semaphore::new(max_concurrent.max(1))),
            timeout,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Free process slots right now
    pub fn available_slots(&self) -> usize {
        self.permits.available_permits()
    }

    /// Run a command to completion; only a zero exit status is success
    pub async fn run(
        &self,
        command: &ExternalCommand,
        cancel: &CancellationToken,
    ) -> Result<(), ProcessError> {
        let program = command.display_name();

        // A cancelled caller never starts a process
        let _permit = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                return Err(ProcessError::Cancelled { program });
            }
            permit = Arc::clone(&self.permits).acquire_owned() => {
                permit.map_err(|e| ProcessError::Interrupted {
                    program: program.clone(),
                    reason: e.to_string(),
                })?
            }
        };

        let child = tokio::process::Command::new(command.program())
            .args(command.get_args())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| ProcessError::Spawn {
                program: program.clone(),
                reason: e.to_string(),
            })?;

        tracing::debug!(program = %program, args = ?command.get_args(), "Spawned external process");

        // Dropping the wait future drops the child, which kills it
        let output = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::debug!(program = %program, "External process cancelled, killed");
                return Err(ProcessError::Cancelled { program });
            }
            result = tokio::time::timeout(self.timeout, child.wait_with_output()) => {
                match result {
                    Ok(Ok(output)) => output,
                    Ok(Err(e)) => {
                        return Err(ProcessError::Interrupted {
                            program,
                            reason: e.to_string(),
                        });
                    }
                    Err(_) => {
                        tracing::warn!(program = %program, timeout = ?self.timeout, "External process timed out, killed");
                        return Err(ProcessError::Timeout {
                            program,
                            timeout: self.timeout,
                        });
                    }
                }
            }
        };

        if output.status.success() {
            return Ok(());
        }

        tracing::debug!(
            program = %program,
            code = ?output.status.code(),
            stderr = %stderr_tail(&output.stderr),
            "External process failed"
        );

        Err(ProcessError::NonZeroExit {
            program,
            code: output.status.code(),
        })
    }

    /// Run a command that must leave a file behind at `expected`
    pub async fn run_expecting(
        &self,
        command: &ExternalCommand,
        expected: &Path,
        cancel: &CancellationToken,
    ) -> Result<(), ProcessError> {
        self.run(command, cancel).await?;

        match tokio::fs::metadata(expected).await {
            Ok(meta) if meta.is_file() => Ok(()),
            _ => Err(ProcessError::MissingOutput {
                program: command.display_name(),
                expected: expected.to_path_buf(),
            }),
        }
    }
}

fn stderr_tail(stderr: &[u8]) -> String {
    let start = stderr.len().saturating_sub(STDERR_TAIL);
    String::from_utf8_lossy(&stderr[start..]).trim().to_string()
}
