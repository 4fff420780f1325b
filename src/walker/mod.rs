//! Tree walker
//!
//! Expands a root path into the regular files beneath it with an explicit worklist,
//! then feeds them to the dispatcher through a bounded pool of concurrent dispatches.
//! Directories that cannot be listed count as empty.

#[cfg(test)]
mod tests;

use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;
use uuid::Uuid;

use crate::classify::SourceFile;
use crate::core::config::WalkConfig;
use crate::core::types::{OutcomeStatus, RenderOutcome, ThumbnailSpec};
use crate::dispatch::Dispatcher;

/// Counts for one walk
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalkSummary {
    /// Identifier attached to every log line of the walk
    pub walk_id: Uuid,
    /// Files handed to the dispatcher
    pub files: u64,
    pub success: u64,
    pub fallback: u64,
    pub failed: u64,
    /// Generated thumbnails, unfollowed directory symlinks, broken links and
    /// special files
    pub skipped: u64,
    /// Files never dispatched because the walk was cancelled
    pub cancelled: u64,
    /// Outcomes with status `Failed`
    pub failures: Vec<RenderOutcome>,
    pub elapsed_ms: u64,
}

impl WalkSummary {
    fn record(&mut self, outcome: RenderOutcome) {
        self.files += 1;
        match outcome.status {
            OutcomeStatus::Success => self.success += 1,
            OutcomeStatus::Fallback => self.fallback += 1,
            OutcomeStatus::Failed => {
                self.failed += 1;
                self.failures.push(outcome);
            }
        }
    }
}

/// Files found under a root
#[derive(Debug, Default)]
struct Discovery {
    files: Vec<PathBuf>,
    skipped: u64,
}

/// Walks file trees and dispatches every regular file once
#[derive(Clone)]
pub struct TreeWalker {
    dispatcher: Arc<Dispatcher>,
    workers: usize,
    config: WalkConfig,
}

impl TreeWalker {
    pub fn new(dispatcher: Arc<Dispatcher>, workers: usize, config: WalkConfig) -> Self {
        Self {
            dispatcher,
            workers: workers.max(1),
            config,
        }
    }

    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.dispatcher
    }

    /// Thumbnail `root`, a file or a directory tree
    pub async fn walk(&self, root: &Path) -> WalkSummary {
        self.walk_with_cancel(root, &CancellationToken::new()).await
    }

    /// Like `walk`; after `cancel` fires no further files are dispatched and running
    /// external processes are killed
    pub async fn walk_with_cancel(&self, root: &Path, cancel: &CancellationToken) -> WalkSummary {
        let walk_id = Uuid::now_v7();
        let span = tracing::info_span!("walk", walk_id = %walk_id);
        self.run_walk(walk_id, root, cancel).instrument(span).await
    }

    async fn run_walk(&self, walk_id: Uuid, root: &Path, cancel: &CancellationToken) -> WalkSummary {
        let started = Instant::now();
        let discovery = self.discover(root).await;

        tracing::info!(
            root = %root.display(),
            files = discovery.files.len(),
            skipped = discovery.skipped,
            workers = self.workers,
            "Walk started"
        );

        let mut summary = WalkSummary {
            walk_id,
            skipped: discovery.skipped,
            ..Default::default()
        };

        let dispatcher = Arc::clone(&self.dispatcher);
        let token = cancel.clone();
        let mut outcomes = stream::iter(discovery.files)
            .map(move |path| {
                let dispatcher = Arc::clone(&dispatcher);
                let cancel = token.clone();
                async move {
                    if cancel.is_cancelled() {
                        return None;
                    }
                    let source = SourceFile::new(path);
                    Some(dispatcher.render_with_cancel(&source, &cancel).await)
                }
            })
            .buffer_unordered(self.workers);

        while let Some(outcome) = outcomes.next().await {
            match outcome {
                Some(outcome) => summary.record(outcome),
                None => summary.cancelled += 1,
            }
        }

        summary.elapsed_ms = started.elapsed().as_millis() as u64;

        tracing::info!(
            root = %root.display(),
            files = summary.files,
            success = summary.success,
            fallback = summary.fallback,
            failed = summary.failed,
            cancelled = summary.cancelled,
            elapsed_ms = summary.elapsed_ms,
            "Walk finished"
        );

        summary
    }

    /// Expand `root` into the files to dispatch
    async fn discover(&self, root: &Path) -> Discovery {
        let mut discovery = Discovery::default();

        let metadata = match tokio::fs::metadata(root).await {
            Ok(m) => m,
            Err(e) => {
                tracing::warn!(root = %root.display(), error = %e, "Walk root is not accessible");
                return discovery;
            }
        };

        if metadata.is_file() {
            discovery.files.push(root.to_path_buf());
            return discovery;
        }
        if !metadata.is_dir() {
            return discovery;
        }

        let mut seen_files = HashSet::new();
        let mut seen_dirs = HashSet::new();
        let mut stack = vec![root.to_path_buf()];

        while let Some(dir) = stack.pop() {
            if self.config.follow_symlinks {
                // Followed links can loop back on themselves
                let key = tokio::fs::canonicalize(&dir).await.unwrap_or_else(|_| dir.clone());
                if !seen_dirs.insert(key) {
                    continue;
                }
            }

            for (path, kind) in self.list_directory(&dir).await {
                match kind {
                    EntryKind::Dir => stack.push(path),
                    EntryKind::File => {
                        if self.is_generated_thumbnail(&path).await {
                            discovery.skipped += 1;
                        } else if seen_files.insert(path.clone()) {
                            discovery.files.push(path);
                        }
                    }
                    EntryKind::Skipped => discovery.skipped += 1,
                }
            }
        }

        discovery
    }

    /// Immediate children of `dir`; an unreadable directory has none
    async fn list_directory(&self, dir: &Path) -> Vec<(PathBuf, EntryKind)> {
        let mut entries = match tokio::fs::read_dir(dir).await {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(dir = %dir.display(), error = %e, "Failed to read directory, treating as empty");
                return Vec::new();
            }
        };

        let mut children = Vec::new();
        loop {
            let entry = match entries.next_entry().await {
                Ok(Some(entry)) => entry,
                Ok(None) => break,
                Err(e) => {
                    tracing::warn!(dir = %dir.display(), error = %e, "Directory listing interrupted");
                    break;
                }
            };

            let path = entry.path();
            let kind = match entry.file_type().await {
                Ok(file_type) if file_type.is_symlink() => self.resolve_symlink(&path).await,
                Ok(file_type) if file_type.is_dir() => EntryKind::Dir,
                Ok(file_type) if file_type.is_file() => EntryKind::File,
                // sockets, fifos, devices
                Ok(_) => EntryKind::Skipped,
                Err(e) => {
                    tracing::debug!(path = %path.display(), error = %e, "Failed to stat entry");
                    continue;
                }
            };
            children.push((path, kind));
        }

        children
    }

    async fn resolve_symlink(&self, path: &Path) -> EntryKind {
        match tokio::fs::metadata(path).await {
            Ok(m) if m.is_file() => EntryKind::File,
            Ok(m) if m.is_dir() && self.config.follow_symlinks => EntryKind::Dir,
            Ok(m) if m.is_dir() => {
                tracing::debug!(path = %path.display(), "Not following directory symlink");
                EntryKind::Skipped
            }
            // dangling, or pointing at a special file
            _ => EntryKind::Skipped,
        }
    }

    /// `thumb_<name>.jpg` whose `<name>` exists beside it. A lone file that merely
    /// carries the prefix is an ordinary source.
    async fn is_generated_thumbnail(&self, path: &Path) -> bool {
        if !self.config.skip_generated_thumbnails {
            return false;
        }
        let Some(source) = path
            .file_name()
            .and_then(|n| n.to_str())
            .and_then(ThumbnailSpec::source_name)
        else {
            return false;
        };
        tokio::fs::symlink_metadata(path.with_file_name(source))
            .await
            .is_ok()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EntryKind {
    File,
    Dir,
    Skipped,
}
