//! Per-file dispatch records and the observers that receive them

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::classify::ContentType;
use crate::core::types::OutcomeStatus;

/// Structured record of one dispatch
#[derive(Debug, Clone)]
pub struct DispatchRecord {
    pub path: PathBuf,
    /// `None` when classification itself failed
    pub content_type: Option<ContentType>,
    /// Strategy that ran, if any
    pub strategy: Option<&'static str>,
    pub status: OutcomeStatus,
    /// Failing stage for fallbacks and failures
    pub stage: Option<&'static str>,
    pub cause: Option<String>,
    pub elapsed: Duration,
}

impl DispatchRecord {
    /// Content type label, `unclassified` when classification failed
    pub fn content_label(&self) -> &'static str {
        self.content_type
            .map(|ct| ct.label())
            .unwrap_or("unclassified")
    }
}

/// Receives one record per dispatched file
pub trait DispatchObserver: Send + Sync {
    fn on_dispatch(&self, record: &DispatchRecord);
}

/// Emits one structured tracing event per file
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl DispatchObserver for TracingObserver {
    fn on_dispatch(&self, record: &DispatchRecord) {
        let path = record.path.display();
        let elapsed_ms = record.elapsed.as_millis() as u64;
        let stage = record.stage.unwrap_or("-");
        let cause = record.cause.as_deref().unwrap_or("");
        let strategy = record.strategy.unwrap_or("-");

        match record.status {
            OutcomeStatus::Success => tracing::info!(
                target: "dispatch",
                path = %path,
                content_type = record.content_label(),
                strategy,
                elapsed_ms,
                "Thumbnail generated"
            ),
            OutcomeStatus::Fallback => tracing::warn!(
                target: "dispatch",
                path = %path,
                content_type = record.content_label(),
                strategy,
                stage,
                cause,
                elapsed_ms,
                "Placeholder written instead of thumbnail"
            ),
            OutcomeStatus::Failed => tracing::error!(
                target: "dispatch",
                path = %path,
                content_type = record.content_label(),
                strategy,
                stage,
                cause,
                elapsed_ms,
                "No thumbnail could be written"
            ),
        }
    }
}

/// Fans a record out to several observers, in order
#[derive(Default, Clone)]
pub struct ObserverSet {
    observers: Vec<Arc<dyn DispatchObserver>>,
}

impl ObserverSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, observer: Arc<dyn DispatchObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    pub fn len(&self) -> usize {
        self.observers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }
}

impl DispatchObserver for ObserverSet {
    fn on_dispatch(&self, record: &DispatchRecord) {
        for observer in &self.observers {
            observer.on_dispatch(record);
        }
    }
}
