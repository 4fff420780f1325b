//! Aggregated dispatch metrics
//!
//! Counts outcomes per status and keeps duration statistics per content type.
//! Served by the HTTP stats endpoint.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use super::observer::{DispatchObserver, DispatchRecord};
use crate::core::types::OutcomeStatus;

/// Aggregated statistics for a series of durations, in milliseconds
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct MetricStats {
    /// Number of samples
    pub count: u64,
    /// Sum of all values
    pub sum: f64,
    /// Minimum value
    pub min: f64,
    /// Maximum value
    pub max: f64,
    /// Mean value
    pub mean: f64,
    /// Last recorded value
    pub last: f64,
    /// Last update timestamp
    pub last_updated: Option<DateTime<Utc>>,
}

impl MetricStats {
    fn new() -> Self {
        Self {
            count: 0,
            sum: 0.0,
            min: f64::MAX,
            max: f64::MIN,
            mean: 0.0,
            last: 0.0,
            last_updated: None,
        }
    }

    fn update(&mut self, value: f64) {
        self.count += 1;
        self.sum += value;
        self.min = self.min.min(value);
        self.max = self.max.max(value);
        self.mean = self.sum / self.count as f64;
        self.last = value;
        self.last_updated = Some(Utc::now());
    }
}

/// Point-in-time copy of the collected metrics
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct MetricsSnapshot {
    /// Seconds since the collector was created
    pub uptime_secs: u64,
    /// Files dispatched
    pub total: u64,
    pub success: u64,
    pub fallback: u64,
    pub failed: u64,
    /// Dispatch duration statistics keyed by content type label
    pub durations_ms: HashMap<String, MetricStats>,
    /// Fallback and failure counts keyed by failing stage
    pub failing_stages: HashMap<String, u64>,
}

/// Metrics collector fed by the dispatcher
pub struct DispatchMetrics {
    success: AtomicU64,
    fallback: AtomicU64,
    failed: AtomicU64,
    durations: RwLock<HashMap<String, MetricStats>>,
    stages: RwLock<HashMap<String, u64>>,
    start_time: Instant,
}

impl Default for DispatchMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl DispatchMetrics {
    pub fn new() -> Self {
        Self {
            success: AtomicU64::new(0),
            fallback: AtomicU64::new(0),
            failed: AtomicU64::new(0),
            durations: RwLock::new(HashMap::new()),
            stages: RwLock::new(HashMap::new()),
            start_time: Instant::now(),
        }
    }

    /// Record one dispatch
    pub fn record(&self, record: &DispatchRecord) {
        let counter = match record.status {
            OutcomeStatus::Success => &self.success,
            OutcomeStatus::Fallback => &self.fallback,
            OutcomeStatus::Failed => &self.failed,
        };
        counter.fetch_add(1, Ordering::Relaxed);

        {
            let mut durations = self.durations.write();
            durations
                .entry(record.content_label().to_string())
                .or_insert_with(MetricStats::new)
                .update(record.elapsed.as_secs_f64() * 1000.0);
        }

        if let Some(stage) = record.stage {
            *self.stages.write().entry(stage.to_string()).or_insert(0) += 1;
        }

        tracing::trace!(
            target: "metrics",
            content_type = record.content_label(),
            status = %record.status,
            "Dispatch recorded"
        );
    }

    pub fn count(&self, status: OutcomeStatus) -> u64 {
        match status {
            OutcomeStatus::Success => self.success.load(Ordering::Relaxed),
            OutcomeStatus::Fallback => self.fallback.load(Ordering::Relaxed),
            OutcomeStatus::Failed => self.failed.load(Ordering::Relaxed),
        }
    }

    pub fn total(&self) -> u64 {
        self.count(OutcomeStatus::Success)
            + self.count(OutcomeStatus::Fallback)
            + self.count(OutcomeStatus::Failed)
    }

    /// Duration statistics for one content type label
    pub fn durations_for(&self, label: &str) -> Option<MetricStats> {
        self.durations.read().get(label).cloned()
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            uptime_secs: self.start_time.elapsed().as_secs(),
            total: self.total(),
            success: self.count(OutcomeStatus::Success),
            fallback: self.count(OutcomeStatus::Fallback),
            failed: self.count(OutcomeStatus::Failed),
            durations_ms: self.durations.read().clone(),
            failing_stages: self.stages.read().clone(),
        }
    }

    /// Clear everything except the start time
    pub fn reset(&self) {
        self.success.store(0, Ordering::Relaxed);
        self.fallback.store(0, Ordering::Relaxed);
        self.failed.store(0, Ordering::Relaxed);
        self.durations.write().clear();
        self.stages.write().clear();
    }
}

impl DispatchObserver for DispatchMetrics {
    fn on_dispatch(&self, record: &DispatchRecord) {
        self.record(record);
    }
}
