//! Metrics sink for the processing pipeline
//!
//! The pipeline reports through the `MetricsSink` trait rather than
//! process-wide counters, so tests can inject doubles and the daemon can
//! aggregate into `IngestStats` for the exit summary. Sink calls are
//! fire-and-forget: they never block and never fail the pipeline.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Metrics collaborator invoked by the file processor
pub trait MetricsSink: Send + Sync {
    /// Record the byte size of a relocated file
    fn observe_size(&self, bytes: u64);

    /// Record the wall-clock time one file took to process
    fn observe_duration(&self, elapsed: Duration);

    /// Count a validator failure (an error, not an invalid verdict)
    fn increment_validation_error(&self);
}

/// Aggregated counters for the whole ingest run
#[derive(Debug, Default)]
pub struct IngestStats {
    /// Files that completed the pipeline
    files_processed: AtomicU64,

    /// Total bytes relocated
    bytes_total: AtomicU64,

    /// Validator failures
    validation_errors: AtomicU64,

    /// Accumulated per-file processing time, in microseconds
    busy_micros: AtomicU64,
}

/// Point-in-time copy of the counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub files_processed: u64,
    pub bytes_total: u64,
    pub validation_errors: u64,
    pub busy: Duration,
}

impl IngestStats {
    /// Take a consistent-enough snapshot for reporting
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            files_processed: self.files_processed.load(Ordering::Relaxed),
            bytes_total: self.bytes_total.load(Ordering::Relaxed),
            validation_errors: self.validation_errors.load(Ordering::Relaxed),
            busy: Duration::from_micros(self.busy_micros.load(Ordering::Relaxed)),
        }
    }
}

impl MetricsSink for IngestStats {
    fn observe_size(&self, bytes: u64) {
        self.files_processed.fetch_add(1, Ordering::Relaxed);
        self.bytes_total.fetch_add(bytes, Ordering::Relaxed);
    }

    fn observe_duration(&self, elapsed: Duration) {
        self.busy_micros
            .fetch_add(elapsed.as_micros() as u64, Ordering::Relaxed);
    }

    fn increment_validation_error(&self) {
        self.validation_errors.fetch_add(1, Ordering::Relaxed);
    }
}

/// Sink that discards everything, for tests and disabled metrics
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopMetrics;

impl MetricsSink for NoopMetrics {
    fn observe_size(&self, _bytes: u64) {}
    fn observe_duration(&self, _elapsed: Duration) {}
    fn increment_validation_error(&self) {}
}
