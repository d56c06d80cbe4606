//! Source directory scanner
//!
//! A polling loop that alternates between two states until cancelled:
//!
//! - *Scanning*: list every path matching the configured glob pattern and
//!   submit each one, checking for cancellation before each submission.
//! - *Waiting*: return after one pass when the interval is zero
//!   (single-pass mode), otherwise wait out the interval or wake early on
//!   cancellation.
//!
//! Cancellation is cooperative: it does not interrupt a submission already
//! blocked on a full queue buffer, so shutdown latency is bounded by the
//! time a worker needs to free one buffer slot.
//!
//! Listing failures do not abort the loop; they are logged and counted,
//! and the pass proceeds as if it had found nothing.

use crate::config::IngestConfig;
use crate::error::QueueError;
use crate::shutdown::ShutdownSignal;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, warn};

/// Statistics for the scanner
#[derive(Debug, Default)]
pub struct ScanStats {
    /// Completed scan passes
    pub passes: AtomicU64,

    /// Paths handed to the queue (including deduplicated ones)
    pub submitted: AtomicU64,

    /// Paths skipped because the listing could not read them
    pub list_errors: AtomicU64,
}

impl ScanStats {
    pub fn passes_count(&self) -> u64 {
        self.passes.load(Ordering::Relaxed)
    }

    pub fn submitted_count(&self) -> u64 {
        self.submitted.load(Ordering::Relaxed)
    }

    pub fn list_errors_count(&self) -> u64 {
        self.list_errors.load(Ordering::Relaxed)
    }
}

/// Polling directory scanner
pub struct Scanner {
    /// Absolute glob pattern (source directory joined with the pattern)
    glob_pattern: String,

    /// Inter-pass interval; zero means exactly one pass
    interval: Duration,

    /// Cancellation token
    shutdown: ShutdownSignal,

    /// Scan statistics
    stats: Arc<ScanStats>,
}

impl Scanner {
    /// Create a scanner for the configured source directory
    pub fn new(config: &IngestConfig, shutdown: ShutdownSignal) -> Self {
        Self {
            glob_pattern: config.glob_pattern.clone(),
            interval: config.sleep,
            shutdown,
            stats: Arc::new(ScanStats::default()),
        }
    }

    /// Scan statistics handle
    pub fn stats(&self) -> Arc<ScanStats> {
        Arc::clone(&self.stats)
    }

    /// Run the scan loop until cancellation or, in single-pass mode,
    /// until one pass has completed
    ///
    /// `submit` is the queue's `add`: it may block under backpressure. A
    /// submission error means the queue was closed underneath us, which
    /// is a programming error; the loop logs it and stops.
    pub fn run<F>(&self, mut submit: F)
    where
        F: FnMut(PathBuf) -> Result<(), QueueError>,
    {
        loop {
            for path in self.list_pass() {
                if self.shutdown.is_cancelled() {
                    debug!("cancellation observed mid-pass, stopping scanner");
                    return;
                }
                match submit(path) {
                    Ok(()) => {
                        self.stats.submitted.fetch_add(1, Ordering::Relaxed);
                    }
                    Err(err) => {
                        error!(error = %err, "work queue closed while scanning");
                        return;
                    }
                }
            }
            self.stats.passes.fetch_add(1, Ordering::Relaxed);

            if self.interval.is_zero() {
                debug!("single-pass mode, scanner done");
                return;
            }
            if self.shutdown.wait_timeout(self.interval) {
                debug!("cancellation observed while waiting, stopping scanner");
                return;
            }
        }
    }

    /// Enumerate paths matching the glob pattern for one pass
    ///
    /// Unreadable entries are logged and counted, then dropped; a pass
    /// that can list nothing simply yields no work.
    fn list_pass(&self) -> Vec<PathBuf> {
        let entries = match glob::glob(&self.glob_pattern) {
            Ok(entries) => entries,
            Err(err) => {
                // The config validated the pattern, so this path is
                // effectively unreachable; still, do not abort the loop.
                warn!(pattern = %self.glob_pattern, error = %err, "glob failed");
                self.stats.list_errors.fetch_add(1, Ordering::Relaxed);
                return Vec::new();
            }
        };

        entries
            .filter_map(|entry| match entry {
                Ok(path) => Some(path),
                Err(err) => {
                    warn!(error = %err, "skipping unreadable path during scan");
                    self.stats.list_errors.fetch_add(1, Ordering::Relaxed);
                    None
                }
            })
            .collect()
    }
}
