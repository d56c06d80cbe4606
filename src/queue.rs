//! Deduplicating bounded work queue
//!
//! This module provides the work-distribution engine: a bounded channel
//! of file paths drained by a fixed pool of worker threads, guarded by an
//! in-flight set that suppresses duplicate submissions.
//!
//! Deduplication exists because the scanner re-lists the source directory
//! on every pass: a slow file discovered on pass N and still queued when
//! pass N+1 starts would otherwise be submitted twice, breaking the
//! at-most-once-in-flight guarantee the relocation protocol depends on.
//!
//! Invariant: a path is in the in-flight set iff it is currently buffered
//! or being executed by exactly one worker. Insertion happens under the
//! set mutex *before* the channel send; removal happens under the same
//! mutex only after `execute` returns.

use crate::error::QueueError;
use crossbeam_channel::{bounded, Sender};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};
use tracing::{error, trace};

/// Statistics for the work queue
#[derive(Debug, Default)]
pub struct QueueStats {
    /// Jobs accepted into the buffer
    pub enqueued: AtomicU64,

    /// Jobs dropped because their identity was already in flight
    pub deduplicated: AtomicU64,

    /// Jobs whose execution has completed
    pub executed: AtomicU64,
}

impl QueueStats {
    /// Number of completed executions
    pub fn executed_count(&self) -> u64 {
        self.executed.load(Ordering::Relaxed)
    }

    /// Number of duplicate submissions suppressed
    pub fn deduplicated_count(&self) -> u64 {
        self.deduplicated.load(Ordering::Relaxed)
    }

    /// Number of jobs accepted
    pub fn enqueued_count(&self) -> u64 {
        self.enqueued.load(Ordering::Relaxed)
    }
}

/// Bounded work queue with per-path deduplication
///
/// `new` spawns the worker pool; `add` submits paths with backpressure;
/// `close_and_wait` drains the buffer and joins the workers.
pub struct WorkQueue {
    /// Present until close_and_wait; dropping it disconnects the workers
    sender: Option<Sender<PathBuf>>,

    /// Identities currently buffered or executing
    in_flight: Arc<Mutex<HashSet<PathBuf>>>,

    /// Worker thread handles
    workers: Vec<JoinHandle<()>>,

    /// Queue statistics
    stats: Arc<QueueStats>,

    /// Buffer capacity (= worker count)
    capacity: usize,
}

impl WorkQueue {
    /// Create a queue and spawn `concurrency` worker threads
    ///
    /// Each worker pulls paths from a bounded buffer of capacity
    /// `concurrency` and invokes `execute` synchronously per path.
    pub fn new<F>(execute: F, concurrency: usize) -> Self
    where
        F: Fn(&Path) + Send + Sync + 'static,
    {
        let (sender, receiver) = bounded::<PathBuf>(concurrency);
        let in_flight = Arc::new(Mutex::new(HashSet::with_capacity(concurrency)));
        let stats = Arc::new(QueueStats::default());
        let execute = Arc::new(execute);

        let mut workers = Vec::with_capacity(concurrency);
        for id in 0..concurrency {
            let receiver = receiver.clone();
            let in_flight = Arc::clone(&in_flight);
            let stats = Arc::clone(&stats);
            let execute = Arc::clone(&execute);

            let handle = thread::Builder::new()
                .name(format!("ingest-worker-{id}"))
                .spawn(move || {
                    for job in receiver.iter() {
                        trace!(worker = id, path = %job.display(), "executing job");
                        execute(&job);
                        stats.executed.fetch_add(1, Ordering::Relaxed);
                        lock_set(&in_flight).remove(&job);
                    }
                })
                .expect("Failed to spawn worker thread");
            workers.push(handle);
        }

        Self {
            sender: Some(sender),
            in_flight,
            workers,
            stats,
            capacity: concurrency,
        }
    }

    /// Submit a path for processing
    ///
    /// A path already buffered or executing is silently ignored. Blocks
    /// when the buffer is full, throttling the caller to the rate the
    /// workers can sustain. Returns `QueueError::Closed` after
    /// `close_and_wait`; that is caller misuse, not a runtime condition.
    pub fn add(&self, job: PathBuf) -> Result<(), QueueError> {
        let sender = self.sender.as_ref().ok_or(QueueError::Closed)?;

        // Reserve the identity before enqueueing so a second add racing
        // with this one cannot also decide to enqueue. The lock must be
        // released before the (potentially blocking) send, or workers
        // could never remove entries and drain the buffer.
        {
            let mut set = lock_set(&self.in_flight);
            if !set.insert(job.clone()) {
                self.stats.deduplicated.fetch_add(1, Ordering::Relaxed);
                trace!(path = %job.display(), "already in flight, skipping");
                return Ok(());
            }
        }

        match sender.send(job) {
            Ok(()) => {
                self.stats.enqueued.fetch_add(1, Ordering::Relaxed);
                Ok(())
            }
            Err(send_err) => {
                // Workers are gone; roll back the reservation
                lock_set(&self.in_flight).remove(&send_err.0);
                Err(QueueError::Closed)
            }
        }
    }

    /// Stop accepting jobs, drain the buffer and join all workers
    ///
    /// Returns only after every buffered and in-flight job has completed.
    /// Safe to call more than once; `add` errors afterwards.
    pub fn close_and_wait(&mut self) {
        self.sender.take();
        for handle in self.workers.drain(..) {
            if handle.join().is_err() {
                error!("worker thread panicked");
            }
        }
    }

    /// Queue statistics handle
    pub fn stats(&self) -> Arc<QueueStats> {
        Arc::clone(&self.stats)
    }

    /// Buffer capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Drop for WorkQueue {
    fn drop(&mut self) {
        self.close_and_wait();
    }
}

/// Lock the in-flight set, shrugging off poisoning
///
/// A panic in `execute` unwinds a worker without the lock held, so a
/// poisoned set is still structurally sound.
fn lock_set(set: &Mutex<HashSet<PathBuf>>) -> MutexGuard<'_, HashSet<PathBuf>> {
    set.lock().unwrap_or_else(|e| e.into_inner())
}
