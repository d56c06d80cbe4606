//! warc-ingest - Crash-Safe WARC File Ingest Daemon
//!
//! A daemon that ingests archival WARC files produced by an upstream
//! crawler: it scans a staging directory, checksums and structurally
//! validates each new file, and atomically relocates it together with an
//! MD5 sidecar into a valid or invalid destination tree. Validated files
//! can optionally be uploaded to an object store.
//!
//! # Features
//!
//! - **Bounded Concurrency**: A fixed worker pool drains a bounded work
//!   queue; a full buffer throttles the scanner instead of growing
//!   memory.
//!
//! - **Duplicate Suppression**: The scanner re-lists the directory every
//!   pass; an in-flight set guarantees each file is processed by at most
//!   one worker at a time.
//!
//! - **Crash Safety Without State**: Relocation moves the sidecar before
//!   the content file, so any interruption leaves the content at the
//!   source to be rediscovered and reprocessed. No database, no
//!   write-ahead log.
//!
//! - **Implicit Retry**: A file whose processing fails stays in the
//!   staging directory and is retried on every subsequent pass until it
//!   succeeds or is removed.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     Staging Directory                       │
//! │                  (crawler drops *.warc.gz)                  │
//! └──────────────────────────────┬──────────────────────────────┘
//!                                │ glob every pass
//!                                ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                          Scanner                            │
//! │              (polling loop, cancellation-aware)             │
//! └──────────────────────────────┬──────────────────────────────┘
//!                                │ add (dedup + backpressure)
//!                                ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        Work Queue                           │
//! │           (crossbeam bounded + in-flight set)               │
//! │   ┌─────────┐  ┌─────────┐           ┌─────────┐            │
//! │   │Worker 1 │  │Worker 2 │    ...    │Worker N │            │
//! │   └────┬────┘  └────┬────┘           └────┬────┘            │
//! └────────┼────────────┼─────────────────────┼─────────────────┘
//!          │            │                     │
//!          ▼            ▼                     ▼
//!   checksum -> sidecar -> validate -> move sidecar -> move content
//!          │                                  │
//!          ▼                                  ▼
//!   ┌─────────────┐                    ┌─────────────┐
//!   │ valid tree  │                    │invalid tree │
//!   └──────┬──────┘                    └─────────────┘
//!          │ optional upload, then delete local copy
//!          ▼
//!   ┌─────────────┐
//!   │object store │
//!   └─────────────┘
//! ```

pub mod checksum;
pub mod config;
pub mod error;
pub mod metrics;
pub mod pipeline;
pub mod progress;
pub mod queue;
pub mod scanner;
pub mod shutdown;
pub mod upload;
pub mod warc;

pub use config::{CliArgs, IngestConfig};
pub use error::{IngestError, Result};
pub use pipeline::{FileProcessor, Verdict};
pub use queue::WorkQueue;
pub use scanner::Scanner;
pub use shutdown::ShutdownSignal;
