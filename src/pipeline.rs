//! Per-file processing pipeline
//!
//! The function the queue's workers execute, one invocation per file,
//! with exclusivity per path guaranteed by the queue:
//!
//! 1. Existence check - a vanished file was handled elsewhere, not an error
//! 2. MD5 checksum of the full content
//! 3. Checksum sidecar written next to the source file
//! 4. Structural validation, yielding the valid/invalid verdict
//! 5. Two-phase relocation: sidecar first, then the content file
//! 6. Stat of the relocated file, metrics, outcome log
//! 7. Optional upload of relocated valid files
//!
//! The relocation order is the crash-safety invariant: if the process
//! dies between the two renames, the content file is still at the source
//! and gets rediscovered, re-checksummed and reprocessed on the next
//! pass, overwriting the stale destination sidecar. The reverse order
//! would strand content in the destination with no sidecar ever written.
//!
//! Any step failing drops the job with a log line; the source file stays
//! where it is and retry happens implicitly through rediscovery.

use crate::checksum;
use crate::config::IngestConfig;
use crate::error::{ProcessError, ProcessResult};
use crate::metrics::MetricsSink;
use crate::upload::Uploader;
use crate::warc::Validate;
use std::ffi::OsStr;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Outcome of structural validation, routing a file to one of the two
/// destination trees
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Valid,
    Invalid,
}

impl Verdict {
    pub fn is_valid(self) -> bool {
        matches!(self, Verdict::Valid)
    }

    pub fn label(self) -> &'static str {
        match self {
            Verdict::Valid => "valid",
            Verdict::Invalid => "invalid",
        }
    }
}

/// Filesystem rename collaborator
///
/// `fs::rename` is atomic when source and destination live on the same
/// volume, which the deployment guarantees; the trait exists so tests
/// can fail a specific rename and observe the relocation ordering.
pub trait Mover: Send + Sync {
    fn rename(&self, from: &Path, to: &Path) -> io::Result<()>;
}

/// Real filesystem mover
#[derive(Debug, Default, Clone, Copy)]
pub struct FsMover;

impl Mover for FsMover {
    fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        fs::rename(from, to)
    }
}

/// What one completed pipeline invocation did
#[derive(Debug)]
pub struct ProcessReport {
    pub path: PathBuf,
    pub digest: String,
    pub verdict: Verdict,
    pub size: u64,
    pub destination: PathBuf,
    pub uploaded: bool,
}

/// The per-file pipeline with its collaborators
pub struct FileProcessor {
    valid_dir: PathBuf,
    invalid_dir: PathBuf,
    tmp_dir: PathBuf,
    validator: Arc<dyn Validate>,
    metrics: Arc<dyn MetricsSink>,
    mover: Arc<dyn Mover>,
    uploader: Option<Arc<dyn Uploader>>,
}

impl FileProcessor {
    /// Create a processor over the real filesystem
    pub fn new(
        config: &IngestConfig,
        validator: Arc<dyn Validate>,
        metrics: Arc<dyn MetricsSink>,
    ) -> Self {
        Self {
            valid_dir: config.valid_dir.clone(),
            invalid_dir: config.invalid_dir.clone(),
            tmp_dir: config.tmp_dir.clone(),
            validator,
            metrics,
            mover: Arc::new(FsMover),
            uploader: None,
        }
    }

    /// Replace the rename collaborator (used by tests)
    pub fn with_mover(mut self, mover: Arc<dyn Mover>) -> Self {
        self.mover = mover;
        self
    }

    /// Attach the upload stage for relocated valid files
    pub fn with_uploader(mut self, uploader: Arc<dyn Uploader>) -> Self {
        self.uploader = Some(uploader);
        self
    }

    /// Queue-facing entry point: run the pipeline and log the outcome
    ///
    /// Never propagates: per-file errors are logged and the job dropped,
    /// leaving the source file for the next scan pass.
    pub fn process(&self, path: &Path) {
        let start = Instant::now();
        match self.run(path) {
            Ok(None) => {}
            Ok(Some(report)) => {
                self.metrics.observe_duration(start.elapsed());
                info!(
                    path = %report.path.display(),
                    destination = %report.destination.display(),
                    size = report.size,
                    digest = %report.digest,
                    verdict = report.verdict.label(),
                    uploaded = report.uploaded,
                    "processed file"
                );
            }
            Err(err) => {
                if err.is_validation_error() {
                    self.metrics.increment_validation_error();
                }
                if err.is_inconsistent_state() {
                    // The one unrecoverable state: sidecar relocated,
                    // content left behind. Needs operator attention.
                    error!(path = %path.display(), error = %err, "file left in inconsistent state");
                } else if err.is_upload_error() {
                    // Already relocated, so the source scan will not see
                    // it again; retry takes a run over the valid tree.
                    warn!(path = %path.display(), error = %err, "upload failed, relocated file kept for a later upload run");
                } else {
                    warn!(path = %path.display(), error = %err, "failed to process file, will retry on next pass");
                }
            }
        }
    }

    /// Run the pipeline for one file
    ///
    /// `Ok(None)` means the file was gone before processing started.
    pub fn run(&self, path: &Path) -> ProcessResult<Option<ProcessReport>> {
        if !path.exists() {
            debug!(path = %path.display(), "file vanished before processing");
            return Ok(None);
        }

        let basename = path
            .file_name()
            .and_then(OsStr::to_str)
            .ok_or_else(|| ProcessError::InvalidFileName { path: path.into() })?;

        let digest = checksum::md5_hex(path).map_err(|source| ProcessError::Checksum {
            path: path.into(),
            source,
        })?;

        let sidecar = checksum::write_sidecar(path, &digest)?;

        let verdict = match self.validator.validate(path, &self.tmp_dir) {
            Ok(true) => Verdict::Valid,
            Ok(false) => Verdict::Invalid,
            Err(source) => {
                // The stranded source sidecar is recomputed and
                // overwritten on the next pass.
                return Err(ProcessError::Validate {
                    path: path.into(),
                    source,
                });
            }
        };

        let target_dir = match verdict {
            Verdict::Valid => &self.valid_dir,
            Verdict::Invalid => &self.invalid_dir,
        };

        // Sidecar moves first. Failing here leaves both files at the
        // source, safe to retry.
        let sidecar_dest = target_dir.join(format!("{basename}{}", checksum::SIDECAR_SUFFIX));
        self.mover
            .rename(&sidecar, &sidecar_dest)
            .map_err(|source| ProcessError::MoveSidecar {
                from: sidecar.clone(),
                to: sidecar_dest.clone(),
                source,
            })?;

        let destination = target_dir.join(basename);
        self.mover
            .rename(path, &destination)
            .map_err(|source| ProcessError::MoveContent {
                from: path.into(),
                to: destination.clone(),
                source,
            })?;

        let size = fs::metadata(&destination)
            .map_err(|source| ProcessError::Stat {
                path: destination.clone(),
                source,
            })?
            .len();
        self.metrics.observe_size(size);

        let mut uploaded = false;
        if verdict.is_valid() {
            if let Some(uploader) = &self.uploader {
                let info =
                    uploader
                        .upload(&destination)
                        .map_err(|source| ProcessError::Upload {
                            path: destination.clone(),
                            source,
                        })?;
                info!(key = %info.key, size = info.size, etag = %info.etag, "uploaded file");
                if let Err(err) = fs::remove_file(&destination) {
                    warn!(path = %destination.display(), error = %err, "failed to remove uploaded file");
                }
                uploaded = true;
            }
        }

        Ok(Some(ProcessReport {
            path: path.into(),
            digest,
            verdict,
            size,
            destination,
            uploaded,
        }))
    }
}
