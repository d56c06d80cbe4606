//! Error types for warc-ingest
//!
//! This module defines the error hierarchy that covers:
//! - Configuration and CLI errors (fatal at startup)
//! - Work queue errors (caller misuse, not runtime conditions)
//! - Per-file processing errors (logged, never fatal)
//! - Validator and upload errors
//!
//! Design philosophy:
//! - Use thiserror for structured error types in library code
//! - Per-file errors never propagate past the worker that hit them; the
//!   file stays at the source and is rediscovered on the next scan pass
//! - Caller-misuse conditions (adding to a closed queue, writing a sidecar
//!   with an empty digest) get their own variants instead of panics

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for the warc-ingest application
#[derive(Error, Debug)]
pub enum IngestError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Work queue errors
    #[error("Queue error: {0}")]
    Queue(#[from] QueueError),

    /// Per-file processing errors
    #[error("Processing error: {0}")]
    Process(#[from] ProcessError),

    /// I/O errors (file operations, etc.)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration and CLI errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Concurrency must be at least 1
    #[error("Invalid concurrency {count}: must be at least 1")]
    InvalidConcurrency { count: usize },

    /// A configured directory could not be resolved
    #[error("{role} directory '{}' is not usable: {reason}", path.display())]
    DirectoryUnavailable {
        role: &'static str,
        path: PathBuf,
        reason: String,
    },

    /// A configured path exists but is not a directory
    #[error("{role} path '{}' is not a directory", path.display())]
    NotADirectory { role: &'static str, path: PathBuf },

    /// Source directory would re-match files moved into a target directory
    #[error(
        "source directory must differ from the target directories when the \
         glob pattern '{pattern}' contains wildcards or ends with the \
         sidecar suffix"
    )]
    SourceEqualsTarget { pattern: String },

    /// Glob pattern failed to parse
    #[error("Invalid glob pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    /// Upload endpoint configured without a bucket
    #[error("upload bucket is required when an upload URL is configured")]
    MissingUploadBucket,
}

/// Work queue errors
///
/// `Closed` is a programmer-error condition: the scanner must never outlive
/// the queue it submits to.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueueError {
    /// Job submitted after close_and_wait
    #[error("work queue is closed")]
    Closed,
}

/// Per-file processing errors
///
/// Every variant except `EmptyDigest` and `InvalidFileName` is transient:
/// the source file is left untouched and retried on the next scan pass.
#[derive(Error, Debug)]
pub enum ProcessError {
    /// Checksum computation failed
    #[error("failed to checksum '{}': {source}", path.display())]
    Checksum {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Refusing to write a sidecar recording no digest (caller misuse)
    #[error("refusing to write a checksum sidecar with an empty digest")]
    EmptyDigest,

    /// File name is missing or not valid UTF-8, so no sidecar line or
    /// destination path can be formed for it
    #[error("file name of '{}' is missing or not valid UTF-8", path.display())]
    InvalidFileName { path: PathBuf },

    /// Sidecar write failed; both files remain at the source
    #[error("failed to write sidecar '{}': {source}", path.display())]
    SidecarWrite {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The validator itself failed (distinct from an invalid verdict)
    #[error("failed to validate '{}': {source}", path.display())]
    Validate {
        path: PathBuf,
        source: ValidateError,
    },

    /// Sidecar rename failed; both files remain at the source
    #[error("failed to move sidecar '{}' to '{}': {source}", from.display(), to.display())]
    MoveSidecar {
        from: PathBuf,
        to: PathBuf,
        source: std::io::Error,
    },

    /// Content rename failed after the sidecar was already relocated.
    /// The destination now holds a sidecar for a file still at the source;
    /// this is the one state the pipeline cannot repair on its own.
    #[error(
        "failed to move '{}' to '{}' after its sidecar was already \
         relocated: {source}",
        from.display(),
        to.display()
    )]
    MoveContent {
        from: PathBuf,
        to: PathBuf,
        source: std::io::Error,
    },

    /// Stat of the relocated file failed
    #[error("failed to stat relocated file '{}': {source}", path.display())]
    Stat {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Upload of a relocated valid file failed; the file stays put
    #[error("failed to upload '{}': {source}", path.display())]
    Upload { path: PathBuf, source: UploadError },
}

impl ProcessError {
    /// Check if this error left the destination tree inconsistent
    /// (sidecar relocated, content still at the source)
    pub fn is_inconsistent_state(&self) -> bool {
        matches!(self, ProcessError::MoveContent { .. })
    }

    /// Check if this error came from the validator collaborator
    pub fn is_validation_error(&self) -> bool {
        matches!(self, ProcessError::Validate { .. })
    }

    /// Check if this error came from the upload stage. The file was
    /// already relocated, so the usual rediscovery retry does not apply.
    pub fn is_upload_error(&self) -> bool {
        matches!(self, ProcessError::Upload { .. })
    }
}

/// Validator collaborator errors
///
/// Structural problems in a file are a verdict, not an error; only failures
/// to read the file at all surface here.
#[derive(Error, Debug)]
pub enum ValidateError {
    /// Could not open or begin reading the file
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Upload collaborator errors
#[derive(Error, Debug)]
pub enum UploadError {
    /// File name cannot be used as an object key
    #[error("file name of '{}' is missing or not valid UTF-8", path.display())]
    InvalidKey { path: PathBuf },

    /// Local I/O failed before or during the upload
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The endpoint answered with a non-success status
    #[error("upload of '{key}' rejected with status {status}")]
    Rejected { key: String, status: u16 },

    /// Transport-level failure (connection, TLS, timeout)
    #[error("transport error: {0}")]
    Transport(#[source] Box<ureq::Error>),
}

/// Result type alias for IngestError
pub type Result<T> = std::result::Result<T, IngestError>;

/// Result type alias for ConfigError
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for ProcessError
pub type ProcessResult<T> = std::result::Result<T, ProcessError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inconsistent_state_detection() {
        let err = ProcessError::MoveContent {
            from: "/staging/a.warc.gz".into(),
            to: "/valid/a.warc.gz".into(),
            source: std::io::Error::new(std::io::ErrorKind::Other, "disk full"),
        };
        assert!(err.is_inconsistent_state());

        let err = ProcessError::MoveSidecar {
            from: "/staging/a.warc.gz.md5".into(),
            to: "/valid/a.warc.gz.md5".into(),
            source: std::io::Error::new(std::io::ErrorKind::Other, "disk full"),
        };
        assert!(!err.is_inconsistent_state());
    }

    #[test]
    fn test_upload_error_detection() {
        let err = ProcessError::Upload {
            path: "/valid/a.warc.gz".into(),
            source: UploadError::Rejected {
                key: "a.warc.gz".to_string(),
                status: 503,
            },
        };
        assert!(err.is_upload_error());
        assert!(!err.is_inconsistent_state());

        let err = ProcessError::EmptyDigest;
        assert!(!err.is_upload_error());
    }

    #[test]
    fn test_error_conversion() {
        let queue_err = QueueError::Closed;
        let ingest_err: IngestError = queue_err.into();
        assert!(matches!(ingest_err, IngestError::Queue(QueueError::Closed)));
    }
}
