//! Configuration types for warc-ingest
//!
//! This module defines:
//! - CLI argument parsing using clap derive macros, with environment
//!   variable fallback for every flag
//! - The validated runtime configuration (`IngestConfig`)
//!
//! All validation happens once at startup in `IngestConfig::from_args`;
//! a configuration error is fatal and the daemon does not start.

use crate::checksum::SIDECAR_SUFFIX;
use crate::error::{ConfigError, ConfigResult};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Ingest daemon for WARC files delivered by an upstream crawler
#[derive(Parser, Debug, Clone)]
#[command(
    name = "warc-ingest",
    version,
    about = "Checksums, validates and relocates crawler WARC files",
    long_about = "Repeatedly scans a staging directory for newly arrived WARC files, \
                  computes an MD5 checksum sidecar for each, structurally validates \
                  the file and atomically relocates both into a valid or invalid \
                  destination tree. Optionally uploads validated files to an object \
                  store.\n\n\
                  Crash recovery needs no state beyond the filesystem: interrupted \
                  files stay in the staging directory and are reprocessed on the \
                  next pass.",
    after_help = "EXAMPLES:\n    \
        warc-ingest --dir /staging --valid-dir /archive/valid --invalid-dir /archive/invalid --tmp-dir /tmp/warc\n    \
        warc-ingest --dir /staging --valid-dir /v --invalid-dir /i --tmp-dir /t --sleep 0   # single pass\n    \
        warc-ingest --dir /staging --valid-dir /v --invalid-dir /i --tmp-dir /t \\\n        \
        --upload-url https://store.example.org --upload-bucket crawls"
)]
pub struct CliArgs {
    /// Source directory to scan for newly arrived files
    #[arg(long = "dir", env = "DIR", value_name = "PATH")]
    pub source_dir: PathBuf,

    /// Destination directory for files that validate
    #[arg(long, env = "VALID_DIR", value_name = "PATH")]
    pub valid_dir: PathBuf,

    /// Destination directory for files that fail validation
    #[arg(long, env = "INVALID_DIR", value_name = "PATH")]
    pub invalid_dir: PathBuf,

    /// Scratch directory for validator buffering
    #[arg(long, env = "TMP_DIR", value_name = "PATH")]
    pub tmp_dir: PathBuf,

    /// Glob pattern matching file names in the source directory
    #[arg(long, env = "PATTERN", default_value = "*.warc.gz", value_name = "GLOB")]
    pub pattern: String,

    /// Number of files processed concurrently
    #[arg(
        long,
        env = "CONCURRENCY",
        default_value_t = num_cpus::get(),
        value_name = "NUM"
    )]
    pub concurrency: usize,

    /// Seconds between directory scans; 0 performs a single pass and exits
    #[arg(long, env = "SLEEP", default_value = "5", value_name = "SECS")]
    pub sleep: u64,

    /// Object store endpoint; enables the upload stage when set
    #[arg(long, env = "UPLOAD_URL", value_name = "URL")]
    pub upload_url: Option<String>,

    /// Bucket to upload validated files into
    #[arg(long, env = "UPLOAD_BUCKET", value_name = "NAME")]
    pub upload_bucket: Option<String>,

    /// Bearer token for the upload endpoint
    #[arg(long, env = "UPLOAD_TOKEN", value_name = "TOKEN", hide_env_values = true)]
    pub upload_token: Option<String>,

    /// Verbose output (debug-level logs)
    #[arg(short, long)]
    pub verbose: bool,

    /// Quiet mode - suppress header and summary output
    #[arg(short, long)]
    pub quiet: bool,
}

/// Upload stage configuration
#[derive(Debug, Clone)]
pub struct UploadConfig {
    pub url: String,
    pub bucket: String,
    pub token: Option<String>,
}

/// Validated runtime configuration
#[derive(Debug, Clone)]
pub struct IngestConfig {
    /// Canonicalized source directory
    pub source_dir: PathBuf,

    /// Canonicalized destination for valid files
    pub valid_dir: PathBuf,

    /// Canonicalized destination for invalid files
    pub invalid_dir: PathBuf,

    /// Canonicalized validator scratch directory
    pub tmp_dir: PathBuf,

    /// Bare file-name pattern as configured
    pub pattern: String,

    /// Source directory joined with the pattern, what the scanner globs
    pub glob_pattern: String,

    /// Worker count (also the queue buffer capacity)
    pub concurrency: usize,

    /// Inter-pass interval; zero means single-pass mode
    pub sleep: Duration,

    /// Upload stage, when enabled
    pub upload: Option<UploadConfig>,

    pub verbose: bool,
    pub quiet: bool,
}

impl IngestConfig {
    /// Validate CLI arguments into a runtime configuration
    pub fn from_args(args: CliArgs) -> ConfigResult<Self> {
        if args.concurrency < 1 {
            return Err(ConfigError::InvalidConcurrency {
                count: args.concurrency,
            });
        }

        let source_dir = resolve_dir("source", &args.source_dir)?;
        let valid_dir = resolve_dir("valid target", &args.valid_dir)?;
        let invalid_dir = resolve_dir("invalid target", &args.invalid_dir)?;
        let tmp_dir = resolve_dir("tmp", &args.tmp_dir)?;

        // Any pattern with glob metacharacters can re-match freshly
        // relocated content files, and one ending in the sidecar suffix
        // re-matches relocated sidecars; either loops files through the
        // pipeline forever when a target equals the source.
        let rematches_output = args.pattern.contains(['*', '?', '['])
            || args.pattern.ends_with(SIDECAR_SUFFIX);
        if rematches_output && (source_dir == valid_dir || source_dir == invalid_dir) {
            return Err(ConfigError::SourceEqualsTarget {
                pattern: args.pattern,
            });
        }

        glob::Pattern::new(&args.pattern).map_err(|err| ConfigError::InvalidPattern {
            pattern: args.pattern.clone(),
            reason: err.to_string(),
        })?;
        let glob_pattern = source_dir.join(&args.pattern).to_string_lossy().into_owned();

        let upload = match (args.upload_url, args.upload_bucket) {
            (Some(url), Some(bucket)) => Some(UploadConfig {
                url,
                bucket,
                token: args.upload_token,
            }),
            (Some(_), None) => return Err(ConfigError::MissingUploadBucket),
            (None, _) => None,
        };

        Ok(Self {
            source_dir,
            valid_dir,
            invalid_dir,
            tmp_dir,
            pattern: args.pattern,
            glob_pattern,
            concurrency: args.concurrency,
            sleep: Duration::from_secs(args.sleep),
            upload,
            verbose: args.verbose,
            quiet: args.quiet,
        })
    }

    /// True when the scanner should perform exactly one pass
    pub fn single_pass(&self) -> bool {
        self.sleep.is_zero()
    }
}

/// Canonicalize a configured directory and require that it is one
fn resolve_dir(role: &'static str, path: &Path) -> ConfigResult<PathBuf> {
    let abs = path
        .canonicalize()
        .map_err(|err| ConfigError::DirectoryUnavailable {
            role,
            path: path.to_path_buf(),
            reason: err.to_string(),
        })?;
    if !abs.is_dir() {
        return Err(ConfigError::NotADirectory {
            role,
            path: path.to_path_buf(),
        });
    }
    Ok(abs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn args(source: &Path, valid: &Path, invalid: &Path, tmp: &Path) -> CliArgs {
        CliArgs {
            source_dir: source.to_path_buf(),
            valid_dir: valid.to_path_buf(),
            invalid_dir: invalid.to_path_buf(),
            tmp_dir: tmp.to_path_buf(),
            pattern: "*.warc.gz".to_string(),
            concurrency: 2,
            sleep: 5,
            upload_url: None,
            upload_bucket: None,
            upload_token: None,
            verbose: false,
            quiet: false,
        }
    }

    #[test]
    fn test_valid_config() {
        let source = tempdir().unwrap();
        let valid = tempdir().unwrap();
        let invalid = tempdir().unwrap();
        let tmp = tempdir().unwrap();

        let config = IngestConfig::from_args(args(
            source.path(),
            valid.path(),
            invalid.path(),
            tmp.path(),
        ))
        .unwrap();

        assert!(config.source_dir.is_absolute());
        assert!(config.glob_pattern.ends_with("*.warc.gz"));
        assert_eq!(config.sleep, Duration::from_secs(5));
        assert!(!config.single_pass());
        assert!(config.upload.is_none());
    }

    #[test]
    fn test_zero_sleep_is_single_pass() {
        let source = tempdir().unwrap();
        let valid = tempdir().unwrap();
        let invalid = tempdir().unwrap();
        let tmp = tempdir().unwrap();

        let mut a = args(source.path(), valid.path(), invalid.path(), tmp.path());
        a.sleep = 0;
        assert!(IngestConfig::from_args(a).unwrap().single_pass());
    }

    #[test]
    fn test_zero_concurrency_rejected() {
        let source = tempdir().unwrap();
        let valid = tempdir().unwrap();
        let invalid = tempdir().unwrap();
        let tmp = tempdir().unwrap();

        let mut a = args(source.path(), valid.path(), invalid.path(), tmp.path());
        a.concurrency = 0;
        assert!(matches!(
            IngestConfig::from_args(a),
            Err(ConfigError::InvalidConcurrency { count: 0 })
        ));
    }

    #[test]
    fn test_missing_directory_rejected() {
        let source = tempdir().unwrap();
        let valid = tempdir().unwrap();
        let invalid = tempdir().unwrap();

        let a = args(
            source.path(),
            valid.path(),
            invalid.path(),
            Path::new("/nonexistent/tmp"),
        );
        assert!(matches!(
            IngestConfig::from_args(a),
            Err(ConfigError::DirectoryUnavailable { role: "tmp", .. })
        ));
    }

    #[test]
    fn test_file_as_directory_rejected() {
        let source = tempdir().unwrap();
        let valid = tempdir().unwrap();
        let invalid = tempdir().unwrap();
        let tmp = tempdir().unwrap();
        let file = tmp.path().join("not-a-dir");
        std::fs::write(&file, b"x").unwrap();

        let a = args(source.path(), valid.path(), invalid.path(), &file);
        assert!(matches!(
            IngestConfig::from_args(a),
            Err(ConfigError::NotADirectory { role: "tmp", .. })
        ));
    }

    #[test]
    fn test_wildcard_pattern_with_source_as_target_rejected() {
        let source = tempdir().unwrap();
        let invalid = tempdir().unwrap();
        let tmp = tempdir().unwrap();

        let mut a = args(source.path(), source.path(), invalid.path(), tmp.path());
        a.pattern = "*".to_string();
        assert!(matches!(
            IngestConfig::from_args(a),
            Err(ConfigError::SourceEqualsTarget { .. })
        ));
    }

    #[test]
    fn test_sidecar_pattern_with_source_as_target_rejected() {
        let source = tempdir().unwrap();
        let valid = tempdir().unwrap();
        let tmp = tempdir().unwrap();

        let mut a = args(source.path(), valid.path(), source.path(), tmp.path());
        a.pattern = "crawl-??.md5".to_string();
        assert!(matches!(
            IngestConfig::from_args(a),
            Err(ConfigError::SourceEqualsTarget { .. })
        ));
    }

    #[test]
    fn test_default_pattern_with_source_as_target_rejected() {
        // The default `*.warc.gz` re-matches every relocated content
        // file; sharing source and target would re-ingest each file on
        // every pass.
        let source = tempdir().unwrap();
        let invalid = tempdir().unwrap();
        let tmp = tempdir().unwrap();

        let a = args(source.path(), source.path(), invalid.path(), tmp.path());
        assert!(matches!(
            IngestConfig::from_args(a),
            Err(ConfigError::SourceEqualsTarget { .. })
        ));
    }

    #[test]
    fn test_literal_pattern_allows_source_as_target() {
        // A wildcard-free name matches exactly one file and cannot
        // re-match anything the pipeline produced.
        let source = tempdir().unwrap();
        let invalid = tempdir().unwrap();
        let tmp = tempdir().unwrap();

        let mut a = args(source.path(), source.path(), invalid.path(), tmp.path());
        a.pattern = "crawl-00.warc.gz".to_string();
        assert!(IngestConfig::from_args(a).is_ok());
    }

    #[test]
    fn test_invalid_glob_pattern_rejected() {
        let source = tempdir().unwrap();
        let valid = tempdir().unwrap();
        let invalid = tempdir().unwrap();
        let tmp = tempdir().unwrap();

        let mut a = args(source.path(), valid.path(), invalid.path(), tmp.path());
        a.pattern = "[".to_string();
        assert!(matches!(
            IngestConfig::from_args(a),
            Err(ConfigError::InvalidPattern { .. })
        ));
    }

    #[test]
    fn test_upload_url_requires_bucket() {
        let source = tempdir().unwrap();
        let valid = tempdir().unwrap();
        let invalid = tempdir().unwrap();
        let tmp = tempdir().unwrap();

        let mut a = args(source.path(), valid.path(), invalid.path(), tmp.path());
        a.upload_url = Some("https://store.example.org".to_string());
        assert!(matches!(
            IngestConfig::from_args(a),
            Err(ConfigError::MissingUploadBucket)
        ));

        let mut a = args(source.path(), valid.path(), invalid.path(), tmp.path());
        a.upload_url = Some("https://store.example.org".to_string());
        a.upload_bucket = Some("crawls".to_string());
        let config = IngestConfig::from_args(a).unwrap();
        assert_eq!(config.upload.unwrap().bucket, "crawls");
    }
}
