//! warc-ingest - Crash-Safe WARC File Ingest Daemon
//!
//! Entry point for the CLI application.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use warc_ingest::config::{CliArgs, IngestConfig};
use warc_ingest::metrics::{IngestStats, MetricsSink};
use warc_ingest::pipeline::FileProcessor;
use warc_ingest::progress::{print_header, print_summary};
use warc_ingest::queue::WorkQueue;
use warc_ingest::scanner::Scanner;
use warc_ingest::shutdown::ShutdownSignal;
use warc_ingest::upload::HttpUploader;
use warc_ingest::warc::WarcValidator;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<()> {
    // Parse CLI arguments
    let args = CliArgs::parse();

    // Setup logging
    setup_logging(args.verbose)?;

    // Validate and create config
    let config = IngestConfig::from_args(args).context("Invalid configuration")?;

    // Print header
    if !config.quiet {
        print_header(
            &config.source_dir.display().to_string(),
            &config.pattern,
            config.concurrency,
        );
    }

    let stats = Arc::new(IngestStats::default());

    // Assemble the per-file pipeline
    let mut processor = FileProcessor::new(
        &config,
        Arc::new(WarcValidator),
        Arc::clone(&stats) as Arc<dyn MetricsSink>,
    );
    if let Some(upload) = &config.upload {
        info!(url = %upload.url, bucket = %upload.bucket, "upload stage enabled");
        processor = processor.with_uploader(Arc::new(HttpUploader::new(
            &upload.url,
            &upload.bucket,
            upload.token.as_deref(),
        )));
    }
    let processor = Arc::new(processor);

    // Worker pool draining the deduplicating queue
    let mut queue = {
        let processor = Arc::clone(&processor);
        WorkQueue::new(move |path: &Path| processor.process(path), config.concurrency)
    };
    info!(concurrency = config.concurrency, "work queue started");

    // Graceful shutdown on SIGINT/SIGTERM: stop scanning, finish
    // in-flight files
    let shutdown = ShutdownSignal::new();
    {
        let shutdown = shutdown.clone();
        ctrlc::set_handler(move || {
            eprintln!("\nInterrupt received, finishing in-flight files...");
            shutdown.cancel();
        })
        .context("Failed to set signal handler")?;
    }

    info!(
        source = %config.source_dir.display(),
        pattern = %config.pattern,
        sleep_secs = config.sleep.as_secs(),
        single_pass = config.single_pass(),
        "starting ingest"
    );

    let start = Instant::now();
    let scanner = Scanner::new(&config, shutdown);
    scanner.run(|path| queue.add(path));

    // Scanner is done; drain the queue and wait for the workers
    queue.close_and_wait();
    let duration = start.elapsed();

    let snapshot = stats.snapshot();
    let scan_errors = scanner.stats().list_errors_count();
    info!(
        files = snapshot.files_processed,
        bytes = snapshot.bytes_total,
        validation_errors = snapshot.validation_errors,
        scan_errors,
        passes = scanner.stats().passes_count(),
        "ingest finished"
    );

    if !config.quiet {
        print_summary(&snapshot, scan_errors, duration);
    }

    Ok(())
}

fn setup_logging(verbose: bool) -> Result<()> {
    let filter = if verbose {
        EnvFilter::new("warc_ingest=debug,warn")
    } else {
        EnvFilter::new("warc_ingest=info,warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {e}"))?;

    Ok(())
}
