//! Startup header and exit summary output
//!
//! Human-facing output around the run; operational logging goes through
//! tracing instead.

use crate::metrics::StatsSnapshot;
use console::style;
use humansize::{format_size, BINARY};
use std::time::Duration;

/// Print a header at daemon startup
pub fn print_header(source: &str, pattern: &str, workers: usize) {
    println!();
    println!(
        "{} {}",
        style("warc-ingest").cyan().bold(),
        env!("CARGO_PKG_VERSION")
    );
    println!("{}", style("─".repeat(50)).dim());
    println!("  {} {}", style("Source:").bold(), source);
    println!("  {} {}", style("Pattern:").bold(), pattern);
    println!("  {} {}", style("Workers:").bold(), workers);
    println!();
}

/// Print a summary of the run after shutdown
pub fn print_summary(snapshot: &StatsSnapshot, scan_errors: u64, duration: Duration) {
    let bytes_str = format_size(snapshot.bytes_total, BINARY);
    let duration_secs = duration.as_secs_f64();
    let rate = if duration_secs > 0.0 {
        snapshot.files_processed as f64 / duration_secs
    } else {
        0.0
    };

    println!();
    println!("{}", style("Ingest Complete").green().bold());
    println!("{}", style("─".repeat(50)).dim());
    println!(
        "  {} {}",
        style("Files:").bold(),
        format_number(snapshot.files_processed)
    );
    println!("  {} {}", style("Total Size:").bold(), bytes_str);
    println!(
        "  {} {:.1}s ({:.0} files/sec)",
        style("Duration:").bold(),
        duration_secs,
        rate
    );
    if snapshot.validation_errors > 0 {
        println!(
            "  {} {}",
            style("Validation errors:").yellow().bold(),
            format_number(snapshot.validation_errors)
        );
    }
    if scan_errors > 0 {
        println!(
            "  {} {}",
            style("Scan errors:").yellow().bold(),
            format_number(scan_errors)
        );
    }
    println!();
}

/// Format a number with thousands separators
fn format_number(n: u64) -> String {
    let s = n.to_string();
    let bytes: Vec<_> = s.bytes().rev().collect();

    let chunks: Vec<String> = bytes
        .chunks(3)
        .map(|chunk| chunk.iter().rev().map(|&b| b as char).collect::<String>())
        .collect();

    chunks.into_iter().rev().collect::<Vec<_>>().join(",")
}
