//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Source enumeration (pages, retries)
//! - Transfers (outcomes, phase durations, bytes)
//! - Job runs
//! - External services (WordPress, yt-dlp, S3)

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts};

// =============================================================================
// Source Enumeration Metrics
// =============================================================================

/// Source pages fetched by outcome.
pub static SOURCE_PAGES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("vidsync_source_pages_total", "Total source page fetches"),
        &["outcome"], // "success", "transient", "terminal"
    )
    .unwrap()
});

/// Page fetch retries after transient failures.
pub static SOURCE_RETRIES: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "vidsync_source_retries_total",
        "Total source page fetch retries",
    )
    .unwrap()
});

// =============================================================================
// Transfer Metrics
// =============================================================================

/// Transfers total by result.
pub static TRANSFERS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("vidsync_transfers_total", "Total media transfers"),
        &["result"], // "success", "download_failed", "empty_download", "upload_failed", "ledger_failed"
    )
    .unwrap()
});

/// Transfer phase duration in seconds.
pub static TRANSFER_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "vidsync_transfer_duration_seconds",
            "Duration of transfer phases",
        )
        .buckets(vec![
            1.0, 5.0, 10.0, 30.0, 60.0, 120.0, 300.0, 600.0, 1800.0, 3600.0,
        ]),
        &["phase"], // "download", "upload"
    )
    .unwrap()
});

/// Bytes uploaded to object storage.
pub static BYTES_UPLOADED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "vidsync_bytes_uploaded_total",
        "Total bytes uploaded to object storage",
    )
    .unwrap()
});

// =============================================================================
// Job Metrics
// =============================================================================

/// Job runs total by result.
pub static RUNS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("vidsync_runs_total", "Total transfer job runs"),
        &["result"], // "completed", "failed"
    )
    .unwrap()
});

// =============================================================================
// External Service Metrics
// =============================================================================

/// External service request duration in seconds.
pub static EXTERNAL_SERVICE_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "vidsync_external_service_duration_seconds",
            "Duration of external service requests",
        )
        .buckets(vec![0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0]),
        &["service", "operation"],
    )
    .unwrap()
});

/// External service requests total by status.
pub static EXTERNAL_SERVICE_REQUESTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "vidsync_external_service_requests_total",
            "Total external service requests",
        ),
        &["service", "operation", "status"], // status: "success", "error"
    )
    .unwrap()
});

/// Get all core metrics for registration.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        // Source
        Box::new(SOURCE_PAGES.clone()),
        Box::new(SOURCE_RETRIES.clone()),
        // Transfers
        Box::new(TRANSFERS_TOTAL.clone()),
        Box::new(TRANSFER_DURATION.clone()),
        Box::new(BYTES_UPLOADED.clone()),
        // Jobs
        Box::new(RUNS_TOTAL.clone()),
        // External services
        Box::new(EXTERNAL_SERVICE_DURATION.clone()),
        Box::new(EXTERNAL_SERVICE_REQUESTS.clone()),
    ]
}
