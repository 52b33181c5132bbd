//! Prometheus metrics for observability.
//!
//! This module provides metrics for monitoring the vidsync server:
//! - HTTP request metrics (latency, counts)
//! - Job and ledger status (collected dynamically on scrape)
//! - Core metrics (enumeration, transfers, external services)

use once_cell::sync::Lazy;
use prometheus::{
    self, Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};
use regex_lite::Regex;

/// Global metrics registry.
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    register_metrics(&registry);
    registry
});

// =============================================================================
// HTTP Request Metrics
// =============================================================================

/// HTTP request duration in seconds.
pub static HTTP_REQUEST_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "vidsync_http_request_duration_seconds",
            "HTTP request duration in seconds",
        )
        .buckets(vec![
            0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
        ]),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests total count.
pub static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("vidsync_http_requests_total", "Total HTTP requests"),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests currently in flight.
pub static HTTP_REQUESTS_IN_FLIGHT: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "vidsync_http_requests_in_flight",
        "Number of HTTP requests currently being processed",
    )
    .unwrap()
});

// =============================================================================
// Job Metrics (collected dynamically)
// =============================================================================

/// Whether a run (or ledger repair) holds the single-flight slot.
pub static JOB_RUNNING: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "vidsync_job_running",
        "Whether a transfer run is in progress (1) or not (0)",
    )
    .unwrap()
});

/// Items in the current (or last) run.
pub static JOB_ITEMS_TOTAL: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "vidsync_job_items",
        "Number of items in the current or last run",
    )
    .unwrap()
});

/// Items finished so far in the current (or last) run.
pub static JOB_ITEMS_DONE: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "vidsync_job_items_done",
        "Number of items finished in the current or last run",
    )
    .unwrap()
});

/// Ledger size.
pub static LEDGER_ENTRIES: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "vidsync_ledger_entries",
        "Number of item ids recorded as transferred",
    )
    .unwrap()
});

// =============================================================================
// Registration
// =============================================================================

fn register_metrics(registry: &Registry) {
    // HTTP
    registry
        .register(Box::new(HTTP_REQUEST_DURATION.clone()))
        .unwrap();
    registry
        .register(Box::new(HTTP_REQUESTS_TOTAL.clone()))
        .unwrap();
    registry
        .register(Box::new(HTTP_REQUESTS_IN_FLIGHT.clone()))
        .unwrap();

    // Job
    registry.register(Box::new(JOB_RUNNING.clone())).unwrap();
    registry.register(Box::new(JOB_ITEMS_TOTAL.clone())).unwrap();
    registry.register(Box::new(JOB_ITEMS_DONE.clone())).unwrap();
    registry.register(Box::new(LEDGER_ENTRIES.clone())).unwrap();

    // Core metrics (enumeration, transfers, external services)
    for metric in vidsync_core::metrics::all_metrics() {
        registry.register(metric).unwrap();
    }
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer).unwrap();
    String::from_utf8(buffer).unwrap()
}

/// Update gauges from current application state.
///
/// Called before encoding so a scrape sees live job and ledger values.
pub fn collect_dynamic_metrics(state: &crate::state::AppState) {
    let coordinator = state.coordinator();
    let status = coordinator.status();

    JOB_RUNNING.set(i64::from(coordinator.is_running()));
    JOB_ITEMS_TOTAL.set(status.total as i64);
    JOB_ITEMS_DONE.set((status.successes + status.failures) as i64);
    LEDGER_ENTRIES.set(coordinator.ledger().len() as i64);
}

static UUID_SEGMENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}")
        .unwrap()
});

static NUMERIC_SEGMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"/\d+(/|$)").unwrap());

/// Normalize a path for metric labels (replace IDs with placeholders).
pub fn normalize_path(path: &str) -> String {
    let result = UUID_SEGMENT.replace_all(path, "{id}");
    let result = NUMERIC_SEGMENT.replace_all(&result, "/{id}$1");
    result.to_string()
}
