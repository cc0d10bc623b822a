//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Refresh cycles (outcome, duration)
//! - Per-record reconciliation outcomes
//! - External services (StashDB, Easynews)

use once_cell::sync::Lazy;
use prometheus::{Histogram, HistogramOpts, HistogramVec, IntCounterVec, Opts};

// =============================================================================
// Refresh Cycle Metrics
// =============================================================================

/// Refresh cycles total by result.
pub static CYCLES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("stashcast_refresh_cycles_total", "Total refresh cycles"),
        &["result"], // "completed", "empty_catalog", "failed"
    )
    .unwrap()
});

/// Refresh cycle duration in seconds.
pub static CYCLE_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "stashcast_refresh_cycle_duration_seconds",
            "Duration of refresh cycles",
        )
        .buckets(vec![1.0, 10.0, 30.0, 60.0, 120.0, 300.0, 600.0, 1800.0]),
        &["result"],
    )
    .unwrap()
});

/// Catalog records processed by outcome.
pub static RECORDS_PROCESSED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "stashcast_records_processed_total",
            "Catalog records processed during refresh cycles",
        ),
        &["outcome"], // "matched", "no_match", "unsearchable", "search_failed"
    )
    .unwrap()
});

/// Surviving candidates per searched record.
pub static CANDIDATES_PER_RECORD: Lazy<Histogram> = Lazy::new(|| {
    Histogram::with_opts(
        HistogramOpts::new(
            "stashcast_candidates_per_record",
            "Number of ranked candidates stored per searched record",
        )
        .buckets(vec![0.0, 1.0, 2.0, 5.0, 10.0, 25.0, 50.0]),
    )
    .unwrap()
});

// =============================================================================
// External Service Metrics
// =============================================================================

/// External service request duration.
pub static EXTERNAL_SERVICE_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "stashcast_external_service_duration_seconds",
            "Duration of external service calls",
        )
        .buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]),
        &["service", "operation"],
    )
    .unwrap()
});

/// External service requests total.
pub static EXTERNAL_SERVICE_REQUESTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "stashcast_external_service_requests_total",
            "Total external service requests",
        ),
        &["service", "operation", "status"], // status: "success", "error"
    )
    .unwrap()
});

// =============================================================================
// Helper functions
// =============================================================================

/// Record one external call.
pub fn observe_external_call(service: &str, operation: &str, success: bool, seconds: f64) {
    let status = if success { "success" } else { "error" };
    EXTERNAL_SERVICE_REQUESTS
        .with_label_values(&[service, operation, status])
        .inc();
    EXTERNAL_SERVICE_DURATION
        .with_label_values(&[service, operation])
        .observe(seconds);
}

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        // Cycles
        Box::new(CYCLES_TOTAL.clone()),
        Box::new(CYCLE_DURATION.clone()),
        Box::new(RECORDS_PROCESSED.clone()),
        Box::new(CANDIDATES_PER_RECORD.clone()),
        // External services
        Box::new(EXTERNAL_SERVICE_DURATION.clone()),
        Box::new(EXTERNAL_SERVICE_REQUESTS.clone()),
    ]
}
