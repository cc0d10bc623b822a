//! Prometheus metrics for observability.
//!
//! This module provides metrics for monitoring the stashcast server:
//! - HTTP request metrics (latency, counts)
//! - Result store size and scheduler state (collected dynamically)
//! - Core refresh and provider metrics, registered from `stashcast_core`

use once_cell::sync::Lazy;
use prometheus::{
    self, Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};
use regex_lite::Regex;
use tracing::warn;

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
            "stashcast_http_request_duration_seconds",
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
        Opts::new("stashcast_http_requests_total", "Total HTTP requests"),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests currently in flight.
pub static HTTP_REQUESTS_IN_FLIGHT: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "stashcast_http_requests_in_flight",
        "Number of HTTP requests currently being processed",
    )
    .unwrap()
});

// =============================================================================
// Store and Scheduler Metrics (collected dynamically)
// =============================================================================

/// Reconciled records in the result store.
pub static STORE_RECORDS: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "stashcast_store_records",
        "Number of reconciled records in the result store",
    )
    .unwrap()
});

/// Stored records with at least one candidate.
pub static STORE_MATCHED_RECORDS: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "stashcast_store_matched_records",
        "Number of stored records with at least one candidate",
    )
    .unwrap()
});

/// Whether a refresh cycle is in flight (1) or not (0).
pub static SCHEDULER_CYCLE_RUNNING: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "stashcast_scheduler_cycle_running",
        "Whether a refresh cycle is currently running (1) or idle (0)",
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

    // Store and scheduler
    registry.register(Box::new(STORE_RECORDS.clone())).unwrap();
    registry
        .register(Box::new(STORE_MATCHED_RECORDS.clone()))
        .unwrap();
    registry
        .register(Box::new(SCHEDULER_CYCLE_RUNNING.clone()))
        .unwrap();

    // Core metrics (refresh cycles, external services)
    for metric in stashcast_core::metrics::all_metrics() {
        registry.register(metric).unwrap();
    }
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        warn!(error = %e, "Failed to encode metrics");
    }
    String::from_utf8(buffer).unwrap_or_default()
}

/// Collect dynamic metrics from current application state.
///
/// Called before encoding so gauges reflect the store and scheduler as of
/// this scrape.
pub async fn collect_dynamic_metrics(state: &crate::state::AppState) {
    let records = state.store().get_all().await;
    STORE_RECORDS.set(records.len() as i64);
    STORE_MATCHED_RECORDS.set(records.iter().filter(|r| r.has_matches()).count() as i64);
    SCHEDULER_CYCLE_RUNNING.set(if state.scheduler().is_cycle_running() {
        1
    } else {
        0
    });
}

/// First path segments that belong to a route rather than a user config token.
const ROUTE_SEGMENTS: &[&str] = &["api", "metrics", "manifest.json", "catalog", "meta", "stream"];

static CONTENT_ID: Lazy<Regex> = Lazy::new(|| Regex::new(r"/stashdb:[^/]+").unwrap());

/// Normalize a path for metric labels.
///
/// The user config token segment carries credentials and is always replaced,
/// as are content ids.
pub fn normalize_path(path: &str) -> String {
    let trimmed = path.trim_start_matches('/');
    let redacted = match trimmed.split_once('/') {
        Some((first, rest)) if !ROUTE_SEGMENTS.contains(&first) => format!("/{{config}}/{}", rest),
        _ => path.to_string(),
    };
    CONTENT_ID.replace_all(&redacted, "/{id}").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path_redacts_config_token() {
        let path = "/{\"easynewsUsername\":\"u\",\"easynewsPassword\":\"p\"}/manifest.json";
        assert_eq!(normalize_path(path), "/{config}/manifest.json");

        let path = "/eyJlYXN5bmV3c1VzZXJuYW1lIjoidSJ9/stream/movie/stashdb:abc-123.json";
        assert_eq!(normalize_path(path), "/{config}/stream/movie/{id}");
    }

    #[test]
    fn test_normalize_path_content_id() {
        let path = "/meta/movie/stashdb:4f1c2d3e.json";
        assert_eq!(normalize_path(path), "/meta/movie/{id}");
    }

    #[test]
    fn test_normalize_path_no_ids() {
        assert_eq!(normalize_path("/api/v1/health"), "/api/v1/health");
        assert_eq!(normalize_path("/manifest.json"), "/manifest.json");
        assert_eq!(
            normalize_path("/catalog/movie/stashdb-trending.json"),
            "/catalog/movie/stashdb-trending.json"
        );
    }

    #[test]
    fn test_encode_metrics_returns_prometheus_format() {
        HTTP_REQUESTS_TOTAL
            .with_label_values(&["GET", "/test", "200"])
            .inc();

        let output = encode_metrics();
        assert!(output.contains("stashcast_http_requests_total"));
        assert!(output.contains("# HELP"));
        assert!(output.contains("# TYPE"));
    }

    #[test]
    fn test_registry_contains_all_metrics() {
        // Prometheus only outputs vec metrics that have been touched.
        HTTP_REQUEST_DURATION
            .with_label_values(&["GET", "/test", "200"])
            .observe(0.1);
        HTTP_REQUESTS_IN_FLIGHT.set(0);
        STORE_RECORDS.set(0);
        SCHEDULER_CYCLE_RUNNING.set(0);
        stashcast_core::metrics::CYCLES_TOTAL
            .with_label_values(&["completed"])
            .inc_by(0);

        let output = encode_metrics();

        assert!(output.contains("stashcast_http_request_duration_seconds"));
        assert!(output.contains("stashcast_http_requests_in_flight"));
        assert!(output.contains("stashcast_store_records"));
        assert!(output.contains("stashcast_scheduler_cycle_running"));
        assert!(output.contains("stashcast_refresh_cycles_total"));
    }
}
