//! Prometheus metrics for cart submissions.
//!
//! # Panics
//!
//! Metric registration uses `unwrap()`. Registration only fails on duplicate
//! metric names, which is a static configuration error caught at startup.

use once_cell::sync::Lazy;
use prometheus::{
    register_counter_vec, register_histogram_vec, register_int_counter, register_int_gauge,
    CounterVec, Encoder, HistogramVec, IntCounter, IntGauge, TextEncoder,
};

use crate::error::{TelemetryError, TelemetryResult};

/// Add-to-cart requests currently in flight.
pub static CART_PENDING_REQUESTS: Lazy<IntGauge> = Lazy::new(|| {
    register_int_gauge!(
        "commerce_cart_pending_requests",
        "Add-to-cart requests currently in flight"
    )
    .unwrap()
});

/// Slow signal state (1 = slow).
pub static CART_SLOW: Lazy<IntGauge> = Lazy::new(|| {
    register_int_gauge!(
        "commerce_cart_slow",
        "Add-to-cart slow signal (1=slow)"
    )
    .unwrap()
});

/// Total slow episodes entered.
pub static CART_SLOW_EPISODES_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "commerce_cart_slow_episodes_total",
        "Total times the add-to-cart slow signal was raised"
    )
    .unwrap()
});

/// Settled submissions by outcome.
/// Labels: outcome (completed/failed/canceled)
pub static CART_SUBMISSIONS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "commerce_cart_submissions_total",
        "Total settled add-to-cart submissions",
        &["outcome"]
    )
    .unwrap()
});

/// Submission latency in milliseconds, from registration to settle.
pub static CART_SUBMIT_LATENCY_MS: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "commerce_cart_submit_latency_ms",
        "Add-to-cart submission latency in milliseconds",
        &["outcome"],
        vec![10.0, 25.0, 50.0, 100.0, 250.0, 500.0, 1000.0, 2500.0, 5000.0, 10000.0]
    )
    .unwrap()
});

/// Submissions rejected as duplicates of an in-flight line.
pub static CART_DUPLICATES_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "commerce_cart_duplicates_total",
        "Add-to-cart submissions rejected as duplicates"
    )
    .unwrap()
});

/// Errors handed to the tracking sink.
/// Labels: kind
pub static TRACKED_ERRORS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "commerce_tracked_errors_total",
        "Transport errors reported to the tracking sink",
        &["kind"]
    )
    .unwrap()
});

/// Cancel-all invocations.
pub static CART_CANCEL_ALL_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "commerce_cart_cancel_all_total",
        "Total cancel-all requests"
    )
    .unwrap()
});

/// Metrics facade.
pub struct Metrics;

impl Metrics {
    /// Update the in-flight request gauge.
    pub fn pending_requests(count: usize) {
        CART_PENDING_REQUESTS.set(count as i64);
    }

    /// Record a slow signal transition.
    pub fn slow_state(is_slow: bool) {
        CART_SLOW.set(i64::from(is_slow));
        if is_slow {
            CART_SLOW_EPISODES_TOTAL.inc();
        }
    }

    /// Record a settled submission.
    pub fn submission_settled(outcome: &str, latency_ms: f64) {
        CART_SUBMISSIONS_TOTAL.with_label_values(&[outcome]).inc();
        CART_SUBMIT_LATENCY_MS
            .with_label_values(&[outcome])
            .observe(latency_ms);
    }

    /// Record a duplicate rejection.
    pub fn duplicate_rejected() {
        CART_DUPLICATES_TOTAL.inc();
    }

    /// Record an error reported to tracking.
    pub fn error_tracked(kind: &str) {
        TRACKED_ERRORS_TOTAL.with_label_values(&[kind]).inc();
    }

    /// Record a cancel-all request.
    pub fn cancel_all() {
        CART_CANCEL_ALL_TOTAL.inc();
    }

    /// Render all registered metrics in the Prometheus text format.
    pub fn gather_text() -> TelemetryResult<String> {
        let encoder = TextEncoder::new();
        let mut buf = Vec::new();
        encoder
            .encode(&prometheus::gather(), &mut buf)
            .map_err(|e| TelemetryError::Metrics(e.to_string()))?;
        String::from_utf8(buf).map_err(|e| TelemetryError::Metrics(e.to_string()))
    }
}
