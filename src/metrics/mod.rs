//! Prometheus metrics for manifest resolution and the viewer server
//!
//! This module provides metrics tracking for:
//! - Resolver: resolutions by outcome, candidate failures by reason, duration
//! - Server: requests by route and status, request duration
//!
//! # Usage
//!
//! Call `init_metrics()` at application startup to register all metrics.
//! If initialization fails, metrics operations become no-ops.

use prometheus::{
    register_counter_vec, register_histogram, register_histogram_vec, CounterVec, Encoder,
    Histogram, HistogramVec, TextEncoder,
};
use std::sync::OnceLock;

// ============================================================================
// Metrics Storage
// ============================================================================

/// Container for resolver metrics
struct ResolverMetrics {
    resolutions: CounterVec,
    candidate_failures: CounterVec,
    resolve_duration: Histogram,
}

/// Container for server metrics
struct ServerMetrics {
    http_requests: CounterVec,
    http_duration: HistogramVec,
}

/// Global storage for resolver metrics
static RESOLVER_METRICS: OnceLock<ResolverMetrics> = OnceLock::new();

/// Global storage for server metrics
static SERVER_METRICS: OnceLock<ServerMetrics> = OnceLock::new();

/// Flag to track if initialization was attempted
static METRICS_INIT_ATTEMPTED: OnceLock<bool> = OnceLock::new();

// ============================================================================
// Initialization
// ============================================================================

/// Initialize all Prometheus metrics
///
/// This function should be called once at application startup.
/// If metric registration fails, subsequent metric operations become no-ops.
///
/// # Example
///
/// ```ignore
/// if let Err(e) = racecard::metrics::init_metrics() {
///     eprintln!("Warning: Metrics initialization failed: {}", e);
/// }
/// ```
pub fn init_metrics() -> Result<(), Box<dyn std::error::Error>> {
    // Prevent double initialization
    if METRICS_INIT_ATTEMPTED.get().is_some() {
        return Ok(());
    }
    METRICS_INIT_ATTEMPTED.set(true).ok();

    let resolver = ResolverMetrics {
        resolutions: register_counter_vec!(
            "racecard_resolutions_total",
            "Manifest resolutions by outcome",
            &["outcome"]
        )?,
        candidate_failures: register_counter_vec!(
            "racecard_candidate_failures_total",
            "Skipped manifest candidates by failure reason",
            &["reason"]
        )?,
        resolve_duration: register_histogram!(
            "racecard_resolve_duration_seconds",
            "Time spent resolving a manifest in seconds",
            vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]
        )?,
    };

    let server = ServerMetrics {
        http_requests: register_counter_vec!(
            "racecard_http_requests_total",
            "HTTP requests by route and status",
            &["route", "status"]
        )?,
        http_duration: register_histogram_vec!(
            "racecard_http_request_duration_seconds",
            "HTTP request duration in seconds",
            &["route"],
            vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]
        )?,
    };

    RESOLVER_METRICS.set(resolver).ok();
    SERVER_METRICS.set(server).ok();

    Ok(())
}

/// Check if metrics have been initialized
pub fn metrics_initialized() -> bool {
    RESOLVER_METRICS.get().is_some() && SERVER_METRICS.get().is_some()
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Encode all metrics to Prometheus text format
pub fn encode_metrics() -> Result<String, Box<dyn std::error::Error>> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    Ok(String::from_utf8(buffer)?)
}

/// Record the outcome of one resolution
pub fn record_resolution(resolved: bool) {
    if let Some(m) = RESOLVER_METRICS.get() {
        let outcome = if resolved { "resolved" } else { "empty" };
        m.resolutions.with_label_values(&[outcome]).inc();
    }
}

/// Record a skipped candidate
pub fn record_candidate_failure(reason: &str) {
    if let Some(m) = RESOLVER_METRICS.get() {
        m.candidate_failures.with_label_values(&[reason]).inc();
    }
}

/// Record an HTTP request
pub fn record_http_request(route: &str, status: u16, duration_secs: f64) {
    let Some(m) = SERVER_METRICS.get() else {
        return;
    };

    let status_str = status.to_string();
    m.http_requests
        .with_label_values(&[route, &status_str])
        .inc();
    m.http_duration
        .with_label_values(&[route])
        .observe(duration_secs);
}

/// Histogram timer guard that records duration on drop
pub struct MetricsTimer {
    timer: Option<prometheus::HistogramTimer>,
}

impl MetricsTimer {
    fn new(timer: prometheus::HistogramTimer) -> Self {
        Self { timer: Some(timer) }
    }

    /// Create a no-op timer when metrics are not initialized
    fn noop() -> Self {
        Self { timer: None }
    }
}

impl Drop for MetricsTimer {
    fn drop(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.stop_and_record();
        }
    }
}

/// Start a resolution timer (returns a timer handle)
pub fn start_resolve_timer() -> MetricsTimer {
    match RESOLVER_METRICS.get() {
        Some(m) => MetricsTimer::new(m.resolve_duration.start_timer()),
        None => MetricsTimer::noop(),
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn ensure_metrics_initialized() {
        let _ = init_metrics();
    }

    #[test]
    fn test_init_metrics() {
        // Should succeed or return Ok if already initialized
        let result = init_metrics();
        assert!(result.is_ok());

        // Second call should also be Ok (idempotent)
        let result2 = init_metrics();
        assert!(result2.is_ok());
    }

    #[test]
    fn test_metrics_initialized() {
        ensure_metrics_initialized();
        assert!(metrics_initialized());
    }

    #[test]
    fn test_encode_metrics() {
        ensure_metrics_initialized();
        record_resolution(true);
        let text = encode_metrics().unwrap();
        assert!(text.contains("racecard_resolutions_total"));
    }

    #[test]
    fn test_recording_does_not_panic() {
        ensure_metrics_initialized();
        record_resolution(false);
        record_candidate_failure("status");
        record_http_request("/", 200, 0.005);
        let _timer = start_resolve_timer();
    }
}
