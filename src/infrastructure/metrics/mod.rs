//! Prometheus Metrics Module
//!
//! Provides process-wide metrics collection using Prometheus.
//!
//! # Metrics Collected
//! - Session lifecycle and traffic counters by event
//! - Whether the session is currently open
//! - Latest potential-points estimate and server-confirmed totals

use once_cell::sync::Lazy;
use prometheus::{Encoder, Gauge, GaugeVec, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};

/// Global metrics registry
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    register_metrics(&registry);
    registry
});

/// Session events by kind ("attempt", "open", "close", "error", "ping_sent", ...)
pub static SESSION_EVENTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("session_events_total", "Total number of session events by kind")
            .namespace("scorelink"),
        &["event"],
    )
    .expect("Failed to create SESSION_EVENTS_TOTAL metric")
});

/// 1 while the websocket session is open
pub static SESSION_OPEN: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::with_opts(
        Opts::new("session_open", "Whether the websocket session is open").namespace("scorelink"),
    )
    .expect("Failed to create SESSION_OPEN metric")
});

/// Latest potential-points estimate
pub static POTENTIAL_POINTS: Lazy<Gauge> = Lazy::new(|| {
    Gauge::with_opts(
        Opts::new("potential_points", "Estimated points accrued in the current window")
            .namespace("scorelink"),
    )
    .expect("Failed to create POTENTIAL_POINTS metric")
});

/// Points totals reported by the server
pub static POINTS: Lazy<GaugeVec> = Lazy::new(|| {
    GaugeVec::new(
        Opts::new("points", "Points totals reported by the server").namespace("scorelink"),
        &["period"], // "total", "today"
    )
    .expect("Failed to create POINTS metric")
});

/// Register all metrics with the registry
fn register_metrics(registry: &Registry) {
    registry
        .register(Box::new(SESSION_EVENTS_TOTAL.clone()))
        .expect("Failed to register SESSION_EVENTS_TOTAL");
    registry
        .register(Box::new(SESSION_OPEN.clone()))
        .expect("Failed to register SESSION_OPEN");
    registry
        .register(Box::new(POTENTIAL_POINTS.clone()))
        .expect("Failed to register POTENTIAL_POINTS");
    registry
        .register(Box::new(POINTS.clone()))
        .expect("Failed to register POINTS");
}

/// Collect and encode all metrics as Prometheus text format
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .expect("Failed to encode metrics");
    String::from_utf8(buffer).expect("Metrics should be valid UTF-8")
}

/// Helper to count a session event
pub fn record_session_event(event: &str) {
    SESSION_EVENTS_TOTAL.with_label_values(&[event]).inc();
}

/// Helper to flag the session as open or not
pub fn set_session_open(open: bool) {
    SESSION_OPEN.set(i64::from(open));
}

/// Helper to publish the latest estimate
pub fn set_potential_points(points: f64) {
    POTENTIAL_POINTS.set(points);
}

/// Helper to publish server-confirmed totals
pub fn set_points(total: f64, today: f64) {
    POINTS.with_label_values(&["total"]).set(total);
    POINTS.with_label_values(&["today"]).set(today);
}
