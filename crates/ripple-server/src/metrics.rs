//! Metrics collection and export for Ripple.
//!
//! Uses the `metrics` crate for instrumentation and exports
//! to Prometheus format.

use metrics::{counter, gauge};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use tracing::info;

/// Metric names.
pub mod names {
    pub const CONNECTIONS_TOTAL: &str = "ripple_connections_total";
    pub const CONNECTIONS_ACTIVE: &str = "ripple_connections_active";
    pub const EVENTS_TOTAL: &str = "ripple_events_total";
    pub const MALFORMED_FRAMES_TOTAL: &str = "ripple_malformed_frames_total";
    pub const AUTH_FAILURES_TOTAL: &str = "ripple_auth_failures_total";
    pub const PERSISTENCE_FAILURES_TOTAL: &str = "ripple_persistence_failures_total";
    pub const ONLINE_USERS: &str = "ripple_online_users";
}

/// Initialize the metrics system.
pub fn init_metrics() {
    metrics::describe_counter!(
        names::CONNECTIONS_TOTAL,
        "Total number of connections since server start"
    );
    metrics::describe_gauge!(
        names::CONNECTIONS_ACTIVE,
        "Current number of active connections"
    );
    metrics::describe_counter!(names::EVENTS_TOTAL, "Total number of events processed");
    metrics::describe_counter!(
        names::MALFORMED_FRAMES_TOTAL,
        "Total number of frames rejected as malformed"
    );
    metrics::describe_counter!(
        names::AUTH_FAILURES_TOTAL,
        "Total number of rejected handshakes"
    );
    metrics::describe_counter!(
        names::PERSISTENCE_FAILURES_TOTAL,
        "Total number of failed message writes"
    );
    metrics::describe_gauge!(names::ONLINE_USERS, "Current number of online users");

    info!("Metrics initialized");
}

/// Start the Prometheus metrics server.
///
/// # Errors
///
/// Returns an error if the server cannot be started.
pub fn start_metrics_server(port: u16) -> Result<(), Box<dyn std::error::Error>> {
    let addr: SocketAddr = format!("0.0.0.0:{}", port).parse()?;

    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()?;

    info!("Metrics server listening on {}", addr);
    Ok(())
}

/// Record a new connection.
pub fn record_connection() {
    counter!(names::CONNECTIONS_TOTAL).increment(1);
    gauge!(names::CONNECTIONS_ACTIVE).increment(1.0);
}

/// Record a disconnection.
pub fn record_disconnection() {
    gauge!(names::CONNECTIONS_ACTIVE).decrement(1.0);
}

/// Record a processed event.
pub fn record_event(event: &str, direction: &str) {
    counter!(
        names::EVENTS_TOTAL,
        "event" => event.to_string(),
        "direction" => direction.to_string()
    )
    .increment(1);
}

/// Record a malformed inbound frame.
pub fn record_malformed_frame() {
    counter!(names::MALFORMED_FRAMES_TOTAL).increment(1);
}

/// Record a rejected handshake.
pub fn record_auth_failure() {
    counter!(names::AUTH_FAILURES_TOTAL).increment(1);
}

/// Record a failed message write.
pub fn record_persistence_failure() {
    counter!(names::PERSISTENCE_FAILURES_TOTAL).increment(1);
}

/// Update the online-user count.
pub fn set_online_users(count: usize) {
    gauge!(names::ONLINE_USERS).set(count as f64);
}

/// Metrics guard that records disconnection on drop.
pub struct ConnectionMetricsGuard;

impl ConnectionMetricsGuard {
    /// Create a new metrics guard, recording a connection.
    #[must_use]
    pub fn new() -> Self {
        record_connection();
        Self
    }
}

impl Default for ConnectionMetricsGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for ConnectionMetricsGuard {
    fn drop(&mut self) {
        record_disconnection();
    }
}
