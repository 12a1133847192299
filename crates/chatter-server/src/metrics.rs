//! Metrics collection and export for the chatter server.
//!
//! Uses the `metrics` crate for instrumentation and exports
//! to Prometheus format.

use metrics::{counter, gauge};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use tracing::info;

/// Metric names.
pub mod names {
    pub const SUBSCRIBERS_TOTAL: &str = "chatter_subscribers_total";
    pub const SUBSCRIBERS_ACTIVE: &str = "chatter_subscribers_active";
    pub const MESSAGES_TOTAL: &str = "chatter_messages_total";
    pub const MESSAGES_BYTES: &str = "chatter_messages_bytes";
    pub const ROOMS_ACTIVE: &str = "chatter_rooms_active";
}

/// Initialize the metrics system.
pub fn init_metrics() {
    metrics::describe_counter!(
        names::SUBSCRIBERS_TOTAL,
        "Total number of subscriber connections since server start"
    );
    metrics::describe_gauge!(
        names::SUBSCRIBERS_ACTIVE,
        "Current number of open subscriber connections"
    );
    metrics::describe_counter!(names::MESSAGES_TOTAL, "Total number of messages processed");
    metrics::describe_counter!(names::MESSAGES_BYTES, "Total bytes of messages processed");
    metrics::describe_gauge!(names::ROOMS_ACTIVE, "Current number of chat rooms");

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

/// Record a message.
pub fn record_message(bytes: usize, direction: &str) {
    counter!(names::MESSAGES_TOTAL, "direction" => direction.to_string()).increment(1);
    counter!(names::MESSAGES_BYTES, "direction" => direction.to_string()).increment(bytes as u64);
}

/// Record a new subscriber connection.
pub fn record_subscriber() {
    counter!(names::SUBSCRIBERS_TOTAL).increment(1);
    gauge!(names::SUBSCRIBERS_ACTIVE).increment(1.0);
}

/// Record a subscriber disconnect.
pub fn record_subscriber_gone() {
    gauge!(names::SUBSCRIBERS_ACTIVE).decrement(1.0);
}

/// Update the active room count.
pub fn set_active_rooms(count: usize) {
    gauge!(names::ROOMS_ACTIVE).set(count as f64);
}

/// Metrics guard that records a subscriber disconnect on drop.
pub struct SubscriberMetricsGuard;

impl SubscriberMetricsGuard {
    /// Create a new metrics guard, recording a subscriber connection.
    #[must_use]
    pub fn new() -> Self {
        record_subscriber();
        Self
    }
}

impl Default for SubscriberMetricsGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for SubscriberMetricsGuard {
    fn drop(&mut self) {
        record_subscriber_gone();
    }
}
