//! Prometheus metrics for Rally publishing.

use std::net::SocketAddr;

use metrics::{counter, histogram};

/// Install the Prometheus exporter on the given address.
pub fn init_metrics(addr: SocketAddr) {
    let builder = metrics_exporter_prometheus::PrometheusBuilder::new().with_http_listener(addr);
    if let Err(e) = builder.install() {
        tracing::warn!("Failed to install Prometheus exporter: {}", e);
    }
}

/// Record a WSAPI round-trip.
pub fn rally_request(operation: &str) {
    counter!("rally_requests_total", "operation" => operation.to_string()).increment(1);
}

/// Record the outcome of a publishing run.
pub fn run_finished(outcome: &str) {
    counter!("rally_runs_total", "outcome" => outcome.to_string()).increment(1);
}

/// Record run duration.
pub fn run_duration(duration_ms: u64) {
    histogram!("rally_run_duration_ms").record(duration_ms as f64);
}

/// Record an artifact linked to a build.
pub fn artifact_collected(kind: &str) {
    counter!("rally_artifacts_collected_total", "kind" => kind.to_string()).increment(1);
}

/// Record a build definition created on first use.
pub fn build_definition_created() {
    counter!("rally_build_definitions_created_total").increment(1);
}

/// Record a post-build notification received by the server.
pub fn notification_received() {
    counter!("rally_notifications_received_total").increment(1);
}
