//! Prometheus metrics exposition
//!
//! Agent-level metrics, alongside the session counters recorded by
//! `auth-session`:
//!
//! - `agent_requests_total` (counter): labels `route`, `status`
//! - `agent_request_duration_seconds` (histogram): label `route`

use metrics_exporter_prometheus::{BuildError, Matcher, PrometheusBuilder, PrometheusHandle};

const DURATION_BUCKETS: &[f64] = &[
    0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0,
];

fn builder() -> Result<PrometheusBuilder, BuildError> {
    PrometheusBuilder::new().set_buckets_for_metric(
        Matcher::Full("agent_request_duration_seconds".to_string()),
        DURATION_BUCKETS,
    )
}

/// Install the Prometheus recorder and return a handle for rendering metrics.
///
/// Request durations render as a histogram (with `_bucket` lines) rather than
/// the default summary.
pub fn install_recorder() -> Result<PrometheusHandle, BuildError> {
    builder()?.install_recorder()
}

/// Record a handled request under its route label.
pub fn record_request(route: &str, status: u16, duration_secs: f64) {
    metrics::counter!(
        "agent_requests_total",
        "route" => route.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    metrics::histogram!("agent_request_duration_seconds", "route" => route.to_string())
        .record(duration_secs);
}
