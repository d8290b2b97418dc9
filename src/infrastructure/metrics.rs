//! Dialer metrics
//!
//! Thin wrappers over the `metrics` facade. Without an installed recorder
//! every call is a no-op, which is what tests rely on.

use crate::domain::call::CallStatus;
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use std::time::Duration;

pub const CALLS_INITIATED: &str = "dialer_calls_initiated_total";
pub const CALLS_ROUTED: &str = "dialer_calls_routed_total";
pub const CALL_OUTCOMES: &str = "dialer_call_outcomes_total";
pub const CALLS_CANCELLED: &str = "dialer_calls_cancelled_total";
pub const DIAL_RUNS: &str = "dialer_runs_total";
pub const IDLE_AGENTS: &str = "dialer_idle_agents";
pub const RUN_DURATION: &str = "dialer_run_duration_seconds";
pub const HTTP_REQUESTS: &str = "http_requests_total";
pub const HTTP_REQUEST_DURATION: &str = "http_request_duration_seconds";

/// Register descriptions with the installed recorder
pub fn describe_metrics() {
    describe_counter!(CALLS_INITIATED, "Total number of calls handed to telephony");
    describe_counter!(CALLS_ROUTED, "Total number of answered calls connected to an agent");
    describe_counter!(CALL_OUTCOMES, "Calls that reached a final status, by status");
    describe_counter!(CALLS_CANCELLED, "Dialing calls cancelled by a campaign stop");
    describe_counter!(DIAL_RUNS, "Dialing runs, by result");
    describe_gauge!(IDLE_AGENTS, "Idle agents seen by the last dialing run");
    describe_histogram!(RUN_DURATION, "Duration of a dialing run in seconds");
    describe_counter!(HTTP_REQUESTS, "Total number of HTTP requests received");
    describe_histogram!(HTTP_REQUEST_DURATION, "HTTP request duration in seconds");
}

pub fn record_calls_initiated(campaign_id: &str, count: usize) {
    counter!(CALLS_INITIATED, "campaign_id" => campaign_id.to_string()).increment(count as u64);
}

pub fn record_call_routed(campaign_id: &str) {
    counter!(CALLS_ROUTED, "campaign_id" => campaign_id.to_string()).increment(1);
}

pub fn record_call_outcome(status: CallStatus) {
    counter!(CALL_OUTCOMES, "outcome" => status.as_str()).increment(1);
}

pub fn record_calls_cancelled(count: u64) {
    counter!(CALLS_CANCELLED).increment(count);
}

pub fn record_dial_run(result: &'static str, duration: Duration) {
    counter!(DIAL_RUNS, "result" => result).increment(1);
    histogram!(RUN_DURATION).record(duration.as_secs_f64());
}

pub fn update_idle_agents(count: usize) {
    gauge!(IDLE_AGENTS).set(count as f64);
}

pub fn record_http_request(method: &str, path: &str, status: u16, duration: Duration) {
    counter!(HTTP_REQUESTS, "method" => method.to_string(), "path" => path.to_string(), "status" => status.to_string())
        .increment(1);
    histogram!(
        HTTP_REQUEST_DURATION,
        "method" => method.to_string(),
        "path" => path.to_string()
    )
    .record(duration.as_secs_f64());
}
