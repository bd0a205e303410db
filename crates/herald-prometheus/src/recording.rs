// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Metric registration and recording helpers.
//!
//! Uses the metrics-rs facade so any recorder (Prometheus, statsd, etc.)
//! can collect these metrics.

use metrics::{describe_counter, describe_histogram};

pub const DISPATCH_DURATION_MS: &str = "herald_dispatch_duration_ms";
pub const EVENTS_TOTAL: &str = "herald_events_total";
pub const DISPATCH_FAILURES_TOTAL: &str = "herald_dispatch_failures_total";
pub const SECURITY_BLOCKS_TOTAL: &str = "herald_security_blocks_total";

/// Register all Herald metric descriptions.
///
/// Called once at startup after the recorder is installed.
pub fn register_metrics() {
    describe_histogram!(
        DISPATCH_DURATION_MS,
        metrics::Unit::Milliseconds,
        "Wall-clock time from event admission to dispatch completion"
    );
    describe_counter!(EVENTS_TOTAL, "Events routed, by category");
    describe_counter!(
        DISPATCH_FAILURES_TOTAL,
        "Isolated dispatch step failures, by stage"
    );
    describe_counter!(SECURITY_BLOCKS_TOTAL, "Events blocked by the security gate");
}

/// Record the processing time of one dispatch.
pub fn record_dispatch_duration(tenant: &str, millis: u64) {
    metrics::histogram!(DISPATCH_DURATION_MS, "tenant" => tenant.to_string()).record(millis as f64);
}

/// Record a routed event.
pub fn record_event(category: &str) {
    metrics::counter!(EVENTS_TOTAL, "category" => category.to_string()).increment(1);
}

/// Record an isolated step failure.
pub fn record_failure(stage: &str) {
    metrics::counter!(DISPATCH_FAILURES_TOTAL, "stage" => stage.to_string()).increment(1);
}

/// Record a security block.
pub fn record_security_block() {
    metrics::counter!(SECURITY_BLOCKS_TOTAL).increment(1);
}
