//! # Metrics Collection
//!
//! Compilation counters recorded through the `metrics` facade. The embedding
//! process chooses the exporter; without one installed these calls are no-ops.

use metrics::{counter, describe_counter, describe_histogram, histogram, Unit};

/// Metrics recorder for gateway compilation
#[derive(Debug, Clone, Copy, Default)]
pub struct MetricsRecorder;

impl MetricsRecorder {
    /// Create a new metrics recorder instance
    pub fn new() -> Self {
        Self
    }

    /// Register metric descriptions with the installed recorder
    pub fn describe() {
        describe_counter!(
            "gateway_listeners_built_total",
            Unit::Count,
            "Gateway listeners produced, by transport"
        );
        describe_counter!(
            "gateway_filter_chains_built_total",
            Unit::Count,
            "Filter chains attached to gateway listeners"
        );
        describe_counter!(
            "gateway_listener_build_failures_total",
            Unit::Count,
            "Gateway listener compilations that failed"
        );
        describe_histogram!(
            "gateway_virtual_hosts_collapsed",
            Unit::Count,
            "Virtual hosts removed by route table collapsing per route configuration"
        );
    }

    /// Record a listener successfully assembled
    pub fn record_listener(&self, transport: &'static str, filter_chains: usize) {
        counter!("gateway_listeners_built_total", "transport" => transport).increment(1);
        counter!("gateway_filter_chains_built_total").increment(filter_chains as u64);
    }

    /// Record a failed listener compilation
    pub fn record_listener_failure(&self) {
        counter!("gateway_listener_build_failures_total").increment(1);
    }

    /// Record how many virtual hosts route table collapsing removed
    pub fn record_collapse(&self, before: usize, after: usize) {
        histogram!("gateway_virtual_hosts_collapsed").record(before.saturating_sub(after) as f64);
    }
}
