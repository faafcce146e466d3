//! Dispatch metrics.
//!
//! Available with the `metrics` feature.

use opentelemetry::{
    KeyValue, global,
    metrics::{Counter, Histogram, Meter},
};
use tracing::debug;

/// Counters and timings for decoder dispatches, labelled by task.
#[derive(Clone)]
pub struct PipelineMetrics {
    /// Meter handle kept alive for metric instruments
    _meter: Meter,
    /// Total dispatches
    pub calls: Counter<u64>,
    /// Dispatches that returned an error
    pub failures: Counter<u64>,
    /// Dispatch duration in seconds
    pub duration: Histogram<f64>,
}

impl PipelineMetrics {
    /// Create instruments on the global meter.
    pub fn new() -> Self {
        let meter = global::meter("chorus_pipeline");

        let calls = meter
            .u64_counter("dispatch.calls")
            .with_description("Total decoder dispatches")
            .build();
        let failures = meter
            .u64_counter("dispatch.failures")
            .with_description("Failed decoder dispatches")
            .build();
        let duration = meter
            .f64_histogram("dispatch.duration")
            .with_unit("seconds")
            .with_description("Decoder dispatch duration")
            .build();

        debug!("PipelineMetrics instruments created");
        Self {
            _meter: meter,
            calls,
            failures,
            duration,
        }
    }

    /// Record a completed dispatch.
    pub fn record_dispatch(&self, task: &str, duration_secs: f64) {
        let labels = &[KeyValue::new("task", task.to_string())];
        self.calls.add(1, labels);
        self.duration.record(duration_secs, labels);
    }

    /// Record a failed dispatch.
    pub fn record_failure(&self, task: &str) {
        let labels = &[KeyValue::new("task", task.to_string())];
        self.calls.add(1, labels);
        self.failures.add(1, labels);
    }
}

impl Default for PipelineMetrics {
    fn default() -> Self {
        Self::new()
    }
}
