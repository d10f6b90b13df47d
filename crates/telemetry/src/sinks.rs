// Path: crates/telemetry/src/sinks.rs
//! Defines abstract traits for metrics reporting, decoupling core logic from the backend.

use once_cell::sync::OnceCell;

// --- Static Sink Access ---

/// A no-op sink for use in tests or when telemetry is disabled.
#[derive(Debug, Clone, Copy)]
pub struct NopSink;

/// A lazily-initialized static reference to the global `MetricsSink` implementation.
pub static SINK: OnceCell<&'static dyn MetricsSink> = OnceCell::new();
static NOP_SINK: NopSink = NopSink;

/// Returns the configured LCD metrics sink, or a no-op sink.
pub fn lcd_metrics() -> &'static dyn LcdMetricsSink {
    SINK.get().copied().unwrap_or(&NOP_SINK)
}

/// Returns the configured alert metrics sink, or a no-op sink.
pub fn alert_metrics() -> &'static dyn AlertMetricsSink {
    SINK.get().copied().unwrap_or(&NOP_SINK)
}

/// Returns the configured cycle metrics sink, or a no-op sink.
pub fn cycle_metrics() -> &'static dyn CycleMetricsSink {
    SINK.get().copied().unwrap_or(&NOP_SINK)
}

/// Returns the configured error metrics sink, or a no-op sink.
pub fn error_metrics() -> &'static dyn ErrorMetricsSink {
    SINK.get().copied().unwrap_or(&NOP_SINK)
}

// --- Trait Definitions ---

/// A sink for metrics related to LCD endpoint traffic.
pub trait LcdMetricsSink: Send + Sync + std::fmt::Debug {
    /// Observes the latency of a request, labeled by resource (`proposals`, `vote`, `probe`).
    fn observe_request_duration(&self, resource: &str, duration_secs: f64);
    /// Increments a counter for completed requests, labeled by resource and status code.
    fn inc_requests_total(&self, resource: &str, status_code: u16);
    /// Sets the number of endpoints that passed their health probe for a chain.
    fn set_healthy_endpoints(&self, chain: &str, count: usize);
}
impl LcdMetricsSink for NopSink {
    fn observe_request_duration(&self, _resource: &str, _duration_secs: f64) {}
    fn inc_requests_total(&self, _resource: &str, _status_code: u16) {}
    fn set_healthy_endpoints(&self, _chain: &str, _count: usize) {}
}

/// A sink for metrics related to alert decisions and delivery.
pub trait AlertMetricsSink: Send + Sync + std::fmt::Debug {
    /// Increments the counter of alerts delivered for a chain.
    fn inc_alerts_sent(&self, chain: &str);
    /// Increments the counter of alerts whose delivery failed for a chain.
    fn inc_alert_failures(&self, chain: &str);
    /// Sets the gauge for the number of keys held by the dedup store.
    fn set_tracked_alert_keys(&self, count: usize);
    /// Increments the counter of dedup keys evicted after their deadline.
    fn inc_alert_keys_evicted(&self, count: u64);
}
impl AlertMetricsSink for NopSink {
    fn inc_alerts_sent(&self, _chain: &str) {}
    fn inc_alert_failures(&self, _chain: &str) {}
    fn set_tracked_alert_keys(&self, _count: usize) {}
    fn inc_alert_keys_evicted(&self, _count: u64) {}
}

/// A sink for metrics related to the poll cycle itself.
pub trait CycleMetricsSink: Send + Sync + std::fmt::Debug {
    /// Observes the wall-clock duration of one poll cycle.
    fn observe_cycle_duration(&self, duration_secs: f64);
    /// Increments the counter of cycles, labeled by outcome (`completed`, `timed_out`, `aborted`).
    fn inc_cycles_total(&self, outcome: &'static str);
}
impl CycleMetricsSink for NopSink {
    fn observe_cycle_duration(&self, _duration_secs: f64) {}
    fn inc_cycles_total(&self, _outcome: &'static str) {}
}

/// A sink for recording structured error metrics.
pub trait ErrorMetricsSink: Send + Sync + std::fmt::Debug {
    /// Increments a counter for a specific error, categorized by its kind and code.
    fn inc_error(&self, kind: &'static str, code: &'static str);
}
impl ErrorMetricsSink for NopSink {
    fn inc_error(&self, _kind: &'static str, _code: &'static str) {}
}

/// A unified sink that implements all domain-specific traits, providing a single
/// point of implementation for metrics backends like Prometheus.
pub trait MetricsSink: LcdMetricsSink + AlertMetricsSink + CycleMetricsSink + ErrorMetricsSink {}

// Blanket implementation to allow any type that implements all sub-traits
// to be used as a `MetricsSink`.
impl<T> MetricsSink for T where T: LcdMetricsSink + AlertMetricsSink + CycleMetricsSink + ErrorMetricsSink
{}
