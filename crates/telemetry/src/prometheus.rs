// Path: crates/telemetry/src/prometheus.rs
//! A concrete implementation of the metrics sinks using the Prometheus crate.

use crate::sinks::*;
use once_cell::sync::OnceCell;
use prometheus::{
    exponential_buckets, register_histogram, register_histogram_vec, register_int_counter,
    register_int_counter_vec, register_int_gauge, register_int_gauge_vec, Histogram,
    HistogramVec, IntCounter, IntCounterVec, IntGauge, IntGaugeVec,
};

// --- Metric Statics ---
// Each collector is set exactly once by `install`.

static LCD_REQUEST_DURATION_SECONDS: OnceCell<HistogramVec> = OnceCell::new();
static LCD_REQUESTS_TOTAL: OnceCell<IntCounterVec> = OnceCell::new();
static LCD_HEALTHY_ENDPOINTS: OnceCell<IntGaugeVec> = OnceCell::new();
static ALERTS_SENT_TOTAL: OnceCell<IntCounterVec> = OnceCell::new();
static ALERT_FAILURES_TOTAL: OnceCell<IntCounterVec> = OnceCell::new();
static ALERT_KEYS_TRACKED: OnceCell<IntGauge> = OnceCell::new();
static ALERT_KEYS_EVICTED_TOTAL: OnceCell<IntCounter> = OnceCell::new();
static CYCLE_DURATION_SECONDS: OnceCell<Histogram> = OnceCell::new();
static CYCLES_TOTAL: OnceCell<IntCounterVec> = OnceCell::new();
static ERRORS_TOTAL: OnceCell<IntCounterVec> = OnceCell::new();

#[derive(Debug, Clone, Copy)]
pub struct PrometheusSink;

/// Runs the body against a collector if `install()` has registered it.
macro_rules! with_metric {
    ($metric:ident, |$m:ident| $body:expr) => {
        if let Some($m) = $metric.get() {
            $body;
        }
    };
}

impl LcdMetricsSink for PrometheusSink {
    fn observe_request_duration(&self, resource: &str, duration_secs: f64) {
        with_metric!(LCD_REQUEST_DURATION_SECONDS, |m| m
            .with_label_values(&[resource])
            .observe(duration_secs));
    }
    fn inc_requests_total(&self, resource: &str, status_code: u16) {
        with_metric!(LCD_REQUESTS_TOTAL, |m| m
            .with_label_values(&[resource, &status_code.to_string()])
            .inc());
    }
    fn set_healthy_endpoints(&self, chain: &str, count: usize) {
        with_metric!(LCD_HEALTHY_ENDPOINTS, |m| m
            .with_label_values(&[chain])
            .set(i64::try_from(count).unwrap_or(i64::MAX)));
    }
}

impl AlertMetricsSink for PrometheusSink {
    fn inc_alerts_sent(&self, chain: &str) {
        with_metric!(ALERTS_SENT_TOTAL, |m| m.with_label_values(&[chain]).inc());
    }
    fn inc_alert_failures(&self, chain: &str) {
        with_metric!(ALERT_FAILURES_TOTAL, |m| m.with_label_values(&[chain]).inc());
    }
    fn set_tracked_alert_keys(&self, count: usize) {
        with_metric!(ALERT_KEYS_TRACKED, |m| m
            .set(i64::try_from(count).unwrap_or(i64::MAX)));
    }
    fn inc_alert_keys_evicted(&self, count: u64) {
        with_metric!(ALERT_KEYS_EVICTED_TOTAL, |m| m.inc_by(count));
    }
}

impl CycleMetricsSink for PrometheusSink {
    fn observe_cycle_duration(&self, duration_secs: f64) {
        with_metric!(CYCLE_DURATION_SECONDS, |m| m.observe(duration_secs));
    }
    fn inc_cycles_total(&self, outcome: &'static str) {
        with_metric!(CYCLES_TOTAL, |m| m.with_label_values(&[outcome]).inc());
    }
}

impl ErrorMetricsSink for PrometheusSink {
    fn inc_error(&self, kind: &'static str, code: &'static str) {
        with_metric!(ERRORS_TOTAL, |m| m.with_label_values(&[kind, code]).inc());
    }
}

fn already_installed() -> prometheus::Error {
    prometheus::Error::Msg("prometheus sink already installed".into())
}

/// Registers all collectors with the default registry and returns the sink.
/// Must be called only once at application startup.
pub fn install() -> Result<&'static dyn MetricsSink, prometheus::Error> {
    LCD_REQUEST_DURATION_SECONDS
        .set(register_histogram_vec!(
            "govwatch_lcd_request_duration_seconds",
            "Latency of LCD requests by resource.",
            &["resource"],
            exponential_buckets(0.01, 2.0, 12)?
        )?)
        .map_err(|_| already_installed())?;
    LCD_REQUESTS_TOTAL
        .set(register_int_counter_vec!(
            "govwatch_lcd_requests_total",
            "Completed LCD requests by resource and HTTP status.",
            &["resource", "status"]
        )?)
        .map_err(|_| already_installed())?;
    LCD_HEALTHY_ENDPOINTS
        .set(register_int_gauge_vec!(
            "govwatch_lcd_healthy_endpoints",
            "Endpoints that passed the last health probe, per chain.",
            &["chain"]
        )?)
        .map_err(|_| already_installed())?;
    ALERTS_SENT_TOTAL
        .set(register_int_counter_vec!(
            "govwatch_alerts_sent_total",
            "Voting deadline alerts delivered, per chain.",
            &["chain"]
        )?)
        .map_err(|_| already_installed())?;
    ALERT_FAILURES_TOTAL
        .set(register_int_counter_vec!(
            "govwatch_alert_failures_total",
            "Voting deadline alerts whose delivery failed, per chain.",
            &["chain"]
        )?)
        .map_err(|_| already_installed())?;
    ALERT_KEYS_TRACKED
        .set(register_int_gauge!(
            "govwatch_alert_keys_tracked",
            "Alert keys currently held by the dedup store."
        )?)
        .map_err(|_| already_installed())?;
    ALERT_KEYS_EVICTED_TOTAL
        .set(register_int_counter!(
            "govwatch_alert_keys_evicted_total",
            "Alert keys evicted after their voting period ended."
        )?)
        .map_err(|_| already_installed())?;
    CYCLE_DURATION_SECONDS
        .set(register_histogram!(
            "govwatch_cycle_duration_seconds",
            "Wall-clock duration of a poll cycle.",
            exponential_buckets(0.1, 2.0, 12)?
        )?)
        .map_err(|_| already_installed())?;
    CYCLES_TOTAL
        .set(register_int_counter_vec!(
            "govwatch_cycles_total",
            "Poll cycles by outcome.",
            &["outcome"]
        )?)
        .map_err(|_| already_installed())?;
    ERRORS_TOTAL
        .set(register_int_counter_vec!(
            "govwatch_errors_total",
            "Errors encountered during poll cycles by kind and code.",
            &["kind", "code"]
        )?)
        .map_err(|_| already_installed())?;

    static PROMETHEUS_SINK: PrometheusSink = PrometheusSink;
    SINK.set(&PROMETHEUS_SINK).map_err(|_| already_installed())?;
    Ok(&PROMETHEUS_SINK)
}
