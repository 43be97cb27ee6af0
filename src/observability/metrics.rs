//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define service metric names and label keys
//! - Abstract the metrics backend behind [`MetricsSink`]
//! - Install the Prometheus recorder and render its exposition text
//!
//! # Metrics
//! - `taxapp_tax_calculations_total` (counter): successful calculations
//! - `taxapp_tax_service_errors_total` (counter): failed lookups, rejections included
//! - `taxapp_tax_fetch_duration_seconds` (histogram): upstream fetch latency
//! - `taxapp_circuit_breaker_state` (gauge): 1=closed, 2=half-open, 3=open
//! - `taxapp_circuit_breaker_rejected_total` (counter): calls refused by the breaker
//! - `taxapp_circuit_breaker_requests_total` (counter): calls that went through, by success
//!
//! # Design Decisions
//! - Callers pass labels explicitly; no global label state
//! - The default sink is the `metrics` facade, so any installed recorder works

use metrics::Label;
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};

pub const TAX_CALCULATIONS_TOTAL: &str = "taxapp_tax_calculations_total";
pub const TAX_SERVICE_ERRORS_TOTAL: &str = "taxapp_tax_service_errors_total";
pub const TAX_FETCH_DURATION_SECONDS: &str = "taxapp_tax_fetch_duration_seconds";
pub const CIRCUIT_BREAKER_STATE: &str = "taxapp_circuit_breaker_state";
pub const CIRCUIT_BREAKER_REJECTED_TOTAL: &str = "taxapp_circuit_breaker_rejected_total";
pub const CIRCUIT_BREAKER_REQUESTS_TOTAL: &str = "taxapp_circuit_breaker_requests_total";

/// Label set passed with every metric call.
pub type Labels = [(&'static str, String)];

/// Destination for counters, histograms and gauges.
pub trait MetricsSink: Send + Sync {
    fn increment_counter(&self, name: &'static str, labels: &Labels);
    fn observe_histogram(&self, name: &'static str, labels: &Labels, value: f64);
    fn set_gauge(&self, name: &'static str, labels: &Labels, value: f64);
}

/// Sink backed by the global `metrics` recorder.
#[derive(Debug, Default, Clone, Copy)]
pub struct RecorderSink;

fn to_labels(labels: &Labels) -> Vec<Label> {
    labels
        .iter()
        .map(|(key, value)| Label::new(*key, value.clone()))
        .collect()
}

impl MetricsSink for RecorderSink {
    fn increment_counter(&self, name: &'static str, labels: &Labels) {
        metrics::counter!(name, to_labels(labels)).increment(1);
    }

    fn observe_histogram(&self, name: &'static str, labels: &Labels, value: f64) {
        metrics::histogram!(name, to_labels(labels)).record(value);
    }

    fn set_gauge(&self, name: &'static str, labels: &Labels, value: f64) {
        metrics::gauge!(name, to_labels(labels)).set(value);
    }
}

/// Sink that drops everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSink;

impl MetricsSink for NoopSink {
    fn increment_counter(&self, _name: &'static str, _labels: &Labels) {}
    fn observe_histogram(&self, _name: &'static str, _labels: &Labels, _value: f64) {}
    fn set_gauge(&self, _name: &'static str, _labels: &Labels, _value: f64) {}
}

/// Install the Prometheus recorder globally.
///
/// The returned handle renders the exposition text on demand.
pub fn init_metrics() -> Result<PrometheusHandle, BuildError> {
    let handle = PrometheusBuilder::new().install_recorder()?;
    tracing::info!("Prometheus metrics recorder installed");
    Ok(handle)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels_preserve_order_and_values() {
        let labels = to_labels(&[
            ("name", "tax-service".to_string()),
            ("environment", "dev".to_string()),
        ]);
        assert_eq!(labels.len(), 2);
        assert_eq!(labels[0].key(), "name");
        assert_eq!(labels[0].value(), "tax-service");
        assert_eq!(labels[1].key(), "environment");
        assert_eq!(labels[1].value(), "dev");
    }

    #[test]
    fn test_recorder_sink_without_recorder_is_harmless() {
        let sink = RecorderSink;
        let labels = [("environment", "test".to_string())];
        sink.increment_counter(TAX_CALCULATIONS_TOTAL, &labels);
        sink.observe_histogram(TAX_FETCH_DURATION_SECONDS, &labels, 0.25);
        sink.set_gauge(CIRCUIT_BREAKER_STATE, &labels, 1.0);
    }
}
