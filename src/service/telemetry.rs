//! Forwards breaker transitions to the log and metrics sinks.

use std::sync::Arc;

use crate::observability::metrics::CIRCUIT_BREAKER_STATE;
use crate::observability::{LogSink, MetricsSink};
use crate::resilience::{BreakerSettings, TransitionEvent, TransitionObserver};

/// Breaker observer that logs each transition and updates the state gauge.
pub struct BreakerTelemetry {
    environment: String,
    settings: BreakerSettings,
    metrics: Arc<dyn MetricsSink>,
    log: Arc<dyn LogSink>,
}

impl BreakerTelemetry {
    pub fn new(
        environment: impl Into<String>,
        settings: BreakerSettings,
        metrics: Arc<dyn MetricsSink>,
        log: Arc<dyn LogSink>,
    ) -> Self {
        Self {
            environment: environment.into(),
            settings,
            metrics,
            log,
        }
    }
}

impl TransitionObserver for BreakerTelemetry {
    fn on_transition(&self, event: &TransitionEvent) {
        self.log.info(&format!(
            "Circuit breaker '{}' changed from '{}' to '{}' [threshold={}, ratio={:.2}]",
            event.name,
            event.from,
            event.to,
            self.settings.request_threshold,
            self.settings.failure_ratio
        ));

        self.metrics.set_gauge(
            CIRCUIT_BREAKER_STATE,
            &[
                ("name", event.name.clone()),
                ("environment", self.environment.clone()),
            ],
            event.to.gauge_value(),
        );
    }
}
