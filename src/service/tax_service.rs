//! Lookup-and-compute orchestration.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Datelike;

use crate::brackets::{self, TaxBracket, TaxComputation};
use crate::config::AppConfig;
use crate::observability::metrics::{
    CIRCUIT_BREAKER_REJECTED_TOTAL, CIRCUIT_BREAKER_REQUESTS_TOTAL, CIRCUIT_BREAKER_STATE,
    TAX_CALCULATIONS_TOTAL, TAX_FETCH_DURATION_SECONDS, TAX_SERVICE_ERRORS_TOTAL,
};
use crate::observability::{LogSink, MetricsSink, RecorderSink, TracingSink};
use crate::resilience::{BreakerSettings, CircuitBreaker, CircuitState};
use crate::service::telemetry::BreakerTelemetry;
use crate::service::types::{TaxResponse, TaxServiceError};
use crate::upstream::{BracketFetcher, FetchError};

/// Name of the breaker guarding the bracket-rate service.
pub const BREAKER_NAME: &str = "tax-service";

/// External collaborators the service reports to.
#[derive(Clone)]
pub struct Sinks {
    pub metrics: Arc<dyn MetricsSink>,
    pub log: Arc<dyn LogSink>,
}

impl Default for Sinks {
    fn default() -> Self {
        Self {
            metrics: Arc::new(RecorderSink),
            log: Arc::new(TracingSink),
        }
    }
}

/// Fetches brackets through the circuit breaker and computes tax over them.
pub struct TaxService {
    base_url: String,
    include_tax_year: bool,
    environment: String,
    fetcher: BracketFetcher,
    breaker: CircuitBreaker,
    sinks: Sinks,
}

impl TaxService {
    /// Build the service from validated configuration.
    pub fn new(config: &AppConfig, sinks: Sinks) -> Result<Self, FetchError> {
        let fetcher = BracketFetcher::new(
            Duration::from_secs(config.tax_calculator.request_timeout_secs),
            config.tax_calculator.use_system_proxy,
        )?;

        let breaker = if config.circuit_breaker.enabled {
            let settings = BreakerSettings::from(&config.circuit_breaker);
            let telemetry = BreakerTelemetry::new(
                config.environment.clone(),
                settings,
                sinks.metrics.clone(),
                sinks.log.clone(),
            );
            sinks.metrics.set_gauge(
                CIRCUIT_BREAKER_STATE,
                &[
                    ("name", BREAKER_NAME.to_string()),
                    ("environment", config.environment.clone()),
                ],
                CircuitState::Closed.gauge_value(),
            );
            CircuitBreaker::new(BREAKER_NAME, settings, Arc::new(telemetry))
        } else {
            sinks
                .log
                .warn("Circuit breaker disabled; upstream calls are not guarded");
            CircuitBreaker::passthrough(BREAKER_NAME)
        };

        Ok(Self {
            base_url: config.tax_calculator.base_url.trim_end_matches('/').to_string(),
            include_tax_year: config.tax_calculator.include_tax_year,
            environment: config.environment.clone(),
            fetcher,
            breaker,
            sinks,
        })
    }

    pub fn breaker(&self) -> &CircuitBreaker {
        &self.breaker
    }

    pub fn environment(&self) -> &str {
        &self.environment
    }

    /// Upstream URL for `year`.
    ///
    /// The year segment is only added when year-aware lookup is configured;
    /// a missing or non-positive year means the current calendar year.
    pub fn lookup_url(&self, year: Option<i32>) -> String {
        if !self.include_tax_year {
            return self.base_url.clone();
        }
        let year = year
            .filter(|y| *y > 0)
            .unwrap_or_else(|| chrono::Local::now().year());
        format!("{}/tax-year/{}", self.base_url, year)
    }

    /// Fetch the bracket set for `year` through the breaker.
    pub async fn fetch_brackets(
        &self,
        year: Option<i32>,
    ) -> Result<Vec<TaxBracket>, TaxServiceError> {
        let url = self.lookup_url(year);
        let started = Instant::now();

        let result = self.breaker.execute(|| self.fetcher.fetch(&url)).await;
        let elapsed = started.elapsed().as_secs_f64();

        match result {
            Ok(brackets) => {
                self.sinks.metrics.observe_histogram(
                    TAX_FETCH_DURATION_SECONDS,
                    &self.outcome_labels("success"),
                    elapsed,
                );
                self.record_breaker_request(true);
                Ok(brackets)
            }
            Err(err) => {
                let err = TaxServiceError::from(err);
                if err.is_rejection() {
                    let reason = match err {
                        TaxServiceError::HalfOpenSaturated => "half_open_saturated",
                        _ => "open",
                    };
                    self.sinks.metrics.increment_counter(
                        CIRCUIT_BREAKER_REJECTED_TOTAL,
                        &[
                            ("name", BREAKER_NAME.to_string()),
                            ("environment", self.environment.clone()),
                            ("reason", reason.to_string()),
                        ],
                    );
                    self.sinks.log.warn(&format!(
                        "Circuit breaker '{BREAKER_NAME}' rejected lookup of {url}: {err}"
                    ));
                } else {
                    self.sinks.metrics.observe_histogram(
                        TAX_FETCH_DURATION_SECONDS,
                        &self.outcome_labels("failure"),
                        elapsed,
                    );
                    self.record_breaker_request(false);
                    self.sinks
                        .log
                        .error(&format!("Tax bracket lookup failed for {url}: {err}"));
                }
                self.sinks
                    .metrics
                    .increment_counter(TAX_SERVICE_ERRORS_TOTAL, &self.environment_labels());
                Err(err)
            }
        }
    }

    /// Compute tax for `salary` using the bracket set for `year`.
    pub async fn calculate(
        &self,
        salary: f64,
        year: Option<i32>,
    ) -> Result<TaxComputation, TaxServiceError> {
        if !salary.is_finite() || salary < 0.0 {
            return Err(TaxServiceError::InvalidSalary(salary));
        }

        let brackets = self.fetch_brackets(year).await?;
        let computation = brackets::compute(salary, &brackets);

        self.sinks
            .metrics
            .increment_counter(TAX_CALCULATIONS_TOTAL, &self.environment_labels());
        self.sinks.log.debug(&format!(
            "Computed tax {:.2} (effective rate {}) for salary {:.2} over {} brackets",
            computation.tax,
            computation.effective_rate,
            salary,
            brackets.len()
        ));

        Ok(computation)
    }

    /// Like [`calculate`](Self::calculate), folded into a response envelope.
    pub async fn respond(&self, salary: f64, year: Option<i32>) -> TaxResponse {
        match self.calculate(salary, year).await {
            Ok(computation) => TaxResponse::success(salary, computation),
            Err(err) => TaxResponse::failure(salary, &err),
        }
    }

    fn record_breaker_request(&self, success: bool) {
        if !self.breaker.is_enabled() {
            return;
        }
        self.sinks.metrics.increment_counter(
            CIRCUIT_BREAKER_REQUESTS_TOTAL,
            &[
                ("name", BREAKER_NAME.to_string()),
                ("success", success.to_string()),
                ("environment", self.environment.clone()),
            ],
        );
    }

    fn environment_labels(&self) -> [(&'static str, String); 1] {
        [("environment", self.environment.clone())]
    }

    fn outcome_labels(&self, outcome: &str) -> [(&'static str, String); 2] {
        [
            ("environment", self.environment.clone()),
            ("outcome", outcome.to_string()),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observability::NoopSink;

    struct QuietLog;

    impl LogSink for QuietLog {
        fn log(&self, _level: tracing::Level, _message: &str) {}
    }

    fn service(include_tax_year: bool, base_url: &str) -> TaxService {
        let mut config = AppConfig::default();
        config.environment = "test".into();
        config.tax_calculator.base_url = base_url.into();
        config.tax_calculator.include_tax_year = include_tax_year;
        let sinks = Sinks {
            metrics: Arc::new(NoopSink),
            log: Arc::new(QuietLog),
        };
        TaxService::new(&config, sinks).unwrap()
    }

    #[test]
    fn test_lookup_url_without_year() {
        let service = service(false, "http://localhost:5001/tax-calculator");
        assert_eq!(
            service.lookup_url(Some(2022)),
            "http://localhost:5001/tax-calculator"
        );
    }

    #[test]
    fn test_lookup_url_with_year() {
        let service = service(true, "http://localhost:5001/tax-calculator/");
        assert_eq!(
            service.lookup_url(Some(2022)),
            "http://localhost:5001/tax-calculator/tax-year/2022"
        );
    }

    #[test]
    fn test_lookup_url_defaults_to_current_year() {
        let service = service(true, "http://localhost:5001/tax-calculator");
        let current = chrono::Local::now().year();
        let expected = format!("http://localhost:5001/tax-calculator/tax-year/{current}");
        assert_eq!(service.lookup_url(None), expected);
        assert_eq!(service.lookup_url(Some(0)), expected);
    }

    #[tokio::test]
    async fn test_invalid_salary_is_rejected_before_fetch() {
        let service = service(false, "http://127.0.0.1:9/unreachable");

        let err = service.calculate(-1.0, None).await.unwrap_err();
        assert!(matches!(err, TaxServiceError::InvalidSalary(_)));
        let err = service.calculate(f64::NAN, None).await.unwrap_err();
        assert!(matches!(err, TaxServiceError::InvalidSalary(_)));

        assert_eq!(service.breaker().counts().requests, 0);
    }
}
