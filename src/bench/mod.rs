//! Concurrent load driver.
//!
//! Fires randomised lookups at a shared [`TaxService`] and summarises how the
//! breaker and the upstream behaved: successes, upstream failures, breaker
//! rejections and latency.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::{Serialize, Serializer};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::service::{TaxService, TaxServiceError};
use crate::upstream::FetchError;

/// Load shape.
#[derive(Debug, Clone)]
pub struct BenchOptions {
    pub requests: usize,
    pub concurrency: usize,
    pub min_salary: u32,
    pub max_salary: u32,
    pub min_year: i32,
    pub max_year: i32,
}

impl Default for BenchOptions {
    fn default() -> Self {
        Self {
            requests: 100,
            concurrency: 10,
            min_salary: 10_000,
            max_salary: 1_000_000,
            min_year: 2020,
            max_year: 2025,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Outcome {
    Success,
    Failure { kind: &'static str, status: Option<u16> },
    Rejected { kind: &'static str },
}

impl Outcome {
    fn from_error(err: &TaxServiceError) -> Self {
        match err {
            TaxServiceError::CircuitOpen => Outcome::Rejected {
                kind: "circuit_open",
            },
            TaxServiceError::HalfOpenSaturated => Outcome::Rejected {
                kind: "half_open_saturated",
            },
            TaxServiceError::InvalidSalary(_) => Outcome::Failure {
                kind: "invalid_salary",
                status: None,
            },
            TaxServiceError::Upstream(fetch) => match fetch {
                FetchError::Network(_) => Outcome::Failure {
                    kind: "network",
                    status: None,
                },
                FetchError::HttpStatus { status, .. } => Outcome::Failure {
                    kind: "http_status",
                    status: Some(*status),
                },
                FetchError::MalformedResponse(_) => Outcome::Failure {
                    kind: "malformed_response",
                    status: None,
                },
                FetchError::EmptyBracketSet => Outcome::Failure {
                    kind: "empty_bracket_set",
                    status: None,
                },
                FetchError::InvalidBracketSet(_) => Outcome::Failure {
                    kind: "invalid_bracket_set",
                    status: None,
                },
            },
        }
    }
}

/// Aggregated results of a run.
///
/// Latencies serialize as fractional milliseconds.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BenchReport {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub rejected: usize,
    /// Non-success outcomes keyed by kind (`network`, `http_status`, `circuit_open`, ...).
    pub errors: BTreeMap<&'static str, usize>,
    /// Upstream error statuses seen.
    pub status_codes: BTreeMap<u16, usize>,
    #[serde(rename = "elapsed_ms", serialize_with = "as_millis")]
    pub elapsed: Duration,
    pub requests_per_second: f64,
    #[serde(rename = "min_latency_ms", serialize_with = "as_millis")]
    pub min_latency: Duration,
    #[serde(rename = "max_latency_ms", serialize_with = "as_millis")]
    pub max_latency: Duration,
    #[serde(rename = "avg_latency_ms", serialize_with = "as_millis")]
    pub avg_latency: Duration,
}

fn as_millis<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(duration.as_nanos() as f64 / 1_000_000.0)
}

impl BenchReport {
    fn from_samples(samples: &[(Outcome, Duration)], elapsed: Duration) -> Self {
        let mut report = Self {
            total: samples.len(),
            elapsed,
            ..Self::default()
        };

        for (outcome, _) in samples {
            match outcome {
                Outcome::Success => report.succeeded += 1,
                Outcome::Failure { kind, status } => {
                    report.failed += 1;
                    *report.errors.entry(*kind).or_default() += 1;
                    if let Some(status) = status {
                        *report.status_codes.entry(*status).or_default() += 1;
                    }
                }
                Outcome::Rejected { kind } => {
                    report.rejected += 1;
                    *report.errors.entry(*kind).or_default() += 1;
                }
            }
        }

        let latencies = samples.iter().map(|(_, d)| *d);
        let total_latency: Duration = latencies.clone().sum();
        report.min_latency = latencies.clone().min().unwrap_or_default();
        report.max_latency = latencies.max().unwrap_or_default();
        report.avg_latency = u32::try_from(samples.len())
            .ok()
            .filter(|n| *n > 0)
            .map(|n| total_latency / n)
            .unwrap_or_default();

        let secs = elapsed.as_secs_f64();
        report.requests_per_second = if secs > 0.0 {
            report.total as f64 / secs
        } else {
            0.0
        };
        report
    }

    /// Pretty-printed JSON rendering.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl fmt::Display for BenchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Load Test Results ---")?;
        writeln!(f, "Total Requests: {}", self.total)?;
        writeln!(f, "Succeeded:      {}", self.succeeded)?;
        writeln!(f, "Failed:         {}", self.failed)?;
        writeln!(f, "Rejected:       {}", self.rejected)?;
        writeln!(f, "Total Duration: {:?}", self.elapsed)?;
        writeln!(f, "Requests/sec:   {:.2}", self.requests_per_second)?;
        writeln!(f, "Min Latency:    {:?}", self.min_latency)?;
        writeln!(f, "Avg Latency:    {:?}", self.avg_latency)?;
        writeln!(f, "Max Latency:    {:?}", self.max_latency)?;
        if !self.errors.is_empty() {
            writeln!(f, "Errors:")?;
            for (kind, count) in &self.errors {
                writeln!(f, "  {kind}: {count}")?;
            }
        }
        if !self.status_codes.is_empty() {
            writeln!(f, "Upstream Status Codes:")?;
            for (status, count) in &self.status_codes {
                writeln!(f, "  {status}: {count}")?;
            }
        }
        write!(f, "-------------------------")
    }
}

/// Run `options.requests` lookups with at most `options.concurrency` in flight.
pub async fn run(service: Arc<TaxService>, options: &BenchOptions) -> BenchReport {
    let permits = Arc::new(Semaphore::new(options.concurrency.max(1)));
    let mut tasks = JoinSet::new();
    let started = Instant::now();

    for _ in 0..options.requests {
        let service = service.clone();
        let permits = permits.clone();
        let salary = f64::from(fastrand::u32(
            options.min_salary..=options.max_salary.max(options.min_salary),
        ));
        let year = fastrand::i32(options.min_year..=options.max_year.max(options.min_year));

        tasks.spawn(async move {
            let _permit = permits.acquire_owned().await.ok();
            let request_started = Instant::now();
            let outcome = match service.calculate(salary, Some(year)).await {
                Ok(_) => Outcome::Success,
                Err(e) => Outcome::from_error(&e),
            };
            (outcome, request_started.elapsed())
        });
    }

    let mut samples = Vec::with_capacity(options.requests);
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(sample) => samples.push(sample),
            Err(e) => tracing::error!(error = %e, "Bench task failed"),
        }
    }

    BenchReport::from_samples(&samples, started.elapsed())
}
