//! Load testing for the tax service.

use std::sync::Arc;

use taxgate::bench::{self, BenchOptions};
use taxgate::config::AppConfig;
use taxgate::observability::{NoopSink, TracingSink};
use taxgate::resilience::CircuitState;
use taxgate::service::{Sinks, TaxService};

mod common;

fn service(base_url: String) -> Arc<TaxService> {
    let mut config = AppConfig::default();
    config.environment = "load".into();
    config.tax_calculator.base_url = base_url;
    config.tax_calculator.include_tax_year = true;
    config.tax_calculator.use_system_proxy = false;
    let sinks = Sinks {
        metrics: Arc::new(NoopSink),
        log: Arc::new(TracingSink),
    };
    Arc::new(TaxService::new(&config, sinks).unwrap())
}

#[tokio::test]
async fn test_load_against_healthy_upstream() {
    let addr = common::start_fixed_backend(200, common::THREE_BRACKETS).await;
    let service = service(format!("http://{addr}/tax-calculator"));

    let options = BenchOptions {
        requests: 200,
        concurrency: 20,
        ..BenchOptions::default()
    };
    let report = bench::run(service.clone(), &options).await;

    println!("\n{report}\n");
    assert_eq!(report.total, 200);
    assert_eq!(report.succeeded, 200);
    assert_eq!(report.rejected, 0);
    assert_eq!(service.breaker().state(), CircuitState::Closed);
}

#[tokio::test]
async fn test_load_against_failing_upstream_trips_breaker() {
    let addr = common::start_fixed_backend(503, "down").await;
    let service = service(format!("http://{addr}/tax-calculator"));

    let options = BenchOptions {
        requests: 100,
        concurrency: 1,
        ..BenchOptions::default()
    };
    let report = bench::run(service.clone(), &options).await;

    println!("\n{report}\n");
    assert_eq!(report.total, 100);
    assert_eq!(report.succeeded, 0);
    assert_eq!(report.failed, 5);
    assert_eq!(report.rejected, 95);
    assert_eq!(report.status_codes.get(&503), Some(&5));
    assert_eq!(report.errors.get("circuit_open"), Some(&95));
    assert_eq!(service.breaker().state(), CircuitState::Open);
}
