//! Tax lookup service.
//!
//! # Data Flow
//! ```text
//! (salary, year?)
//!     → lookup_url (base URL, optional /tax-year/<year>)
//!     → CircuitBreaker::execute(BracketFetcher::fetch)
//!     → brackets::compute
//!     → TaxComputation | TaxServiceError
//!
//! Side channels:
//!     → MetricsSink (outcome counters, fetch latency, breaker gauge)
//!     → LogSink (transitions, rejections, upstream failures)
//! ```
//!
//! # Design Decisions
//! - No retries; a failed lookup is reported once
//! - Breaker rejections and upstream failures share one error type and are
//!   told apart only in metrics

pub mod tax_service;
pub mod telemetry;
pub mod types;

pub use tax_service::{Sinks, TaxService, BREAKER_NAME};
pub use telemetry::BreakerTelemetry;
pub use types::{TaxResponse, TaxServiceError};
