//! Resilient tax bracket lookup and progressive tax calculation.

pub mod bench;
pub mod brackets;
pub mod config;
pub mod observability;
pub mod resilience;
pub mod service;
pub mod upstream;

pub use brackets::{compute, TaxBracket, TaxComputation};
pub use config::AppConfig;
pub use resilience::CircuitBreaker;
pub use service::{TaxResponse, TaxService, TaxServiceError};
