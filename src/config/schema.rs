//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the service.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Environment name the config was loaded for (not read from file).
    #[serde(skip)]
    pub environment: String,

    /// Upstream bracket-rate service settings.
    pub tax_calculator: TaxCalculatorConfig,

    /// Circuit breaker guarding the upstream.
    pub circuit_breaker: CircuitBreakerConfig,

    /// Logging settings.
    pub logging: LoggingConfig,

    /// Metrics settings.
    pub observability: ObservabilityConfig,
}

/// Upstream bracket-rate service configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TaxCalculatorConfig {
    /// Base lookup URL.
    pub base_url: String,

    /// Append `/tax-year/<year>` to the lookup URL.
    pub include_tax_year: bool,

    /// Upstream request timeout in seconds.
    pub request_timeout_secs: u64,

    /// Honour proxy environment variables for upstream requests.
    pub use_system_proxy: bool,
}

impl Default for TaxCalculatorConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5001/tax-calculator".to_string(),
            include_tax_year: false,
            request_timeout_secs: 35,
            use_system_proxy: true,
        }
    }
}

/// Circuit breaker configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CircuitBreakerConfig {
    /// When false the breaker is a pass-through.
    pub enabled: bool,

    /// Minimum number of requests before the circuit can trip.
    pub request_threshold: u32,

    /// Share of failures (0.0-1.0) required to trip the circuit.
    pub failure_ratio: f64,

    /// Seconds before a half-open trial is allowed after the circuit opens.
    pub timeout_secs: u64,

    /// Maximum concurrent trial requests while half-open.
    pub max_half_open_requests: u32,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            request_threshold: 5,
            failure_ratio: 0.5,
            timeout_secs: 60,
            max_half_open_requests: 100,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Whether logging is enabled at all.
    pub enabled: bool,

    /// Log level (none, error, warn, info, debug, trace).
    pub level: String,

    /// Output format.
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Install the Prometheus recorder.
    pub metrics_enabled: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            metrics_enabled: true,
        }
    }
}
