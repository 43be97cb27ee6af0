//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (ratios, thresholds, timeouts)
//! - Check the upstream URL is usable
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: AppConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use thiserror::Error;
use url::Url;

use crate::config::schema::AppConfig;

const LOG_LEVELS: &[&str] = &["none", "off", "error", "warn", "info", "debug", "trace"];

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("tax_calculator.base_url '{url}' is invalid: {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error("tax_calculator.request_timeout_secs must be greater than 0")]
    ZeroRequestTimeout,

    #[error("circuit_breaker.request_threshold must be at least 1")]
    ZeroRequestThreshold,

    #[error("circuit_breaker.failure_ratio {0} must be within [0, 1]")]
    FailureRatioOutOfRange(f64),

    #[error("circuit_breaker.max_half_open_requests must be at least 1")]
    ZeroHalfOpenRequests,

    #[error("logging.level '{0}' is not one of none, error, warn, info, debug, trace")]
    UnknownLogLevel(String),
}

/// Validate `config`, collecting every problem.
pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let base_url = &config.tax_calculator.base_url;
    match Url::parse(base_url) {
        Ok(url) if url.scheme() == "http" || url.scheme() == "https" => {}
        Ok(url) => errors.push(ValidationError::InvalidBaseUrl {
            url: base_url.clone(),
            reason: format!("unsupported scheme '{}'", url.scheme()),
        }),
        Err(e) => errors.push(ValidationError::InvalidBaseUrl {
            url: base_url.clone(),
            reason: e.to_string(),
        }),
    }

    if config.tax_calculator.request_timeout_secs == 0 {
        errors.push(ValidationError::ZeroRequestTimeout);
    }

    let breaker = &config.circuit_breaker;
    if breaker.request_threshold == 0 {
        errors.push(ValidationError::ZeroRequestThreshold);
    }
    if !(0.0..=1.0).contains(&breaker.failure_ratio) {
        errors.push(ValidationError::FailureRatioOutOfRange(breaker.failure_ratio));
    }
    if breaker.max_half_open_requests == 0 {
        errors.push(ValidationError::ZeroHalfOpenRequests);
    }

    let level = config.logging.level.to_ascii_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        errors.push(ValidationError::UnknownLogLevel(config.logging.level.clone()));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&AppConfig::default()).is_ok());
    }

    #[test]
    fn test_level_is_case_insensitive() {
        let mut config = AppConfig::default();
        config.logging.level = "DEBUG".into();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_collects_every_error() {
        let mut config = AppConfig::default();
        config.tax_calculator.base_url = "ftp://example.com/brackets".into();
        config.tax_calculator.request_timeout_secs = 0;
        config.circuit_breaker.request_threshold = 0;
        config.circuit_breaker.failure_ratio = 1.5;
        config.circuit_breaker.max_half_open_requests = 0;
        config.logging.level = "verbose".into();

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 6);
        assert!(matches!(errors[0], ValidationError::InvalidBaseUrl { .. }));
        assert!(errors.contains(&ValidationError::FailureRatioOutOfRange(1.5)));
        assert!(errors.contains(&ValidationError::UnknownLogLevel("verbose".into())));
    }

    #[test]
    fn test_nan_ratio_rejected() {
        let mut config = AppConfig::default();
        config.circuit_breaker.failure_ratio = f64::NAN;
        let errors = validate_config(&config).unwrap_err();
        assert!(matches!(errors[0], ValidationError::FailureRatioOutOfRange(_)));
    }

    #[test]
    fn test_unparseable_url() {
        let mut config = AppConfig::default();
        config.tax_calculator.base_url = "not a url".into();
        let errors = validate_config(&config).unwrap_err();
        assert!(errors[0].to_string().contains("not a url"));
    }
}
