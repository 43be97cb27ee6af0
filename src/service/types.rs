//! Service-level result and error types.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::brackets::TaxComputation;
use crate::resilience::BreakerError;
use crate::upstream::FetchError;

/// Errors surfaced by [`TaxService`](crate::service::TaxService).
///
/// The `Display` text is the single externally visible message.
#[derive(Debug, Error)]
pub enum TaxServiceError {
    #[error("invalid salary {0}: must be a finite, non-negative amount")]
    InvalidSalary(f64),

    #[error("tax calculator service is unavailable (circuit open): too many recent failures")]
    CircuitOpen,

    #[error("tax calculator service is unavailable: too many concurrent requests")]
    HalfOpenSaturated,

    #[error("tax calculator service error: {0}")]
    Upstream(#[from] FetchError),
}

impl TaxServiceError {
    /// True when the breaker refused the call without contacting the upstream.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            TaxServiceError::CircuitOpen | TaxServiceError::HalfOpenSaturated
        )
    }
}

impl From<BreakerError<FetchError>> for TaxServiceError {
    fn from(err: BreakerError<FetchError>) -> Self {
        match err {
            BreakerError::Open => TaxServiceError::CircuitOpen,
            BreakerError::HalfOpenSaturated => TaxServiceError::HalfOpenSaturated,
            BreakerError::Inner(e) => TaxServiceError::Upstream(e),
        }
    }
}

/// Response envelope returned to callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxResponse {
    pub salary: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tax: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effective_rate: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TaxResponse {
    pub fn success(salary: f64, computation: TaxComputation) -> Self {
        Self {
            salary,
            tax: Some(computation.tax),
            effective_rate: Some(computation.effective_rate),
            error: None,
        }
    }

    pub fn failure(salary: f64, err: &TaxServiceError) -> Self {
        Self {
            salary,
            tax: None,
            effective_rate: None,
            error: Some(format!("Error calculating tax: {err}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_breaker_error_mapping() {
        let err = TaxServiceError::from(BreakerError::<FetchError>::Open);
        assert!(matches!(err, TaxServiceError::CircuitOpen));
        assert!(err.is_rejection());

        let err = TaxServiceError::from(BreakerError::<FetchError>::HalfOpenSaturated);
        assert!(err.is_rejection());

        let err = TaxServiceError::from(BreakerError::Inner(FetchError::EmptyBracketSet));
        assert!(!err.is_rejection());
        assert_eq!(
            err.to_string(),
            "tax calculator service error: no tax brackets returned from tax calculator"
        );
    }

    #[test]
    fn test_response_serialization_skips_absent_fields() {
        let ok = TaxResponse::success(
            80000.0,
            TaxComputation {
                tax: 14000.0,
                effective_rate: 0.175,
            },
        );
        assert_eq!(
            serde_json::to_string(&ok).unwrap(),
            r#"{"salary":80000.0,"tax":14000.0,"effective_rate":0.175}"#
        );

        let failed = TaxResponse::failure(50000.0, &TaxServiceError::CircuitOpen);
        let json = serde_json::to_value(&failed).unwrap();
        assert!(json.get("tax").is_none());
        assert_eq!(
            json["error"],
            "Error calculating tax: tax calculator service is unavailable (circuit open): too many recent failures"
        );
    }
}
