//! Tax bracket types and upstream wire payloads.

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

/// A salary range taxed at a single marginal rate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TaxBracket {
    /// Lower bound of the range (exclusive for taxation purposes).
    pub min: f64,
    /// Upper bound of the range; `None` marks the unbounded top bracket.
    ///
    /// On the wire an absent, `null` or `0` value all mean unbounded.
    #[serde(
        default,
        deserialize_with = "deserialize_upper_bound",
        skip_serializing_if = "Option::is_none"
    )]
    pub max: Option<f64>,
    /// Marginal rate in `[0, 1]`.
    pub rate: f64,
}

impl TaxBracket {
    /// Create a bracket with an upper bound.
    pub fn bounded(min: f64, max: f64, rate: f64) -> Self {
        Self {
            min,
            max: Some(max),
            rate,
        }
    }

    /// Create the open-ended top bracket.
    pub fn unbounded(min: f64, rate: f64) -> Self {
        Self {
            min,
            max: None,
            rate,
        }
    }
}

fn deserialize_upper_bound<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let max = Option::<f64>::deserialize(deserializer)?;
    Ok(max.filter(|m| *m != 0.0))
}

/// Successful payload returned by the bracket-rate service.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaxBracketsPayload {
    #[serde(default)]
    pub tax_brackets: Vec<TaxBracket>,
}

/// A single structured error entry returned by the bracket-rate service.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpstreamErrorEntry {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub field: String,
    #[serde(default)]
    pub message: String,
}

/// Error payload returned alongside non-success statuses.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpstreamErrorPayload {
    #[serde(default)]
    pub errors: Vec<UpstreamErrorEntry>,
}

impl UpstreamErrorPayload {
    /// Render every entry as `code: message`, joined with `"; "`.
    pub fn joined(&self) -> String {
        self.errors
            .iter()
            .map(|e| format!("{}: {}", e.code, e.message))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// Result of a bracket computation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TaxComputation {
    /// Total tax owed.
    pub tax: f64,
    /// `tax / salary`, rounded to three decimals.
    pub effective_rate: f64,
}

/// Reasons a bracket set is rejected before computation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BracketError {
    /// A bracket starts below its predecessor.
    #[error("bracket {index} starts at {min} which is below the previous bracket start {previous_min}")]
    OutOfOrder {
        index: usize,
        min: f64,
        previous_min: f64,
    },

    /// A bounded bracket whose upper bound does not exceed its lower bound.
    #[error("bracket {index} has max {max} not above its min {min}")]
    EmptyRange { index: usize, min: f64, max: f64 },

    /// Rate outside `[0, 1]` or not a number.
    #[error("bracket {index} has rate {rate} outside [0, 1]")]
    InvalidRate { index: usize, rate: f64 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_and_absent_max_are_unbounded() {
        let payload: TaxBracketsPayload = serde_json::from_str(
            r#"{"tax_brackets":[{"min":0,"max":50197,"rate":0.15},{"min":50197,"max":0,"rate":0.205},{"min":100392,"rate":0.26},{"min":155625,"max":null,"rate":0.29}]}"#,
        )
        .unwrap();

        assert_eq!(payload.tax_brackets[0].max, Some(50197.0));
        assert_eq!(payload.tax_brackets[1].max, None);
        assert_eq!(payload.tax_brackets[2].max, None);
        assert_eq!(payload.tax_brackets[3].max, None);
    }

    #[test]
    fn test_missing_brackets_field_is_empty() {
        let payload: TaxBracketsPayload = serde_json::from_str("{}").unwrap();
        assert!(payload.tax_brackets.is_empty());
    }

    #[test]
    fn test_unbounded_bracket_serializes_without_max() {
        let json = serde_json::to_string(&TaxBracket::unbounded(70000.0, 0.3)).unwrap();
        assert_eq!(json, r#"{"min":70000.0,"rate":0.3}"#);
    }

    #[test]
    fn test_error_payload_joined() {
        let payload: UpstreamErrorPayload = serde_json::from_str(
            r#"{"errors":[{"code":"INTERNAL_SERVER_ERROR","field":"","message":"Database not found!"},{"code":"BAD_YEAR","field":"year","message":"unsupported"}]}"#,
        )
        .unwrap();

        assert_eq!(
            payload.joined(),
            "INTERNAL_SERVER_ERROR: Database not found!; BAD_YEAR: unsupported"
        );
    }
}
