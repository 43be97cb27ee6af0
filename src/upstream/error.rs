//! Upstream fetch error definitions.

use thiserror::Error;

use crate::brackets::BracketError;

/// Errors that can occur while fetching a bracket set.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Connection, timeout or body transfer failure.
    #[error("network error: {0}")]
    Network(#[source] reqwest::Error),

    /// Non-success status; `detail` is the upstream's own explanation when it gave one.
    #[error("upstream returned {detail}")]
    HttpStatus { status: u16, detail: String },

    /// Success status with a body that is not a bracket payload.
    #[error("failed to parse tax calculator response: {0}")]
    MalformedResponse(#[source] serde_json::Error),

    /// Success status with zero brackets.
    #[error("no tax brackets returned from tax calculator")]
    EmptyBracketSet,

    /// Brackets that cannot be computed over.
    #[error("invalid tax bracket set: {0}")]
    InvalidBracketSet(#[from] BracketError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(
            FetchError::EmptyBracketSet.to_string(),
            "no tax brackets returned from tax calculator"
        );

        let err = FetchError::HttpStatus {
            status: 400,
            detail: "BAD_YEAR: unsupported".into(),
        };
        assert_eq!(err.to_string(), "upstream returned BAD_YEAR: unsupported");

        let err = FetchError::from(BracketError::InvalidRate { index: 2, rate: 1.5 });
        assert!(err.to_string().starts_with("invalid tax bracket set: bracket 2"));
    }
}
