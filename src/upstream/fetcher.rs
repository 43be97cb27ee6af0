//! Bracket lookups against the bracket-rate service.

use std::time::Duration;

use reqwest::{Client, StatusCode};

use crate::brackets::{self, TaxBracket, TaxBracketsPayload, UpstreamErrorPayload};
use crate::upstream::error::FetchError;

/// HTTP client for the bracket-rate service.
#[derive(Debug, Clone)]
pub struct BracketFetcher {
    client: Client,
    timeout: Duration,
}

impl BracketFetcher {
    /// Create a fetcher whose requests give up after `timeout`.
    ///
    /// With `use_system_proxy` off, `HTTP_PROXY`-style environment settings are ignored.
    pub fn new(timeout: Duration, use_system_proxy: bool) -> Result<Self, FetchError> {
        let mut builder = Client::builder().timeout(timeout);
        if !use_system_proxy {
            builder = builder.no_proxy();
        }
        let client = builder.build().map_err(FetchError::Network)?;
        Ok(Self { client, timeout })
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// GET `url` and return its bracket set in upstream order.
    pub async fn fetch(&self, url: &str) -> Result<Vec<TaxBracket>, FetchError> {
        let response = self.client.get(url).send().await.map_err(|e| {
            tracing::debug!(url = %url, error = %e, "Bracket request failed");
            FetchError::Network(e)
        })?;

        let status = response.status();
        if !status.is_success() {
            // An unreadable error body is treated as empty.
            let body = response.bytes().await.unwrap_or_default();
            let err = status_error(status, &body);
            tracing::debug!(url = %url, status = status.as_u16(), error = %err, "Bracket service returned an error status");
            return Err(err);
        }

        let body = response.bytes().await.map_err(|e| {
            tracing::debug!(url = %url, error = %e, "Failed to read bracket response body");
            FetchError::Network(e)
        })?;

        let payload: TaxBracketsPayload =
            serde_json::from_slice(&body).map_err(FetchError::MalformedResponse)?;

        if payload.tax_brackets.is_empty() {
            return Err(FetchError::EmptyBracketSet);
        }
        brackets::validate(&payload.tax_brackets)?;

        tracing::debug!(url = %url, count = payload.tax_brackets.len(), "Fetched tax brackets");
        Ok(payload.tax_brackets)
    }
}

fn status_error(status: StatusCode, body: &[u8]) -> FetchError {
    let status = status.as_u16();

    let detail = if body.is_empty() {
        format!("status {status}")
    } else {
        match serde_json::from_slice::<UpstreamErrorPayload>(body) {
            Ok(payload) if !payload.errors.is_empty() => payload.joined(),
            _ => format!("status {status}: {}", String::from_utf8_lossy(body)),
        }
    };

    FetchError::HttpStatus { status, detail }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_structured_error_body() {
        let body = br#"{"errors":[{"code":"NOT_FOUND","field":"year","message":"no data for 2019"}]}"#;
        let err = status_error(StatusCode::NOT_FOUND, body);
        assert!(matches!(
            err,
            FetchError::HttpStatus { status: 404, ref detail } if detail == "NOT_FOUND: no data for 2019"
        ));
    }

    #[test]
    fn test_empty_errors_array_falls_back_to_raw_body() {
        let err = status_error(StatusCode::BAD_GATEWAY, br#"{"errors":[]}"#);
        assert!(matches!(
            err,
            FetchError::HttpStatus { status: 502, ref detail } if detail == r#"status 502: {"errors":[]}"#
        ));
    }

    #[test]
    fn test_plain_text_body() {
        let err = status_error(StatusCode::SERVICE_UNAVAILABLE, b"upstream maintenance");
        assert_eq!(
            err.to_string(),
            "upstream returned status 503: upstream maintenance"
        );
    }

    #[test]
    fn test_empty_body_reports_bare_status() {
        let err = status_error(StatusCode::INTERNAL_SERVER_ERROR, b"");
        assert_eq!(err.to_string(), "upstream returned status 500");
    }
}
