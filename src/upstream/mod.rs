//! Upstream bracket-rate service client.
//!
//! # Failure Classification
//! ```text
//! transport / timeout / body read     → FetchError::Network
//! non-2xx status                      → FetchError::HttpStatus
//!     body {"errors":[...]} non-empty → "code: message; ..."
//!     other non-empty body            → "status N: <body>"
//!     empty body                      → "status N"
//! 2xx, body not a bracket payload     → FetchError::MalformedResponse
//! 2xx, zero brackets                  → FetchError::EmptyBracketSet
//! 2xx, brackets fail validation       → FetchError::InvalidBracketSet
//! ```
//!
//! # Design Decisions
//! - Request timeout is owned by the HTTP client, independent of the breaker
//! - No retries; the circuit breaker is the only resilience layer

pub mod error;
pub mod fetcher;

pub use error::FetchError;
pub use fetcher::BracketFetcher;
