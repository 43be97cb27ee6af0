//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Call to upstream:
//!     → circuit_breaker.rs (admit, reject, or admit as half-open trial)
//!     → wrapped operation (bounded by its own timeout)
//!     → circuit_breaker.rs (record outcome, maybe transition)
//!     → TransitionObserver (after the lock is released)
//! ```
//!
//! # Design Decisions
//! - Fail fast: rejected calls never reach the upstream
//! - No retries at this layer; the breaker is the retry-suppression device
//! - Generic over the operation's output and error, no downcasts

pub mod circuit_breaker;

pub use circuit_breaker::{
    BreakerError, BreakerSettings, CircuitBreaker, CircuitState, Counts, NoopObserver,
    TransitionEvent, TransitionObserver,
};
