//! Circuit breaker guarding calls to an upstream dependency.
//!
//! # States
//! - Closed: normal operation, calls pass through
//! - Open: upstream assumed down, calls fail fast
//! - Half-Open: a bounded number of trial calls probe recovery
//!
//! # State Transitions
//! ```text
//! Closed → Open: requests >= threshold AND failures/requests >= ratio
//! Open → Half-Open: first call after the open timeout (lazy, no timer)
//! Half-Open → Closed: successful trials reach max_half_open_requests
//! Half-Open → Open: any trial fails
//! ```
//!
//! # Design Decisions
//! - One mutex guards state, counts, generation and the trial slots
//! - The lock is never held across the wrapped future
//! - Transition events are delivered after the lock is released
//! - Completions from an older generation are ignored

use std::fmt;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant, SystemTime};

use thiserror::Error;

use crate::config::CircuitBreakerConfig;

/// Observable breaker state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

impl CircuitState {
    /// Gauge encoding: 1=closed, 2=half-open, 3=open.
    pub fn gauge_value(self) -> f64 {
        match self {
            CircuitState::Closed => 1.0,
            CircuitState::HalfOpen => 2.0,
            CircuitState::Open => 3.0,
        }
    }
}

impl fmt::Display for CircuitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CircuitState::Closed => write!(f, "closed"),
            CircuitState::Open => write!(f, "open"),
            CircuitState::HalfOpen => write!(f, "half-open"),
        }
    }
}

/// Outcomes accumulated since the last transition.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Counts {
    pub requests: u32,
    pub successes: u32,
    pub failures: u32,
}

impl Counts {
    fn on_success(&mut self) {
        self.requests = self.requests.saturating_add(1);
        self.successes = self.successes.saturating_add(1);
    }

    fn on_failure(&mut self) {
        self.requests = self.requests.saturating_add(1);
        self.failures = self.failures.saturating_add(1);
    }

    fn failure_ratio(&self) -> f64 {
        if self.requests == 0 {
            0.0
        } else {
            f64::from(self.failures) / f64::from(self.requests)
        }
    }
}

/// Tuning for a [`CircuitBreaker`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BreakerSettings {
    /// Minimum completed requests before the breaker may trip.
    pub request_threshold: u32,
    /// Failure share in `[0, 1]` that trips the breaker.
    pub failure_ratio: f64,
    /// Time spent Open before the next call is admitted as a trial.
    pub open_timeout: Duration,
    /// Trials admitted concurrently in Half-Open, and successes needed to close.
    pub max_half_open_requests: u32,
}

impl Default for BreakerSettings {
    fn default() -> Self {
        Self {
            request_threshold: 5,
            failure_ratio: 0.5,
            open_timeout: Duration::from_secs(60),
            max_half_open_requests: 100,
        }
    }
}

impl From<&CircuitBreakerConfig> for BreakerSettings {
    fn from(config: &CircuitBreakerConfig) -> Self {
        Self {
            request_threshold: config.request_threshold.max(1),
            failure_ratio: config.failure_ratio,
            open_timeout: Duration::from_secs(config.timeout_secs),
            max_half_open_requests: config.max_half_open_requests.max(1),
        }
    }
}

/// A state change, delivered to the breaker's [`TransitionObserver`].
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionEvent {
    pub name: String,
    pub from: CircuitState,
    pub to: CircuitState,
    pub at: SystemTime,
}

/// Receives breaker transitions outside the critical section.
pub trait TransitionObserver: Send + Sync {
    fn on_transition(&self, event: &TransitionEvent);
}

/// Observer that discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl TransitionObserver for NoopObserver {
    fn on_transition(&self, _event: &TransitionEvent) {}
}

/// Error returned by [`CircuitBreaker::execute`].
#[derive(Debug, Error)]
pub enum BreakerError<E> {
    /// Rejected without calling the operation: circuit is open.
    #[error("circuit breaker is open")]
    Open,

    /// Rejected without calling the operation: all half-open trial slots are taken.
    #[error("circuit breaker is half-open and saturated with trial requests")]
    HalfOpenSaturated,

    /// The operation ran and failed.
    #[error(transparent)]
    Inner(E),
}

impl<E> BreakerError<E> {
    /// True when the operation was never invoked.
    pub fn is_rejection(&self) -> bool {
        matches!(self, BreakerError::Open | BreakerError::HalfOpenSaturated)
    }
}

#[derive(Debug)]
struct BreakerInner {
    state: CircuitState,
    counts: Counts,
    generation: u64,
    opened_at: Option<Instant>,
    trials_in_flight: u32,
}

impl Default for BreakerInner {
    fn default() -> Self {
        Self {
            state: CircuitState::Closed,
            counts: Counts::default(),
            generation: 0,
            opened_at: None,
            trials_in_flight: 0,
        }
    }
}

enum Rejection {
    Open,
    HalfOpenSaturated,
}

/// Failure-aware gate around a fallible async operation.
///
/// Share one instance (behind an `Arc`) per guarded upstream.
pub struct CircuitBreaker {
    name: String,
    settings: BreakerSettings,
    enabled: bool,
    inner: Mutex<BreakerInner>,
    observer: Arc<dyn TransitionObserver>,
}

impl fmt::Debug for CircuitBreaker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CircuitBreaker")
            .field("name", &self.name)
            .field("settings", &self.settings)
            .field("enabled", &self.enabled)
            .field("inner", &self.inner)
            .finish()
    }
}

impl CircuitBreaker {
    /// Create an active breaker starting Closed.
    pub fn new(
        name: impl Into<String>,
        settings: BreakerSettings,
        observer: Arc<dyn TransitionObserver>,
    ) -> Self {
        Self {
            name: name.into(),
            settings,
            enabled: true,
            inner: Mutex::new(BreakerInner::default()),
            observer,
        }
    }

    /// Create an inert breaker that always invokes the operation and tracks nothing.
    pub fn passthrough(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            settings: BreakerSettings::default(),
            enabled: false,
            inner: Mutex::new(BreakerInner::default()),
            observer: Arc::new(NoopObserver),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn settings(&self) -> &BreakerSettings {
        &self.settings
    }

    /// Current state. An expired Open state is reported as Open until the next call.
    pub fn state(&self) -> CircuitState {
        self.lock().state
    }

    /// Counts accumulated since the last transition.
    pub fn counts(&self) -> Counts {
        self.lock().counts
    }

    /// Run `operation` through the breaker.
    ///
    /// Rejections return immediately without invoking `operation`.
    pub async fn execute<F, Fut, T, E>(&self, operation: F) -> Result<T, BreakerError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if !self.enabled {
            return operation().await.map_err(BreakerError::Inner);
        }

        let mut permit = match self.admit() {
            Ok(permit) => permit,
            Err(Rejection::Open) => return Err(BreakerError::Open),
            Err(Rejection::HalfOpenSaturated) => return Err(BreakerError::HalfOpenSaturated),
        };

        let result = operation().await;
        permit.complete(result.is_ok());
        result.map_err(BreakerError::Inner)
    }

    fn lock(&self) -> MutexGuard<'_, BreakerInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn admit(&self) -> Result<Permit<'_>, Rejection> {
        let now = Instant::now();
        let mut event = None;

        let admitted = {
            let mut inner = self.lock();

            if inner.state == CircuitState::Open {
                let expired = inner
                    .opened_at
                    .map_or(true, |opened_at| {
                        now.duration_since(opened_at) >= self.settings.open_timeout
                    });
                if expired {
                    event = Some(self.transition(&mut inner, CircuitState::HalfOpen, now));
                }
            }

            match inner.state {
                CircuitState::Closed => Ok(Permit::new(self, inner.generation, false)),
                CircuitState::Open => Err(Rejection::Open),
                CircuitState::HalfOpen => {
                    if inner.trials_in_flight >= self.settings.max_half_open_requests {
                        Err(Rejection::HalfOpenSaturated)
                    } else {
                        inner.trials_in_flight += 1;
                        Ok(Permit::new(self, inner.generation, true))
                    }
                }
            }
        };

        if let Some(event) = event {
            self.observer.on_transition(&event);
        }
        admitted
    }

    fn on_complete(&self, generation: u64, trial: bool, success: bool) {
        let now = Instant::now();

        let event = {
            let mut inner = self.lock();
            if inner.generation != generation {
                return;
            }
            if trial {
                inner.trials_in_flight = inner.trials_in_flight.saturating_sub(1);
            }

            match (inner.state, success) {
                (CircuitState::Closed, true) => {
                    inner.counts.on_success();
                    None
                }
                (CircuitState::Closed, false) => {
                    inner.counts.on_failure();
                    if self.ready_to_trip(&inner.counts) {
                        Some(self.transition(&mut inner, CircuitState::Open, now))
                    } else {
                        None
                    }
                }
                (CircuitState::HalfOpen, true) => {
                    inner.counts.on_success();
                    if inner.counts.successes >= self.settings.max_half_open_requests {
                        Some(self.transition(&mut inner, CircuitState::Closed, now))
                    } else {
                        None
                    }
                }
                (CircuitState::HalfOpen, false) => {
                    inner.counts.on_failure();
                    Some(self.transition(&mut inner, CircuitState::Open, now))
                }
                (CircuitState::Open, _) => None,
            }
        };

        if let Some(event) = event {
            self.observer.on_transition(&event);
        }
    }

    fn on_abandon(&self, generation: u64, trial: bool) {
        let mut inner = self.lock();
        if trial && inner.generation == generation {
            inner.trials_in_flight = inner.trials_in_flight.saturating_sub(1);
        }
    }

    fn ready_to_trip(&self, counts: &Counts) -> bool {
        counts.requests >= self.settings.request_threshold
            && counts.failure_ratio() >= self.settings.failure_ratio
    }

    fn transition(
        &self,
        inner: &mut BreakerInner,
        to: CircuitState,
        now: Instant,
    ) -> TransitionEvent {
        let from = inner.state;
        inner.state = to;
        inner.generation = inner.generation.wrapping_add(1);
        inner.counts = Counts::default();
        inner.trials_in_flight = 0;
        inner.opened_at = (to == CircuitState::Open).then_some(now);

        TransitionEvent {
            name: self.name.clone(),
            from,
            to,
            at: SystemTime::now(),
        }
    }
}

/// Admission ticket for one call.
///
/// Dropping it without `complete` (the caller's future was cancelled) frees
/// the trial slot without recording an outcome.
struct Permit<'a> {
    breaker: &'a CircuitBreaker,
    generation: u64,
    trial: bool,
    done: bool,
}

impl<'a> Permit<'a> {
    fn new(breaker: &'a CircuitBreaker, generation: u64, trial: bool) -> Self {
        Self {
            breaker,
            generation,
            trial,
            done: false,
        }
    }

    fn complete(&mut self, success: bool) {
        self.done = true;
        self.breaker.on_complete(self.generation, self.trial, success);
    }
}

impl Drop for Permit<'_> {
    fn drop(&mut self) {
        if !self.done {
            self.breaker.on_abandon(self.generation, self.trial);
        }
    }
}
