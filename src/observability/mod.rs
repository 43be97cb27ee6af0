//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! service layer produces:
//!     → LogSink (leveled messages; TracingSink by default)
//!     → MetricsSink (counters, gauges, histograms; RecorderSink by default)
//!
//! Consumers:
//!     → tracing-subscriber (stdout, pretty or JSON)
//!     → Prometheus recorder (rendered on demand)
//! ```
//!
//! # Design Decisions
//! - The service never talks to a global logger or recorder directly
//! - Sinks are trait objects so tests can capture every emission

pub mod logging;
pub mod metrics;

pub use logging::{init_logging, LogSink, TracingSink};
pub use metrics::{init_metrics, Labels, MetricsSink, NoopSink, RecorderSink};
