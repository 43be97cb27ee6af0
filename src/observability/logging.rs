//! Structured logging.
//!
//! # Responsibilities
//! - Initialize logging subsystem
//! - Provide the [`LogSink`] collaborator used by the service layer
//! - Configure log level from config, overridable with `RUST_LOG`
//!
//! # Design Decisions
//! - Uses tracing crate for structured logging
//! - JSON format for production, pretty format for development
//! - Disabled logging installs an `off` filter rather than no subscriber

use tracing::Level;
use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{LogFormat, LoggingConfig};

/// Leveled message sink.
pub trait LogSink: Send + Sync {
    fn log(&self, level: Level, message: &str);

    fn debug(&self, message: &str) {
        self.log(Level::DEBUG, message);
    }

    fn info(&self, message: &str) {
        self.log(Level::INFO, message);
    }

    fn warn(&self, message: &str) {
        self.log(Level::WARN, message);
    }

    fn error(&self, message: &str) {
        self.log(Level::ERROR, message);
    }
}

/// Sink forwarding to `tracing` events under the `taxgate` target.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn log(&self, level: Level, message: &str) {
        match level {
            Level::ERROR => tracing::error!(target: "taxgate", "{}", message),
            Level::WARN => tracing::warn!(target: "taxgate", "{}", message),
            Level::INFO => tracing::info!(target: "taxgate", "{}", message),
            Level::DEBUG => tracing::debug!(target: "taxgate", "{}", message),
            _ => tracing::trace!(target: "taxgate", "{}", message),
        }
    }
}

/// Filter directive for the configured level.
pub fn filter_directive(config: &LoggingConfig) -> String {
    if !config.enabled {
        return "off".to_string();
    }
    match config.level.to_ascii_lowercase().as_str() {
        "none" | "off" => "off".to_string(),
        level => level.to_string(),
    }
}

/// Install the global subscriber.
pub fn init_logging(config: &LoggingConfig) -> Result<(), TryInitError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter_directive(config)));

    let (pretty, json) = match config.format {
        LogFormat::Pretty => (Some(tracing_subscriber::fmt::layer()), None),
        LogFormat::Json => (None, Some(tracing_subscriber::fmt::layer().json())),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(pretty)
        .with(json)
        .try_init()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct CapturingSink {
        lines: Mutex<Vec<(Level, String)>>,
    }

    impl LogSink for CapturingSink {
        fn log(&self, level: Level, message: &str) {
            self.lines.lock().unwrap().push((level, message.to_string()));
        }
    }

    #[test]
    fn test_helpers_route_to_levels() {
        let sink = CapturingSink::default();
        sink.debug("d");
        sink.info("i");
        sink.warn("w");
        sink.error("e");

        let lines = sink.lines.lock().unwrap();
        let levels: Vec<Level> = lines.iter().map(|(level, _)| *level).collect();
        assert_eq!(levels, vec![Level::DEBUG, Level::INFO, Level::WARN, Level::ERROR]);
        assert_eq!(lines[3].1, "e");
    }

    #[test]
    fn test_filter_directive() {
        let mut config = LoggingConfig::default();
        assert_eq!(filter_directive(&config), "info");

        config.level = "NONE".into();
        assert_eq!(filter_directive(&config), "off");

        config.level = "Debug".into();
        assert_eq!(filter_directive(&config), "debug");

        config.enabled = false;
        assert_eq!(filter_directive(&config), "off");
    }

    #[test]
    fn test_tracing_sink_without_subscriber() {
        TracingSink.info("no subscriber installed");
    }
}
