//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! configs/config.toml (base layer)
//!     + configs/config.<env>.toml (overlay, skipped for dev)
//!     → loader.rs (parse, deep-merge, deserialize)
//!     → validation.rs (semantic checks)
//!     → AppConfig (validated, immutable)
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError, LoadedConfig, DEFAULT_ENVIRONMENT};
pub use schema::{
    AppConfig, CircuitBreakerConfig, LogFormat, LoggingConfig, ObservabilityConfig,
    TaxCalculatorConfig,
};
pub use validation::{validate_config, ValidationError};
