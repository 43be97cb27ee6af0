//! Configuration loading from disk.
//!
//! `config.toml` is the base layer. Any environment other than `dev` merges
//! `config.<env>.toml` on top, table by table. Missing files fall back to
//! defaults; malformed files are errors.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use toml::Table;

use crate::config::schema::AppConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Environment that only reads the base layer.
pub const DEFAULT_ENVIRONMENT: &str = "dev";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Parse error in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// A validated configuration plus the layers it was built from.
///
/// Loading happens before the subscriber is installed, so the loader records
/// what it read and [`LoadedConfig::log_summary`] reports it afterwards.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: AppConfig,
    /// Layers read, in merge order.
    pub layers: Vec<PathBuf>,
    /// Layers looked for but absent.
    pub missing: Vec<PathBuf>,
}

impl LoadedConfig {
    /// Emit the load report through `tracing`.
    pub fn log_summary(&self) {
        for path in &self.missing {
            tracing::warn!(path = %path.display(), "Config file not found, using defaults");
        }
        for path in &self.layers {
            tracing::debug!(path = %path.display(), "Read config layer");
        }

        let config = &self.config;
        tracing::info!(
            environment = %config.environment,
            base_url = %config.tax_calculator.base_url,
            include_tax_year = config.tax_calculator.include_tax_year,
            circuit_breaker_enabled = config.circuit_breaker.enabled,
            "Configuration loaded"
        );
        tracing::debug!(
            request_threshold = config.circuit_breaker.request_threshold,
            failure_ratio = config.circuit_breaker.failure_ratio,
            timeout_secs = config.circuit_breaker.timeout_secs,
            max_half_open_requests = config.circuit_breaker.max_half_open_requests,
            "Circuit breaker configuration"
        );
    }
}

/// Load, merge and validate configuration for `environment` from `dir`.
pub fn load_config(dir: &Path, environment: &str) -> Result<LoadedConfig, ConfigError> {
    let environment = if environment.is_empty() {
        DEFAULT_ENVIRONMENT
    } else {
        environment
    };

    let mut layers = Vec::new();
    let mut missing = Vec::new();

    let base_path = dir.join("config.toml");
    let mut merged = match read_layer(&base_path)? {
        Some(table) => {
            layers.push(base_path.clone());
            table
        }
        None => {
            missing.push(base_path.clone());
            Table::new()
        }
    };

    if environment != DEFAULT_ENVIRONMENT {
        let overlay_path = dir.join(format!("config.{environment}.toml"));
        match read_layer(&overlay_path)? {
            Some(overlay) => {
                merge_tables(&mut merged, overlay);
                layers.push(overlay_path);
            }
            None => missing.push(overlay_path),
        }
    }

    let mut config: AppConfig = toml::Value::Table(merged)
        .try_into()
        .map_err(|source| ConfigError::Parse {
            path: base_path,
            source,
        })?;
    config.environment = environment.to_string();

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(LoadedConfig {
        config,
        layers,
        missing,
    })
}

fn read_layer(path: &Path) -> Result<Option<Table>, ConfigError> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(ConfigError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    let table = toml::from_str::<Table>(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(Some(table))
}

fn merge_tables(base: &mut Table, overlay: Table) {
    for (key, value) in overlay {
        match (base.get_mut(&key), value) {
            (Some(toml::Value::Table(base_table)), toml::Value::Table(overlay_table)) => {
                merge_tables(base_table, overlay_table);
            }
            (_, value) => {
                base.insert(key, value);
            }
        }
    }
}
