//! Startup orchestration: resolve the effective configuration.
//!
//! Order: config file (or defaults) → command-line overrides → validation.
//! Any error is fatal.

use std::path::Path;

use crate::config::{load_config, validate_config, AppConfig, ConfigError};

/// Values given on the command line that take precedence over the file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub bind_address: Option<String>,
    pub access_log: Option<String>,
}

/// Load `path` (or defaults when `None`) and apply `overrides`.
pub fn resolve_config(path: Option<&Path>, overrides: Overrides) -> Result<AppConfig, ConfigError> {
    let mut config = match path {
        Some(path) => load_config(path)?,
        None => AppConfig::default(),
    };

    if let Some(bind_address) = overrides.bind_address {
        config.listener.bind_address = bind_address;
    }
    if let Some(output) = overrides.access_log {
        config.access_log.output = output;
    }

    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}
