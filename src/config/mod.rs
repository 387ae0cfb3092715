//! Configuration management for topicforge
//!
//! This module provides a layered configuration system that loads settings from:
//! 1. Default values (embedded in structs)
//! 2. TOML configuration file
//! 3. Environment variables (highest priority)
//!
//! # Usage
//!
//! ```no_run
//! use topicforge::config::Config;
//!
//! let config = Config::load().expect("Failed to load configuration");
//! println!("Talking to: {}", config.client.base_url);
//! ```
//!
//! # Environment Variables
//!
//! Configuration can be overridden using environment variables with the pattern:
//! `TOPICFORGE__<section>__<key>`
//!
//! Examples:
//! - `TOPICFORGE__CLIENT__BASE_URL=https://content.example.com/api`
//! - `TOPICFORGE__POLLING__INTERVAL=500ms`
//! - `TOPICFORGE__FANOUT__RECONNECT_DELAY=5s`
//!
//! The API token is a secret and is only read from `TOPICFORGE_API_TOKEN`.
//!
//! # Configuration File
//!
//! By default, the configuration is loaded from `config/topicforge.toml`.
//! This can be overridden using the `TOPICFORGE_CONFIG` environment variable.

mod models;
mod sources;
mod validation;

pub use crate::humanize::HumanDuration;
pub use models::{
    ClientConfig, Config, FanoutConfig, IngestConfig, PollingConfig, TelemetryConfig,
};
pub use validation::ValidationError;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Configuration validation failed: {0}")]
    ValidationError(#[from] ValidationError),
}

impl Config {
    /// Load configuration from all sources (file + environment)
    ///
    /// Configuration is loaded with the following priority (highest to lowest):
    /// 1. Environment variables (`TOPICFORGE__*`)
    /// 2. TOML file (default: `config/topicforge.toml`)
    /// 3. Default values
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file is malformed or a
    /// setting fails validation.
    pub fn load() -> Result<Self, ConfigError> {
        let config = sources::load()?;
        validation::validate(&config)?;
        Ok(config)
    }

    /// Re-check settings after they were changed in code
    pub fn validate(&self) -> Result<(), ValidationError> {
        validation::validate(self)
    }

    /// Like [`Config::load`], reading `path` instead of the default file
    /// when one is given
    pub fn load_with(path: Option<std::path::PathBuf>) -> Result<Self, ConfigError> {
        let config = sources::load_with(path)?;
        validation::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific path
    ///
    /// Useful for testing with custom configuration files.
    pub fn load_from_path(path: std::path::PathBuf) -> Result<Self, ConfigError> {
        let config = sources::load_from_sources(path)?;
        validation::validate(&config)?;
        Ok(config)
    }
}
