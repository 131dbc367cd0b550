//! Configuration management for debridge
//!
//! This module provides a layered configuration system that loads settings from:
//! 1. Default values (embedded in structs)
//! 2. TOML configuration file
//! 3. Environment variables (highest priority)
//!
//! # Usage
//!
//! ```no_run
//! use debridge::config::Config;
//!
//! let config = Config::load().expect("Failed to load configuration");
//! println!("Download wait timeout: {}s", config.debrid.download_timeout_secs);
//! ```
//!
//! # Environment Variables
//!
//! Configuration can be overridden using environment variables with the pattern:
//! `DEBRIDGE__<section>__<key>`
//!
//! Examples:
//! - `DEBRIDGE__DEBRID__MAX_RETRIES=10`
//! - `DEBRIDGE__DEBRID__POLLING_INTERVAL_MS=500`
//! - `DEBRIDGE__REALDEBRID__BASE_URL=http://127.0.0.1:8080/rest/1.0`
//!
//! Credentials come only from `REALDEBRID_API_KEY`, `TORRSERVER_URL`,
//! `TORRSERVER_USERNAME`, `TORRSERVER_PASSWORD` and `DEBRID_CLIENT_IP`.
//!
//! # Configuration File
//!
//! By default, the configuration is loaded from `config/debridge.toml`.
//! This can be overridden using the `DEBRIDGE_CONFIG` environment variable.

mod models;
mod sources;
mod validation;

pub use models::{
    Config, DebridConfig, HttpClientConfig, LoggingConfig, RealDebridConfig, TorrServerConfig,
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
    /// # Errors
    ///
    /// Returns an error if the configuration file is malformed or a tunable is
    /// out of range.
    pub fn load() -> Result<Self, ConfigError> {
        let config = sources::load()?;
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

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::time::Duration;
    use tempfile::TempDir;

    #[test]
    fn test_load_minimal_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("test.toml");

        fs::write(&config_path, "[debrid]\nmax_retries = 3\n").unwrap();

        let config = Config::load_from_path(config_path).unwrap();
        assert_eq!(config.debrid.max_retries, 3);
        assert_eq!(config.poll_config().max_retries, 3);
    }

    #[test]
    fn test_validation_catches_zero_interval() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("test.toml");

        fs::write(&config_path, "[debrid]\npolling_interval_ms = 0\n").unwrap();

        let result = Config::load_from_path(config_path);
        assert!(matches!(
            result.unwrap_err(),
            ConfigError::ValidationError(ValidationError::NotPositive { .. })
        ));
    }

    #[test]
    fn test_full_config_example() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("test.toml");

        let toml_content = r#"
[debrid]
enable_cache_check = false
max_retries = 30
polling_interval_ms = 2000
download_timeout_secs = 45

[realdebrid]
base_url = "https://api.real-debrid.com/rest/1.0"

[torrserver]
metadata_attempts = 10
metadata_interval_ms = 500

[http]
connect_timeout_secs = 5
request_timeout_secs = 20
user_agent = "debridge-test"

[logging]
filter = "debridge=debug"
        "#;

        fs::write(&config_path, toml_content).unwrap();

        let config = Config::load_from_path(config_path).unwrap();

        let poll = config.poll_config();
        assert_eq!(poll.interval, Duration::from_secs(2));
        assert_eq!(poll.timeout, Duration::from_secs(45));

        let http = config.http_config();
        assert_eq!(http.connect_timeout, Duration::from_secs(5));
        assert_eq!(http.user_agent, "debridge-test");

        let options = config.provider_options();
        assert_eq!(options.torrserver.metadata_attempts, 10);
        assert_eq!(config.logging.filter, "debridge=debug");
    }

    #[test]
    fn test_malformed_file() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("test.toml");

        fs::write(&config_path, "[debrid]\nmax_retries = \"many\"\n").unwrap();

        assert!(matches!(
            Config::load_from_path(config_path).unwrap_err(),
            ConfigError::LoadError(_)
        ));
    }
}
