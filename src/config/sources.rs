use super::models::Config;
use config::{ConfigError, Environment, File};
use std::env;
use std::path::PathBuf;

const CONFIG_ENV_VAR: &str = "DEBRIDGE_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "config/debridge.toml";
const ENV_PREFIX: &str = "DEBRIDGE";
const ENV_SEPARATOR: &str = "__";

/// Load configuration from multiple sources with priority:
/// 1. Defaults (embedded in structs)
/// 2. TOML file (if exists)
/// 3. Environment variables from .env file (via dotenvy)
/// 4. System environment variables (highest priority)
pub fn load() -> Result<Config, ConfigError> {
    // Load .env file if it exists (ignore errors if file doesn't exist)
    let _ = dotenvy::dotenv();

    let config_path = env::var(CONFIG_ENV_VAR)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH));

    let mut config = load_from_sources(config_path)?;

    load_secrets(&mut config, |key| env::var(key).ok());

    Ok(config)
}

/// Credentials are never stored in TOML files, only in environment
fn load_secrets(config: &mut Config, lookup: impl Fn(&str) -> Option<String>) {
    let creds = &mut config.credentials;

    let fields = [
        ("REALDEBRID_API_KEY", &mut creds.debrid_api_key),
        ("TORRSERVER_URL", &mut creds.torrserver_url),
        ("TORRSERVER_USERNAME", &mut creds.torrserver_username),
        ("TORRSERVER_PASSWORD", &mut creds.torrserver_password),
        ("DEBRID_CLIENT_IP", &mut creds.ip),
    ];

    for (key, slot) in fields {
        if let Some(value) = lookup(key).filter(|v| !v.is_empty()) {
            *slot = Some(value);
        }
    }
}

/// Load configuration from a specific path and environment
/// Useful for testing with custom config files
pub fn load_from_sources(config_path: PathBuf) -> Result<Config, ConfigError> {
    let mut builder = config::Config::builder();

    if config_path.exists() {
        tracing::info!("Loading configuration from: {}", config_path.display());
        builder = builder.add_source(File::from(config_path).required(false));
    } else {
        tracing::debug!(
            "Configuration file not found at {}, using defaults and environment overrides",
            config_path.display()
        );
    }

    // DEBRIDGE__DEBRID__MAX_RETRIES -> debrid.max_retries
    builder = builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .separator(ENV_SEPARATOR)
            .try_parsing(true),
    );

    let config = builder.build()?;
    config.try_deserialize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_load_defaults_only() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("nonexistent.toml");

        let config = load_from_sources(config_path).unwrap();
        assert_eq!(config.debrid.max_retries, 60);
        assert_eq!(config.http.request_timeout_secs, 30);
    }

    #[test]
    fn test_load_from_toml() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("test.toml");

        let toml_content = r#"
[debrid]
enable_cache_check = true
max_retries = 5
polling_interval_ms = 250
download_timeout_secs = 10

[realdebrid]
base_url = "http://127.0.0.1:9999/rest/1.0"

[torrserver]
metadata_attempts = 3
        "#;

        fs::write(&config_path, toml_content).unwrap();

        let config = load_from_sources(config_path).unwrap();
        assert!(config.debrid.enable_cache_check);
        assert_eq!(config.debrid.max_retries, 5);
        assert_eq!(config.debrid.polling_interval_ms, 250);
        assert_eq!(config.realdebrid.base_url, "http://127.0.0.1:9999/rest/1.0");
        assert_eq!(config.torrserver.metadata_attempts, 3);
        assert_eq!(config.torrserver.metadata_interval_ms, 2000);
    }

    #[test]
    fn test_credentials_not_read_from_toml() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("test.toml");

        fs::write(&config_path, "[credentials]\ndebridApiKey = \"leaked\"\n").unwrap();

        let config = load_from_sources(config_path).unwrap();
        assert!(config.credentials.debrid_api_key.is_none());
    }

    #[test]
    fn test_load_secrets() {
        let env: HashMap<&str, &str> = [
            ("REALDEBRID_API_KEY", "secret"),
            ("TORRSERVER_URL", "http://ts:8090"),
            ("DEBRID_CLIENT_IP", ""),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        load_secrets(&mut config, |key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.credentials.debrid_api_key.as_deref(), Some("secret"));
        assert_eq!(config.credentials.torrserver_url.as_deref(), Some("http://ts:8090"));
        assert!(config.credentials.ip.is_none());
        assert!(config.credentials.torrserver_password.is_none());
    }
}
