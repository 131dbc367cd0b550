use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::debrid::realdebrid::DEFAULT_BASE_URL;
use crate::debrid::{
    HttpConfig, PollConfig, ProviderOptions, RealDebridOptions, TorrServerOptions,
    UserCredentials,
};

/// Top-level configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub debrid: DebridConfig,
    #[serde(default)]
    pub realdebrid: RealDebridConfig,
    #[serde(default)]
    pub torrserver: TorrServerConfig,
    #[serde(default)]
    pub http: HttpClientConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Loaded from environment, never from config file
    #[serde(skip)]
    pub credentials: UserCredentials,
}

/// Global debrid tunables
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DebridConfig {
    #[serde(default)]
    pub enable_cache_check: bool,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_polling_interval_ms")]
    pub polling_interval_ms: u64,
    #[serde(default = "default_download_timeout_secs")]
    pub download_timeout_secs: u64,
}

impl Default for DebridConfig {
    fn default() -> Self {
        Self {
            enable_cache_check: false,
            max_retries: default_max_retries(),
            polling_interval_ms: default_polling_interval_ms(),
            download_timeout_secs: default_download_timeout_secs(),
        }
    }
}

fn default_max_retries() -> u32 {
    60
}

fn default_polling_interval_ms() -> u64 {
    1000
}

fn default_download_timeout_secs() -> u64 {
    30
}

/// Real-Debrid endpoint
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RealDebridConfig {
    #[serde(default = "default_realdebrid_base_url")]
    pub base_url: String,
}

impl Default for RealDebridConfig {
    fn default() -> Self {
        Self {
            base_url: default_realdebrid_base_url(),
        }
    }
}

fn default_realdebrid_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

/// TorrServer metadata wait
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TorrServerConfig {
    #[serde(default = "default_metadata_attempts")]
    pub metadata_attempts: u32,
    #[serde(default = "default_metadata_interval_ms")]
    pub metadata_interval_ms: u64,
}

impl Default for TorrServerConfig {
    fn default() -> Self {
        Self {
            metadata_attempts: default_metadata_attempts(),
            metadata_interval_ms: default_metadata_interval_ms(),
        }
    }
}

fn default_metadata_attempts() -> u32 {
    30
}

fn default_metadata_interval_ms() -> u64 {
    2000
}

/// Outbound HTTP settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HttpClientConfig {
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: default_connect_timeout_secs(),
            request_timeout_secs: default_request_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_user_agent() -> String {
    format!("debridge/{}", env!("CARGO_PKG_VERSION"))
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is unset
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
        }
    }
}

fn default_log_filter() -> String {
    "info".to_string()
}

impl Config {
    pub fn poll_config(&self) -> PollConfig {
        PollConfig::builder()
            .max_retries(self.debrid.max_retries)
            .interval(Duration::from_millis(self.debrid.polling_interval_ms))
            .timeout(Duration::from_secs(self.debrid.download_timeout_secs))
            .build()
    }

    pub fn http_config(&self) -> HttpConfig {
        HttpConfig {
            connect_timeout: Duration::from_secs(self.http.connect_timeout_secs),
            request_timeout: Duration::from_secs(self.http.request_timeout_secs),
            user_agent: self.http.user_agent.clone(),
        }
    }

    /// Per-provider options derived from the global tunables
    pub fn provider_options(&self) -> ProviderOptions {
        ProviderOptions {
            real_debrid: RealDebridOptions {
                base_url: self.realdebrid.base_url.clone(),
                http: self.http_config(),
                poll: self.poll_config(),
                enable_cache_check: self.debrid.enable_cache_check,
            },
            torrserver: TorrServerOptions {
                http: self.http_config(),
                metadata_attempts: self.torrserver.metadata_attempts,
                metadata_interval: Duration::from_millis(self.torrserver.metadata_interval_ms),
            },
        }
    }
}
