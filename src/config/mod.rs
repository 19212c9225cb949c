use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

/// Environment variable consulted before the config file for the API root.
pub const API_URL_ENV: &str = "GYMHUB_API_URL";

/// Used when neither the environment nor the config file name an API root.
pub const FALLBACK_API_URL: &str = "http://localhost:5000/api";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// Root of the REST backend; role prefixes are appended to it
    pub base_url: Option<String>,
    /// Timeout for ordinary requests in seconds (default: 30)
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    /// Timeout for best-effort loads that fall back instead of failing (default: 3)
    #[serde(default = "default_soft_timeout")]
    pub soft_timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            request_timeout_secs: default_request_timeout(),
            soft_timeout_secs: default_soft_timeout(),
        }
    }
}

fn default_request_timeout() -> u64 {
    30
}

fn default_soft_timeout() -> u64 {
    3
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// JSON file holding the per-role session keys
    #[serde(default = "default_storage_path")]
    pub path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: default_storage_path(),
        }
    }
}

fn default_storage_path() -> PathBuf {
    PathBuf::from("./data/session.json")
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Resolved connection settings handed to every component at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiSettings {
    pub base_url: String,
    pub request_timeout: Duration,
    pub soft_timeout: Duration,
}

impl ApiSettings {
    /// Resolve the API root once: explicit override (flag or env), then the
    /// config file, then [`FALLBACK_API_URL`].
    pub fn resolve(config: &ApiConfig, override_url: Option<&str>) -> Self {
        let base_url = override_url
            .filter(|u| !u.trim().is_empty())
            .map(str::to_string)
            .or_else(|| config.base_url.clone().filter(|u| !u.trim().is_empty()))
            .unwrap_or_else(|| FALLBACK_API_URL.to_string());

        Self {
            base_url: base_url.trim().trim_end_matches('/').to_string(),
            request_timeout: Duration::from_secs(config.request_timeout_secs),
            soft_timeout: Duration::from_secs(config.soft_timeout_secs),
        }
    }
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self::resolve(&ApiConfig::default(), None)
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        if path.exists() {
            info!("Loading configuration from {}", path.display());
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            Self::parse(&content)
        } else {
            info!("No config file found, using defaults");
            Ok(Config::default())
        }
    }

    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).with_context(|| "Failed to parse configuration file")
    }

    pub fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            storage: StorageConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}
