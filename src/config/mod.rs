use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub poller: PollerConfig,
    #[serde(default)]
    pub notifications: NotificationConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the DCA ranking backend.
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PollerConfig {
    /// Activity-status poll interval in milliseconds.
    #[serde(default = "default_status_interval_ms")]
    pub status_interval_ms: u64,
    /// Automatic ranking refresh interval in seconds.
    #[serde(default = "default_refresh_secs")]
    pub ranking_refresh_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NotificationConfig {
    /// Seconds before a notification auto-dismisses.
    #[serde(default = "default_notification_ttl_secs")]
    pub ttl_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub json: bool,
}

fn default_base_url() -> String {
    "http://localhost:8089".to_string()
}
fn default_status_interval_ms() -> u64 {
    2000
}
fn default_refresh_secs() -> u64 {
    300
}
fn default_notification_ttl_secs() -> u64 {
    5
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
        }
    }
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            status_interval_ms: default_status_interval_ms(),
            ranking_refresh_secs: default_refresh_secs(),
        }
    }
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_notification_ttl_secs(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

impl Config {
    /// Load config from a TOML file, then overlay environment variables.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let mut config: Config = toml::from_str(&contents)?;
        config.overlay_env();
        Ok(config)
    }

    /// Load a default config with env-only overrides (no file needed).
    pub fn from_env() -> Self {
        let mut config = Config {
            api: ApiConfig::default(),
            poller: PollerConfig::default(),
            notifications: NotificationConfig::default(),
            logging: LoggingConfig::default(),
        };
        config.overlay_env();
        config
    }

    fn overlay_env(&mut self) {
        if let Ok(url) = std::env::var("DCA_API_URL") {
            self.api.base_url = url;
        }
        if let Ok(level) = std::env::var("DCA_LOG_LEVEL") {
            self.logging.level = level;
        }
    }
}
