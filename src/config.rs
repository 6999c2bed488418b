//! Configuration System
//!
//! Handles loading configuration from files and environment variables.
//! Supports TOML config files and environment variable overrides.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::backend::{BackendMode, RemoteConfig};

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub backend: BackendConfig,

    #[serde(default)]
    pub session: SessionConfig,

    #[serde(default)]
    pub chat: ChatConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Expense API configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_base_url() -> String {
    "http://localhost:3001/api".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

/// Backend strategy selection
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BackendConfig {
    #[serde(default)]
    pub mode: BackendMode,
}

/// Session persistence configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
}

fn default_data_dir() -> String {
    dirs::data_local_dir()
        .map(|p| p.join("spendlens").to_string_lossy().to_string())
        .unwrap_or_else(|| "./spendlens_data".to_string())
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

/// Chat behaviour
#[derive(Debug, Clone, Deserialize)]
pub struct ChatConfig {
    #[serde(default = "default_typing_delay")]
    pub typing_delay_ms: u64,
}

fn default_typing_delay() -> u64 {
    1000
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            typing_delay_ms: default_typing_delay(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        Ok(config)
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Config::default();
        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Load configuration with environment variable overrides
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Load from default locations or environment
    ///
    /// Unreadable config files are skipped with a warning. An invalid
    /// `SPENDLENS_BACKEND_MODE` is an error.
    pub fn load_default() -> Result<Self, ConfigError> {
        let config_paths = [
            dirs::config_dir().map(|p| p.join("spendlens").join("config.toml")),
            Some(PathBuf::from("./config.toml")),
        ];

        for path in config_paths.iter().flatten() {
            if !path.exists() {
                continue;
            }
            match Self::load(path) {
                Ok(mut config) => {
                    tracing::info!(path = ?path, "Loaded config");
                    config.apply_env_overrides()?;
                    return Ok(config);
                }
                Err(e) => {
                    tracing::warn!(path = ?path, error = %e, "Failed to load config");
                }
            }
        }

        tracing::debug!("Using default config with environment overrides");
        Self::from_env()
    }

    /// Apply `SPENDLENS_*` environment variable overrides
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from any key lookup
    fn apply_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        // API overrides
        if let Some(url) = lookup("SPENDLENS_API_URL") {
            self.api.base_url = url;
        }

        // Backend overrides
        if let Some(mode) = lookup("SPENDLENS_BACKEND_MODE") {
            self.backend.mode = mode.parse().map_err(ConfigError::InvalidMode)?;
        }

        // Session overrides
        if let Some(data_dir) = lookup("SPENDLENS_DATA_DIR") {
            self.session.data_dir = data_dir;
        }

        // Chat overrides
        if let Some(delay) = lookup("SPENDLENS_TYPING_DELAY_MS") {
            match delay.parse() {
                Ok(ms) => self.chat.typing_delay_ms = ms,
                Err(_) => tracing::warn!(value = %delay, "Ignoring invalid SPENDLENS_TYPING_DELAY_MS"),
            }
        }

        // Logging overrides
        if let Some(level) = lookup("SPENDLENS_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = lookup("SPENDLENS_LOG_FORMAT") {
            self.logging.format = format;
        }

        Ok(())
    }

    /// Settings for the remote backend
    pub fn remote(&self) -> RemoteConfig {
        RemoteConfig {
            base_url: self.api.base_url.trim_end_matches('/').to_string(),
            request_timeout_ms: self.api.request_timeout_secs.saturating_mul(1000),
        }
    }

    pub fn typing_delay(&self) -> Duration {
        Duration::from_millis(self.chat.typing_delay_ms)
    }

    /// Session directory, with a leading `~` expanded to the home directory
    pub fn data_dir(&self) -> PathBuf {
        expand_home(&self.session.data_dir, dirs::home_dir())
    }
}

fn expand_home(path: &str, home: Option<PathBuf>) -> PathBuf {
    let rest = match path.strip_prefix('~') {
        Some("") => "",
        Some(rest) if rest.starts_with('/') => rest.trim_start_matches('/'),
        _ => return PathBuf::from(path),
    };
    match home {
        Some(home) if rest.is_empty() => home,
        Some(home) => home.join(rest),
        None => {
            tracing::warn!(path, "No home directory, using data_dir as written");
            PathBuf::from(path)
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Failed to parse config file {path:?}: {error}")]
    Parse { path: PathBuf, error: String },

    #[error("Invalid backend mode: {0}")]
    InvalidMode(String),
}

/// Generate a default config file content
pub fn generate_default_config() -> String {
    r#"# SpendLens Configuration
#
# Environment variables override these settings:
# - SPENDLENS_API_URL
# - SPENDLENS_BACKEND_MODE
# - SPENDLENS_DATA_DIR
# - SPENDLENS_TYPING_DELAY_MS
# - SPENDLENS_LOG_LEVEL
# - SPENDLENS_LOG_FORMAT

[api]
# Expense API base URL, including the /api prefix
base_url = "http://localhost:3001/api"

# Request timeout in seconds
request_timeout_secs = 30

[backend]
# remote: real API only
# mock: built-in sample data, no network
# fallback: real API, sample data when it cannot be reached
mode = "fallback"

[session]
# Directory holding session.json; a leading ~ means the home directory
data_dir = "~/.local/share/spendlens"

[chat]
# Simulated typing delay before the assistant replies (ms)
typing_delay_ms = 1000

[logging]
# Log level: trace, debug, info, warn, error
level = "info"

# Log format: pretty (for development) or json (for production)
format = "pretty"
"#
    .to_string()
}
