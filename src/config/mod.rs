//! Configuration management
//!
//! This module handles loading and parsing configuration for the Share2Go client.
//! Configuration can be loaded from:
//! - share2go.yml file
//! - Environment variables (override file settings)
//!
//! Missing optional values are filled with sensible defaults.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Backend API configuration
    #[serde(default)]
    pub api: ApiConfig,
    /// Local session storage configuration
    #[serde(default)]
    pub storage: StorageConfig,
    /// Session handling configuration
    #[serde(default)]
    pub session: SessionConfig,
}

/// Backend API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the REST backend
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_seconds: default_timeout(),
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_timeout() -> u64 {
    30
}

/// Local session storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Storage driver (memory, file or sqlite)
    #[serde(default)]
    pub driver: StorageDriver,
    /// JSON file used by the file driver
    #[serde(default = "default_storage_path")]
    pub path: PathBuf,
    /// Database used by the sqlite driver
    #[serde(default = "default_sqlite_url")]
    pub sqlite_url: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            driver: StorageDriver::default(),
            path: default_storage_path(),
            sqlite_url: default_sqlite_url(),
        }
    }
}

fn default_storage_path() -> PathBuf {
    PathBuf::from("data/session.json")
}

fn default_sqlite_url() -> String {
    "data/session.db".to_string()
}

/// Storage driver type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageDriver {
    /// Process-local map, lost on exit
    Memory,
    /// JSON file (default)
    #[default]
    File,
    /// SQLite database
    Sqlite,
}

/// Session handling configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Treat tokens whose `exp` has passed as undecodable
    #[serde(default = "default_check_expiry")]
    pub check_expiry: bool,
    /// Clock skew tolerated on `exp`, in seconds
    #[serde(default)]
    pub leeway_seconds: i64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            check_expiry: default_check_expiry(),
            leeway_seconds: 0,
        }
    }
}

fn default_check_expiry() -> bool {
    true
}

/// Error type for configuration parsing
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    FileRead {
        path: String,
        source: std::io::Error,
    },
    #[error("Failed to parse config file '{path}': {message}")]
    ParseError {
        path: String,
        message: String,
    },
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

impl Config {
    /// Load configuration from file
    ///
    /// If the file doesn't exist, returns default configuration.
    /// If the file exists but is invalid YAML, returns an error with details.
    pub fn load(path: &std::path::Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.display().to_string(),
            source: e,
        })?;

        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        let config: Config = serde_yaml::from_str(&content).map_err(|e| {
            ConfigError::ParseError {
                path: path.display().to_string(),
                message: format_yaml_error(&e),
            }
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from file with environment variable overrides
    ///
    /// Environment variables follow the pattern:
    /// - SHARE2GO_API_BASE_URL
    /// - SHARE2GO_API_TIMEOUT_SECONDS
    /// - SHARE2GO_STORAGE_DRIVER
    /// - SHARE2GO_STORAGE_PATH
    /// - SHARE2GO_STORAGE_SQLITE_URL
    /// - SHARE2GO_SESSION_CHECK_EXPIRY
    /// - SHARE2GO_SESSION_LEEWAY_SECONDS
    pub fn load_with_env(path: &std::path::Path) -> anyhow::Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Reject values no client could work with
    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = self.api.base_url.trim();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ConfigError::ValidationError(format!(
                "api.base_url must be an http(s) URL, got '{}'",
                self.api.base_url
            )));
        }
        if self.api.timeout_seconds == 0 {
            return Err(ConfigError::ValidationError(
                "api.timeout_seconds must be greater than zero".to_string(),
            ));
        }
        if self.session.leeway_seconds < 0 {
            return Err(ConfigError::ValidationError(
                "session.leeway_seconds must not be negative".to_string(),
            ));
        }
        Ok(())
    }

    /// Apply environment variable overrides to the configuration
    fn apply_env_overrides(&mut self) {
        // API configuration
        if let Ok(url) = std::env::var("SHARE2GO_API_BASE_URL") {
            self.api.base_url = url;
        }
        if let Ok(timeout) = std::env::var("SHARE2GO_API_TIMEOUT_SECONDS") {
            if let Ok(timeout) = timeout.parse::<u64>() {
                self.api.timeout_seconds = timeout;
            }
        }

        // Storage configuration
        if let Ok(driver) = std::env::var("SHARE2GO_STORAGE_DRIVER") {
            match driver.to_lowercase().as_str() {
                "memory" => self.storage.driver = StorageDriver::Memory,
                "file" => self.storage.driver = StorageDriver::File,
                "sqlite" => self.storage.driver = StorageDriver::Sqlite,
                _ => {} // Ignore invalid values
            }
        }
        if let Ok(path) = std::env::var("SHARE2GO_STORAGE_PATH") {
            self.storage.path = PathBuf::from(path);
        }
        if let Ok(url) = std::env::var("SHARE2GO_STORAGE_SQLITE_URL") {
            self.storage.sqlite_url = url;
        }

        // Session configuration
        if let Ok(check) = std::env::var("SHARE2GO_SESSION_CHECK_EXPIRY") {
            match check.to_lowercase().as_str() {
                "true" | "1" | "yes" => self.session.check_expiry = true,
                "false" | "0" | "no" => self.session.check_expiry = false,
                _ => {}
            }
        }
        if let Ok(leeway) = std::env::var("SHARE2GO_SESSION_LEEWAY_SECONDS") {
            if let Ok(leeway) = leeway.parse::<i64>() {
                self.session.leeway_seconds = leeway;
            }
        }
    }
}

/// Format YAML parsing error with location and context
fn format_yaml_error(e: &serde_yaml::Error) -> String {
    if let Some(location) = e.location() {
        format!(
            "at line {}, column {}: {}",
            location.line(),
            location.column(),
            e
        )
    } else {
        e.to_string()
    }
}

// Shared mutex for all config tests that modify environment variables.
#[cfg(test)]
static CONFIG_ENV_MUTEX: std::sync::Mutex<()> = std::sync::Mutex::new(());

#[cfg(test)]
const ENV_KEYS: &[&str] = &[
    "SHARE2GO_API_BASE_URL",
    "SHARE2GO_API_TIMEOUT_SECONDS",
    "SHARE2GO_STORAGE_DRIVER",
    "SHARE2GO_STORAGE_PATH",
    "SHARE2GO_STORAGE_SQLITE_URL",
    "SHARE2GO_SESSION_CHECK_EXPIRY",
    "SHARE2GO_SESSION_LEEWAY_SECONDS",
];

#[cfg(test)]
fn clear_env() {
    for key in ENV_KEYS {
        std::env::remove_var(key);
    }
}
