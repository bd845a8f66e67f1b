//! Configuration loading and management
//!
//! Configuration is loaded from `~/.config/todolist/config.toml`
//!
//! This module follows the XDG Base Directory Specification:
//! - Config: `$XDG_CONFIG_HOME/todolist/` (~/.config/todolist/)
//! - Data: `$XDG_DATA_HOME/todolist/` (~/.local/share/todolist/)
//! - State/Logs: `$XDG_STATE_HOME/todolist/` (~/.local/state/todolist/)

use crate::db::RetryPolicy;
use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Returns a best-effort home directory path.
fn home_dir() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Returns XDG_CONFIG_HOME or ~/.config
fn xdg_config_home() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".config"))
}

/// Returns XDG_DATA_HOME or ~/.local/share
fn xdg_data_home() -> PathBuf {
    std::env::var("XDG_DATA_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local/share"))
}

/// Returns XDG_STATE_HOME or ~/.local/state
fn xdg_state_home() -> PathBuf {
    std::env::var("XDG_STATE_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local/state"))
}

/// Main configuration struct
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    /// Task store configuration
    #[serde(default)]
    pub store: StoreConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Task store configuration
#[derive(Debug, Deserialize, Clone)]
pub struct StoreConfig {
    /// Database file (defaults to the XDG data directory)
    pub path: Option<PathBuf>,

    /// Attempts per write when the store is busy, including the first
    #[serde(default = "default_max_busy_retries")]
    pub max_busy_retries: u32,

    /// Delay before the first retry, doubled on each further retry
    #[serde(default = "default_retry_base_delay")]
    pub retry_base_delay_ms: u64,

    /// Cap for a single retry delay
    #[serde(default = "default_retry_max_delay")]
    pub retry_max_delay_ms: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: None,
            max_busy_retries: default_max_busy_retries(),
            retry_base_delay_ms: default_retry_base_delay(),
            retry_max_delay_ms: default_retry_max_delay(),
        }
    }
}

fn default_max_busy_retries() -> u32 {
    5
}

fn default_retry_base_delay() -> u64 {
    10
}

fn default_retry_max_delay() -> u64 {
    1000
}

impl StoreConfig {
    /// Configured database path, or the XDG default
    pub fn database_path(&self) -> PathBuf {
        self.path.clone().unwrap_or_else(Config::database_path)
    }

    /// Retry policy for busy stores
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            base_delay: Duration::from_millis(self.retry_base_delay_ms),
            max_delay: Duration::from_millis(self.retry_max_delay_ms),
            ..Default::default()
        }
        .with_max_attempts(self.max_busy_retries)
    }

    /// Validate configuration, returning error message if invalid
    pub fn validate(&self) -> Result<()> {
        if self.max_busy_retries == 0 {
            return Err(Error::Config(
                "store.max_busy_retries must be at least 1".to_string(),
            ));
        }
        if self.retry_base_delay_ms > self.retry_max_delay_ms {
            return Err(Error::Config(
                "store.retry_base_delay_ms must not exceed store.retry_max_delay_ms".to_string(),
            ));
        }
        Ok(())
    }
}

/// Logging configuration
#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Maximum number of log files to keep
    #[serde(default = "default_max_log_files")]
    pub max_files: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            max_files: default_max_log_files(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_log_files() -> usize {
    5
}

impl Config {
    /// Load configuration from the default path
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        if !config_path.exists() {
            tracing::info!("No config file found at {:?}, using defaults", config_path);
            return Ok(Config::default());
        }

        Self::load_from(&config_path)
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read config file {:?}: {}", path, e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("failed to parse config: {}", e)))?;

        config.store.validate()?;
        Ok(config)
    }

    /// Returns the default config file path
    ///
    /// `$XDG_CONFIG_HOME/todolist/config.toml` (~/.config/todolist/config.toml)
    pub fn config_path() -> PathBuf {
        xdg_config_home().join("todolist").join("config.toml")
    }

    /// Returns the data directory path (for the SQLite database)
    ///
    /// `$XDG_DATA_HOME/todolist/` (~/.local/share/todolist/)
    pub fn data_dir() -> PathBuf {
        xdg_data_home().join("todolist")
    }

    /// Returns the state directory path (for logs)
    ///
    /// `$XDG_STATE_HOME/todolist/` (~/.local/state/todolist/)
    pub fn state_dir() -> PathBuf {
        xdg_state_home().join("todolist")
    }

    /// Returns the default database file path
    ///
    /// `$XDG_DATA_HOME/todolist/tasks.db` (~/.local/share/todolist/tasks.db)
    pub fn database_path() -> PathBuf {
        Self::data_dir().join("tasks.db")
    }

    /// Returns the log file path
    ///
    /// `$XDG_STATE_HOME/todolist/todolist.log` (~/.local/state/todolist/todolist.log)
    pub fn log_path() -> PathBuf {
        Self::state_dir().join("todolist.log")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.store.path.is_none());
        assert_eq!(config.store.max_busy_retries, 5);
        assert_eq!(config.logging.level, "info");
        assert!(config.store.validate().is_ok());
    }

    #[test]
    fn test_parse_config() {
        let toml = r#"
[store]
path = "/tmp/todolist-test/tasks.db"
max_busy_retries = 8
retry_base_delay_ms = 5

[logging]
level = "debug"
"#;
        let config: Config = toml::from_str(toml).unwrap();

        assert_eq!(
            config.store.database_path(),
            PathBuf::from("/tmp/todolist-test/tasks.db")
        );
        assert_eq!(config.store.retry_base_delay_ms, 5);
        assert_eq!(config.store.retry_max_delay_ms, 1000);
        assert_eq!(config.logging.level, "debug");

        let policy = config.store.retry_policy();
        assert_eq!(policy.max_attempts, 8);
        assert_eq!(policy.base_delay, Duration::from_millis(5));
    }

    #[test]
    fn test_store_config_validation() {
        let config = StoreConfig {
            max_busy_retries: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
        // Even unvalidated, the policy always makes one attempt
        assert_eq!(config.retry_policy().max_attempts, 1);

        let config = StoreConfig {
            retry_base_delay_ms: 2000,
            retry_max_delay_ms: 100,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_from_rejects_invalid_store() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[store]\nmax_busy_retries = 0\n").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_default_paths() {
        assert!(Config::database_path().ends_with("todolist/tasks.db"));
        assert!(Config::log_path().ends_with("todolist/todolist.log"));
    }
}
