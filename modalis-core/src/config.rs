//! Configuration loading and management
//!
//! Configuration is loaded from `~/.config/modalis/config.toml`
//!
//! This module follows the XDG Base Directory Specification:
//! - Config: `$XDG_CONFIG_HOME/modalis/` (~/.config/modalis/)
//! - Data: `$XDG_DATA_HOME/modalis/` (~/.local/share/modalis/)
//! - State/Logs: `$XDG_STATE_HOME/modalis/` (~/.local/state/modalis/)

use crate::error::{Error, Result};
use chrono::Utc;
use serde::Deserialize;
use std::path::PathBuf;
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
    /// Insight store configuration
    #[serde(default)]
    pub store: StoreConfig,

    /// Activity plan defaults
    #[serde(default)]
    pub plan: PlanConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Insight store configuration
#[derive(Debug, Deserialize, Clone)]
pub struct StoreConfig {
    /// Database file override (defaults to the XDG data directory)
    pub path: Option<PathBuf>,

    /// How long a store call may wait on a locked database, in milliseconds
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: None,
            busy_timeout_ms: default_busy_timeout_ms(),
        }
    }
}

impl StoreConfig {
    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }

    /// Configured database path, or the XDG default
    pub fn database_path(&self) -> PathBuf {
        self.path.clone().unwrap_or_else(Config::database_path)
    }
}

fn default_busy_timeout_ms() -> u64 {
    5000
}

/// Topics used when a plan request has no `titulo`
#[derive(Debug, Deserialize, Clone)]
pub struct PlanConfig {
    /// Topic for the base objective
    #[serde(default = "default_topic")]
    pub default_topic: String,

    /// Topic for each student's closing tie-in step
    #[serde(default = "default_fallback_topic")]
    pub fallback_topic: String,
}

impl Default for PlanConfig {
    fn default() -> Self {
        Self {
            default_topic: default_topic(),
            fallback_topic: default_fallback_topic(),
        }
    }
}

fn default_topic() -> String {
    "Actividad".to_string()
}

fn default_fallback_topic() -> String {
    "tema".to_string()
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
    pub fn load_from(path: &PathBuf) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read config file {:?}: {}", path, e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("failed to parse config: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Reject values that would make the store or planner misbehave
    pub fn validate(&self) -> Result<()> {
        if self.store.busy_timeout_ms == 0 {
            return Err(Error::Config(
                "store.busy_timeout_ms must be greater than 0".to_string(),
            ));
        }
        if self.logging.max_files == 0 {
            return Err(Error::Config(
                "logging.max_files must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Returns the default config file path
    ///
    /// `$XDG_CONFIG_HOME/modalis/config.toml` (~/.config/modalis/config.toml)
    pub fn config_path() -> PathBuf {
        xdg_config_home().join("modalis").join("config.toml")
    }

    /// Returns the data directory path (for SQLite database)
    ///
    /// `$XDG_DATA_HOME/modalis/` (~/.local/share/modalis/)
    pub fn data_dir() -> PathBuf {
        xdg_data_home().join("modalis")
    }

    /// Returns the state directory path (for logs)
    ///
    /// `$XDG_STATE_HOME/modalis/` (~/.local/state/modalis/)
    pub fn state_dir() -> PathBuf {
        xdg_state_home().join("modalis")
    }

    /// Returns the default database file path
    ///
    /// `$XDG_DATA_HOME/modalis/data.db` (~/.local/share/modalis/data.db)
    pub fn database_path() -> PathBuf {
        Self::data_dir().join("data.db")
    }

    /// Returns today's log file path
    ///
    /// The appender rotates daily on the UTC date:
    /// `$XDG_STATE_HOME/modalis/modalis.log.YYYY-MM-DD`
    pub fn log_path() -> PathBuf {
        Self::state_dir().join(format!(
            "{}.{}",
            crate::logging::LOG_FILE_PREFIX,
            Utc::now().format("%Y-%m-%d")
        ))
    }
}
