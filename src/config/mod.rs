//! Configuration for the data framework
//!
//! Settings are grouped per subsystem and stored as TOML. Every field has a
//! default, so a partial file (or none at all) yields a usable configuration.
//!
//! # Config Location
//!
//! `FrameworkConfig::load_or_default()` reads from the platform config
//! directory:
//! - **Linux**: `~/.config/org.visgui.data/framework.toml`
//! - **macOS**: `~/Library/Application Support/org.visgui.data/framework.toml`
//! - **Windows**: `%APPDATA%\org.visgui.data\framework.toml`
//!
//! # Example
//!
//! ```toml
//! [event_loop]
//! wait_timeout_ms = 20
//!
//! [query]
//! feedback_implicit = false
//! desired_feedback_count = 25
//!
//! [logging]
//! filter = "warn,visgui_data=info"
//! log_dir = "/var/log/visgui"
//! ```

use crate::error::{DataFrameworkError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application identifier for config directories
pub const APP_ID: &str = "org.visgui.data";

/// Config filename
pub const CONFIG_FILE: &str = "framework.toml";

/// Default longest sleep of a blocking wait, in milliseconds
pub const DEFAULT_WAIT_TIMEOUT_MS: u64 = 50;

/// Default number of feedback candidates requested per round
pub const DEFAULT_DESIRED_FEEDBACK_COUNT: usize = 10;

/// Default working set size passed to the query back-end
pub const DEFAULT_WORKING_SET_SIZE: usize = 100;

/// Default log filter when `RUST_LOG` is unset
pub const DEFAULT_LOG_FILTER: &str = "info,visgui_data=debug";

/// Get the config directory path
pub fn config_dir() -> Option<PathBuf> {
    dirs_next::config_dir().map(|p| p.join(APP_ID))
}

/// Get the path to the default config file
pub fn config_path() -> Option<PathBuf> {
    config_dir().map(|p| p.join(CONFIG_FILE))
}

// ==================== Framework Config ====================

/// Top-level framework configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrameworkConfig {
    pub event_loop: EventLoopConfig,
    pub reader: ReaderConfig,
    pub query: QueryConfig,
    pub logging: LoggingConfig,
}

impl FrameworkConfig {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            DataFrameworkError::Config(format!("Failed to read config {:?}: {}", path, e))
        })?;

        toml::from_str(&content).map_err(|e| {
            DataFrameworkError::Config(format!("Failed to parse config {:?}: {}", path, e))
        })
    }

    /// Load from the platform config directory, returning defaults on any error
    pub fn load_or_default() -> Self {
        let Some(path) = config_path() else {
            tracing::warn!("Could not determine config directory, using defaults");
            return Self::default();
        };
        if !path.exists() {
            return Self::default();
        }
        Self::load(&path).unwrap_or_else(|e| {
            tracing::warn!("Failed to load config, using defaults: {}", e);
            Self::default()
        })
    }

    /// Save configuration as TOML, creating parent directories as needed
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                DataFrameworkError::Config(format!("Failed to create config directory: {}", e))
            })?;
        }

        let content = toml::to_string_pretty(self)?;

        std::fs::write(path, content).map_err(|e| {
            DataFrameworkError::Config(format!("Failed to write config {:?}: {}", path, e))
        })
    }
}

// ==================== Event Loop ====================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventLoopConfig {
    /// Longest a blocking wait sleeps before re-checking its condition
    pub wait_timeout_ms: u64,
}

impl Default for EventLoopConfig {
    fn default() -> Self {
        Self {
            wait_timeout_ms: DEFAULT_WAIT_TIMEOUT_MS,
        }
    }
}

// ==================== Readers ====================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReaderConfig {
    /// Overall cap on `DataReader::exec`; `None` waits for a terminal status
    pub timeout_ms: Option<u64>,
}

// ==================== Query Sessions ====================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryConfig {
    /// Request feedback candidates automatically after each result batch
    pub feedback_implicit: bool,
    pub desired_feedback_count: usize,
    pub working_set_size: usize,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            feedback_implicit: true,
            desired_feedback_count: DEFAULT_DESIRED_FEEDBACK_COUNT,
            working_set_size: DEFAULT_WORKING_SET_SIZE,
        }
    }
}

// ==================== Logging ====================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directives used when `RUST_LOG` is unset
    pub filter: String,

    /// Directory for daily rolling log files; console only when unset
    pub log_dir: Option<PathBuf>,

    /// File name prefix for rolled log files
    pub file_prefix: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: DEFAULT_LOG_FILTER.to_string(),
            log_dir: None,
            file_prefix: "visgui-data.log".to_string(),
        }
    }
}
