//! # Configuration Module
//!
//! Handles loading and validating the application configuration from TOML.
//! Every section and field is optional; missing values take the defaults
//! below, and a missing file means all defaults.

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::error::{PadError, Result};
use crate::history::strip::MAX_ROWS;

/// Default location of the application configuration file
pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// Main configuration structure
#[derive(Debug, Deserialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub display: DisplayConfig,

    #[serde(default)]
    pub skins: SkinsConfig,

    #[serde(default)]
    pub history: HistoryConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Display configuration
#[derive(Debug, Deserialize, Clone)]
pub struct DisplayConfig {
    #[serde(default = "default_fps")]
    pub fps: u32,
}

/// Skin lookup configuration
#[derive(Debug, Deserialize, Clone)]
pub struct SkinsConfig {
    #[serde(default = "default_skins_dir")]
    pub dir: PathBuf,
}

/// Input history configuration
#[derive(Debug, Deserialize, Clone)]
pub struct HistoryConfig {
    #[serde(default = "default_history_enabled")]
    pub enabled: bool,

    #[serde(default = "default_history_rows")]
    pub rows: u32,

    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

/// File logging configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default)]
    pub file_enabled: bool,

    #[serde(default = "default_logging_dir")]
    pub dir: String,
}

// Default value functions
fn default_fps() -> u32 { 60 }

fn default_skins_dir() -> PathBuf { PathBuf::from("skins") }

fn default_history_enabled() -> bool { true }
fn default_history_rows() -> u32 { 10 }
fn default_channel_capacity() -> usize { 256 }

fn default_logging_dir() -> String { "./logs".to_string() }

impl Default for DisplayConfig {
    fn default() -> Self {
        Self { fps: default_fps() }
    }
}

impl Default for SkinsConfig {
    fn default() -> Self {
        Self { dir: default_skins_dir() }
    }
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            enabled: default_history_enabled(),
            rows: default_history_rows(),
            channel_capacity: default_channel_capacity(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            file_enabled: false,
            dir: default_logging_dir(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - File cannot be read
    /// - TOML parsing fails
    /// - Validation fails
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use padview::config::AppConfig;
    ///
    /// let config = AppConfig::load("config/default.toml")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration if the file exists, otherwise use defaults
    ///
    /// # Errors
    ///
    /// Returns error only when the file exists but is invalid.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            Self::load(path)
        } else {
            info!("No configuration at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns error if any configuration value is out of valid range
    pub fn validate(&self) -> Result<()> {
        if self.display.fps == 0 || self.display.fps > 240 {
            return Err(PadError::Config(
                "fps must be between 1 and 240".to_string(),
            ));
        }

        if self.skins.dir.as_os_str().is_empty() {
            return Err(PadError::Config("skins dir cannot be empty".to_string()));
        }

        if self.history.enabled {
            if self.history.rows == 0 || self.history.rows > MAX_ROWS {
                return Err(PadError::Config(format!(
                    "history rows must be between 1 and {}",
                    MAX_ROWS
                )));
            }

            if self.history.channel_capacity == 0 || self.history.channel_capacity > 65536 {
                return Err(PadError::Config(
                    "channel_capacity must be between 1 and 65536".to_string(),
                ));
            }
        }

        if self.logging.file_enabled && self.logging.dir.is_empty() {
            return Err(PadError::Config(
                "logging dir cannot be empty when file logging is enabled".to_string(),
            ));
        }

        Ok(())
    }
}
