//! Configuration system
//!
//! Handles TOML config file parsing and CLI argument merging.

pub mod builder;
pub mod file;

pub use builder::ConfigBuilder;
pub use file::ConfigFile;

use crate::domain::Device;
use crate::error::{ConfigError, MonitorError};
use crate::services::{MonitorConfig, DEFAULT_POLL_RATE};
use serde::{Deserialize, Serialize};

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,
    /// Memory monitor settings
    pub monitor: MonitorSection,
}

/// General configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct GeneralConfig {
    /// Enable verbose logging
    pub verbose: bool,
}

/// Memory monitor configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorSection {
    /// Samples per second (0 or negative: one sample per window)
    pub poll_rate: f64,
    /// Device handle, e.g. "cuda", "cuda:1" or "drm:0"
    pub device: String,
    /// Length of a CLI sampling window in seconds
    pub duration_seconds: f64,
}

impl Default for MonitorSection {
    fn default() -> Self {
        Self {
            poll_rate: DEFAULT_POLL_RATE,
            device: "cuda".to_string(),
            duration_seconds: 5.0,
        }
    }
}

impl MonitorSection {
    /// Convert to a MonitorConfig
    pub fn to_monitor_config(&self) -> Result<MonitorConfig, ConfigError> {
        if !self.poll_rate.is_finite() {
            return Err(ConfigError::InvalidValue {
                key: "monitor.poll_rate".to_string(),
                message: format!("must be a finite number, got {}", self.poll_rate),
            });
        }
        Ok(MonitorConfig::new(self.poll_rate))
    }

    /// Parse the configured device handle
    pub fn to_device(&self) -> Result<Device, MonitorError> {
        self.device.parse()
    }
}
