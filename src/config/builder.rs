//! Configuration builder
//!
//! Merges configuration from files and CLI arguments.

use crate::config::{Config, ConfigFile};

/// Builder for merging configuration sources
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Create a new builder with default configuration
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    /// Load configuration from a file
    pub fn with_file(mut self, path: Option<&str>) -> Self {
        let file_config = if let Some(path) = path {
            match ConfigFile::load(path) {
                Ok(cfg) => Some(cfg),
                Err(e) => {
                    log::warn!("Ignoring config file {}: {}", path, e);
                    None
                }
            }
        } else {
            ConfigFile::load_default()
        };

        if let Some(cfg) = file_config {
            self.config = cfg;
        }

        self
    }

    /// Override with CLI verbose flag
    pub fn with_verbose(mut self, verbose: Option<bool>) -> Self {
        if let Some(v) = verbose {
            self.config.general.verbose = v;
        }
        self
    }

    /// Override with CLI poll rate
    pub fn with_poll_rate(mut self, poll_rate: Option<f64>) -> Self {
        if let Some(r) = poll_rate {
            self.config.monitor.poll_rate = r;
        }
        self
    }

    /// Override with CLI device handle
    pub fn with_device(mut self, device: Option<String>) -> Self {
        if let Some(d) = device {
            self.config.monitor.device = d;
        }
        self
    }

    /// Override with CLI window duration
    pub fn with_duration(mut self, seconds: Option<f64>) -> Self {
        if let Some(s) = seconds {
            self.config.monitor.duration_seconds = s;
        }
        self
    }

    /// Build the final configuration
    pub fn build(self) -> Config {
        self.config
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
