//! Unified error types for memmon
//!
//! This module defines all error types used throughout the crate.
//! Uses thiserror for ergonomic error definitions.

use thiserror::Error;

/// Top-level application error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from the memory monitor
    #[error("Monitor error: {0}")]
    Monitor(#[from] MonitorError),

    /// Error from configuration parsing/validation
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The monitor could not reach the device's memory API
    #[error("Memory monitor disabled for device {0}")]
    MonitorDisabled(String),

    /// IO error (file operations, console output)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors from accelerator memory backends
#[derive(Error, Debug)]
pub enum BackendError {
    /// Failed to initialize the vendor library
    #[error("Failed to initialize backend: {0}")]
    InitializationFailed(String),

    /// NVML library not found
    #[error("NVML library not found. Is the NVIDIA driver installed?")]
    LibraryNotFound,

    /// Device not found at index
    #[error("GPU device not found at index {0}")]
    DeviceNotFound(u32),

    /// Operation not supported by this device or backend
    #[error("Operation not supported: {0}")]
    NotSupported(String),

    /// Insufficient permissions
    #[error("Insufficient permissions: {0}")]
    InsufficientPermissions(String),

    /// A counter file could not be read
    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// A counter value could not be parsed
    #[error("Failed to parse {path}: {value:?}")]
    Parse { path: String, value: String },

    /// GPU is lost (fallen off bus, etc.)
    #[error("GPU is lost or has become inaccessible")]
    GpuLost,

    /// Unknown backend error
    #[error("Backend error: {0}")]
    Unknown(String),
}

/// Errors from memory monitor operations
#[derive(Error, Debug)]
pub enum MonitorError {
    /// Backend query failed
    #[error("Memory query failed: {0}")]
    Backend(#[from] BackendError),

    /// Device handle could not be parsed
    #[error("Invalid device '{0}' (expected e.g. 'cuda', 'cuda:1' or 'drm:0')")]
    InvalidDevice(String),
}

/// Errors from configuration parsing and validation
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Config file not found
    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    /// Invalid config value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// TOML parsing error
    #[error("TOML parse error: {0}")]
    TomlError(#[from] toml::de::Error),
}

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;
