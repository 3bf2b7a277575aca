//! memmon - GPU memory usage monitoring library
//!
//! This library provides a background monitor that samples accelerator
//! memory at a configurable rate and reports minimum free memory, peak
//! active/reserved bytes and totals to a host application.
//!
//! # Modules
//!
//! - [`backend`]: Accelerator memory backends (NVML, DRM sysfs)
//! - [`cli`]: Command-line interface definitions
//! - [`commands`]: Command handlers
//! - [`config`]: Configuration system
//! - [`domain`]: Device handles and statistics types
//! - [`error`]: Error types
//! - [`services`]: The memory usage monitor

pub mod backend;
pub mod cli;
pub mod commands;
pub mod config;
pub mod domain;
pub mod error;
pub mod services;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

pub use error::{AppError, Result};
pub use services::{MemUsageMonitor, MonitorConfig};
