//! Service layer
//!
//! The memory usage monitor and its sampling thread.

pub mod monitor;

pub use monitor::{MemUsageMonitor, MonitorConfig, DEFAULT_POLL_RATE};
