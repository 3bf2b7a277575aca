//! Read command implementation
//!
//! Prints a one-shot statistics snapshot without running a sampling window.

use crate::cli::args::OutputFormat;
use crate::cli::output::{print_output, MemoryReport};
use crate::config::Config;
use crate::error::{AppError, Result};
use crate::services::MemUsageMonitor;

/// Execute the read command
pub fn run_read(config: &Config, format: OutputFormat) -> Result<()> {
    let device = config.monitor.to_device()?;
    let monitor = MemUsageMonitor::new("MemMon", device, config.monitor.to_monitor_config()?);
    if monitor.is_disabled() {
        return Err(AppError::MonitorDisabled(device.to_string()));
    }

    let report = MemoryReport {
        device: device.to_string(),
        backend: device.kind().to_string(),
        duration_seconds: None,
        stats: monitor.read()?,
    };
    print_output(&report, format)?;

    Ok(())
}
