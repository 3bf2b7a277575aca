//! Sample command implementation
//!
//! Runs one sampling window and prints the statistics `stop()` returns.

use crate::cli::args::{OutputFormat, SampleArgs};
use crate::cli::output::{print_output, MemoryReport};
use crate::config::Config;
use crate::error::{AppError, ConfigError, Result};
use crate::services::MemUsageMonitor;

use std::thread;
use std::time::Duration;

/// Execute the sample command
pub fn run_sample(args: &SampleArgs, config: &Config, format: OutputFormat) -> Result<()> {
    let device = config.monitor.to_device()?;
    let monitor_config = config.monitor.to_monitor_config()?;
    let window = window_duration(config.monitor.duration_seconds)?;

    let monitor = MemUsageMonitor::new("MemMon", device, monitor_config);
    if monitor.is_disabled() {
        return Err(AppError::MonitorDisabled(device.to_string()));
    }

    log::info!(
        "Sampling {} for {:?} at {} samples/s",
        device,
        window,
        monitor_config.poll_rate
    );

    monitor.monitor();
    thread::sleep(window);
    let stats = monitor.stop()?;

    if let Some(err) = monitor.last_error() {
        log::warn!("Sampling window ended early: {}", err);
    }

    let report = MemoryReport {
        device: device.to_string(),
        backend: device.kind().to_string(),
        duration_seconds: Some(window.as_secs_f64()),
        stats,
    };
    print_output(&report, format)?;

    if args.debug {
        monitor.dump_debug();
    }

    Ok(())
}

/// Validate a window length in seconds
fn window_duration(seconds: f64) -> std::result::Result<Duration, ConfigError> {
    Duration::try_from_secs_f64(seconds).map_err(|_| ConfigError::InvalidValue {
        key: "monitor.duration_seconds".to_string(),
        message: format!("must be a non-negative number of seconds, got {}", seconds),
    })
}
