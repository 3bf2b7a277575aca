//! Memory usage monitor
//!
//! A background thread samples free device memory at a fixed rate between
//! [`MemUsageMonitor::monitor`] and [`MemUsageMonitor::stop`]; the host reads
//! aggregated statistics at any time with [`MemUsageMonitor::read`].

use crate::backend::{select_backend, MemoryBackend};
use crate::domain::{bytes_to_mib_ceil, Device, MemoryStats};
use crate::error::{BackendError, MonitorError};

use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::Duration;

/// Default samples per second
pub const DEFAULT_POLL_RATE: f64 = 8.0;

/// Shortest wait between samples
pub const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// Configuration for the monitor
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MonitorConfig {
    /// Samples per second; `<= 0` turns each window into a no-op
    pub poll_rate: f64,
}

impl MonitorConfig {
    /// Create a configuration with the given poll rate
    pub fn new(poll_rate: f64) -> Self {
        Self { poll_rate }
    }

    /// Wait between samples, `None` when polling is off
    ///
    /// Never shorter than [`MIN_INTERVAL`].
    pub fn interval(&self) -> Option<Duration> {
        if self.poll_rate.is_nan() || self.poll_rate <= 0.0 {
            return None;
        }
        let interval =
            Duration::try_from_secs_f64(self.poll_rate.recip()).unwrap_or(Duration::MAX);
        Some(interval.max(MIN_INTERVAL))
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            poll_rate: DEFAULT_POLL_RATE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    /// Waiting for `monitor()`
    Idle,
    /// Window requested, sampler has not started it yet
    Pending,
    /// Polling
    Sampling,
    /// Owner dropped; the sampler exits
    Closed,
}

#[derive(Debug)]
struct Control {
    phase: Phase,
    window: u64,
}

/// State shared between the monitor and its sampling thread
struct Shared {
    backend: Arc<dyn MemoryBackend>,
    index: u32,
    interval: Option<Duration>,
    control: Mutex<Control>,
    signal: Condvar,
    stats: Mutex<MemoryStats>,
    last_error: Mutex<Option<String>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        msg
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg
    } else {
        "unknown panic"
    }
}

impl Shared {
    fn run(&self) {
        loop {
            let window = {
                let control = self
                    .signal
                    .wait_while(lock(&self.control), |c| c.phase == Phase::Idle)
                    .unwrap_or_else(PoisonError::into_inner);
                if control.phase == Phase::Closed {
                    break;
                }
                control.window
            };

            log::debug!("Sampling window {} started on device {}", window, self.index);
            let error = match panic::catch_unwind(AssertUnwindSafe(|| self.run_window(window))) {
                Ok(Ok(())) => None,
                Ok(Err(e)) => Some(e.to_string()),
                Err(payload) => Some(format!("sampler panicked: {}", panic_message(&*payload))),
            };
            if let Some(error) = error {
                log::error!("Sampling window {} failed: {}", window, error);
                *lock(&self.last_error) = Some(error);
            }
            self.finish_window(window);
        }
        log::debug!("Sampler for device {} exiting", self.index);
    }

    fn run_window(&self, window: u64) -> Result<(), BackendError> {
        *lock(&self.last_error) = None;
        self.backend.reset_peak_memory_stats(self.index)?;
        lock(&self.stats).clear();

        let Some(interval) = self.interval else {
            return Ok(());
        };

        let initial = self.backend.mem_get_info(self.index)?;
        lock(&self.stats).min_free = initial.free;

        {
            let mut control = lock(&self.control);
            if control.window != window || control.phase != Phase::Pending {
                return Ok(());
            }
            control.phase = Phase::Sampling;
            self.signal.notify_all();
        }

        loop {
            let info = self.backend.mem_get_info(self.index)?;
            {
                let mut stats = lock(&self.stats);
                stats.min_free = stats.min_free.min(info.free);
            }

            let (control, _) = self
                .signal
                .wait_timeout_while(lock(&self.control), interval, |c| {
                    c.window == window && c.phase == Phase::Sampling
                })
                .unwrap_or_else(PoisonError::into_inner);
            if control.window != window || control.phase != Phase::Sampling {
                return Ok(());
            }
        }
    }

    fn finish_window(&self, window: u64) {
        let mut control = lock(&self.control);
        if control.window == window && matches!(control.phase, Phase::Pending | Phase::Sampling) {
            control.phase = Phase::Idle;
        }
        self.signal.notify_all();
        log::debug!("Sampling window {} finished", window);
    }
}

/// Background GPU memory usage monitor
///
/// Construction probes the device once. If the probe fails the monitor is
/// disabled for its whole lifetime: `monitor()` and `stop()` do nothing and
/// `read()` returns all-zero statistics.
///
/// # Examples
///
/// ```no_run
/// use memmon::domain::Device;
/// use memmon::services::{MemUsageMonitor, MonitorConfig};
///
/// let monitor = MemUsageMonitor::new("MemMon", Device::cuda(0), MonitorConfig::default());
/// monitor.monitor();
/// // ... long-running work ...
/// let stats = monitor.stop().unwrap();
/// println!("peak usage: {} bytes", stats.system_peak);
/// ```
pub struct MemUsageMonitor {
    name: String,
    device: Device,
    config: MonitorConfig,
    shared: Option<Arc<Shared>>,
}

impl MemUsageMonitor {
    /// Create a monitor using the backend for the device's family
    pub fn new(name: impl Into<String>, device: Device, config: MonitorConfig) -> Self {
        let name = name.into();
        match select_backend(device.kind()) {
            Ok(backend) => Self::with_backend(name, device, config, backend),
            Err(e) => Self::disabled(name, device, config, &e),
        }
    }

    /// Create a monitor on an explicit backend
    pub fn with_backend(
        name: impl Into<String>,
        device: Device,
        config: MonitorConfig,
        backend: Arc<dyn MemoryBackend>,
    ) -> Self {
        let name = name.into();

        let index = match Self::probe(backend.as_ref(), &device) {
            Ok(index) => index,
            Err(e) => return Self::disabled(name, device, config, &e),
        };

        let shared = Arc::new(Shared {
            backend,
            index,
            interval: config.interval(),
            control: Mutex::new(Control {
                phase: Phase::Idle,
                window: 0,
            }),
            signal: Condvar::new(),
            stats: Mutex::new(MemoryStats::default()),
            last_error: Mutex::new(None),
        });

        let sampler = Arc::clone(&shared);
        // Thread names may not contain NUL
        let spawned = thread::Builder::new()
            .name(name.replace('\0', ""))
            .spawn(move || sampler.run());

        if let Err(e) = spawned {
            log::warn!(
                "Memory monitor '{}' disabled: failed to spawn sampler: {}",
                name,
                e
            );
            return Self {
                name,
                device,
                config,
                shared: None,
            };
        }

        log::debug!(
            "Memory monitor '{}' on {} (index {}) at {} samples/s",
            name,
            device,
            index,
            config.poll_rate
        );

        Self {
            name,
            device,
            config,
            shared: Some(shared),
        }
    }

    fn probe(backend: &dyn MemoryBackend, device: &Device) -> Result<u32, BackendError> {
        let index = backend.resolve_index(device)?;
        backend.mem_get_info(index)?;
        backend.memory_stats(index)?;
        Ok(index)
    }

    fn disabled(name: String, device: Device, config: MonitorConfig, err: &BackendError) -> Self {
        log::warn!(
            "Memory monitor '{}' disabled for {}: {}",
            name,
            device,
            err
        );
        Self {
            name,
            device,
            config,
            shared: None,
        }
    }

    /// Start a sampling window
    ///
    /// Has no effect while a window is already active.
    pub fn monitor(&self) {
        let Some(shared) = &self.shared else {
            return;
        };

        let mut control = lock(&shared.control);
        if control.phase == Phase::Idle {
            control.phase = Phase::Pending;
            control.window += 1;
            shared.signal.notify_all();
        }
    }

    /// Snapshot current statistics without stopping the window
    ///
    /// Refreshes the instantaneous fields; `min_free` is only moved by the
    /// sampler.
    pub fn read(&self) -> Result<MemoryStats, MonitorError> {
        let Some(shared) = &self.shared else {
            return Ok(MemoryStats::default());
        };

        let info = shared.backend.mem_get_info(shared.index)?;
        let report = shared.backend.memory_stats(shared.index)?;

        let mut stats = lock(&shared.stats);
        stats.update(info, &report);
        Ok(*stats)
    }

    /// End the sampling window and return its statistics
    ///
    /// The sampler may be between samples, so `min_free` can miss up to one
    /// polling interval.
    pub fn stop(&self) -> Result<MemoryStats, MonitorError> {
        if let Some(shared) = &self.shared {
            let mut control = shared
                .signal
                .wait_while(lock(&shared.control), |c| c.phase == Phase::Pending)
                .unwrap_or_else(PoisonError::into_inner);
            if control.phase == Phase::Sampling {
                control.phase = Phase::Idle;
                shared.signal.notify_all();
            }
        }
        self.read()
    }

    /// Recorded statistics and raw backend counters in MiB
    pub fn debug_report(&self) -> String {
        let mut output = format!("{} recorded data:\n", self);
        match self.read() {
            Ok(stats) => {
                for (key, value) in stats.iter() {
                    output.push_str(&format!("{} {}\n", key, bytes_to_mib_ceil(value)));
                }
            }
            Err(e) => output.push_str(&format!("unavailable: {}\n", e)),
        }

        output.push_str(&format!("{} raw memory stats:\n", self));
        let Some(shared) = &self.shared else {
            output.push_str("disabled\n");
            return output;
        };

        match shared.backend.memory_stats(shared.index) {
            Ok(report) => {
                for (key, value) in report.iter().filter(|(k, _)| k.contains("bytes")) {
                    let indent = if key.contains("peak") { "\t" } else { "" };
                    output.push_str(&format!(
                        "{}{} {}\n",
                        indent,
                        key,
                        bytes_to_mib_ceil(value)
                    ));
                }
            }
            Err(e) => output.push_str(&format!("unavailable: {}\n", e)),
        }

        if let Some(summary) = shared.backend.memory_summary(shared.index) {
            output.push_str(&summary);
        }

        output
    }

    /// Print [`debug_report`](Self::debug_report) to stdout
    pub fn dump_debug(&self) {
        print!("{}", self.debug_report());
    }

    /// Monitor name (also the sampler thread name)
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Device handle this monitor was created for
    pub fn device(&self) -> Device {
        self.device
    }

    /// Get the monitor configuration
    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    /// Whether the device probe failed at construction
    pub fn is_disabled(&self) -> bool {
        self.shared.is_none()
    }

    /// Whether a sampling window is active
    pub fn is_sampling(&self) -> bool {
        self.shared.as_ref().is_some_and(|shared| {
            matches!(
                lock(&shared.control).phase,
                Phase::Pending | Phase::Sampling
            )
        })
    }

    /// Error that ended the most recent sampling window, if any
    pub fn last_error(&self) -> Option<String> {
        self.shared
            .as_ref()
            .and_then(|shared| lock(&shared.last_error).clone())
    }
}

impl fmt::Display for MemUsageMonitor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<MemUsageMonitor '{}' on {}>", self.name, self.device)
    }
}

impl Drop for MemUsageMonitor {
    fn drop(&mut self) {
        if let Some(shared) = &self.shared {
            lock(&shared.control).phase = Phase::Closed;
            shared.signal.notify_all();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{BackendKind, StatsReport, MIB};
    use crate::mock::MockBackend;
    use std::sync::mpsc;
    use std::time::Instant;

    const GIB: u64 = 1024 * 1024 * 1024;

    fn monitor_on(backend: &Arc<MockBackend>, poll_rate: f64) -> MemUsageMonitor {
        MemUsageMonitor::with_backend(
            "MemMon",
            Device::cuda(0),
            MonitorConfig::new(poll_rate),
            Arc::clone(backend) as Arc<dyn MemoryBackend>,
        )
    }

    #[test]
    fn test_monitor_config_default() {
        let config = MonitorConfig::default();
        assert_eq!(config.poll_rate, 8.0);
        assert_eq!(config.interval(), Some(Duration::from_millis(125)));
    }

    #[test]
    fn test_monitor_config_interval_disabled() {
        assert_eq!(MonitorConfig::new(0.0).interval(), None);
        assert_eq!(MonitorConfig::new(-3.0).interval(), None);
        assert_eq!(MonitorConfig::new(f64::NAN).interval(), None);
        assert_eq!(MonitorConfig::new(1e-300).interval(), Some(Duration::MAX));
    }

    #[test]
    fn test_monitor_config_interval_floor() {
        assert_eq!(MonitorConfig::new(f64::INFINITY).interval(), Some(MIN_INTERVAL));
        assert_eq!(MonitorConfig::new(1e12).interval(), Some(MIN_INTERVAL));
        assert_eq!(MonitorConfig::new(1000.0).interval(), Some(MIN_INTERVAL));
        assert_eq!(MonitorConfig::new(500.0).interval(), Some(Duration::from_millis(2)));
    }

    #[test]
    fn test_infinite_poll_rate_window() {
        let backend = Arc::new(MockBackend::new(8 * GIB));
        let monitor = monitor_on(&backend, f64::INFINITY);

        monitor.monitor();
        thread::sleep(Duration::from_millis(30));
        monitor.stop().unwrap();

        // One sample per millisecond at most
        assert!(backend.mem_info_calls() < 1000);
        assert!(!monitor.is_sampling());
    }

    #[test]
    fn test_disabled_monitor_reads_zero() {
        let backend = Arc::new(MockBackend::failing(8 * GIB));
        let monitor = monitor_on(&backend, 100.0);
        assert!(monitor.is_disabled());

        for _ in 0..3 {
            monitor.monitor();
            assert!(!monitor.is_sampling());
            assert_eq!(monitor.stop().unwrap(), MemoryStats::default());
        }
        assert_eq!(monitor.read().unwrap(), MemoryStats::default());

        // Recovery of the backend does not re-enable the monitor
        backend.set_failing(false);
        monitor.monitor();
        assert_eq!(monitor.stop().unwrap(), MemoryStats::default());
        assert_eq!(backend.reset_calls(), 0);
    }

    #[test]
    fn test_rejected_device_disables() {
        let backend = Arc::new(MockBackend::new(8 * GIB).with_device_count(1));
        let monitor = MemUsageMonitor::with_backend(
            "MemMon",
            Device::cuda(5),
            MonitorConfig::default(),
            backend as Arc<dyn MemoryBackend>,
        );

        assert!(monitor.is_disabled());
        assert_eq!(monitor.read().unwrap(), MemoryStats::default());

        let report = monitor.debug_report();
        assert!(report.contains("recorded data"));
        assert!(report.contains("disabled"));
        monitor.dump_debug();
    }

    #[test]
    fn test_current_device_resolution() {
        let backend = Arc::new(
            MockBackend::new(8 * GIB)
                .with_device_count(2)
                .with_current_device(1),
        );
        let monitor = MemUsageMonitor::with_backend(
            "MemMon",
            Device::new(BackendKind::Primary, None),
            MonitorConfig::default(),
            backend as Arc<dyn MemoryBackend>,
        );
        assert!(!monitor.is_disabled());
        assert_eq!(monitor.device().index(), None);
    }

    #[test]
    fn test_zero_poll_rate_takes_no_sample() {
        // probe, read
        let backend = Arc::new(MockBackend::new(8 * GIB).with_free_sequence([6 * GIB, 3 * GIB]));
        let monitor = monitor_on(&backend, 0.0);

        monitor.monitor();
        let stats = monitor.stop().unwrap();

        assert_eq!(stats.min_free, 0);
        assert_eq!(stats.free, 3 * GIB);
        assert_eq!(stats.system_peak, stats.total);
        assert_eq!(backend.mem_info_calls(), 2);
        assert_eq!(backend.reset_calls(), 1);
        assert!(!monitor.is_sampling());
    }

    #[test]
    fn test_zero_poll_rate_clears_previous_window() {
        let backend = Arc::new(MockBackend::new(8 * GIB).with_free_sequence([6 * GIB, 2 * GIB]));
        let sampling = monitor_on(&backend, 200.0);
        sampling.monitor();
        assert_eq!(sampling.stop().unwrap().min_free, 2 * GIB);
        drop(sampling);

        let monitor = monitor_on(&backend, -1.0);
        monitor.monitor();
        let stats = monitor.stop().unwrap();
        assert_eq!(stats.min_free, 0);
        assert_eq!(stats.system_peak, 8 * GIB);
    }

    #[test]
    fn test_min_free_tracks_lowest_sample() {
        let backend = Arc::new(
            MockBackend::new(8 * GIB).with_free_sequence([7 * GIB, 6 * GIB, 2 * GIB, 5 * GIB]),
        );
        let monitor = monitor_on(&backend, 200.0);

        monitor.monitor();
        thread::sleep(Duration::from_millis(100));
        let stats = monitor.stop().unwrap();

        assert_eq!(stats.min_free, 2 * GIB);
        assert_eq!(stats.free, 5 * GIB);
        assert_eq!(stats.total, 8 * GIB);
        assert!(stats.min_free <= stats.total);
        assert_eq!(stats.system_peak, stats.total - stats.min_free);
    }

    #[test]
    fn test_full_window_reports_all_keys() {
        let backend = Arc::new(MockBackend::new(8 * GIB));
        let monitor = monitor_on(&backend, 100.0);

        monitor.monitor();
        thread::sleep(Duration::from_millis(30));
        let stats = monitor.stop().unwrap();

        let keys: Vec<&str> = stats.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, MemoryStats::KEYS.to_vec());
        assert_eq!(stats.active, 100);
        assert_eq!(stats.active_peak, 200);
        assert_eq!(stats.reserved, 300);
        assert_eq!(stats.reserved_peak, 400);
        assert!(stats.min_free <= stats.total);
    }

    #[test]
    fn test_read_does_not_move_min_free() {
        let backend = Arc::new(MockBackend::new(8 * GIB).with_free_sequence([4 * GIB, GIB]));
        let monitor = monitor_on(&backend, 200.0);

        monitor.monitor();
        let stopped = monitor.stop().unwrap();
        assert_eq!(stopped.min_free, GIB);
        // Let the sampler finish its last sample before the value changes
        thread::sleep(Duration::from_millis(20));

        backend.set_free(512);
        let first = monitor.read().unwrap();
        let second = monitor.read().unwrap();
        assert_eq!(first.min_free, GIB);
        assert_eq!(second.min_free, GIB);
        assert_eq!(second.free, 512);
        assert_eq!(second.system_peak, 8 * GIB - GIB);
    }

    #[test]
    fn test_read_before_any_window() {
        let backend = Arc::new(MockBackend::new(8 * GIB));
        let monitor = monitor_on(&backend, 10.0);

        let stats = monitor.read().unwrap();
        assert_eq!(stats.min_free, 0);
        assert_eq!(stats.system_peak, 8 * GIB);
        assert_eq!(stats.free, 4 * GIB);
    }

    #[test]
    fn test_monitor_while_sampling_is_noop() {
        let backend = Arc::new(MockBackend::new(8 * GIB));
        let monitor = monitor_on(&backend, 100.0);

        monitor.monitor();
        thread::sleep(Duration::from_millis(20));
        monitor.monitor();
        assert!(monitor.is_sampling());
        monitor.stop().unwrap();

        assert_eq!(backend.reset_calls(), 1);
    }

    #[test]
    fn test_each_window_starts_fresh() {
        let backend = Arc::new(MockBackend::new(8 * GIB).with_free_sequence([6 * GIB, GIB]));
        let monitor = monitor_on(&backend, 200.0);

        monitor.monitor();
        assert_eq!(monitor.stop().unwrap().min_free, GIB);
        thread::sleep(Duration::from_millis(20));

        backend.set_free(7 * GIB);
        monitor.monitor();
        assert_eq!(monitor.stop().unwrap().min_free, 7 * GIB);
        assert_eq!(backend.reset_calls(), 2);
    }

    #[test]
    fn test_stop_interrupts_long_interval() {
        let backend = Arc::new(MockBackend::new(8 * GIB));
        let monitor = monitor_on(&backend, 0.01);

        monitor.monitor();
        let started = Instant::now();
        monitor.stop().unwrap();
        assert!(started.elapsed() < Duration::from_secs(5));

        // Sampler is back to idle and serves the next window
        monitor.monitor();
        monitor.stop().unwrap();
        assert_eq!(backend.reset_calls(), 2);
    }

    #[test]
    fn test_sampler_survives_backend_error() {
        let backend = Arc::new(MockBackend::new(8 * GIB));
        let monitor = monitor_on(&backend, 200.0);

        monitor.monitor();
        thread::sleep(Duration::from_millis(20));
        backend.set_failing(true);
        thread::sleep(Duration::from_millis(50));

        assert!(!monitor.is_sampling());
        assert!(monitor
            .last_error()
            .is_some_and(|e| e.contains("mock failure")));
        assert!(monitor.read().is_err());

        backend.set_failing(false);
        monitor.monitor();
        let stats = monitor.stop().unwrap();
        assert_eq!(stats.min_free, 4 * GIB);
        assert!(monitor.last_error().is_none());
    }

    #[test]
    fn test_debug_report() {
        let backend = Arc::new(MockBackend::new(8 * GIB));
        let monitor = monitor_on(&backend, 0.0);
        monitor.monitor();
        monitor.stop().unwrap();

        let report = monitor.debug_report();
        assert!(report.starts_with("<MemUsageMonitor 'MemMon' on cuda:0> recorded data:"));
        assert!(report.contains("total 8192\n"));
        assert!(report.contains("min_free 0\n"));
        assert!(report.contains("system_peak 8192\n"));
        assert!(report.contains("\tactive_bytes.all.peak 1\n"));
        assert!(report.contains("reserved_bytes.all.current 1\n"));
        assert!(!report.contains("allocation.all.current"));
        assert!(report.contains("Mock GPU 0"));
    }

    #[test]
    fn test_debug_report_lists_byte_counters() {
        let report = StatsReport::new()
            .with("active_bytes.all.current", 3 * MIB)
            .with("active_bytes.all.peak", 5 * MIB)
            .with("num_alloc_retries", 2);
        let backend = Arc::new(MockBackend::new(8 * GIB).with_report(report));
        let monitor = monitor_on(&backend, 10.0);

        let report = monitor.debug_report();
        assert!(report.contains("active_bytes.all.current 3\n"));
        assert!(report.contains("\tactive_bytes.all.peak 5\n"));
        assert!(!report.contains("num_alloc_retries"));

        let stats = monitor.read().unwrap();
        assert_eq!(stats.active, 0);
        assert_eq!(stats.active_peak, 5 * MIB);
    }

    #[test]
    fn test_sampler_survives_backend_panic() {
        let backend = Arc::new(MockBackend::new(8 * GIB));
        let monitor = monitor_on(&backend, 100.0);
        backend.set_panicking(true);

        let (tx, rx) = mpsc::channel();
        let worker = thread::spawn(move || {
            monitor.monitor();
            let stopped = monitor.stop().is_ok();
            tx.send(stopped).unwrap();
            monitor
        });
        assert_eq!(rx.recv_timeout(Duration::from_secs(5)), Ok(true));
        let monitor = worker.join().unwrap();

        assert!(!monitor.is_sampling());
        assert!(monitor
            .last_error()
            .is_some_and(|e| e.contains("mock reset panicked")));

        // The thread is still alive and serves the next window
        backend.set_panicking(false);
        monitor.monitor();
        monitor.stop().unwrap();
        assert_eq!(backend.reset_calls(), 1);
        assert!(monitor.last_error().is_none());
    }

    #[test]
    fn test_name_with_nul_byte() {
        let backend = Arc::new(MockBackend::new(8 * GIB));
        let monitor = MemUsageMonitor::with_backend(
            "Mem\0Mon",
            Device::cuda(0),
            MonitorConfig::new(100.0),
            Arc::clone(&backend) as Arc<dyn MemoryBackend>,
        );

        assert!(!monitor.is_disabled());
        assert_eq!(monitor.name(), "Mem\0Mon");
        monitor.monitor();
        monitor.stop().unwrap();
        assert_eq!(backend.reset_calls(), 1);
    }

    #[test]
    fn test_unavailable_alternate_device_disables() {
        let monitor = MemUsageMonitor::new("MemMon", Device::drm(u32::MAX), MonitorConfig::default());
        assert!(monitor.is_disabled());
        assert_eq!(monitor.read().unwrap(), MemoryStats::default());
    }

    #[test]
    fn test_drop_ends_sampler() {
        let backend = Arc::new(MockBackend::new(8 * GIB));
        let monitor = monitor_on(&backend, 100.0);
        monitor.monitor();
        thread::sleep(Duration::from_millis(20));
        drop(monitor);

        let deadline = Instant::now() + Duration::from_secs(5);
        while Arc::strong_count(&backend) > 1 && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(5));
        }
        assert_eq!(Arc::strong_count(&backend), 1);
    }
}
