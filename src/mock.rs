//! Mock implementations for testing
//!
//! Provides a scripted memory backend for unit testing without real hardware.

use crate::backend::MemoryBackend;
use crate::domain::stats::{
    ACTIVE_BYTES_PEAK, ACTIVE_CURRENT, RESERVED_BYTES_CURRENT, RESERVED_BYTES_PEAK,
};
use crate::domain::{MemoryInfo, StatsReport};
use crate::error::BackendError;

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

/// Mock memory backend for testing
///
/// Free memory follows a script: each `mem_get_info` call consumes the next
/// value and the last one sticks.
#[derive(Debug)]
pub struct MockBackend {
    total: u64,
    device_count: u32,
    current: u32,
    free: Mutex<u64>,
    script: Mutex<VecDeque<u64>>,
    report: Mutex<StatsReport>,
    failing: AtomicBool,
    panicking: AtomicBool,
    mem_info_calls: AtomicUsize,
    reset_calls: AtomicUsize,
}

impl MockBackend {
    /// Create a mock with one device of `total` bytes, half of it free
    pub fn new(total: u64) -> Self {
        Self {
            total,
            device_count: 1,
            current: 0,
            free: Mutex::new(total / 2),
            script: Mutex::new(VecDeque::new()),
            report: Mutex::new(
                StatsReport::new()
                    .with(ACTIVE_CURRENT, 100)
                    .with(ACTIVE_BYTES_PEAK, 200)
                    .with(RESERVED_BYTES_CURRENT, 300)
                    .with(RESERVED_BYTES_PEAK, 400)
                    .with("allocation.all.current", 7),
            ),
            failing: AtomicBool::new(false),
            panicking: AtomicBool::new(false),
            mem_info_calls: AtomicUsize::new(0),
            reset_calls: AtomicUsize::new(0),
        }
    }

    /// Create a mock whose every query fails
    pub fn failing(total: u64) -> Self {
        let backend = Self::new(total);
        backend.set_failing(true);
        backend
    }

    /// Builder: set number of devices
    pub fn with_device_count(mut self, count: u32) -> Self {
        self.device_count = count;
        self
    }

    /// Builder: set the current device index
    pub fn with_current_device(mut self, index: u32) -> Self {
        self.current = index;
        self
    }

    /// Builder: queue free values returned by successive `mem_get_info` calls
    pub fn with_free_sequence(self, values: impl IntoIterator<Item = u64>) -> Self {
        self.script.lock().unwrap().extend(values);
        self
    }

    /// Builder: replace the counter report
    pub fn with_report(self, report: StatsReport) -> Self {
        *self.report.lock().unwrap() = report;
        self
    }

    /// Set the free value returned once the script is exhausted
    pub fn set_free(&self, free: u64) {
        *self.free.lock().unwrap() = free;
    }

    /// Make every query fail (or succeed again)
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Make peak resets panic (or return normally again)
    pub fn set_panicking(&self, panicking: bool) {
        self.panicking.store(panicking, Ordering::SeqCst);
    }

    /// Number of `mem_get_info` calls so far
    pub fn mem_info_calls(&self) -> usize {
        self.mem_info_calls.load(Ordering::SeqCst)
    }

    /// Number of peak resets so far
    pub fn reset_calls(&self) -> usize {
        self.reset_calls.load(Ordering::SeqCst)
    }

    fn check(&self, index: u32) -> Result<(), BackendError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(BackendError::Unknown("mock failure".to_string()));
        }
        if index >= self.device_count {
            return Err(BackendError::DeviceNotFound(index));
        }
        Ok(())
    }
}

impl MemoryBackend for MockBackend {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn current_device(&self) -> Result<u32, BackendError> {
        Ok(self.current)
    }

    fn mem_get_info(&self, index: u32) -> Result<MemoryInfo, BackendError> {
        self.check(index)?;
        self.mem_info_calls.fetch_add(1, Ordering::SeqCst);

        let mut free = self.free.lock().unwrap();
        if let Some(next) = self.script.lock().unwrap().pop_front() {
            *free = next;
        }
        Ok(MemoryInfo::new(*free, self.total))
    }

    fn memory_stats(&self, index: u32) -> Result<StatsReport, BackendError> {
        self.check(index)?;
        Ok(self.report.lock().unwrap().clone())
    }

    fn reset_peak_memory_stats(&self, index: u32) -> Result<(), BackendError> {
        if self.panicking.load(Ordering::SeqCst) {
            panic!("mock reset panicked");
        }
        self.check(index)?;
        self.reset_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn memory_summary(&self, index: u32) -> Option<String> {
        Some(format!("Mock GPU {}: {} bytes total\n", index, self.total))
    }
}
