//! Trait definitions for accelerator memory backends
//!
//! The monitor only talks to this trait, so tests can substitute a fake
//! backend for a real accelerator.

use crate::domain::{Device, MemoryInfo, StatsReport};
use crate::error::BackendError;

/// Memory statistics capability of an accelerator backend
///
/// Peak counters are process-wide backend state: the monitor resets them at
/// the start of each sampling window and reads them back through
/// [`memory_stats`](MemoryBackend::memory_stats).
pub trait MemoryBackend: Send + Sync {
    /// Short backend name used in logs and reports
    fn name(&self) -> &'static str;

    /// Index of the device used when a handle carries no explicit index
    fn current_device(&self) -> Result<u32, BackendError>;

    /// Get free and total memory for a device
    fn mem_get_info(&self, index: u32) -> Result<MemoryInfo, BackendError>;

    /// Get the named counter report for a device
    ///
    /// Reports carry at least `active.all.current`, `active_bytes.all.peak`,
    /// `reserved_bytes.all.current` and `reserved_bytes.all.peak`.
    fn memory_stats(&self, index: u32) -> Result<StatsReport, BackendError>;

    /// Reset the peak counters for a device
    fn reset_peak_memory_stats(&self, index: u32) -> Result<(), BackendError>;

    /// Human-readable summary, if the backend has one
    fn memory_summary(&self, _index: u32) -> Option<String> {
        None
    }

    /// Resolve a device handle to a concrete index
    fn resolve_index(&self, device: &Device) -> Result<u32, BackendError> {
        match device.index() {
            Some(index) => Ok(index),
            None => self.current_device(),
        }
    }
}
