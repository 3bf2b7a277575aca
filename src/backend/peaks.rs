//! Highwater marks for backends without native peak counters

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

#[derive(Debug, Clone, Copy, Default)]
struct Peaks {
    active: u64,
    reserved: u64,
}

/// Per-device peak tracking, reset at the start of each sampling window
#[derive(Debug, Default)]
pub struct PeakTracker {
    peaks: Mutex<HashMap<u32, Peaks>>,
}

impl PeakTracker {
    /// Create an empty tracker
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an active reading and return the active peak
    pub fn observe_active(&self, index: u32, active: u64) -> u64 {
        let mut peaks = self.peaks.lock().unwrap_or_else(PoisonError::into_inner);
        let entry = peaks.entry(index).or_default();
        entry.active = entry.active.max(active);
        entry.active
    }

    /// Record a reserved reading and return the reserved peak
    pub fn observe_reserved(&self, index: u32, reserved: u64) -> u64 {
        let mut peaks = self.peaks.lock().unwrap_or_else(PoisonError::into_inner);
        let entry = peaks.entry(index).or_default();
        entry.reserved = entry.reserved.max(reserved);
        entry.reserved
    }

    /// Forget the peaks of one device
    pub fn reset(&self, index: u32) {
        self.peaks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&index);
    }
}
