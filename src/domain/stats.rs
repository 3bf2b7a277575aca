//! Memory statistics domain types
//!
//! Provides the free/total reading returned by backends, the raw counter
//! report, and the aggregated statistics record a monitor hands back.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Bytes per mebibyte
pub const MIB: u64 = 1024 * 1024;

/// Current active allocation counter
pub const ACTIVE_CURRENT: &str = "active.all.current";
/// Peak active bytes counter
pub const ACTIVE_BYTES_PEAK: &str = "active_bytes.all.peak";
/// Current reserved bytes counter
pub const RESERVED_BYTES_CURRENT: &str = "reserved_bytes.all.current";
/// Peak reserved bytes counter
pub const RESERVED_BYTES_PEAK: &str = "reserved_bytes.all.peak";

/// Convert bytes to mebibytes, rounding up
#[inline]
pub fn bytes_to_mib_ceil(bytes: u64) -> u64 {
    bytes.div_ceil(MIB)
}

/// Free/total device memory in bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MemoryInfo {
    /// Free memory in bytes
    pub free: u64,
    /// Total memory in bytes
    pub total: u64,
}

impl MemoryInfo {
    /// Create a new memory info value
    pub fn new(free: u64, total: u64) -> Self {
        Self { free, total }
    }

    /// Used memory in bytes
    pub fn used(&self) -> u64 {
        self.total.saturating_sub(self.free)
    }
}

/// Raw counter report from a backend, keyed by counter name
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StatsReport(BTreeMap<String, u64>);

impl StatsReport {
    /// Create an empty report
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a counter
    pub fn insert(&mut self, key: impl Into<String>, value: u64) {
        self.0.insert(key.into(), value);
    }

    /// Builder: set a counter
    pub fn with(mut self, key: impl Into<String>, value: u64) -> Self {
        self.insert(key, value);
        self
    }

    /// Get a counter, 0 when absent
    pub fn get(&self, key: &str) -> u64 {
        self.0.get(key).copied().unwrap_or(0)
    }

    /// Iterate counters in name order
    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Number of counters
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the report has no counters
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Aggregated memory statistics for a sampling window
///
/// Every field is a byte count; unset fields are 0.
///
/// # Examples
///
/// ```
/// use memmon::domain::MemoryStats;
///
/// let stats = MemoryStats {
///     min_free: 2 * 1024 * 1024,
///     total: 8 * 1024 * 1024,
///     ..Default::default()
/// };
/// assert_eq!(stats.get("min_free"), Some(2 * 1024 * 1024));
/// assert_eq!(stats.get("nonexistent"), None);
/// assert_eq!(stats.iter().count(), 8);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MemoryStats {
    /// Lowest free memory observed during the window
    pub min_free: u64,
    /// Free memory at the last read
    pub free: u64,
    /// Total device memory
    pub total: u64,
    /// Currently active bytes
    pub active: u64,
    /// Peak active bytes since the window started
    pub active_peak: u64,
    /// Currently reserved bytes
    pub reserved: u64,
    /// Peak reserved bytes since the window started
    pub reserved_peak: u64,
    /// `total - min_free`
    pub system_peak: u64,
}

impl MemoryStats {
    /// Field names in display order
    pub const KEYS: [&'static str; 8] = [
        "min_free",
        "free",
        "total",
        "active",
        "active_peak",
        "reserved",
        "reserved_peak",
        "system_peak",
    ];

    /// Look up a field by name
    pub fn get(&self, key: &str) -> Option<u64> {
        let value = match key {
            "min_free" => self.min_free,
            "free" => self.free,
            "total" => self.total,
            "active" => self.active,
            "active_peak" => self.active_peak,
            "reserved" => self.reserved,
            "reserved_peak" => self.reserved_peak,
            "system_peak" => self.system_peak,
            _ => return None,
        };
        Some(value)
    }

    /// Iterate `(name, bytes)` pairs in display order
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, u64)> + '_ {
        Self::KEYS
            .iter()
            .filter_map(move |key| self.get(key).map(|value| (*key, value)))
    }

    /// Reset every field to 0
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Apply a fresh free/total reading and backend report
    ///
    /// Leaves `min_free` untouched; `system_peak` is derived from it.
    pub fn update(&mut self, info: MemoryInfo, report: &StatsReport) {
        self.free = info.free;
        self.total = info.total;
        self.active = report.get(ACTIVE_CURRENT);
        self.active_peak = report.get(ACTIVE_BYTES_PEAK);
        self.reserved = report.get(RESERVED_BYTES_CURRENT);
        self.reserved_peak = report.get(RESERVED_BYTES_PEAK);
        self.system_peak = info.total.saturating_sub(self.min_free);
    }
}

impl fmt::Display for MemoryStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .iter()
            .map(|(key, value)| format!("{}={}MiB", key, bytes_to_mib_ceil(value)))
            .collect();
        write!(f, "{}", parts.join(" "))
    }
}
