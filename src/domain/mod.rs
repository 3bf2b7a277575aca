//! Domain models for memmon
//!
//! Device handles and memory statistics shared by backends, the monitor
//! and the CLI.

pub mod device;
pub mod stats;

pub use device::{BackendKind, Device};
pub use stats::{bytes_to_mib_ceil, MemoryInfo, MemoryStats, StatsReport, MIB};
