//! Device handle domain type
//!
//! Identifies which accelerator a monitor queries and which backend family
//! serves it.

use crate::error::MonitorError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Backend family serving a device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// NVIDIA devices through NVML
    #[default]
    Primary,
    /// DRM devices exposing VRAM counters in sysfs (amdgpu)
    Alternate,
}

impl BackendKind {
    /// Prefix used when formatting a device of this kind
    pub fn prefix(&self) -> &'static str {
        match self {
            Self::Primary => "cuda",
            Self::Alternate => "drm",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Primary => write!(f, "NVML"),
            Self::Alternate => write!(f, "DRM sysfs"),
        }
    }
}

/// Accelerator device handle
///
/// Parsed from strings such as `cuda`, `cuda:1`, `nvml:0`, `drm:0` or
/// `amdgpu:1`. A handle without an index refers to the backend's current
/// device.
///
/// # Examples
///
/// ```
/// use memmon::domain::{BackendKind, Device};
///
/// let device: Device = "drm:1".parse().unwrap();
/// assert_eq!(device.kind(), BackendKind::Alternate);
/// assert_eq!(device.index(), Some(1));
/// assert_eq!(device.to_string(), "drm:1");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Device {
    kind: BackendKind,
    index: Option<u32>,
}

impl Device {
    /// Create a device handle
    pub const fn new(kind: BackendKind, index: Option<u32>) -> Self {
        Self { kind, index }
    }

    /// NVML device at the given index
    pub const fn cuda(index: u32) -> Self {
        Self::new(BackendKind::Primary, Some(index))
    }

    /// DRM card at the given index
    pub const fn drm(index: u32) -> Self {
        Self::new(BackendKind::Alternate, Some(index))
    }

    /// Backend family for this device
    #[inline]
    pub const fn kind(&self) -> BackendKind {
        self.kind
    }

    /// Explicit device index, if any
    #[inline]
    pub const fn index(&self) -> Option<u32> {
        self.index
    }
}

impl FromStr for Device {
    type Err = MonitorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || MonitorError::InvalidDevice(s.to_string());
        let trimmed = s.trim().to_lowercase();

        let (prefix, index) = match trimmed.split_once(':') {
            Some((prefix, index)) => (prefix, Some(index.parse::<u32>().map_err(|_| invalid())?)),
            None => (trimmed.as_str(), None),
        };

        let kind = match prefix {
            "cuda" | "nvml" | "nvidia" | "gpu" => BackendKind::Primary,
            "drm" | "amdgpu" => BackendKind::Alternate,
            _ => return Err(invalid()),
        };

        Ok(Self { kind, index })
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.index {
            Some(index) => write!(f, "{}:{}", self.kind.prefix(), index),
            None => write!(f, "{}", self.kind.prefix()),
        }
    }
}
