//! NVML backend implementation
//!
//! Primary backend for NVIDIA devices using nvml-wrapper.

use crate::backend::peaks::PeakTracker;
use crate::backend::traits::MemoryBackend;
use crate::domain::stats::{
    ACTIVE_BYTES_PEAK, ACTIVE_CURRENT, RESERVED_BYTES_CURRENT, RESERVED_BYTES_PEAK,
};
use crate::domain::{bytes_to_mib_ceil, MemoryInfo, StatsReport};
use crate::error::BackendError;

use nvml_wrapper::enums::device::UsedGpuMemory;
use nvml_wrapper::struct_wrappers::device::ProcessInfo;
use nvml_wrapper::{Device, Nvml};

/// NVML-backed memory statistics
///
/// NVML has no allocator counters, so `active` is the memory NVML attributes
/// to this process and `reserved` is the device's used memory. Peaks are
/// highwater marks of the values this backend has observed.
pub struct NvmlBackend {
    nvml: Nvml,
    peaks: PeakTracker,
}

impl NvmlBackend {
    /// Initialize NVML and create a new backend
    pub fn new() -> Result<Self, BackendError> {
        let nvml = Nvml::init().map_err(|e| match e {
            nvml_wrapper::error::NvmlError::LibloadingError(_) => BackendError::LibraryNotFound,
            nvml_wrapper::error::NvmlError::DriverNotLoaded => {
                BackendError::InitializationFailed("NVIDIA driver not loaded".to_string())
            }
            other => BackendError::InitializationFailed(other.to_string()),
        })?;

        Ok(Self {
            nvml,
            peaks: PeakTracker::new(),
        })
    }

    fn device(&self, index: u32) -> Result<Device<'_>, BackendError> {
        self.nvml.device_by_index(index).map_err(|e| match e {
            nvml_wrapper::error::NvmlError::NotFound
            | nvml_wrapper::error::NvmlError::InvalidArg => BackendError::DeviceNotFound(index),
            other => convert_error(other),
        })
    }

    /// Memory NVML attributes to this process on a device
    fn process_usage(device: &Device<'_>) -> u64 {
        let pid = std::process::id();
        let compute = device.running_compute_processes().unwrap_or_default();
        let graphics = device.running_graphics_processes().unwrap_or_default();

        compute
            .iter()
            .chain(graphics.iter())
            .filter(|p| p.pid == pid)
            .map(used_bytes)
            .sum()
    }
}

/// Convert NVML error to our error type
fn convert_error(err: nvml_wrapper::error::NvmlError) -> BackendError {
    use nvml_wrapper::error::NvmlError as NE;
    match err {
        NE::NotSupported => {
            BackendError::NotSupported("Operation not supported by this GPU".to_string())
        }
        NE::NoPermission => {
            BackendError::InsufficientPermissions("Insufficient permissions".to_string())
        }
        NE::GpuLost => BackendError::GpuLost,
        _ => BackendError::Unknown(err.to_string()),
    }
}

fn used_bytes(process: &ProcessInfo) -> u64 {
    match process.used_gpu_memory {
        UsedGpuMemory::Used(bytes) => bytes,
        UsedGpuMemory::Unavailable => 0,
    }
}

/// Index of CUDA ordinal 0 from a `CUDA_VISIBLE_DEVICES` value
///
/// NVML enumerates devices in PCI bus order. The value only names the same
/// device when CUDA runs with `CUDA_DEVICE_ORDER=PCI_BUS_ID`; the CUDA
/// default (fastest first) may differ on mixed-GPU hosts. UUID and MIG
/// entries are not resolved.
fn first_visible_device(value: &str) -> Option<u32> {
    value.split(',').next()?.trim().parse().ok()
}

impl MemoryBackend for NvmlBackend {
    fn name(&self) -> &'static str {
        "nvml"
    }

    fn current_device(&self) -> Result<u32, BackendError> {
        let index = std::env::var("CUDA_VISIBLE_DEVICES")
            .ok()
            .and_then(|v| first_visible_device(&v))
            .unwrap_or(0);
        Ok(index)
    }

    fn mem_get_info(&self, index: u32) -> Result<MemoryInfo, BackendError> {
        let mem = self.device(index)?.memory_info().map_err(convert_error)?;
        self.peaks.observe_reserved(index, mem.used);

        Ok(MemoryInfo::new(mem.free, mem.total))
    }

    fn memory_stats(&self, index: u32) -> Result<StatsReport, BackendError> {
        let device = self.device(index)?;
        let mem = device.memory_info().map_err(convert_error)?;
        let active = Self::process_usage(&device);

        let active_peak = self.peaks.observe_active(index, active);
        let reserved_peak = self.peaks.observe_reserved(index, mem.used);

        Ok(StatsReport::new()
            .with(ACTIVE_CURRENT, active)
            .with(ACTIVE_BYTES_PEAK, active_peak)
            .with(RESERVED_BYTES_CURRENT, mem.used)
            .with(RESERVED_BYTES_PEAK, reserved_peak))
    }

    fn reset_peak_memory_stats(&self, index: u32) -> Result<(), BackendError> {
        self.peaks.reset(index);
        Ok(())
    }

    fn memory_summary(&self, index: u32) -> Option<String> {
        let device = self.device(index).ok()?;
        let name = device.name().unwrap_or_else(|_| "Unknown GPU".to_string());
        let mem = device.memory_info().ok()?;
        let compute = device.running_compute_processes().unwrap_or_default();

        let mut output = format!("[{}] {}\n", index, name);
        output.push_str(&format!("  Total:     {} MiB\n", bytes_to_mib_ceil(mem.total)));
        output.push_str(&format!("  Used:      {} MiB\n", bytes_to_mib_ceil(mem.used)));
        output.push_str(&format!("  Free:      {} MiB\n", bytes_to_mib_ceil(mem.free)));
        output.push_str(&format!("  Processes: {}\n", compute.len()));
        for process in &compute {
            output.push_str(&format!(
                "    PID {}: {} MiB\n",
                process.pid,
                bytes_to_mib_ceil(used_bytes(process))
            ));
        }

        Some(output)
    }
}
