//! DRM sysfs backend implementation
//!
//! Alternate backend reading the VRAM counters amdgpu exposes under
//! `/sys/class/drm/card<N>/device/`.

use crate::backend::peaks::PeakTracker;
use crate::backend::traits::MemoryBackend;
use crate::domain::stats::{
    ACTIVE_BYTES_PEAK, ACTIVE_CURRENT, RESERVED_BYTES_CURRENT, RESERVED_BYTES_PEAK,
};
use crate::domain::{MemoryInfo, StatsReport};
use crate::error::BackendError;

use std::path::PathBuf;

const DEFAULT_ROOT: &str = "/sys/class/drm";
const VRAM_TOTAL: &str = "mem_info_vram_total";
const VRAM_USED: &str = "mem_info_vram_used";

/// DRM sysfs memory statistics
///
/// The driver reports device-wide usage only, so `active` and `reserved`
/// both carry used VRAM.
#[derive(Debug)]
pub struct DrmBackend {
    root: PathBuf,
    peaks: PeakTracker,
}

impl DrmBackend {
    /// Create a backend reading from `/sys/class/drm`
    pub fn new() -> Self {
        Self::with_root(DEFAULT_ROOT)
    }

    /// Create a backend reading from a custom DRM class directory
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            peaks: PeakTracker::new(),
        }
    }

    fn counter_path(&self, index: u32, counter: &str) -> PathBuf {
        self.root
            .join(format!("card{}", index))
            .join("device")
            .join(counter)
    }

    fn read_counter(&self, index: u32, counter: &str) -> Result<u64, BackendError> {
        let path = self.counter_path(index, counter);

        let content = std::fs::read_to_string(&path).map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                BackendError::DeviceNotFound(index)
            } else {
                BackendError::Io {
                    path: path.display().to_string(),
                    source,
                }
            }
        })?;

        content.trim().parse().map_err(|_| BackendError::Parse {
            path: path.display().to_string(),
            value: content.trim().to_string(),
        })
    }

    fn read_info(&self, index: u32) -> Result<MemoryInfo, BackendError> {
        let total = self.read_counter(index, VRAM_TOTAL)?;
        let used = self.read_counter(index, VRAM_USED)?;
        Ok(MemoryInfo::new(total.saturating_sub(used), total))
    }

    /// Card indices that expose VRAM counters, ascending
    pub fn cards(&self) -> Vec<u32> {
        let Ok(entries) = std::fs::read_dir(&self.root) else {
            return Vec::new();
        };

        let mut cards: Vec<u32> = entries
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| {
                let name = entry.file_name();
                // Skip connector entries such as card0-DP-1
                name.to_str()?.strip_prefix("card")?.parse::<u32>().ok()
            })
            .filter(|&index| self.counter_path(index, VRAM_TOTAL).exists())
            .collect();

        cards.sort_unstable();
        cards
    }
}

impl Default for DrmBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBackend for DrmBackend {
    fn name(&self) -> &'static str {
        "drm"
    }

    fn current_device(&self) -> Result<u32, BackendError> {
        self.cards().first().copied().ok_or_else(|| {
            BackendError::NotSupported(format!(
                "no DRM card with VRAM counters under {}",
                self.root.display()
            ))
        })
    }

    fn mem_get_info(&self, index: u32) -> Result<MemoryInfo, BackendError> {
        let info = self.read_info(index)?;
        self.peaks.observe_reserved(index, info.used());
        Ok(info)
    }

    fn memory_stats(&self, index: u32) -> Result<StatsReport, BackendError> {
        let used = self.read_info(index)?.used();

        let active_peak = self.peaks.observe_active(index, used);
        let reserved_peak = self.peaks.observe_reserved(index, used);

        Ok(StatsReport::new()
            .with(ACTIVE_CURRENT, used)
            .with(ACTIVE_BYTES_PEAK, active_peak)
            .with(RESERVED_BYTES_CURRENT, used)
            .with(RESERVED_BYTES_PEAK, reserved_peak))
    }

    fn reset_peak_memory_stats(&self, index: u32) -> Result<(), BackendError> {
        self.peaks.reset(index);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use tempfile::TempDir;

    fn write_card(root: &Path, index: u32, total: &str, used: &str) {
        let dir = root.join(format!("card{}", index)).join("device");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join(VRAM_TOTAL), total).unwrap();
        std::fs::write(dir.join(VRAM_USED), used).unwrap();
    }

    #[test]
    fn test_mem_get_info() {
        let tmp = TempDir::new().unwrap();
        write_card(tmp.path(), 0, "8589934592\n", "2147483648\n");

        let backend = DrmBackend::with_root(tmp.path());
        let info = backend.mem_get_info(0).unwrap();
        assert_eq!(info.total, 8589934592);
        assert_eq!(info.free, 6442450944);
    }

    #[test]
    fn test_used_clamped_to_total() {
        let tmp = TempDir::new().unwrap();
        write_card(tmp.path(), 0, "1000", "1200");

        let backend = DrmBackend::with_root(tmp.path());
        assert_eq!(backend.mem_get_info(0).unwrap(), MemoryInfo::new(0, 1000));
        assert_eq!(backend.memory_stats(0).unwrap().get(ACTIVE_CURRENT), 1000);
    }

    #[test]
    fn test_missing_card() {
        let tmp = TempDir::new().unwrap();
        let backend = DrmBackend::with_root(tmp.path());
        assert!(matches!(
            backend.mem_get_info(3),
            Err(BackendError::DeviceNotFound(3))
        ));
    }

    #[test]
    fn test_unparsable_counter() {
        let tmp = TempDir::new().unwrap();
        write_card(tmp.path(), 0, "lots", "0");

        let backend = DrmBackend::with_root(tmp.path());
        assert!(matches!(
            backend.mem_get_info(0),
            Err(BackendError::Parse { .. })
        ));
    }

    #[test]
    fn test_current_device_picks_lowest_card() {
        let tmp = TempDir::new().unwrap();
        write_card(tmp.path(), 2, "100", "10");
        write_card(tmp.path(), 1, "100", "10");
        std::fs::create_dir_all(tmp.path().join("card1-DP-1")).unwrap();
        std::fs::create_dir_all(tmp.path().join("card0")).unwrap();

        let backend = DrmBackend::with_root(tmp.path());
        assert_eq!(backend.cards(), vec![1, 2]);
        assert_eq!(backend.current_device().unwrap(), 1);
    }

    #[test]
    fn test_current_device_without_cards() {
        let tmp = TempDir::new().unwrap();
        let backend = DrmBackend::with_root(tmp.path());
        assert!(backend.current_device().is_err());
    }

    #[test]
    fn test_peaks_reset_per_window() {
        let tmp = TempDir::new().unwrap();
        write_card(tmp.path(), 0, "1000", "600");

        let backend = DrmBackend::with_root(tmp.path());
        backend.mem_get_info(0).unwrap();

        write_card(tmp.path(), 0, "1000", "200");
        let report = backend.memory_stats(0).unwrap();
        assert_eq!(report.get(ACTIVE_CURRENT), 200);
        assert_eq!(report.get(RESERVED_BYTES_CURRENT), 200);
        assert_eq!(report.get(RESERVED_BYTES_PEAK), 600);

        backend.reset_peak_memory_stats(0).unwrap();
        let report = backend.memory_stats(0).unwrap();
        assert_eq!(report.get(ACTIVE_BYTES_PEAK), 200);
        assert_eq!(report.get(RESERVED_BYTES_PEAK), 200);
    }
}
