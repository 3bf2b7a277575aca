//! Accelerator memory backends
//!
//! Provides trait-based abstractions over vendor memory APIs for testability.

pub mod drm;
pub mod nvml;
pub mod peaks;
pub mod traits;

pub use drm::DrmBackend;
pub use nvml::NvmlBackend;
pub use peaks::PeakTracker;
pub use traits::MemoryBackend;

use crate::domain::BackendKind;
use crate::error::BackendError;

use std::sync::Arc;

/// Create the backend serving a device family
pub fn select_backend(kind: BackendKind) -> Result<Arc<dyn MemoryBackend>, BackendError> {
    let backend: Arc<dyn MemoryBackend> = match kind {
        BackendKind::Primary => Arc::new(NvmlBackend::new()?),
        BackendKind::Alternate => Arc::new(DrmBackend::new()),
    };
    log::debug!("Selected {} backend ({})", kind, backend.name());
    Ok(backend)
}
