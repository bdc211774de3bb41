//! GPU primitives consumed by the resource managers.
//!
//! Textures never call wgpu directly. They go through [`GpuBackend`], which has
//! two implementations:
//! - [`WgpuBackend`]: real textures on a headless wgpu device
//! - [`RecordingBackend`]: records commands without a GPU (tests, tooling)

mod backend;
mod gpu;
mod recording;

pub use backend::{mip_level_count, FilterMode, GpuBackend, SamplerConfig, TextureId, WrapMode};
pub use gpu::{Gpu, GpuInit, WgpuBackend};
pub use recording::{GpuCommand, RecordingBackend};
