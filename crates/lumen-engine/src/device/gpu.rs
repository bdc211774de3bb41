use std::cell::{Cell, RefCell};
use std::collections::HashMap;

use anyhow::{Context, Result};
use image::imageops::{self, FilterType};
use image::RgbaImage;

use super::backend::{mip_level_count, FilterMode, GpuBackend, SamplerConfig, TextureId, WrapMode};

/// Initialization parameters for the GPU layer.
#[derive(Debug, Clone)]
pub struct GpuInit {
    pub power_preference: wgpu::PowerPreference,

    /// Required wgpu features. Keep empty unless a feature is strictly needed.
    pub required_features: wgpu::Features,

    pub required_limits: wgpu::Limits,

    /// Format of every texture created by [`WgpuBackend`].
    ///
    /// Decoded images are sRGB-encoded RGBA8, so an sRGB format samples them
    /// back in linear space.
    pub texture_format: wgpu::TextureFormat,
}

impl Default for GpuInit {
    fn default() -> Self {
        Self {
            power_preference: wgpu::PowerPreference::HighPerformance,
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::default(),
            texture_format: wgpu::TextureFormat::Rgba8UnormSrgb,
        }
    }
}

/// Owns the wgpu core objects.
///
/// The context is headless: presentation belongs to the host, which shares the
/// same device with the renderers.
pub struct Gpu {
    instance: wgpu::Instance,
    adapter: wgpu::Adapter,
    device: wgpu::Device,
    queue: wgpu::Queue,
    texture_format: wgpu::TextureFormat,
}

impl Gpu {
    /// Blocking form of [`Gpu::new_headless`] for hosts without an executor.
    pub fn headless_blocking(init: GpuInit) -> Result<Self> {
        pollster::block_on(Self::new_headless(init))
    }

    /// Creates a device without a surface.
    ///
    /// Adapter/device acquisition is asynchronous under wgpu; hosts with their
    /// own executor await this directly.
    pub async fn new_headless(init: GpuInit) -> Result<Self> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: init.power_preference,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .context("failed to find a suitable GPU adapter")?;

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("lumen-engine device"),
                required_features: init.required_features,
                required_limits: init.required_limits,
                experimental_features: wgpu::ExperimentalFeatures::disabled(),
                memory_hints: wgpu::MemoryHints::Performance,
                trace: wgpu::Trace::Off,
            })
            .await
            .context("failed to create wgpu device/queue")?;

        log::info!("using GPU adapter `{}`", adapter.get_info().name);

        Ok(Gpu {
            instance,
            adapter,
            device,
            queue,
            texture_format: init.texture_format,
        })
    }

    #[inline]
    pub fn instance(&self) -> &wgpu::Instance {
        &self.instance
    }

    #[inline]
    pub fn adapter(&self) -> &wgpu::Adapter {
        &self.adapter
    }

    #[inline]
    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    #[inline]
    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    #[inline]
    pub fn texture_format(&self) -> wgpu::TextureFormat {
        self.texture_format
    }
}

/// GPU state behind one [`TextureId`].
///
/// wgpu textures have a fixed size and mip count, so `texture` is recreated
/// whenever an upload changes the size or mipmaps are generated.
#[derive(Default)]
struct TextureSlot {
    texture: Option<wgpu::Texture>,
    view: Option<wgpu::TextureView>,
    sampler: Option<wgpu::Sampler>,
    sampling: SamplerConfig,
    // Level 0 as last uploaded; the source for mip generation.
    source: Option<RgbaImage>,
}

/// [`GpuBackend`] on top of a wgpu device.
///
/// Binding has no global state in wgpu; `bind_texture` records the texture per
/// unit and renderers read it back through [`WgpuBackend::with_binding`] when
/// they build their bind groups.
pub struct WgpuBackend {
    gpu: Gpu,
    next_id: Cell<u64>,
    slots: RefCell<HashMap<TextureId, TextureSlot>>,
    units: RefCell<HashMap<u32, TextureId>>,
}

impl WgpuBackend {
    pub fn new(gpu: Gpu) -> Self {
        Self {
            gpu,
            next_id: Cell::new(1),
            slots: RefCell::new(HashMap::new()),
            units: RefCell::new(HashMap::new()),
        }
    }

    #[inline]
    pub fn gpu(&self) -> &Gpu {
        &self.gpu
    }

    /// Number of texture objects currently alive.
    pub fn live_texture_count(&self) -> usize {
        self.slots.borrow().len()
    }

    /// Calls `f` with the view and sampler bound to `unit`.
    ///
    /// Returns `None` if nothing usable is bound there.
    pub fn with_binding<R>(
        &self,
        unit: u32,
        f: impl FnOnce(&wgpu::TextureView, &wgpu::Sampler) -> R,
    ) -> Option<R> {
        let id = *self.units.borrow().get(&unit)?;
        let slots = self.slots.borrow();
        let slot = slots.get(&id)?;
        Some(f(slot.view.as_ref()?, slot.sampler.as_ref()?))
    }

    /// Size of the texture currently backing `id`.
    pub fn texture_size(&self, id: TextureId) -> Option<(u32, u32)> {
        let slots = self.slots.borrow();
        let texture = slots.get(&id)?.texture.as_ref()?;
        Some((texture.width(), texture.height()))
    }

    fn create_gpu_texture(&self, width: u32, height: u32, mip_levels: u32) -> wgpu::Texture {
        self.gpu.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("lumen texture"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: mip_levels,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: self.gpu.texture_format,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        })
    }

    fn write_level(&self, texture: &wgpu::Texture, mip_level: u32, image: &RgbaImage) {
        let (width, height) = image.dimensions();
        self.gpu.queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture,
                mip_level,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            image.as_raw(),
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * width),
                rows_per_image: Some(height),
            },
            wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
        );
    }

    fn create_sampler(&self, sampling: SamplerConfig) -> wgpu::Sampler {
        self.gpu.device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("lumen texture sampler"),
            address_mode_u: address_mode(sampling.wrap_u),
            address_mode_v: address_mode(sampling.wrap_v),
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: filter_mode(sampling.mag_filter),
            min_filter: filter_mode(sampling.min_filter),
            mipmap_filter: if sampling.mipmapped {
                wgpu::MipmapFilterMode::Linear
            } else {
                wgpu::MipmapFilterMode::Nearest
            },
            ..Default::default()
        })
    }

    fn install(&self, slot: &mut TextureSlot, texture: wgpu::Texture) {
        slot.view = Some(texture.create_view(&wgpu::TextureViewDescriptor::default()));
        if let Some(previous) = slot.texture.replace(texture) {
            previous.destroy();
        }
        if slot.sampler.is_none() {
            slot.sampler = Some(self.create_sampler(slot.sampling));
        }
    }
}

impl GpuBackend for WgpuBackend {
    fn create_texture(&self) -> TextureId {
        let id = TextureId::from_raw(self.next_id.get());
        self.next_id.set(self.next_id.get() + 1);
        self.slots.borrow_mut().insert(id, TextureSlot::default());
        id
    }

    fn upload_pixels(&self, id: TextureId, width: u32, height: u32, pixels: &[u8]) {
        let Some(image) = RgbaImage::from_raw(width, height, pixels.to_vec()) else {
            log::warn!(
                "upload to {id:?} rejected: {} bytes do not describe a {width}x{height} RGBA8 image",
                pixels.len()
            );
            return;
        };
        if width == 0 || height == 0 {
            log::warn!("upload to {id:?} rejected: empty {width}x{height} image");
            return;
        }

        let mut slots = self.slots.borrow_mut();
        let Some(slot) = slots.get_mut(&id) else {
            log::warn!("upload to unknown texture {id:?} ignored");
            return;
        };

        let texture = self.create_gpu_texture(width, height, 1);
        self.write_level(&texture, 0, &image);
        self.install(slot, texture);
        slot.source = Some(image);
    }

    fn set_sampling(&self, id: TextureId, sampling: SamplerConfig) {
        let mut slots = self.slots.borrow_mut();
        let Some(slot) = slots.get_mut(&id) else {
            log::warn!("sampling change on unknown texture {id:?} ignored");
            return;
        };

        slot.sampling = sampling;
        slot.sampler = Some(self.create_sampler(sampling));
    }

    fn generate_mipmaps(&self, id: TextureId) {
        let mut slots = self.slots.borrow_mut();
        let Some(slot) = slots.get_mut(&id) else {
            log::warn!("mipmap generation on unknown texture {id:?} ignored");
            return;
        };
        let Some(source) = slot.source.take() else {
            log::warn!("mipmap generation on {id:?} skipped: nothing uploaded yet");
            return;
        };

        let (width, height) = source.dimensions();
        let levels = mip_level_count(width, height);
        let texture = self.create_gpu_texture(width, height, levels);

        self.write_level(&texture, 0, &source);
        for level in 1..levels {
            let level_width = (width >> level).max(1);
            let level_height = (height >> level).max(1);
            let scaled = imageops::resize(&source, level_width, level_height, FilterType::Triangle);
            self.write_level(&texture, level, &scaled);
        }

        self.install(slot, texture);
        slot.source = Some(source);
        log::trace!("generated {levels} mip levels for {id:?}");
    }

    fn bind_texture(&self, id: TextureId, unit: u32) {
        if !self.slots.borrow().contains_key(&id) {
            log::warn!("bind of unknown texture {id:?} ignored");
            return;
        }
        self.units.borrow_mut().insert(unit, id);
    }

    fn unbind_texture(&self, unit: u32) {
        self.units.borrow_mut().remove(&unit);
    }

    fn destroy_texture(&self, id: TextureId) {
        let Some(slot) = self.slots.borrow_mut().remove(&id) else {
            log::warn!("destroy of unknown texture {id:?} ignored");
            return;
        };

        self.units.borrow_mut().retain(|_, bound| *bound != id);
        if let Some(texture) = slot.texture {
            texture.destroy();
        }
    }
}

fn address_mode(wrap: WrapMode) -> wgpu::AddressMode {
    match wrap {
        WrapMode::Repeat => wgpu::AddressMode::Repeat,
        WrapMode::ClampToEdge => wgpu::AddressMode::ClampToEdge,
    }
}

fn filter_mode(filter: FilterMode) -> wgpu::FilterMode {
    match filter {
        FilterMode::Linear => wgpu::FilterMode::Linear,
        FilterMode::Nearest => wgpu::FilterMode::Nearest,
    }
}
