/// Opaque handle of a GPU texture object owned by a backend.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct TextureId(u64);

impl TextureId {
    #[inline]
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    #[inline]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

/// Texture coordinate wrapping outside `[0, 1]`.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub enum WrapMode {
    #[default]
    Repeat,
    ClampToEdge,
}

/// Texel filtering.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub enum FilterMode {
    #[default]
    Linear,
    Nearest,
}

/// Sampling state of a texture.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct SamplerConfig {
    pub wrap_u: WrapMode,
    pub wrap_v: WrapMode,
    pub min_filter: FilterMode,
    pub mag_filter: FilterMode,
    /// Sample across the mip chain when minifying.
    pub mipmapped: bool,
}

impl SamplerConfig {
    /// Repeat wrapping, linear filtering, mipmapped minification.
    ///
    /// Only valid for power-of-two textures with a generated mip chain.
    pub const fn mipmapped() -> Self {
        Self {
            wrap_u: WrapMode::Repeat,
            wrap_v: WrapMode::Repeat,
            min_filter: FilterMode::Linear,
            mag_filter: FilterMode::Linear,
            mipmapped: true,
        }
    }

    /// Edge clamping with nearest minification and no mips.
    ///
    /// Required for textures whose dimensions are not both powers of two.
    pub const fn clamped_nearest() -> Self {
        Self {
            wrap_u: WrapMode::ClampToEdge,
            wrap_v: WrapMode::ClampToEdge,
            min_filter: FilterMode::Nearest,
            mag_filter: FilterMode::Linear,
            mipmapped: false,
        }
    }
}

/// Number of levels in a full mip chain for a `width` x `height` image.
pub fn mip_level_count(width: u32, height: u32) -> u32 {
    let max_dimension = width.max(height).max(1);
    u32::BITS - max_dimension.leading_zeros()
}

/// Texture primitives the engine needs from a graphics API.
///
/// Methods take `&self`: backends live behind `Rc` and are shared by every
/// texture. Operations on an unknown id are ignored with a warning, never a
/// panic.
pub trait GpuBackend {
    /// Allocates an empty texture object.
    fn create_texture(&self) -> TextureId;

    /// Replaces the contents of `id` with tightly packed RGBA8 `pixels`.
    fn upload_pixels(&self, id: TextureId, width: u32, height: u32, pixels: &[u8]);

    fn set_sampling(&self, id: TextureId, sampler: SamplerConfig);

    /// Builds the mip chain from the last uploaded level 0.
    fn generate_mipmaps(&self, id: TextureId);

    /// Makes `id` the texture sampled through `unit`.
    fn bind_texture(&self, id: TextureId, unit: u32);

    fn unbind_texture(&self, unit: u32);

    /// Frees the texture object. The id is dead afterwards.
    fn destroy_texture(&self, id: TextureId);
}
