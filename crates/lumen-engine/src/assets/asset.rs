use image::RgbaImage;

/// Decoded payload of an asset.
#[derive(Debug, Clone)]
pub enum AssetData {
    /// RGBA8 pixels, row-major, top row first.
    Image(RgbaImage),
    /// Undecoded bytes for asset kinds the engine does not interpret.
    Bytes(Vec<u8>),
}

impl AssetData {
    #[inline]
    pub fn as_image(&self) -> Option<&RgbaImage> {
        match self {
            AssetData::Image(image) => Some(image),
            AssetData::Bytes(_) => None,
        }
    }
}

/// A named, decoded asset. Immutable once built.
#[derive(Debug, Clone)]
pub struct Asset {
    name: String,
    data: AssetData,
}

impl Asset {
    pub fn new(name: impl Into<String>, data: AssetData) -> Self {
        Self { name: name.into(), data }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn data(&self) -> &AssetData {
        &self.data
    }

    /// `(width, height)` for image assets.
    pub fn dimensions(&self) -> Option<(u32, u32)> {
        self.data.as_image().map(|image| image.dimensions())
    }
}
