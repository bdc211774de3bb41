/// Straight-alpha RGBA color with 8-bit channels.
///
/// Material tints are authored as bytes; shaders take the float form from
/// [`to_float_array`](Self::to_float_array).
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Default for Color {
    /// Opaque white, the neutral tint.
    fn default() -> Self {
        Self::white()
    }
}

impl Color {
    #[inline]
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    #[inline]
    pub const fn white() -> Self {
        Self::new(255, 255, 255, 255)
    }

    #[inline]
    pub const fn black() -> Self {
        Self::new(0, 0, 0, 255)
    }

    #[inline]
    pub const fn red() -> Self {
        Self::new(255, 0, 0, 255)
    }

    #[inline]
    pub const fn green() -> Self {
        Self::new(0, 255, 0, 255)
    }

    #[inline]
    pub const fn blue() -> Self {
        Self::new(0, 0, 255, 255)
    }

    #[inline]
    pub fn r_float(self) -> f32 {
        self.r as f32 / 255.0
    }

    #[inline]
    pub fn g_float(self) -> f32 {
        self.g as f32 / 255.0
    }

    #[inline]
    pub fn b_float(self) -> f32 {
        self.b as f32 / 255.0
    }

    #[inline]
    pub fn a_float(self) -> f32 {
        self.a as f32 / 255.0
    }

    #[inline]
    pub const fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }

    /// Channels scaled to `[0, 1]`, straight alpha.
    #[inline]
    pub fn to_float_array(self) -> [f32; 4] {
        [self.r_float(), self.g_float(), self.b_float(), self.a_float()]
    }

    /// Channels scaled to `[0, 1]` with rgb multiplied by alpha.
    #[inline]
    pub fn to_premultiplied(self) -> [f32; 4] {
        let a = self.a_float();
        [self.r_float() * a, self.g_float() * a, self.b_float() * a, a]
    }
}
