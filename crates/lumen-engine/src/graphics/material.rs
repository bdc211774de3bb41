use std::rc::Rc;

use super::color::Color;
use super::texture::TextureRef;
use super::texture_manager::TextureManager;

/// A tinted surface description referring to its diffuse texture by name.
///
/// The material holds one reference on its texture through the
/// [`TextureManager`] for as long as it is alive and not destroyed.
pub struct Material {
    name: String,
    diffuse_texture_name: String,
    diffuse_texture: Option<TextureRef>,
    tint: Color,
    textures: Rc<TextureManager>,
}

impl Material {
    /// Creates the material and acquires its diffuse texture.
    pub fn new(
        name: impl Into<String>,
        diffuse_texture_name: impl Into<String>,
        tint: Color,
        textures: &Rc<TextureManager>,
    ) -> Self {
        let diffuse_texture_name = diffuse_texture_name.into();
        let diffuse_texture = Some(textures.get_texture(&diffuse_texture_name));

        Self {
            name: name.into(),
            diffuse_texture_name,
            diffuse_texture,
            tint,
            textures: Rc::clone(textures),
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn diffuse_texture_name(&self) -> &str {
        &self.diffuse_texture_name
    }

    /// `None` after [`destroy`](Self::destroy).
    #[inline]
    pub fn diffuse_texture(&self) -> Option<&TextureRef> {
        self.diffuse_texture.as_ref()
    }

    #[inline]
    pub fn tint(&self) -> Color {
        self.tint
    }

    #[inline]
    pub fn set_tint(&mut self, tint: Color) {
        self.tint = tint;
    }

    /// Switches to another diffuse texture.
    ///
    /// The old reference is released before the new one is acquired, so
    /// reassigning the same name costs one release/get pair and nets out.
    pub fn set_diffuse_texture_name(&mut self, name: impl Into<String>) {
        if self.diffuse_texture.take().is_some() {
            self.textures.release_texture(&self.diffuse_texture_name);
        }

        self.diffuse_texture_name = name.into();
        self.diffuse_texture = Some(self.textures.get_texture(&self.diffuse_texture_name));
    }

    /// Gives back the texture reference. Called by the material manager.
    pub(crate) fn destroy(&mut self) {
        if self.diffuse_texture.take().is_some() {
            self.textures.release_texture(&self.diffuse_texture_name);
        }
    }
}
