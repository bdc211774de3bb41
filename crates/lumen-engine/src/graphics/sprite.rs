use super::material_manager::{MaterialManager, MaterialRef};

/// Floats per sprite vertex: position `x y z`, texture coordinate `u v`.
pub const SPRITE_VERTEX_STRIDE: usize = 5;

/// Vertices per sprite quad (two triangles).
pub const SPRITE_VERTEX_COUNT: usize = 6;

/// An axis-aligned textured quad drawn with a named material.
///
/// A sprite owns one material reference between [`load`](Self::load) and
/// [`destroy`](Self::destroy). Vertex data is built on load; uploading and
/// drawing it belongs to the renderer.
pub struct Sprite {
    name: String,
    material_name: String,
    width: f32,
    height: f32,
    material: Option<MaterialRef>,
    vertices: Vec<f32>,

    pub position: [f32; 3],
}

impl Sprite {
    pub fn new(name: impl Into<String>, material_name: impl Into<String>, width: f32, height: f32) -> Self {
        Self {
            name: name.into(),
            material_name: material_name.into(),
            width,
            height,
            material: None,
            vertices: Vec::new(),
            position: [0.0; 3],
        }
    }

    /// A 100x100 sprite.
    pub fn with_default_size(name: impl Into<String>, material_name: impl Into<String>) -> Self {
        Self::new(name, material_name, 100.0, 100.0)
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn material_name(&self) -> &str {
        &self.material_name
    }

    #[inline]
    pub fn material(&self) -> Option<&MaterialRef> {
        self.material.as_ref()
    }

    #[inline]
    pub fn size(&self) -> (f32, f32) {
        (self.width, self.height)
    }

    /// Interleaved quad vertices in local space; empty until loaded.
    #[inline]
    pub fn vertices(&self) -> &[f32] {
        &self.vertices
    }

    #[inline]
    pub fn is_loaded(&self) -> bool {
        self.material.is_some()
    }

    /// Acquires the material and builds the quad.
    ///
    /// Returns `false` if the material is not registered. Loading twice keeps
    /// the first reference.
    pub fn load(&mut self, materials: &MaterialManager) -> bool {
        if self.material.is_some() {
            log::warn!("sprite `{}` is already loaded", self.name);
            return true;
        }

        let Some(material) = materials.get_material(&self.material_name) else {
            log::warn!(
                "sprite `{}` cannot load: material `{}` is not registered",
                self.name,
                self.material_name
            );
            return false;
        };

        self.material = Some(material);
        self.vertices = quad_vertices(self.width, self.height);
        true
    }

    /// Returns the material reference. Safe to call on an unloaded sprite.
    pub fn destroy(&mut self, materials: &MaterialManager) {
        if self.material.take().is_some() {
            materials.release_material(&self.material_name);
        }
        self.vertices.clear();
    }
}

#[rustfmt::skip]
fn quad_vertices(w: f32, h: f32) -> Vec<f32> {
    vec![
        // x    y    z    u    v
        0.0, 0.0, 0.0, 0.0, 0.0,
        0.0, h,   0.0, 0.0, 1.0,
        w,   h,   0.0, 1.0, 1.0,

        w,   h,   0.0, 1.0, 1.0,
        w,   0.0, 0.0, 1.0, 0.0,
        0.0, 0.0, 0.0, 0.0, 0.0,
    ]
}
