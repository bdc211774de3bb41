use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::assets::AssetManager;
use crate::device::GpuBackend;
use crate::message::MessageBus;

use super::texture::{Texture, TextureRef};

struct TextureReferenceNode {
    texture: TextureRef,
    reference_count: usize,
}

/// Reference-counted texture cache keyed by texture (asset) name.
///
/// Invariant: a name is in the table iff its count is at least 1. The release
/// that takes the count to zero removes the entry and destroys the texture
/// before it returns.
pub struct TextureManager {
    backend: Rc<dyn GpuBackend>,
    bus: Rc<MessageBus>,
    assets: Rc<AssetManager>,
    textures: RefCell<HashMap<String, TextureReferenceNode>>,
}

impl TextureManager {
    pub fn new(backend: Rc<dyn GpuBackend>, bus: Rc<MessageBus>, assets: Rc<AssetManager>) -> Self {
        Self {
            backend,
            bus,
            assets,
            textures: RefCell::new(HashMap::new()),
        }
    }

    /// Returns the texture called `name`, creating it on first use.
    ///
    /// Every call counts as one reference and must be paired with a
    /// [`release_texture`](Self::release_texture).
    pub fn get_texture(&self, name: &str) -> TextureRef {
        if let Some(node) = self.textures.borrow_mut().get_mut(name) {
            node.reference_count += 1;
            return Rc::clone(&node.texture);
        }

        let texture = Texture::create(
            name,
            Rc::clone(&self.backend),
            Rc::clone(&self.bus),
            &self.assets,
        );
        self.textures.borrow_mut().insert(
            name.to_owned(),
            TextureReferenceNode {
                texture: Rc::clone(&texture),
                reference_count: 1,
            },
        );
        texture
    }

    /// Gives back one reference to `name`.
    ///
    /// Releasing a name that is not held logs a warning.
    pub fn release_texture(&self, name: &str) {
        let released = {
            let mut textures = self.textures.borrow_mut();
            let Some(node) = textures.get_mut(name) else {
                log::warn!("a texture named `{name}` does not exist and therefore cannot be released");
                return;
            };

            node.reference_count -= 1;
            if node.reference_count > 0 {
                return;
            }
            textures.remove(name)
        };

        if let Some(node) = released {
            node.texture.borrow_mut().destroy();
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.textures.borrow().contains_key(name)
    }

    /// Current count for `name`, 0 if it is not held.
    pub fn reference_count(&self, name: &str) -> usize {
        self.textures.borrow().get(name).map_or(0, |node| node.reference_count)
    }

    pub fn len(&self) -> usize {
        self.textures.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.textures.borrow().is_empty()
    }
}
