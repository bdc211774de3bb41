use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use super::material::Material;

/// Shared handle to a registered material.
pub type MaterialRef = Rc<RefCell<Material>>;

struct MaterialReferenceNode {
    material: MaterialRef,
    reference_count: usize,
}

/// Reference-counted registry of materials.
///
/// Materials cannot be built from a name alone, so the first reference is
/// taken by [`register_material`](Self::register_material) instead of a
/// cache miss. From there the contract matches the texture manager: every
/// `get_material` hit counts, every `release_material` gives one back, and the
/// release that reaches zero destroys the material and forgets it.
#[derive(Default)]
pub struct MaterialManager {
    materials: RefCell<HashMap<String, MaterialReferenceNode>>,
}

impl MaterialManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes ownership of `material` with a count of 1.
    ///
    /// Returns `false` if the name is taken; the rejected material is
    /// destroyed so its texture reference is not leaked.
    pub fn register_material(&self, mut material: Material) -> bool {
        let mut materials = self.materials.borrow_mut();
        if materials.contains_key(material.name()) {
            drop(materials);
            log::warn!("material `{}` is already registered; keeping the existing one", material.name());
            material.destroy();
            return false;
        }

        log::debug!("material `{}` registered", material.name());
        materials.insert(
            material.name().to_owned(),
            MaterialReferenceNode {
                material: Rc::new(RefCell::new(material)),
                reference_count: 1,
            },
        );
        true
    }

    /// Returns the material and counts one more reference, or `None` if it was
    /// never registered.
    pub fn get_material(&self, name: &str) -> Option<MaterialRef> {
        let mut materials = self.materials.borrow_mut();
        let node = materials.get_mut(name)?;
        node.reference_count += 1;
        Some(Rc::clone(&node.material))
    }

    /// Gives back one reference to `name`.
    pub fn release_material(&self, name: &str) {
        let released = {
            let mut materials = self.materials.borrow_mut();
            let Some(node) = materials.get_mut(name) else {
                log::warn!("cannot release material `{name}` because it has not been registered");
                return;
            };

            node.reference_count -= 1;
            if node.reference_count > 0 {
                return;
            }
            materials.remove(name)
        };

        if let Some(node) = released {
            node.material.borrow_mut().destroy();
            log::debug!("material `{name}` destroyed");
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.materials.borrow().contains_key(name)
    }

    /// Current count for `name`, 0 if it is not registered.
    pub fn reference_count(&self, name: &str) -> usize {
        self.materials.borrow().get(name).map_or(0, |node| node.reference_count)
    }

    pub fn len(&self) -> usize {
        self.materials.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.materials.borrow().is_empty()
    }
}
