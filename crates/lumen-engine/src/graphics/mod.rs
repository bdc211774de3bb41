//! Renderable resources and their shared-ownership managers.
//!
//! Ownership model:
//! - [`TextureManager`] and [`MaterialManager`] hold one counted node per name
//! - owners acquire with `get_*` and give back with `release_*`
//! - the GPU object is destroyed in the same call that drops the count to zero
//!
//! Textures come up as a 1x1 white placeholder and upgrade themselves when the
//! asset with their name is announced on the message bus.

mod color;
mod material;
mod material_manager;
mod sprite;
mod texture;
mod texture_manager;

pub use color::Color;
pub use material::Material;
pub use material_manager::{MaterialManager, MaterialRef};
pub use sprite::{Sprite, SPRITE_VERTEX_COUNT, SPRITE_VERTEX_STRIDE};
pub use texture::{Texture, TextureRef, PLACEHOLDER_PIXEL};
pub use texture_manager::TextureManager;
