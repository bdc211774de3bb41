//! Asset loading and caching.
//!
//! An [`AssetManager`] maps asset names to loaders chosen by file extension,
//! caches every decoded [`Asset`] for its own lifetime, and announces each
//! completed load on the message bus as `ASSET_LOADED::<name>`.
//!
//! Loaders decode off the frame thread and hand their result to an
//! [`AssetCompletion`]. Results are picked up by
//! [`AssetManager::poll_completions`] during the engine tick, so every
//! observable state change happens on the thread that owns the engine.

mod asset;
mod completion;
mod error;
mod image_loader;
mod manager;

pub use asset::{Asset, AssetData};
pub use completion::AssetCompletion;
pub use error::AssetError;
pub use image_loader::{decode_image, ImageAssetLoader, IMAGE_EXTENSIONS};
pub use manager::{asset_loaded_code, AssetLoader, AssetManager, ASSET_LOADED_PREFIX};
