//! Lumen engine crate.
//!
//! This crate owns the resource lifecycle core of the renderer: the message bus,
//! the asset cache and its loaders, and the reference-counted texture and
//! material managers that sit on top of a pluggable GPU backend.

pub mod message;
pub mod assets;
pub mod device;
pub mod graphics;
pub mod core;

pub mod logging;

#[cfg(test)]
pub(crate) mod testing;
