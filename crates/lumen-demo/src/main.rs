//! Headless walk through the resource lifecycle.
//!
//! Usage: `lumen-demo [ASSET_ROOT] [TEXTURE]`
//!
//! Registers a material on `TEXTURE`, loads a sprite with it, ticks until the
//! image has replaced the placeholder, then releases everything and reports
//! what is still alive on the GPU.

use std::rc::Rc;
use std::time::Duration;

use anyhow::{Context, Result};
use lumen_engine::assets::ImageAssetLoader;
use lumen_engine::core::{Engine, EngineConfig};
use lumen_engine::device::{Gpu, GpuBackend, GpuInit, WgpuBackend};
use lumen_engine::graphics::{Color, Sprite};
use lumen_engine::logging::{init_logging, LoggingConfig};

const FRAME: Duration = Duration::from_millis(16);
const MAX_FRAMES: u64 = 600;

fn main() -> Result<()> {
    init_logging(LoggingConfig::default());

    let mut args = std::env::args().skip(1);
    let asset_root = args.next().unwrap_or_else(|| "assets".to_owned());
    let texture_name = args.next().unwrap_or_else(|| "textures/crate.jpg".to_owned());

    let gpu = Gpu::headless_blocking(GpuInit::default()).context("failed to initialize the GPU")?;
    let wgpu_backend = Rc::new(WgpuBackend::new(gpu));
    let backend: Rc<dyn GpuBackend> = wgpu_backend.clone();

    let mut engine = Engine::new(backend, EngineConfig::default());
    engine.register_loader(ImageAssetLoader::new(&asset_root));
    engine.register_material("crate", &texture_name, Color::new(0, 128, 255, 255));

    let mut sprite = Sprite::with_default_size("test", "crate");
    if !sprite.load(engine.materials()) {
        anyhow::bail!("sprite `{}` could not acquire its material", sprite.name());
    }

    let texture = sprite
        .material()
        .and_then(|material| material.borrow().diffuse_texture().cloned())
        .context("material has no diffuse texture")?;

    while !texture.borrow().is_loaded() && engine.frame_index() < MAX_FRAMES {
        engine.update();
        std::thread::sleep(FRAME);
    }

    {
        let texture = texture.borrow();
        if texture.is_loaded() {
            log::info!(
                "`{}` loaded as {}x{} after {} frames",
                texture.name(),
                texture.width(),
                texture.height(),
                engine.frame_index()
            );
        } else {
            log::warn!(
                "`{}` is still a placeholder after {} frames",
                texture.name(),
                engine.frame_index()
            );
        }
    }
    drop(texture);

    sprite.destroy(engine.materials());
    engine.materials().release_material("crate");

    log::info!(
        "released; {} GPU textures still alive",
        wgpu_backend.live_texture_count()
    );
    Ok(())
}
