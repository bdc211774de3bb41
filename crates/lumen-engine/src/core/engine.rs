use std::rc::Rc;

use crate::assets::{AssetLoader, AssetManager};
use crate::device::GpuBackend;
use crate::graphics::{Color, Material, MaterialManager, TextureManager};
use crate::message::{MessageBus, MessageBusConfig};

/// Engine construction parameters.
#[derive(Debug, Clone, Default)]
pub struct EngineConfig {
    pub bus: MessageBusConfig,
}

/// What one [`Engine::update`] did.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct EngineTick {
    /// Index of the tick, starting at 0.
    pub frame_index: u64,
    /// Load results applied by the asset manager.
    pub completions: usize,
    /// Deferred bus messages delivered.
    pub messages_delivered: usize,
}

/// The resource core: message bus, asset cache, texture and material managers.
pub struct Engine {
    backend: Rc<dyn GpuBackend>,
    bus: Rc<MessageBus>,
    assets: Rc<AssetManager>,
    textures: Rc<TextureManager>,
    materials: MaterialManager,
    frame_index: u64,
}

impl Engine {
    pub fn new(backend: Rc<dyn GpuBackend>, config: EngineConfig) -> Self {
        let bus = Rc::new(MessageBus::new(config.bus));
        let assets = Rc::new(AssetManager::new(Rc::clone(&bus)));
        let textures = Rc::new(TextureManager::new(
            Rc::clone(&backend),
            Rc::clone(&bus),
            Rc::clone(&assets),
        ));

        log::debug!("engine services created");

        Self {
            backend,
            bus,
            assets,
            textures,
            materials: MaterialManager::new(),
            frame_index: 0,
        }
    }

    #[inline]
    pub fn backend(&self) -> &Rc<dyn GpuBackend> {
        &self.backend
    }

    #[inline]
    pub fn bus(&self) -> &Rc<MessageBus> {
        &self.bus
    }

    #[inline]
    pub fn assets(&self) -> &Rc<AssetManager> {
        &self.assets
    }

    #[inline]
    pub fn textures(&self) -> &Rc<TextureManager> {
        &self.textures
    }

    #[inline]
    pub fn materials(&self) -> &MaterialManager {
        &self.materials
    }

    /// Number of completed ticks.
    #[inline]
    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }

    pub fn register_loader(&self, loader: impl AssetLoader + 'static) {
        self.assets.register_loader(loader);
    }

    /// Builds a material on this engine's texture manager and registers it.
    ///
    /// Returns `false` if `name` is already registered.
    pub fn register_material(&self, name: &str, diffuse_texture_name: &str, tint: Color) -> bool {
        let material = Material::new(name, diffuse_texture_name, tint, &self.textures);
        self.materials.register_material(material)
    }

    /// Runs one frame of resource work.
    ///
    /// Load results are applied first so the messages they post can be
    /// delivered in the same tick.
    pub fn update(&mut self) -> EngineTick {
        let completions = self.assets.poll_completions();
        let messages_delivered = self.bus.update();

        let tick = EngineTick {
            frame_index: self.frame_index,
            completions,
            messages_delivered,
        };
        self.frame_index += 1;

        if completions > 0 || messages_delivered > 0 {
            log::trace!("{tick:?}");
        }
        tick
    }
}
