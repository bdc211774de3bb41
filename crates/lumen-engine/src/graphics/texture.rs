use std::cell::RefCell;
use std::rc::{Rc, Weak};

use crate::assets::{asset_loaded_code, Asset, AssetManager};
use crate::device::{GpuBackend, SamplerConfig, TextureId};
use crate::message::{HandlerRef, Message, MessageBus, MessageHandler};

/// Pixel shown until the real image arrives: opaque white, so tinting still
/// reads correctly.
pub const PLACEHOLDER_PIXEL: [u8; 4] = [255, 255, 255, 255];

/// Shared handle to a texture owned by the [`TextureManager`](super::TextureManager).
pub type TextureRef = Rc<RefCell<Texture>>;

/// A GPU texture backed by a named image asset.
///
/// Lifecycle: placeholder (1x1) → loaded. The transition happens once the
/// asset named like the texture is available, either at construction or when
/// its `ASSET_LOADED::<name>` message is delivered. There is no way back.
pub struct Texture {
    name: String,
    handle: Option<TextureId>,
    width: u32,
    height: u32,
    is_loaded: bool,

    backend: Rc<dyn GpuBackend>,
    bus: Rc<MessageBus>,
    // Our own allocation, for unsubscribing on destroy.
    self_ref: Weak<RefCell<Texture>>,
}

impl Texture {
    /// Allocates the GPU object, uploads the placeholder, subscribes for the
    /// load message, and picks up the asset right away if it is cached.
    ///
    /// Reaching the asset manager also starts the load on a cache miss.
    pub(crate) fn create(
        name: &str,
        backend: Rc<dyn GpuBackend>,
        bus: Rc<MessageBus>,
        assets: &AssetManager,
    ) -> TextureRef {
        let handle = backend.create_texture();
        let texture = Rc::new_cyclic(|self_ref| {
            RefCell::new(Texture {
                name: name.to_owned(),
                handle: Some(handle),
                width: 1,
                height: 1,
                is_loaded: false,
                backend: Rc::clone(&backend),
                bus: Rc::clone(&bus),
                self_ref: self_ref.clone(),
            })
        });

        texture.borrow().bind();
        backend.upload_pixels(handle, 1, 1, &PLACEHOLDER_PIXEL);

        let handler: HandlerRef = texture.clone();
        bus.subscribe(&asset_loaded_code(name), &handler);

        // The asset may have finished before we subscribed.
        if let Some(asset) = assets.get_asset(name) {
            texture.borrow_mut().load_from_asset(&asset);
        }

        log::debug!("texture `{name}` created as {handle:?}");
        texture
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// `None` once destroyed.
    #[inline]
    pub fn handle(&self) -> Option<TextureId> {
        self.handle
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// `false` while the placeholder pixel is showing.
    #[inline]
    pub fn is_loaded(&self) -> bool {
        self.is_loaded
    }

    /// Binds this texture to `unit`.
    pub fn activate_and_bind(&self, unit: u32) {
        if let Some(handle) = self.handle {
            self.backend.bind_texture(handle, unit);
        }
    }

    /// Binds this texture to unit 0.
    pub fn bind(&self) {
        self.activate_and_bind(0);
    }

    /// Clears unit 0.
    pub fn unbind(&self) {
        self.backend.unbind_texture(0);
    }

    /// Stops listening for the asset and frees the GPU object.
    ///
    /// Only the texture manager calls this, when the last reference goes away.
    pub(crate) fn destroy(&mut self) {
        if let Some(this) = self.self_ref.upgrade() {
            let handler: HandlerRef = this;
            self.bus.unsubscribe(&asset_loaded_code(&self.name), &handler);
        }

        if let Some(handle) = self.handle.take() {
            self.backend.destroy_texture(handle);
            log::debug!("texture `{}` destroyed", self.name);
        }
    }

    fn load_from_asset(&mut self, asset: &Asset) {
        let Some(handle) = self.handle else {
            log::debug!("texture `{}` was destroyed; ignoring late asset", self.name);
            return;
        };
        let Some(image) = asset.data().as_image() else {
            log::warn!("asset `{}` is not an image; texture left unchanged", asset.name());
            return;
        };

        self.width = image.width();
        self.height = image.height();

        self.bind();
        self.backend.upload_pixels(handle, self.width, self.height, image.as_raw());

        // Mips and repeat wrapping need power-of-two dimensions.
        let sampler = if self.is_power_of_two() {
            self.backend.generate_mipmaps(handle);
            SamplerConfig::mipmapped()
        } else {
            SamplerConfig::clamped_nearest()
        };
        self.backend.set_sampling(handle, sampler);

        self.is_loaded = true;
        log::debug!("texture `{}` loaded ({}x{})", self.name, self.width, self.height);
    }

    fn is_power_of_two(&self) -> bool {
        self.width.is_power_of_two() && self.height.is_power_of_two()
    }
}

impl MessageHandler for Texture {
    fn on_message(&mut self, message: &Message) {
        if message.code() != asset_loaded_code(&self.name) {
            return;
        }

        match message.context().as_asset() {
            Some(asset) => self.load_from_asset(asset),
            None => log::warn!("{message} carried no asset"),
        }
    }
}
