//! Shared fixtures for unit tests.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use image::RgbaImage;

use crate::assets::{AssetCompletion, AssetData, AssetLoader, AssetManager};
use crate::device::{GpuBackend, RecordingBackend};
use crate::graphics::TextureManager;
use crate::message::MessageBus;

/// Loader that parks every request until the test resolves it.
pub(crate) struct ManualLoader {
    extensions: &'static [&'static str],
    probe: LoaderProbe,
}

impl ManualLoader {
    pub(crate) fn new(extensions: &'static [&'static str]) -> (Self, LoaderProbe) {
        let probe = LoaderProbe::default();
        (Self { extensions, probe: probe.clone() }, probe)
    }
}

impl AssetLoader for ManualLoader {
    fn supported_extensions(&self) -> &[&str] {
        self.extensions
    }

    fn load_asset(&self, _name: &str, completion: AssetCompletion) {
        self.probe.calls.set(self.probe.calls.get() + 1);
        self.probe.pending.borrow_mut().push(completion);
    }
}

/// Test-side view of a [`ManualLoader`].
#[derive(Clone, Default)]
pub(crate) struct LoaderProbe {
    pending: Rc<RefCell<Vec<AssetCompletion>>>,
    calls: Rc<Cell<usize>>,
}

impl LoaderProbe {
    pub(crate) fn calls(&self) -> usize {
        self.calls.get()
    }

    pub(crate) fn pending(&self) -> usize {
        self.pending.borrow().len()
    }

    /// Removes the parked completion for `name`.
    pub(crate) fn take(&self, name: &str) -> Option<AssetCompletion> {
        let mut pending = self.pending.borrow_mut();
        let index = pending.iter().position(|c| c.name() == name)?;
        Some(pending.remove(index))
    }

    /// Resolves the parked request for `name` with `data`.
    pub(crate) fn complete(&self, name: &str, data: AssetData) {
        let completion = self.take(name).unwrap_or_else(|| panic!("no pending load for `{name}`"));
        completion.complete(data);
    }

    /// Drops every parked request unresolved.
    pub(crate) fn drop_all(&self) {
        self.pending.borrow_mut().clear();
    }
}

pub(crate) fn image(width: u32, height: u32) -> AssetData {
    AssetData::Image(RgbaImage::new(width, height))
}

/// Bus, asset manager, recording GPU and texture manager wired together, with a
/// manual loader for png/jpg.
pub(crate) struct Services {
    pub bus: Rc<MessageBus>,
    pub assets: Rc<AssetManager>,
    pub gpu: Rc<RecordingBackend>,
    pub textures: Rc<TextureManager>,
    pub loader: LoaderProbe,
}

impl Services {
    pub(crate) fn new() -> Self {
        let bus = Rc::new(MessageBus::default());
        let assets = Rc::new(AssetManager::new(Rc::clone(&bus)));
        let (loader, probe) = ManualLoader::new(&["png", "jpg"]);
        assets.register_loader(loader);

        let gpu = Rc::new(RecordingBackend::new());
        let backend: Rc<dyn GpuBackend> = gpu.clone();
        let textures = Rc::new(TextureManager::new(backend, Rc::clone(&bus), Rc::clone(&assets)));

        Self { bus, assets, gpu, textures, loader: probe }
    }

    /// Completes the pending load of `name` and runs one engine tick.
    pub(crate) fn finish_load(&self, name: &str, width: u32, height: u32) {
        self.loader.complete(name, image(width, height));
        self.assets.poll_completions();
        self.bus.update();
    }
}
