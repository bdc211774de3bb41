use std::cell::{Cell, RefCell};
use std::collections::HashMap;

use super::backend::{GpuBackend, SamplerConfig, TextureId};

/// One call made against a [`RecordingBackend`].
#[derive(Debug, Clone, PartialEq)]
pub enum GpuCommand {
    CreateTexture(TextureId),
    UploadPixels { id: TextureId, width: u32, height: u32 },
    SetSampling { id: TextureId, sampler: SamplerConfig },
    GenerateMipmaps(TextureId),
    BindTexture { id: TextureId, unit: u32 },
    UnbindTexture { unit: u32 },
    DestroyTexture(TextureId),
}

#[derive(Debug, Default)]
struct RecordedTexture {
    size: (u32, u32),
    sampler: Option<SamplerConfig>,
    mipmapped: bool,
}

/// GPU-less backend that records every call.
///
/// Tracks which textures are alive so that lifecycle bugs (double destroy,
/// use after destroy, leaks) are visible without a device.
#[derive(Debug, Default)]
pub struct RecordingBackend {
    next_id: Cell<u64>,
    commands: RefCell<Vec<GpuCommand>>,
    live: RefCell<HashMap<TextureId, RecordedTexture>>,
    misuse: Cell<usize>,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the command log.
    pub fn commands(&self) -> Vec<GpuCommand> {
        self.commands.borrow().clone()
    }

    /// Number of recorded commands matching `predicate`.
    pub fn count(&self, predicate: impl Fn(&GpuCommand) -> bool) -> usize {
        self.commands.borrow().iter().filter(|c| predicate(c)).count()
    }

    pub fn clear_commands(&self) {
        self.commands.borrow_mut().clear();
    }

    pub fn live_texture_count(&self) -> usize {
        self.live.borrow().len()
    }

    pub fn is_live(&self, id: TextureId) -> bool {
        self.live.borrow().contains_key(&id)
    }

    /// Size of the last upload to `id`, while it is alive.
    pub fn texture_size(&self, id: TextureId) -> Option<(u32, u32)> {
        self.live.borrow().get(&id).map(|t| t.size)
    }

    pub fn sampler(&self, id: TextureId) -> Option<SamplerConfig> {
        self.live.borrow().get(&id).and_then(|t| t.sampler)
    }

    pub fn has_mipmaps(&self, id: TextureId) -> bool {
        self.live.borrow().get(&id).is_some_and(|t| t.mipmapped)
    }

    /// Calls made against dead or unknown texture ids.
    pub fn misuse_count(&self) -> usize {
        self.misuse.get()
    }

    fn record(&self, command: GpuCommand) {
        self.commands.borrow_mut().push(command);
    }

    fn with_live(&self, id: TextureId, op: &str, f: impl FnOnce(&mut RecordedTexture)) {
        match self.live.borrow_mut().get_mut(&id) {
            Some(texture) => f(texture),
            None => {
                log::warn!("{op} on dead texture {id:?}");
                self.misuse.set(self.misuse.get() + 1);
            }
        }
    }
}

impl GpuBackend for RecordingBackend {
    fn create_texture(&self) -> TextureId {
        let id = TextureId::from_raw(self.next_id.get() + 1);
        self.next_id.set(id.raw());
        self.live.borrow_mut().insert(id, RecordedTexture::default());
        self.record(GpuCommand::CreateTexture(id));
        id
    }

    fn upload_pixels(&self, id: TextureId, width: u32, height: u32, pixels: &[u8]) {
        debug_assert_eq!(pixels.len(), (width * height * 4) as usize, "pixel buffer size mismatch");
        self.record(GpuCommand::UploadPixels { id, width, height });
        self.with_live(id, "upload", |t| {
            t.size = (width, height);
            t.mipmapped = false;
        });
    }

    fn set_sampling(&self, id: TextureId, sampler: SamplerConfig) {
        self.record(GpuCommand::SetSampling { id, sampler });
        self.with_live(id, "set_sampling", |t| t.sampler = Some(sampler));
    }

    fn generate_mipmaps(&self, id: TextureId) {
        self.record(GpuCommand::GenerateMipmaps(id));
        self.with_live(id, "generate_mipmaps", |t| t.mipmapped = true);
    }

    fn bind_texture(&self, id: TextureId, unit: u32) {
        self.record(GpuCommand::BindTexture { id, unit });
        self.with_live(id, "bind", |_| {});
    }

    fn unbind_texture(&self, unit: u32) {
        self.record(GpuCommand::UnbindTexture { unit });
    }

    fn destroy_texture(&self, id: TextureId) {
        self.record(GpuCommand::DestroyTexture(id));
        if self.live.borrow_mut().remove(&id).is_none() {
            log::warn!("destroy of dead texture {id:?}");
            self.misuse.set(self.misuse.get() + 1);
        }
    }
}
