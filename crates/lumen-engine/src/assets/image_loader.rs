use std::path::{Path, PathBuf};
use std::thread;

use image::RgbaImage;

use super::asset::AssetData;
use super::completion::AssetCompletion;
use super::error::AssetError;
use super::manager::AssetLoader;

/// Extensions decoded by [`ImageAssetLoader`].
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "gif", "jpg", "jpeg", "bmp"];

/// Decodes image files from disk on a background thread.
///
/// Asset names are paths relative to `root`. Every load spawns a short-lived
/// decode thread; the decoded RGBA8 image is handed back through the
/// completion.
#[derive(Debug, Clone)]
pub struct ImageAssetLoader {
    root: PathBuf,
}

impl ImageAssetLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[inline]
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl Default for ImageAssetLoader {
    fn default() -> Self {
        Self::new(".")
    }
}

impl AssetLoader for ImageAssetLoader {
    fn supported_extensions(&self) -> &[&str] {
        IMAGE_EXTENSIONS
    }

    fn load_asset(&self, name: &str, completion: AssetCompletion) {
        let path = self.root.join(name);
        let name = name.to_owned();

        let spawned = thread::Builder::new()
            .name(format!("lumen-decode {name}"))
            .spawn(move || match decode_image(&name, &path) {
                Ok(image) => {
                    log::debug!("decoded `{name}` ({}x{})", image.width(), image.height());
                    completion.complete(AssetData::Image(image));
                }
                Err(err) => completion.fail(err),
            });

        // On spawn failure the closure, and the completion in it, is dropped,
        // which reports the load as unresolved.
        if let Err(err) = spawned {
            log::warn!("failed to spawn image decode thread: {err}");
        }
    }
}

/// Reads and decodes the image at `path` into RGBA8.
pub fn decode_image(name: &str, path: &Path) -> Result<RgbaImage, AssetError> {
    let bytes = std::fs::read(path).map_err(|source| AssetError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let decoded = image::load_from_memory(&bytes).map_err(|source| AssetError::Decode {
        name: name.to_owned(),
        source,
    })?;

    Ok(decoded.to_rgba8())
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;
    use std::rc::Rc;
    use std::time::{Duration, Instant};

    use image::{ImageFormat, Rgba};

    use super::*;
    use crate::assets::AssetManager;
    use crate::message::MessageBus;

    fn scratch_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("lumen-{tag}-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn write_png(dir: &Path, file: &str, w: u32, h: u32) {
        let image = RgbaImage::from_pixel(w, h, Rgba([10, 20, 30, 255]));
        let mut bytes = Vec::new();
        image.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png).unwrap();
        std::fs::write(dir.join(file), bytes).unwrap();
    }

    fn poll_until(assets: &AssetManager, done: impl Fn(&AssetManager) -> bool) {
        let deadline = Instant::now() + Duration::from_secs(10);
        while !done(assets) && Instant::now() < deadline {
            assets.poll_completions();
            std::thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn handles_common_image_extensions() {
        let loader = ImageAssetLoader::default();
        for ext in ["png", "gif", "jpg"] {
            assert!(loader.supported_extensions().contains(&ext));
        }
        assert!(!loader.supported_extensions().contains(&"txt"));
    }

    #[test]
    fn decode_reads_rgba_pixels() {
        let dir = scratch_dir("decode");
        write_png(&dir, "tile.png", 3, 5);

        let image = decode_image("tile.png", &dir.join("tile.png")).unwrap();
        assert_eq!(image.dimensions(), (3, 5));
        assert_eq!(image.get_pixel(0, 0), &Rgba([10, 20, 30, 255]));
    }

    #[test]
    fn decode_reports_missing_file_and_garbage() {
        let dir = scratch_dir("errors");
        let missing = decode_image("nope.png", &dir.join("nope.png"));
        assert!(matches!(missing, Err(AssetError::Io { .. })));

        std::fs::write(dir.join("garbage.png"), b"definitely not a png").unwrap();
        let garbage = decode_image("garbage.png", &dir.join("garbage.png"));
        assert!(matches!(garbage, Err(AssetError::Decode { .. })));
    }

    #[test]
    fn loads_through_asset_manager() {
        let dir = scratch_dir("manager");
        write_png(&dir, "crate.png", 16, 8);

        let assets = AssetManager::new(Rc::new(MessageBus::default()));
        assets.register_loader(ImageAssetLoader::new(&dir));
        assert!(assets.get_asset("crate.png").is_none());

        poll_until(&assets, |a| a.is_asset_loaded("crate.png"));

        let asset = assets.get_asset("crate.png").unwrap();
        assert_eq!(asset.dimensions(), Some((16, 8)));
    }

    #[test]
    fn missing_file_never_loads() {
        let dir = scratch_dir("missing");
        let assets = AssetManager::new(Rc::new(MessageBus::default()));
        assets.register_loader(ImageAssetLoader::new(&dir));

        assets.load_asset("ghost.png");
        poll_until(&assets, |a| !a.is_loading("ghost.png"));

        assert!(!assets.is_loading("ghost.png"));
        assert!(!assets.is_asset_loaded("ghost.png"));
    }
}
