use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;
use std::sync::mpsc::{self, Receiver, Sender};

use crate::message::{Message, MessageBus, MessageContext, MessageSender};

use super::asset::Asset;
use super::completion::{AssetCompletion, LoadOutcome};

/// Prefix of the message code announcing a loaded asset.
///
/// The full code is the prefix followed by the exact asset name. A subscriber
/// that spells the name differently never hears about the load.
pub const ASSET_LOADED_PREFIX: &str = "ASSET_LOADED::";

/// Message code posted when `name` finishes loading.
#[inline]
pub fn asset_loaded_code(name: &str) -> String {
    format!("{ASSET_LOADED_PREFIX}{name}")
}

/// Loads assets of one or more file types.
pub trait AssetLoader {
    /// Lower-case file extensions handled by this loader, without the dot.
    fn supported_extensions(&self) -> &[&str];

    /// Starts loading `name`.
    ///
    /// Must not block on the decode. The loader owns `completion` and resolves
    /// it once the data is ready, or fails it.
    fn load_asset(&self, name: &str, completion: AssetCompletion);
}

/// Extension-dispatched asset cache.
///
/// Loaded assets are kept until the manager is dropped; there is no eviction.
pub struct AssetManager {
    bus: Rc<MessageBus>,
    loaders: RefCell<Vec<Box<dyn AssetLoader>>>,
    loaded: RefCell<HashMap<String, Rc<Asset>>>,
    // Names handed to a loader whose result has not been polled yet.
    in_flight: RefCell<HashSet<String>>,
    completion_tx: Sender<LoadOutcome>,
    completion_rx: Receiver<LoadOutcome>,
}

impl AssetManager {
    pub fn new(bus: Rc<MessageBus>) -> Self {
        let (completion_tx, completion_rx) = mpsc::channel();
        Self {
            bus,
            loaders: RefCell::new(Vec::new()),
            loaded: RefCell::new(HashMap::new()),
            in_flight: RefCell::new(HashSet::new()),
            completion_tx,
            completion_rx,
        }
    }

    /// Appends a loader. Earlier registrations win on shared extensions.
    pub fn register_loader(&self, loader: impl AssetLoader + 'static) {
        self.loaders.borrow_mut().push(Box::new(loader));
    }

    /// Starts loading `name` with the first loader that handles its extension.
    ///
    /// Does nothing while a load of `name` is already outstanding. Without a
    /// matching loader a warning is logged and the asset stays unavailable.
    pub fn load_asset(&self, name: &str) {
        if self.in_flight.borrow().contains(name) {
            log::debug!("asset `{name}` is already loading");
            return;
        }

        let extension = extension_of(name);
        let loaders = self.loaders.borrow();
        let Some(loader) = loaders
            .iter()
            .find(|loader| loader.supported_extensions().contains(&extension.as_str()))
        else {
            log::warn!(
                "unable to load asset `{name}` with extension `{extension}` because there is no loader associated with it"
            );
            return;
        };

        self.in_flight.borrow_mut().insert(name.to_owned());
        log::debug!("loading asset `{name}`");
        loader.load_asset(name, AssetCompletion::new(name, self.completion_tx.clone()));
    }

    /// Caches `asset` and announces it with a NORMAL priority message.
    ///
    /// A previously cached asset of the same name is replaced.
    pub fn on_asset_loaded(&self, asset: Asset) {
        let asset = Rc::new(asset);
        let name = asset.name().to_owned();

        self.in_flight.borrow_mut().remove(&name);
        self.loaded.borrow_mut().insert(name.clone(), Rc::clone(&asset));
        log::debug!("asset `{name}` loaded");

        Message::send(
            &self.bus,
            asset_loaded_code(&name),
            MessageSender::AssetManager,
            MessageContext::Asset(asset),
        );
    }

    /// Applies every load result reported since the last poll.
    ///
    /// Returns how many results were processed.
    pub fn poll_completions(&self) -> usize {
        let mut processed = 0;

        while let Ok(outcome) = self.completion_rx.try_recv() {
            processed += 1;
            match outcome {
                LoadOutcome::Loaded(asset) => self.on_asset_loaded(asset),
                LoadOutcome::Failed { name, error } => {
                    self.in_flight.borrow_mut().remove(&name);
                    log::warn!("failed to load asset `{name}`: {error}");
                }
            }
        }

        processed
    }

    pub fn is_asset_loaded(&self, name: &str) -> bool {
        self.loaded.borrow().contains_key(name)
    }

    /// `true` while a loader is working on `name`.
    pub fn is_loading(&self, name: &str) -> bool {
        self.in_flight.borrow().contains(name)
    }

    /// Returns the cached asset, or starts loading it and returns `None`.
    ///
    /// `None` is the normal answer while a decode is in progress.
    pub fn get_asset(&self, name: &str) -> Option<Rc<Asset>> {
        let cached = self.loaded.borrow().get(name).cloned();
        if cached.is_none() {
            self.load_asset(name);
        }
        cached
    }

    pub fn loaded_count(&self) -> usize {
        self.loaded.borrow().len()
    }
}

/// Lower-cased text after the last `.`, or an empty string.
fn extension_of(name: &str) -> String {
    name.rsplit_once('.')
        .map(|(_, extension)| extension.to_ascii_lowercase())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::AssetError;
    use crate::message::{HandlerRef, MessageHandler};
    use crate::testing::{image, LoaderProbe, ManualLoader};

    struct Fixture {
        bus: Rc<MessageBus>,
        assets: AssetManager,
        loader: LoaderProbe,
    }

    fn fixture(extensions: &'static [&'static str]) -> Fixture {
        let bus = Rc::new(MessageBus::default());
        let assets = AssetManager::new(Rc::clone(&bus));
        let (loader, probe) = ManualLoader::new(extensions);
        assets.register_loader(loader);
        Fixture { bus, assets, loader: probe }
    }

    #[derive(Default)]
    struct Seen(Vec<String>);

    impl MessageHandler for Seen {
        fn on_message(&mut self, message: &Message) {
            if let Some(asset) = message.context().as_asset() {
                self.0.push(asset.name().to_owned());
            }
        }
    }

    // ── extension dispatch ────────────────────────────────────────────────

    #[test]
    fn extension_is_lowercased_last_segment() {
        assert_eq!(extension_of("textures/crate.PNG"), "png");
        assert_eq!(extension_of("archive.tar.gz"), "gz");
        assert_eq!(extension_of("no_extension"), "");
    }

    #[test]
    fn first_matching_loader_wins() {
        let f = fixture(&["png"]);
        let (second, second_probe) = ManualLoader::new(&["png", "jpg"]);
        f.assets.register_loader(second);

        f.assets.load_asset("a.png");
        f.assets.load_asset("b.jpg");

        assert_eq!(f.loader.calls(), 1);
        assert_eq!(second_probe.calls(), 1);
    }

    #[test]
    fn unknown_extension_is_never_loaded() {
        let f = fixture(&["png"]);

        f.assets.load_asset("x.unknownext");
        assert!(f.assets.get_asset("x.unknownext").is_none());
        f.assets.poll_completions();

        assert_eq!(f.loader.calls(), 0);
        assert!(!f.assets.is_asset_loaded("x.unknownext"));
        assert!(!f.assets.is_loading("x.unknownext"));
    }

    // ── load lifecycle ────────────────────────────────────────────────────

    #[test]
    fn completion_caches_asset_and_posts_message() {
        let f = fixture(&["png"]);
        let seen = Rc::new(RefCell::new(Seen::default()));
        let handler: HandlerRef = seen.clone();
        f.bus.subscribe(&asset_loaded_code("crate.png"), &handler);

        f.assets.load_asset("crate.png");
        assert!(f.assets.is_loading("crate.png"));

        f.loader.complete("crate.png", image(4, 2));

        // Nothing is observable until the manager polls.
        assert!(!f.assets.is_asset_loaded("crate.png"));
        assert_eq!(f.assets.poll_completions(), 1);
        assert!(f.assets.is_asset_loaded("crate.png"));
        assert!(!f.assets.is_loading("crate.png"));

        let asset = f.assets.get_asset("crate.png").unwrap();
        assert_eq!(asset.dimensions(), Some((4, 2)));

        // NORMAL priority: delivered on the bus tick.
        assert!(seen.borrow().0.is_empty());
        f.bus.update();
        assert_eq!(seen.borrow().0, vec!["crate.png".to_owned()]);
    }

    #[test]
    fn repeated_get_before_completion_loads_once() {
        let f = fixture(&["png"]);

        for _ in 0..5 {
            assert!(f.assets.get_asset("crate.png").is_none());
        }
        assert_eq!(f.loader.calls(), 1);

        f.loader.complete("crate.png", image(1, 1));
        f.assets.poll_completions();
        assert!(f.assets.get_asset("crate.png").is_some());
        assert_eq!(f.loader.calls(), 1);
    }

    #[test]
    fn failed_load_can_be_retried() {
        let f = fixture(&["png"]);

        f.assets.load_asset("broken.png");
        f.loader
            .take("broken.png")
            .unwrap()
            .fail(AssetError::Other("corrupt header".into()));
        f.assets.poll_completions();

        assert!(!f.assets.is_asset_loaded("broken.png"));
        assert!(!f.assets.is_loading("broken.png"));

        f.assets.load_asset("broken.png");
        assert_eq!(f.loader.calls(), 2);
    }

    #[test]
    fn dropped_completion_counts_as_failure() {
        let f = fixture(&["png"]);

        f.assets.load_asset("lost.png");
        assert_eq!(f.loader.pending(), 1);
        f.loader.drop_all();

        assert_eq!(f.assets.poll_completions(), 1);
        assert!(!f.assets.is_loading("lost.png"));
        assert!(!f.assets.is_asset_loaded("lost.png"));
    }

    #[test]
    fn reloaded_asset_replaces_cached_value() {
        let f = fixture(&["png"]);

        f.assets.on_asset_loaded(Asset::new("a.png", image(1, 1)));
        f.assets.on_asset_loaded(Asset::new("a.png", image(8, 8)));

        assert_eq!(f.assets.loaded_count(), 1);
        assert_eq!(f.assets.get_asset("a.png").unwrap().dimensions(), Some((8, 8)));
        assert_eq!(f.bus.pending_count(), 0); // nobody subscribed
    }

    #[test]
    fn completion_from_another_thread_is_delivered() {
        let f = fixture(&["png"]);

        f.assets.load_asset("threaded.png");
        let completion = f.loader.take("threaded.png").unwrap();
        std::thread::spawn(move || completion.complete(image(2, 2)))
            .join()
            .unwrap();

        assert_eq!(f.assets.poll_completions(), 1);
        assert!(f.assets.is_asset_loaded("threaded.png"));
    }
}
