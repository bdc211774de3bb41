use std::sync::mpsc::Sender;

use super::asset::{Asset, AssetData};
use super::error::AssetError;

/// Result of one loader invocation, as seen by the asset manager.
#[derive(Debug)]
pub(crate) enum LoadOutcome {
    Loaded(Asset),
    Failed { name: String, error: AssetError },
}

/// One-shot completion handed to an [`AssetLoader`](super::AssetLoader).
///
/// The loader resolves it exactly once with [`complete`](Self::complete) or
/// [`fail`](Self::fail), from any thread. Dropping it unresolved reports
/// [`AssetError::Unresolved`]. The result is only acted on when the owning
/// manager next polls, never inside this call.
#[derive(Debug)]
pub struct AssetCompletion {
    name: String,
    tx: Option<Sender<LoadOutcome>>,
}

impl AssetCompletion {
    pub(crate) fn new(name: impl Into<String>, tx: Sender<LoadOutcome>) -> Self {
        Self {
            name: name.into(),
            tx: Some(tx),
        }
    }

    /// Name of the asset being loaded.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Reports a successful decode.
    pub fn complete(mut self, data: AssetData) {
        let asset = Asset::new(self.name.clone(), data);
        self.resolve(LoadOutcome::Loaded(asset));
    }

    /// Reports a failed load. The asset stays unavailable.
    pub fn fail(mut self, error: AssetError) {
        let name = self.name.clone();
        self.resolve(LoadOutcome::Failed { name, error });
    }

    fn resolve(&mut self, outcome: LoadOutcome) {
        let Some(tx) = self.tx.take() else { return };
        if tx.send(outcome).is_err() {
            log::debug!("asset manager is gone; discarding result for `{}`", self.name);
        }
    }
}

impl Drop for AssetCompletion {
    fn drop(&mut self) {
        if self.tx.is_some() {
            let name = self.name.clone();
            self.resolve(LoadOutcome::Failed { name, error: AssetError::Unresolved });
        }
    }
}
