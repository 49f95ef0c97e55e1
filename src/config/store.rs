//! Holder of the live configuration value.
//!
//! The live value sits behind an `ArcSwapOption`: readers get a complete
//! value or nothing, and a swap replaces the whole reference at once.
//! Callers that need to mutate get an owned duplicate via [`ConfigStore::snapshot`].

use arc_swap::ArcSwapOption;
use std::sync::Arc;

use crate::error::ConfigError;

pub struct ConfigStore<T> {
    live: ArcSwapOption<T>,
}

impl<T: Clone> ConfigStore<T> {
    /// An empty store; nothing is live until [`ConfigStore::install`].
    pub fn new() -> Self {
        Self {
            live: ArcSwapOption::empty(),
        }
    }

    /// Install the initial value. Fails if a value is already live.
    pub fn install(&self, initial: T) -> Result<(), ConfigError> {
        let previous = self
            .live
            .compare_and_swap(&None::<Arc<T>>, Some(Arc::new(initial)));
        if previous.is_some() {
            return Err(ConfigError::AlreadyManaged);
        }
        Ok(())
    }

    pub fn is_installed(&self) -> bool {
        self.live.load().is_some()
    }

    /// Shared handle to the live value.
    pub fn load(&self) -> Option<Arc<T>> {
        self.live.load_full()
    }

    /// Owned duplicate of the live value, independent of later swaps.
    pub fn snapshot(&self) -> Option<T> {
        self.live.load().as_deref().cloned()
    }

    /// Replace the live value, returning the superseded one.
    pub fn swap(&self, value: T) -> Option<Arc<T>> {
        self.live.swap(Some(Arc::new(value)))
    }

    /// Drop the live value, returning the store to its empty state.
    pub fn clear(&self) -> Option<Arc<T>> {
        self.live.swap(None)
    }
}

impl<T: Clone> Default for ConfigStore<T> {
    fn default() -> Self {
        Self::new()
    }
}
