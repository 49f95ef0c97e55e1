//! Reload coordination.
//!
//! # States
//! ```text
//! Unmanaged → Bootstrapping → Active
//!     ↑            │
//!     └────────────┘  bootstrap failure
//! ```
//!
//! # Reload sequence (under the reload lock)
//! ```text
//! before = duplicate of live value
//! after  = payload decoded onto a second duplicate
//! reject after if it holds a non-finite float or cannot be decoded onto again
//! diff(before, after)          (skipped on first load)
//! swap(after)
//! enqueue notice
//! ```
//! The lock is released before notices are delivered. Notices are drained
//! in commit order by whichever thread holds the dispatch flag, so a slow
//! observer never blocks the next reload and a callback may itself reload.

use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::VecDeque;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::PathBuf;
use std::sync::Arc;

use crate::config::codec::Format;
use crate::config::diff::{diff_snapshots, ChangeSet};
use crate::config::field::{Scalar, Snapshot};
use crate::config::introspect::flatten;
use crate::config::registry::CallbackRegistry;
use crate::config::source::{ByteSource, FileSource};
use crate::config::store::ConfigStore;
use crate::error::ConfigError;
use crate::observability::metrics;

/// A configuration type the manager can hold.
///
/// The type must serialize as a struct. Two serde attributes change that:
/// a `#[serde(flatten)]` field makes the struct serialize as a map, which is
/// rejected as a `Shape` error, and a field with `skip_serializing_if` has
/// no path while its condition holds, so changes into or out of the skipped
/// value are never reported.
///
/// Float leaves must be finite. A non-finite value cannot be encoded as JSON
/// and would leave nothing to decode the next update onto.
pub trait Record: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {}

impl<T> Record for T where T: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {}

/// Lifecycle of a manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Unmanaged,
    Bootstrapping,
    Active,
}

type LoadHook = Box<dyn FnOnce() + Send>;

enum Notice {
    Loaded,
    Changed(ChangeSet),
}

/// Owns the live configuration and turns byte payloads into notifications.
pub struct ConfigManager<T> {
    store: ConfigStore<T>,
    registry: CallbackRegistry,
    source: Box<dyn ByteSource>,
    format: Format,
    state: Mutex<State>,
    load_hook: Mutex<Option<LoadHook>>,
    pending: Mutex<VecDeque<Notice>>,
    dispatching: Mutex<()>,
}

impl<T: Record> ConfigManager<T> {
    pub fn new(source: impl ByteSource + 'static, format: Format) -> Self {
        Self {
            store: ConfigStore::new(),
            registry: CallbackRegistry::new(),
            source: Box::new(source),
            format,
            state: Mutex::new(State::Unmanaged),
            load_hook: Mutex::new(None),
            pending: Mutex::new(VecDeque::new()),
            dispatching: Mutex::new(()),
        }
    }

    /// Manager backed by a file, format picked from the extension.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let format = Format::from_path(&path);
        Self::new(FileSource::new(path), format)
    }

    pub fn state(&self) -> State {
        *self.state.lock()
    }

    pub fn format(&self) -> Format {
        self.format
    }

    pub fn source(&self) -> &dyn ByteSource {
        self.source.as_ref()
    }

    /// Register a callback for changes of the field at `path`.
    pub fn on_change<F>(&self, path: impl Into<String>, callback: F)
    where
        F: Fn(&Scalar, &Scalar) + Send + Sync + 'static,
    {
        self.registry.register(path, callback);
    }

    /// Set the hook run once after the first successful load.
    pub fn on_load<F>(&self, hook: F)
    where
        F: FnOnce() + Send + 'static,
    {
        if self.state() == State::Active {
            tracing::warn!("Load hook registered after the first load, it will not run");
        }
        *self.load_hook.lock() = Some(Box::new(hook));
    }

    /// Take ownership of the configuration and perform the first load.
    ///
    /// If the source holds a payload it is decoded onto `initial`; if the
    /// source does not exist, `initial` is written to it as the baseline.
    /// Any other failure is returned as `Bootstrap` and the manager goes
    /// back to `Unmanaged`.
    pub fn manage(&self, initial: T) -> Result<(), ConfigError> {
        let mut state = self.state.lock();
        if *state != State::Unmanaged {
            return Err(ConfigError::AlreadyManaged);
        }

        let fields = flatten(&initial)?;
        check_mergeable(&initial, &fields).map_err(ConfigError::Encode)?;
        self.store.install(initial)?;
        *state = State::Bootstrapping;

        let source = self.source.describe();
        let result = match self.source.read_bytes() {
            Ok(bytes) => {
                tracing::info!(source = %source, "Loading configuration");
                self.commit(self.format, &bytes, false).map(drop)
            }
            Err(ConfigError::NotFound(_)) => {
                tracing::info!(source = %source, "Configuration not found, saving defaults");
                self.write_live().map(drop)
            }
            Err(e) => Err(e),
        };

        if let Err(e) = result {
            tracing::error!(source = %source, error = %e, "Configuration bootstrap failed");
            metrics::record_reload("bootstrap_error");
            self.store.clear();
            *state = State::Unmanaged;
            return Err(ConfigError::Bootstrap(Box::new(e)));
        }

        *state = State::Active;
        metrics::record_reload("bootstrap");
        self.pending.lock().push_back(Notice::Loaded);
        drop(state);

        self.deliver();
        Ok(())
    }

    /// Decode `payload` onto the live value, swap it in and notify observers.
    ///
    /// On failure the live value is untouched. Returns the applied changes.
    pub fn apply_update(&self, payload: &[u8]) -> Result<ChangeSet, ConfigError> {
        self.apply_update_as(self.format, payload)
    }

    /// Like [`ConfigManager::apply_update`], with a payload in `format`
    /// rather than the source's own format.
    pub fn apply_update_as(&self, format: Format, payload: &[u8]) -> Result<ChangeSet, ConfigError> {
        let state = self.state.lock();
        if *state != State::Active {
            return Err(ConfigError::NotManaged);
        }

        let changes = match self.commit(format, payload, true) {
            Ok(changes) => changes,
            Err(e) => {
                metrics::record_reload("error");
                tracing::warn!(error = %e, "Failed to update configuration, keeping current one");
                return Err(e);
            }
        };

        metrics::record_reload("ok");
        metrics::record_changes(changes.len());
        tracing::info!(changed = changes.len(), "Configuration updated");

        if !changes.is_empty() {
            self.pending.lock().push_back(Notice::Changed(changes.clone()));
        }
        drop(state);

        self.deliver();
        Ok(changes)
    }

    /// Read the source again and apply its contents.
    pub fn reload(&self) -> Result<ChangeSet, ConfigError> {
        let bytes = self.source.read_bytes().inspect_err(|e| {
            metrics::record_reload("error");
            tracing::error!(source = %self.source.describe(), error = %e, "Failed to read configuration");
        })?;
        self.apply_update(&bytes)
    }

    /// Apply a submitted payload and persist the result.
    pub fn save(&self, payload: &[u8]) -> Result<ChangeSet, ConfigError> {
        self.save_as(self.format, payload)
    }

    /// Apply a payload in `format` and persist the result in the source's format.
    ///
    /// If the write fails after the update was applied, the error is
    /// `Unpersisted` and still carries the applied changes.
    pub fn save_as(&self, format: Format, payload: &[u8]) -> Result<ChangeSet, ConfigError> {
        let changes = self.apply_update_as(format, payload)?;
        if let Err(e) = self.flush() {
            tracing::error!(source = %self.source.describe(), error = %e, "Update applied but not persisted");
            return Err(ConfigError::Unpersisted {
                changes,
                error: Box::new(e),
            });
        }
        Ok(changes)
    }

    /// Encode the live value and write it to the source.
    pub fn flush(&self) -> Result<Vec<u8>, ConfigError> {
        let bytes = self.write_live()?;
        tracing::debug!(source = %self.source.describe(), bytes = bytes.len(), "Configuration flushed");
        Ok(bytes)
    }

    /// Encode the live value without writing it anywhere.
    pub fn encode(&self) -> Result<Vec<u8>, ConfigError> {
        let live = self.current()?;
        self.format.encode(&*live)
    }

    /// Shared handle to the live value.
    pub fn current(&self) -> Result<Arc<T>, ConfigError> {
        self.store.load().ok_or(ConfigError::NotManaged)
    }

    /// Scalar leaves of the live value, for display.
    pub fn fields(&self) -> Result<Snapshot, ConfigError> {
        let live = self.current()?;
        flatten(&*live)
    }

    fn write_live(&self) -> Result<Vec<u8>, ConfigError> {
        let bytes = self.encode()?;
        self.source.write_bytes(&bytes)?;
        Ok(bytes)
    }

    /// Decode, diff and swap. Caller holds the reload lock.
    ///
    /// A decoded value that could not serve as the base of the next update
    /// is rejected like any other bad payload.
    fn commit(&self, format: Format, payload: &[u8], compare: bool) -> Result<ChangeSet, ConfigError> {
        let before = self.store.snapshot().ok_or(ConfigError::NotManaged)?;
        let after = format.decode_onto(&before, payload)?;
        let after_fields = flatten(&after)?;
        check_mergeable(&after, &after_fields).map_err(ConfigError::Decode)?;

        let changes = if compare {
            diff_snapshots(&flatten(&before)?, &after_fields)
        } else {
            ChangeSet::default()
        };

        self.store.swap(after);
        Ok(changes)
    }

    /// Drain pending notices unless another thread is already doing so.
    fn deliver(&self) {
        loop {
            let Some(flag) = self.dispatching.try_lock() else {
                return;
            };

            loop {
                let next = self.pending.lock().pop_front();
                match next {
                    Some(Notice::Loaded) => self.run_load_hook(),
                    Some(Notice::Changed(changes)) => {
                        let report = self.registry.dispatch(&changes);
                        tracing::debug!(
                            invoked = report.invoked,
                            failed = report.failed,
                            "Change callbacks dispatched"
                        );
                    }
                    None => break,
                }
            }

            drop(flag);
            if self.pending.lock().is_empty() {
                return;
            }
        }
    }

    fn run_load_hook(&self) {
        let hook = self.load_hook.lock().take();
        if let Some(hook) = hook {
            if catch_unwind(AssertUnwindSafe(hook)).is_err() {
                tracing::error!("Load hook panicked");
            }
        }
    }
}

fn check_mergeable<T: Record>(value: &T, fields: &Snapshot) -> Result<(), String> {
    if let Some(field) = fields.first_non_finite() {
        return Err(format!("{} must be a finite number, got {}", field.path, field.value));
    }
    Format::ensure_mergeable(value)
}
