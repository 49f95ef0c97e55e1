//! Configuration file watcher for hot reload.

use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::manager::{ConfigManager, Record};
use crate::error::ConfigError;

/// Reloads a manager whenever its configuration file is modified.
///
/// The parent directory is watched so that editors which replace the file
/// (write to a temp file, then rename) are still picked up; events for other
/// entries of that directory are ignored.
pub struct ConfigWatcher<T> {
    manager: Arc<ConfigManager<T>>,
    path: PathBuf,
}

impl<T: Record> ConfigWatcher<T> {
    /// Watch the file the manager's source points at.
    pub fn new(manager: Arc<ConfigManager<T>>) -> Result<Self, ConfigError> {
        let path = manager
            .source()
            .path()
            .map(Path::to_path_buf)
            .ok_or_else(|| ConfigError::NotFound("configuration source has no path".to_string()))?;
        Ok(Self { manager, path })
    }

    /// Start watching on notify's background thread.
    ///
    /// The returned watcher must be kept alive for events to keep flowing.
    pub fn run(self) -> Result<RecommendedWatcher, ConfigError> {
        let dir = watch_dir(&self.path);
        let target = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .ok_or_else(|| ConfigError::NotFound(self.path.display().to_string()))?;

        let manager = self.manager;
        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    if !is_target_event(&event, &target) {
                        return;
                    }
                    tracing::info!("Config file change detected, reloading...");
                    if let Err(e) = manager.reload() {
                        tracing::error!("Failed to reload config: {}. Keeping current configuration.", e);
                    }
                }
                Err(e) => tracing::error!("Watch error: {:?}", e),
            },
            Config::default(),
        )?;

        watcher.watch(&dir, RecursiveMode::NonRecursive)?;

        tracing::info!(path = ?self.path, "Config watcher started");
        Ok(watcher)
    }
}

fn watch_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Whether `event` is a modification of the file named `file_name`.
pub fn is_target_event(event: &Event, file_name: &OsString) -> bool {
    let relevant = matches!(event.kind, EventKind::Modify(_) | EventKind::Create(_));
    relevant
        && event
            .paths
            .iter()
            .any(|p| p.file_name() == Some(file_name.as_os_str()))
}
