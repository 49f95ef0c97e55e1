//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use live_config::config::{ByteSource, ConfigManager, Format, MemorySource, Scalar};
use live_config::ConfigError;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    pub app_name: String,
    pub version: i32,
    pub database: DatabaseConfig,
    pub tags: Vec<String>,
}

pub fn initial() -> AppConfig {
    AppConfig {
        app_name: "X".to_string(),
        version: 1,
        database: DatabaseConfig {
            host: "localhost".to_string(),
            port: 3306,
        },
        tags: Vec::new(),
    }
}

/// An active manager backed by an in-memory source seeded with `initial()`.
pub fn active_manager() -> (Arc<ConfigManager<AppConfig>>, MemorySource) {
    let source = MemorySource::new();
    let manager = Arc::new(ConfigManager::new(source.clone(), Format::Json));
    manager.manage(initial()).unwrap();
    (manager, source)
}

/// A source that serves fixed bytes and refuses every write.
pub struct ReadOnlySource {
    bytes: Vec<u8>,
}

impl ReadOnlySource {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: bytes.into(),
        }
    }
}

impl ByteSource for ReadOnlySource {
    fn read_bytes(&self) -> Result<Vec<u8>, ConfigError> {
        Ok(self.bytes.clone())
    }

    fn write_bytes(&self, _: &[u8]) -> Result<(), ConfigError> {
        Err(ConfigError::Io {
            source_name: self.describe(),
            error: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only"),
        })
    }

    fn describe(&self) -> String {
        "<read-only>".to_string()
    }
}

/// An active manager whose source cannot be written.
pub fn read_only_manager() -> Arc<ConfigManager<AppConfig>> {
    let bytes = serde_json::to_vec(&initial()).unwrap();
    let manager = Arc::new(ConfigManager::new(ReadOnlySource::new(bytes), Format::Json));
    manager.manage(initial()).unwrap();
    manager
}

/// Records every change delivered for the paths it is attached to.
#[derive(Clone, Default)]
pub struct Recorder {
    events: Arc<Mutex<Vec<(String, Scalar, Scalar)>>>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attach(&self, manager: &ConfigManager<AppConfig>, path: &str) {
        let events = self.events.clone();
        let owned = path.to_string();
        manager.on_change(path, move |old, new| {
            events.lock().push((owned.clone(), old.clone(), new.clone()));
        });
    }

    pub fn events(&self) -> Vec<(String, Scalar, Scalar)> {
        self.events.lock().clone()
    }

    pub fn for_path(&self, path: &str) -> Vec<(Scalar, Scalar)> {
        self.events
            .lock()
            .iter()
            .filter(|(p, _, _)| p == path)
            .map(|(_, old, new)| (old.clone(), new.clone()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.events.lock().len()
    }
}

/// Poll `check` until it holds or `timeout` elapses.
pub fn wait_until(timeout: Duration, mut check: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if check() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(20));
    }
    check()
}

/// Async variant of [`wait_until`] for tests running on a Tokio runtime.
pub async fn wait_until_async(timeout: Duration, mut check: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    check()
}
