//! Byte persistence for configuration sources.

use parking_lot::Mutex;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::ConfigError;

/// Where configuration bytes are read from and flushed to.
pub trait ByteSource: Send + Sync {
    /// Read the whole payload. Returns `NotFound` when the source is absent.
    fn read_bytes(&self) -> Result<Vec<u8>, ConfigError>;

    /// Replace the whole payload.
    fn write_bytes(&self, bytes: &[u8]) -> Result<(), ConfigError>;

    /// Human-readable name for logs.
    fn describe(&self) -> String;

    /// Filesystem path, for sources a watcher can observe.
    fn path(&self) -> Option<&Path> {
        None
    }
}

/// A configuration file on disk.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn io_error(&self, error: std::io::Error) -> ConfigError {
        ConfigError::Io {
            source_name: self.describe(),
            error,
        }
    }
}

impl ByteSource for FileSource {
    fn read_bytes(&self) -> Result<Vec<u8>, ConfigError> {
        fs::read(&self.path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => ConfigError::NotFound(self.describe()),
            _ => self.io_error(e),
        })
    }

    fn write_bytes(&self, bytes: &[u8]) -> Result<(), ConfigError> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).map_err(|e| self.io_error(e))?;
        }
        fs::write(&self.path, bytes).map_err(|e| self.io_error(e))
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    fn path(&self) -> Option<&Path> {
        Some(&self.path)
    }
}

/// An in-process buffer standing in for a file.
///
/// Clones share the same buffer, so a test can keep a handle and inspect
/// what the manager flushed.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    bytes: Arc<Mutex<Option<Vec<u8>>>>,
}

impl MemorySource {
    /// An empty source; reads fail with `NotFound` until something is written.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: Arc::new(Mutex::new(Some(bytes.into()))),
        }
    }

    /// Current contents, if any.
    pub fn contents(&self) -> Option<Vec<u8>> {
        self.bytes.lock().clone()
    }

    /// Replace the contents without going through a manager.
    pub fn set(&self, bytes: impl Into<Vec<u8>>) {
        *self.bytes.lock() = Some(bytes.into());
    }
}

impl ByteSource for MemorySource {
    fn read_bytes(&self) -> Result<Vec<u8>, ConfigError> {
        self.bytes
            .lock()
            .clone()
            .ok_or_else(|| ConfigError::NotFound(self.describe()))
    }

    fn write_bytes(&self, bytes: &[u8]) -> Result<(), ConfigError> {
        *self.bytes.lock() = Some(bytes.to_vec());
        Ok(())
    }

    fn describe(&self) -> String {
        "<memory>".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_source_missing_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let source = FileSource::new(dir.path().join("config.json"));
        assert!(matches!(source.read_bytes(), Err(ConfigError::NotFound(_))));
    }

    #[test]
    fn test_file_source_creates_parent_dirs_and_truncates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/deeper/config.json");
        let source = FileSource::new(&path);

        source.write_bytes(b"{\"long\": \"payload\"}\n").unwrap();
        source.write_bytes(b"{}\n").unwrap();

        assert_eq!(source.read_bytes().unwrap(), b"{}\n");
        assert_eq!(source.path(), Some(path.as_path()));
    }

    #[test]
    fn test_file_source_read_error_on_directory() {
        let dir = tempfile::tempdir().unwrap();
        let source = FileSource::new(dir.path());
        assert!(matches!(source.read_bytes(), Err(ConfigError::Io { .. })));
    }

    #[test]
    fn test_memory_source_shares_buffer() {
        let source = MemorySource::new();
        assert!(matches!(source.read_bytes(), Err(ConfigError::NotFound(_))));

        let handle = source.clone();
        source.write_bytes(b"abc").unwrap();
        assert_eq!(handle.contents(), Some(b"abc".to_vec()));

        handle.set("xyz");
        assert_eq!(source.read_bytes().unwrap(), b"xyz");
        assert!(source.path().is_none());
    }
}
