//! Error taxonomy for the configuration manager.
//!
//! # Recovery
//! - `Decode`, `NotFound`, `Io` during a runtime reload: logged, live value kept
//! - `Shape`, `AlreadyManaged`, `Bootstrap`: setup errors, callers should abort
//! - `Encode`: surfaced to the caller of `flush`, live value unaffected
//! - `Unpersisted`: the update is live, only the write to the source failed

use thiserror::Error;

use crate::config::diff::ChangeSet;

/// Errors produced by the configuration manager and its collaborators.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The managed value is not a record (struct).
    #[error("configuration must be a struct, got {0}")]
    Shape(String),

    /// The payload could not be decoded into the configuration type.
    #[error("failed to decode configuration: {0}")]
    Decode(String),

    /// The live value could not be serialized.
    #[error("failed to encode configuration: {0}")]
    Encode(String),

    /// The backing source does not exist.
    #[error("configuration source not found: {0}")]
    NotFound(String),

    /// Reading or writing the backing source failed.
    #[error("I/O error on {source_name}: {error}")]
    Io {
        source_name: String,
        #[source]
        error: std::io::Error,
    },

    /// `manage` was called on a manager that already holds a value.
    #[error("configuration is already managed")]
    AlreadyManaged,

    /// An update arrived before `manage` completed.
    #[error("configuration is not managed yet")]
    NotManaged,

    /// The first load failed; there is no valid configuration to run with.
    #[error("bootstrap failed: {0}")]
    Bootstrap(#[source] Box<ConfigError>),

    /// A save was applied to the live value but could not be written back.
    #[error("update applied but not persisted: {error}")]
    Unpersisted {
        changes: ChangeSet,
        #[source]
        error: Box<ConfigError>,
    },

    /// The file watcher could not be installed.
    #[error("watch error: {0}")]
    Watch(#[from] notify::Error),
}

impl ConfigError {
    /// Whether a reload that failed with this error leaves the process usable.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            ConfigError::Decode(_)
                | ConfigError::NotFound(_)
                | ConfigError::Io { .. }
                | ConfigError::Unpersisted { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recoverable_classification() {
        assert!(ConfigError::Decode("bad".into()).is_recoverable());
        assert!(ConfigError::NotFound("config.json".into()).is_recoverable());
        assert!(!ConfigError::Shape("i32".into()).is_recoverable());
        assert!(!ConfigError::AlreadyManaged.is_recoverable());

        let fatal = ConfigError::Bootstrap(Box::new(ConfigError::Decode("bad".into())));
        assert!(!fatal.is_recoverable());
        assert_eq!(fatal.to_string(), "bootstrap failed: failed to decode configuration: bad");

        let unpersisted = ConfigError::Unpersisted {
            changes: ChangeSet::default(),
            error: Box::new(ConfigError::NotFound("config.json".into())),
        };
        assert!(unpersisted.is_recoverable());
        assert_eq!(
            unpersisted.to_string(),
            "update applied but not persisted: configuration source not found: config.json"
        );
    }
}
