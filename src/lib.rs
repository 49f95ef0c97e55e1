//! Live configuration manager.
//!
//! Holds a strongly-typed configuration value, reloads it from a file when
//! the file changes, on SIGHUP, or when a new payload is posted to the admin
//! API, and tells registered observers exactly which fields changed.
//!
//! ```no_run
//! use live_config::ConfigManager;
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Clone, Default, Serialize, Deserialize)]
//! struct AppConfig {
//!     app_name: String,
//!     version: u32,
//! }
//!
//! let manager = ConfigManager::from_path("config.json");
//! manager.on_change("version", |old, new| println!("version {} -> {}", old, new));
//! manager.manage(AppConfig::default())?;
//! # Ok::<(), live_config::ConfigError>(())
//! ```

pub mod admin;
pub mod config;
pub mod error;
pub mod lifecycle;
pub mod observability;

pub use config::{ChangeSet, ConfigManager, Format, Record, Scalar, Snapshot};
pub use error::ConfigError;
pub use lifecycle::Shutdown;
