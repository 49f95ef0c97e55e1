//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! trigger (file watch / SIGHUP / POST /save)
//!     → source.rs (read bytes)
//!     → manager.rs (reload lock)
//!         → codec.rs (decode payload onto a duplicate of the live value)
//!         → introspect.rs + diff.rs (changed leaves, old vs new)
//!         → store.rs (atomic swap of Arc<T>)
//!     → registry.rs (per-path callbacks, outside the lock)
//! ```
//!
//! # Design Decisions
//! - The config type is fixed by `ConfigManager<T>`; it cannot change at runtime
//! - Leaves are discovered through `Serialize`, paths use serialized names
//! - A failed decode never touches the live value
//! - The first load never fires change callbacks, only the load hook

pub mod codec;
pub mod diff;
pub mod field;
pub mod introspect;
pub mod manager;
pub mod registry;
pub mod source;
pub mod store;
pub mod watcher;

pub use codec::Format;
pub use diff::{ChangeSet, DiffEntry};
pub use field::{Field, Scalar, ScalarKind, Snapshot};
pub use manager::{ConfigManager, Record, State};
pub use registry::{CallbackRegistry, ChangeCallback};
pub use source::{ByteSource, FileSource, MemorySource};
pub use store::ConfigStore;
pub use watcher::ConfigWatcher;
