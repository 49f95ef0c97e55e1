//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     manage(initial) → attach triggers (file watch, SIGHUP) → serve admin
//!
//! Signals (signals.rs):
//!     SIGHUP → reload from source
//!
//! Shutdown (shutdown.rs):
//!     Ctrl-C → broadcast → triggers and admin server stop
//! ```
//!
//! # Design Decisions
//! - Bootstrap failure is fatal: triggers are only attached to an active manager
//! - Every trigger calls the same synchronous reload entry point
//! - A failed reload is logged; the trigger keeps running

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
pub use startup::{start_triggers, TriggerOptions, Triggers};
