//! Trigger startup.
//!
//! # Responsibilities
//! - Attach the file watcher and SIGHUP handler to an active manager
//! - Keep their handles alive for the lifetime of the process
//!
//! # Design Decisions
//! - Fail fast: a trigger that cannot be installed is a startup error
//! - Triggers are independent; any subset may be enabled

use notify::RecommendedWatcher;
use std::sync::Arc;
use tokio::task::JoinHandle;

use crate::config::manager::{ConfigManager, Record, State};
use crate::config::watcher::ConfigWatcher;
use crate::error::ConfigError;
use crate::lifecycle::shutdown::Shutdown;
use crate::lifecycle::signals::spawn_reload_on_hangup;

/// Which reload triggers to attach.
#[derive(Debug, Clone, Copy)]
pub struct TriggerOptions {
    pub watch_file: bool,
    pub sighup: bool,
}

impl Default for TriggerOptions {
    fn default() -> Self {
        Self {
            watch_file: true,
            sighup: cfg!(unix),
        }
    }
}

/// Handles of the running triggers. Dropping it stops the file watcher.
pub struct Triggers {
    watcher: Option<RecommendedWatcher>,
    hangup: Option<JoinHandle<()>>,
}

impl Triggers {
    pub fn is_watching(&self) -> bool {
        self.watcher.is_some()
    }

    pub fn handles_sighup(&self) -> bool {
        self.hangup.is_some()
    }

    /// Wait for the signal task to finish after shutdown was triggered.
    pub async fn join(self) {
        drop(self.watcher);
        if let Some(task) = self.hangup {
            let _ = task.await;
        }
    }
}

/// Attach the enabled triggers to `manager`, which must already be active.
///
/// Must be called from within a Tokio runtime when `sighup` is enabled.
pub fn start_triggers<T: Record>(
    manager: &Arc<ConfigManager<T>>,
    options: TriggerOptions,
    shutdown: &Shutdown,
) -> Result<Triggers, ConfigError> {
    if manager.state() != State::Active {
        return Err(ConfigError::NotManaged);
    }

    let watcher = if options.watch_file {
        Some(ConfigWatcher::new(manager.clone())?.run()?)
    } else {
        None
    };

    let hangup = if options.sighup {
        let handle = spawn_reload_on_hangup(manager.clone(), shutdown.subscribe()).map_err(|e| {
            ConfigError::Io {
                source_name: "SIGHUP".to_string(),
                error: e,
            }
        })?;
        Some(handle)
    } else {
        None
    };

    Ok(Triggers { watcher, hangup })
}
