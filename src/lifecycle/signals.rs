//! OS signal handling.
//!
//! # Responsibilities
//! - SIGHUP → reload configuration from its source
//!
//! # Design Decisions
//! - Uses Tokio's signal handling (async-safe)
//! - The reload runs on the blocking pool; callbacks may block
//! - A failed reload is logged and the handler keeps listening

use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::config::manager::{ConfigManager, Record};

/// Reload `manager` on every SIGHUP until shutdown.
#[cfg(unix)]
pub fn spawn_reload_on_hangup<T: Record>(
    manager: Arc<ConfigManager<T>>,
    mut shutdown: broadcast::Receiver<()>,
) -> std::io::Result<JoinHandle<()>> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut hangup = signal(SignalKind::hangup())?;

    Ok(tokio::spawn(async move {
        tracing::info!("SIGHUP handler installed");
        loop {
            tokio::select! {
                _ = shutdown.recv() => break,
                received = hangup.recv() => {
                    if received.is_none() {
                        break;
                    }
                    tracing::info!("SIGHUP received, reloading config");
                    let manager = manager.clone();
                    match tokio::task::spawn_blocking(move || manager.reload()).await {
                        Ok(Ok(changes)) => tracing::debug!(changed = changes.len(), "SIGHUP reload applied"),
                        Ok(Err(e)) => tracing::error!(error = %e, "SIGHUP reload failed, keeping current configuration"),
                        Err(e) => tracing::error!(error = %e, "SIGHUP reload task failed"),
                    }
                }
            }
        }
        tracing::debug!("SIGHUP handler stopped");
    }))
}

#[cfg(not(unix))]
pub fn spawn_reload_on_hangup<T: Record>(
    _manager: Arc<ConfigManager<T>>,
    _shutdown: broadcast::Receiver<()>,
) -> std::io::Result<JoinHandle<()>> {
    Err(std::io::Error::new(
        std::io::ErrorKind::Unsupported,
        "SIGHUP is only available on unix",
    ))
}
