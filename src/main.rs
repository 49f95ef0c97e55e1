//! Demo application whose configuration is managed at runtime.
//!
//! # Architecture Overview
//!
//! ```text
//!   config.json ──modify──▶ ConfigWatcher ─┐
//!   kill -HUP   ──────────▶ SIGHUP handler ─┼──▶ ConfigManager ──▶ on_change callbacks
//!   POST /save  ──────────▶ admin router  ─┘         │
//!                                                     └──▶ flush ──▶ config.json
//! ```

use clap::Parser;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;

use live_config::admin::{self, AdminState};
use live_config::config::{ConfigManager, FileSource, Format};
use live_config::lifecycle::{start_triggers, Shutdown, TriggerOptions};
use live_config::observability::logging::{self, LogFormat};
use live_config::observability::metrics;

/// The demo application's configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct DemoConfig {
    app_name: String,
    version: f32,
    debug: bool,
    database: DatabaseConfig,
    /// Not a scalar: persisted, but never listed or diffed.
    tags: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct DatabaseConfig {
    adapter: String,
    host: String,
    port: u16,
    username: String,
    password: String,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            app_name: "live-config demo".to_string(),
            version: 1.0,
            debug: false,
            database: DatabaseConfig {
                adapter: "mysql".to_string(),
                host: "localhost".to_string(),
                port: 3306,
                username: "root".to_string(),
                password: String::new(),
            },
            tags: Vec::new(),
        }
    }
}

#[derive(Parser)]
#[command(name = "live-config")]
#[command(about = "Demo application with a live-reloaded configuration", long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(short, long, default_value = "config.json")]
    config: PathBuf,

    /// Encoding of the config file (defaults to the file extension)
    #[arg(long, value_enum)]
    format: Option<Format>,

    /// Admin server host
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Admin server port
    #[arg(short, long, default_value_t = 5500)]
    port: u16,

    /// Bearer token required by the admin API
    #[arg(long, env = "LIVE_CONFIG_API_KEY")]
    api_key: Option<String>,

    /// Do not reload when the config file changes
    #[arg(long)]
    no_watch: bool,

    /// Do not reload on SIGHUP
    #[arg(long)]
    no_sighup: bool,

    #[arg(long, value_enum, default_value_t = LogFormat::Pretty)]
    log_format: LogFormat,

    /// Serve Prometheus metrics on this address
    #[arg(long)]
    metrics_address: Option<SocketAddr>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    logging::init(cli.log_format, "live_config=debug,tower_http=info");

    tracing::info!("live-config v{} starting", env!("CARGO_PKG_VERSION"));

    if let Some(addr) = cli.metrics_address {
        metrics::init_metrics(addr);
    }

    let format = cli.format.unwrap_or_else(|| Format::from_path(&cli.config));
    let manager = Arc::new(ConfigManager::new(FileSource::new(&cli.config), format));

    manager.on_load(|| tracing::info!("Configuration loaded for the first time"));
    manager.on_change("app_name", |old, new| {
        tracing::info!(%old, %new, "Application name changed");
    });
    manager.on_change("debug", |_, new| {
        tracing::info!(enabled = new.as_bool().unwrap_or(false), "Debug mode toggled");
    });
    manager.on_change("database.port", |old, new| {
        tracing::warn!(%old, %new, "Database port changed, reconnect required");
    });

    manager.manage(DemoConfig::default())?;

    let live = manager.current()?;
    tracing::info!(
        app_name = %live.app_name,
        version = live.version,
        database = %live.database.host,
        "Configuration active"
    );

    let shutdown = Shutdown::new();
    let options = TriggerOptions {
        watch_file: !cli.no_watch,
        sighup: !cli.no_sighup && cfg!(unix),
    };
    let triggers = start_triggers(&manager, options, &shutdown)?;

    let listener = TcpListener::bind((cli.host.as_str(), cli.port)).await?;
    let mut state = AdminState::new(manager.clone());
    if let Some(key) = cli.api_key {
        state = state.with_api_key(key);
    }
    let server = tokio::spawn(admin::serve(listener, state, shutdown.clone()));

    shutdown.trigger_on_ctrl_c().await;

    server.await??;
    triggers.join().await;

    tracing::info!("Shutdown complete");
    Ok(())
}
