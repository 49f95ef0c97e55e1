//! File-backed managers: seeding, explicit reloads and the file watcher.

use live_config::config::{ConfigManager, ConfigWatcher, Format, Scalar};
use live_config::ConfigError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::sync::Arc;
use std::time::Duration;

mod common;

use common::{initial, wait_until, AppConfig, Recorder};

#[test]
fn test_missing_file_is_seeded_with_initial_value() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("config.json");

    let manager: ConfigManager<AppConfig> = ConfigManager::from_path(&path);
    assert_eq!(manager.format(), Format::Json);
    manager.manage(initial()).unwrap();

    let written = fs::read_to_string(&path).unwrap();
    assert!(written.ends_with("}\n"));
    assert!(written.contains("\n    \"app_name\": \"X\""));
    assert!(written.contains("\n        \"port\": 3306"));
    assert_eq!(serde_json::from_str::<AppConfig>(&written).unwrap(), initial());
}

#[test]
fn test_existing_file_wins_over_initial_value() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    fs::write(&path, r#"{"app_name": "from disk"}"#).unwrap();

    let manager: ConfigManager<AppConfig> = ConfigManager::from_path(&path);
    manager.manage(initial()).unwrap();

    let live = manager.current().unwrap();
    assert_eq!(live.app_name, "from disk");
    assert_eq!(live.database.port, 3306);
    // Bootstrapping from an existing file does not rewrite it.
    assert_eq!(fs::read_to_string(&path).unwrap(), r#"{"app_name": "from disk"}"#);
}

#[test]
fn test_reload_after_edit_reports_changes() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    let manager: ConfigManager<AppConfig> = ConfigManager::from_path(&path);
    manager.manage(initial()).unwrap();
    let recorder = Recorder::new();
    recorder.attach(&manager, "database.host");

    let mut edited = initial();
    edited.database.host = "db.internal".to_string();
    fs::write(&path, serde_json::to_vec(&edited).unwrap()).unwrap();

    let changes = manager.reload().unwrap();
    assert_eq!(changes.paths().collect::<Vec<_>>(), vec!["database.host"]);
    assert_eq!(
        recorder.for_path("database.host"),
        vec![(
            Scalar::Str("localhost".to_string()),
            Scalar::Str("db.internal".to_string())
        )]
    );
}

#[test]
fn test_reload_of_deleted_file_keeps_configuration() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    let manager: ConfigManager<AppConfig> = ConfigManager::from_path(&path);
    manager.manage(initial()).unwrap();

    fs::remove_file(&path).unwrap();
    let err = manager.reload().unwrap_err();
    assert!(matches!(err, ConfigError::NotFound(_)));
    assert!(err.is_recoverable());
    assert_eq!(*manager.current().unwrap(), initial());
}

#[test]
fn test_save_rewrites_the_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    let manager: ConfigManager<AppConfig> = ConfigManager::from_path(&path);
    manager.manage(initial()).unwrap();

    manager.save(br#"{"tags": ["blue"]}"#).unwrap();

    let on_disk: AppConfig = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(on_disk.tags, vec!["blue".to_string()]);
    assert_eq!(on_disk.app_name, "X");
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Limits {
    max_connections: u32,
    ratio: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct ServiceConfig {
    name: String,
    enabled: bool,
    limits: Limits,
}

#[test]
fn test_toml_source_round_trips_through_reload() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("service.toml");
    let manager: ConfigManager<ServiceConfig> = ConfigManager::from_path(&path);
    assert_eq!(manager.format(), Format::Toml);

    manager
        .manage(ServiceConfig {
            name: "api".to_string(),
            enabled: true,
            limits: Limits {
                max_connections: 100,
                ratio: 0.5,
            },
        })
        .unwrap();

    let seeded = fs::read_to_string(&path).unwrap();
    assert!(seeded.contains("name = \"api\""));
    assert!(seeded.contains("[limits]"));

    fs::write(
        &path,
        "name = \"api\"\nenabled = false\n\n[limits]\nmax_connections = 250\nratio = 0.5\n",
    )
    .unwrap();
    let changes = manager.reload().unwrap();

    assert_eq!(
        changes.paths().collect::<Vec<_>>(),
        vec!["enabled", "limits.max_connections"]
    );
    assert_eq!(
        changes.get("limits.max_connections").unwrap().new,
        Scalar::U32(250)
    );
}

#[test]
fn test_watcher_requires_a_file_source() {
    let manager: Arc<ConfigManager<AppConfig>> = Arc::new(ConfigManager::new(
        live_config::config::MemorySource::new(),
        Format::Json,
    ));
    assert!(matches!(
        ConfigWatcher::new(manager),
        Err(ConfigError::NotFound(_))
    ));
}

#[test]
fn test_watcher_reloads_on_file_write() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    let manager: Arc<ConfigManager<AppConfig>> = Arc::new(ConfigManager::from_path(&path));
    manager.manage(initial()).unwrap();
    let recorder = Recorder::new();
    recorder.attach(&manager, "version");

    let _watcher = ConfigWatcher::new(manager.clone()).unwrap().run().unwrap();
    // Give the backend a moment to register the watch.
    std::thread::sleep(Duration::from_millis(200));

    let mut edited = initial();
    edited.version = 7;
    fs::write(&path, serde_json::to_vec_pretty(&edited).unwrap()).unwrap();

    assert!(wait_until(Duration::from_secs(5), || {
        manager.current().unwrap().version == 7
    }));
    let history = recorder.for_path("version");
    assert_eq!(history.last(), Some(&(Scalar::I32(1), Scalar::I32(7))));

    // Unrelated files in the same directory are ignored.
    fs::write(dir.path().join("other.json"), r#"{"version": 99}"#).unwrap();
    std::thread::sleep(Duration::from_millis(300));
    assert_eq!(manager.current().unwrap().version, 7);
}
