//! Integration tests for ConfigManager and hub settings
//!
//! These tests verify:
//! - Configuration loading and saving
//! - Default configuration when the file is missing
//! - Settings flowing into hub construction

use camino::Utf8PathBuf;
use notify_hub::config::CONFIG_FILE_NAME;
use notify_hub::{Category, ConfigManager, HubConfig, NotifyHub};
use std::fs;
use tempfile::TempDir;

fn create_test_config_dir() -> (TempDir, Utf8PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let config_path = Utf8PathBuf::try_from(temp_dir.path().to_path_buf()).unwrap();
    (temp_dir, config_path)
}

#[test]
fn test_create_config_manager() {
    let (_temp_dir, config_path) = create_test_config_dir();
    let manager = ConfigManager::new(&config_path).unwrap();

    assert_eq!(manager.config_dir(), &config_path);
    assert_eq!(
        manager.config_path(),
        config_path.join(CONFIG_FILE_NAME).as_path()
    );
}

#[test]
fn test_creates_missing_config_dir() {
    let (_temp_dir, config_path) = create_test_config_dir();
    let nested = config_path.join("NotifyHub Data");

    let manager = ConfigManager::new(&nested).unwrap();
    assert!(nested.exists());
    assert_eq!(manager.config_dir(), &nested);
}

#[test]
fn test_load_default_config() {
    let (_temp_dir, config_path) = create_test_config_dir();
    let manager = ConfigManager::new(&config_path).unwrap();

    let config = manager.load_config().unwrap();

    assert_eq!(config.settings.log_dir, "logs");
    assert_eq!(config.settings.log_prefix, "notify-hub");
    assert!(!config.settings.debug_mode);
    assert!(config.settings.console_output);
    assert_eq!(config.settings.cancel_channel_capacity, 16);
}

#[test]
fn test_load_handwritten_yaml() {
    let (_temp_dir, config_path) = create_test_config_dir();
    let manager = ConfigManager::new(&config_path).unwrap();

    let yaml = r#"
Notify_Hub:
  Log Dir: player-logs
  Debug Mode: true
  Console Output: false
  Cancel Channel Capacity: 4
"#;
    fs::write(manager.config_path(), yaml).unwrap();

    let config = manager.load_config().unwrap();
    assert_eq!(config.settings.log_dir, "player-logs");
    assert!(config.settings.debug_mode);
    assert!(!config.settings.console_output);
    assert_eq!(config.settings.cancel_channel_capacity, 4);
    // Omitted keys keep their defaults
    assert_eq!(config.settings.log_prefix, "notify-hub");
    assert!(config.settings.log_metrics_on_exit);
}

#[test]
fn test_save_and_reload_roundtrip() {
    let (_temp_dir, config_path) = create_test_config_dir();
    let manager = ConfigManager::new(&config_path).unwrap();

    let mut config = HubConfig::default();
    config.settings.log_metrics_on_exit = false;
    manager.save_config(&config).unwrap();

    let written = fs::read_to_string(manager.config_path()).unwrap();
    assert!(written.contains("Log Metrics On Exit: false"));

    let loaded = manager.load_config().unwrap();
    assert!(!loaded.settings.log_metrics_on_exit);
}

#[test]
fn test_settings_drive_cancel_channel() {
    let (_temp_dir, config_path) = create_test_config_dir();
    let manager = ConfigManager::new(&config_path).unwrap();
    fs::write(
        manager.config_path(),
        "Notify_Hub:\n  Cancel Channel Capacity: 2\n",
    )
    .unwrap();

    let config = manager.load_config().unwrap();
    let (hub, _event_loop) = NotifyHub::with_settings(&config.settings);
    let mut rx = hub.subscribe_cancel();

    let callback = hub.cancel_callback();
    for _ in 0..3 {
        callback.request_for(Category::DOWNLOAD);
    }

    // Capacity 2: the oldest request was overwritten, the receiver lagged
    assert!(matches!(
        rx.try_recv(),
        Err(tokio::sync::broadcast::error::TryRecvError::Lagged(1))
    ));
    assert_eq!(rx.try_recv().unwrap().categories, Category::DOWNLOAD);
}
