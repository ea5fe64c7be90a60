use std::path::PathBuf;

use fintrack_config::{Config, ConfigError, ConfigManager};
use tempfile::tempdir;

#[test]
fn default_config_has_engine_labels() {
    let cfg = Config::default();

    assert_eq!(cfg.locale, "en-US");
    assert_eq!(cfg.currency, "USD");
    assert!(!cfg.deposit_category.is_empty());
    assert!(!cfg.transfer_category.is_empty());
    assert_eq!(cfg.backup_retention, 5);
}

#[test]
fn missing_file_loads_defaults() {
    let dir = tempdir().expect("tempdir");
    let manager = ConfigManager::with_base_dir(dir.path().to_path_buf()).expect("manager");

    assert_eq!(manager.load().expect("load"), Config::default());
    assert!(manager.backups_dir().exists());
    assert!(manager.config_path().ends_with("config/config.json"));
}

#[test]
fn config_manager_persists_and_loads_config() {
    let dir = tempdir().expect("tempdir");
    let manager = ConfigManager::new(dir.path().join("config.json"), dir.path().join("backups"));

    let cfg = Config {
        currency: "EUR".into(),
        locale: "pt-BR".into(),
        data_dir: Some(PathBuf::from("/srv/fintrack")),
        log_filter: Some("fintrack=debug".into()),
        ..Config::default()
    };

    manager.save(&cfg).expect("save config");
    let loaded = manager.load().expect("load config");

    assert_eq!(loaded, cfg);
    assert!(!dir.path().join("config.json.tmp").exists());
}

#[test]
fn backups_restore_previous_settings() {
    let dir = tempdir().expect("tempdir");
    let manager = ConfigManager::with_base_dir(dir.path().to_path_buf()).expect("manager");

    let original = Config::default();
    manager.save(&original).expect("save");
    let name = manager
        .backup(&original, Some("Before EUR switch"))
        .expect("backup");
    assert!(name.starts_with("config_"));
    assert!(name.ends_with("_before-eur-switch.json"));

    let changed = Config {
        currency: "EUR".into(),
        ..Config::default()
    };
    manager.save(&changed).expect("save changed");

    let restored = manager.restore(&name).expect("restore");
    assert_eq!(restored.currency, "USD");
    assert_eq!(manager.load().expect("reload").currency, "USD");
    assert_eq!(manager.list_backups().expect("list"), vec![name]);
}

#[test]
fn restoring_unknown_backup_fails() {
    let dir = tempdir().expect("tempdir");
    let manager = ConfigManager::with_base_dir(dir.path().to_path_buf()).expect("manager");

    assert!(matches!(
        manager.restore("config_20990101_000000.json"),
        Err(ConfigError::BackupNotFound(_))
    ));
}
