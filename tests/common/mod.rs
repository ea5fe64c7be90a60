#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use chrono::{DateTime, TimeZone, Utc};
use fintrack::{
    config::{Config, ConfigManager},
    engine::FixedClock,
    Session,
};
use once_cell::sync::Lazy;
use tempfile::TempDir;

/// Holds TempDir guards so temporary folders live for the duration of the test run.
static TEST_DIRS: Lazy<Mutex<Vec<TempDir>>> = Lazy::new(|| Mutex::new(Vec::new()));

pub fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 15, 12, 0, 0).unwrap()
}

/// Creates a unique directory that outlives the calling test.
pub fn temp_base() -> std::path::PathBuf {
    let temp = TempDir::new().expect("create temp dir");
    let base = temp.path().to_path_buf();
    TEST_DIRS.lock().expect("lock temp dir registry").push(temp);
    base
}

/// File-backed session plus a config manager rooted in a fresh temp directory.
pub fn setup_file_session() -> (Session, ConfigManager) {
    let base = temp_base();
    let config_manager =
        ConfigManager::with_base_dir(base.clone()).expect("create config manager for temp dir");
    let config = Config {
        data_dir: Some(base.join("data")),
        backup_retention: 3,
        ..Config::default()
    };
    config_manager.save(&config).expect("save config");
    let session = Session::open(config).expect("open session");
    (session, config_manager)
}

pub fn memory_session() -> (Session, Arc<FixedClock>) {
    let clock = Arc::new(FixedClock::new(fixed_now()));
    (Session::in_memory(Config::default(), clock.clone()), clock)
}
