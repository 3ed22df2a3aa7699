#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Mutex;

use bookkeeping_core::{
    config::{Config, ConfigManager},
    core::time::ManualClock,
    storage::{JsonStorage, MemoryStorage},
    LedgerManager,
};
use chrono::{DateTime, TimeZone, Utc};
use once_cell::sync::Lazy;
use tempfile::TempDir;

/// Holds TempDir guards so temporary folders live for the duration of the test run.
static TEST_DIRS: Lazy<Mutex<Vec<TempDir>>> = Lazy::new(|| Mutex::new(Vec::new()));

pub fn start_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap()
}

/// Fresh directory that outlives the calling test.
pub fn temp_base() -> PathBuf {
    let temp = TempDir::new().expect("create temp dir");
    let base = temp.path().to_path_buf();
    TEST_DIRS.lock().expect("lock temp dir registry").push(temp);
    base
}

/// Creates an isolated JSON-backed manager and a config manager in a unique directory.
pub fn setup_test_env() -> (LedgerManager, ConfigManager, PathBuf) {
    let base = temp_base();
    let storage = JsonStorage::new(Some(base.join("data")), Some(3)).expect("create json storage");
    let manager = LedgerManager::with_clock(
        Box::new(storage),
        Box::new(ManualClock::new(start_time())),
        Config::default(),
    )
    .expect("open ledger manager");
    let config_manager =
        ConfigManager::with_base_dir(base.clone()).expect("create config manager for temp dir");
    (manager, config_manager, base)
}

/// Manager over in-memory storage with a fixed clock.
pub fn memory_manager() -> LedgerManager {
    LedgerManager::with_clock(
        Box::new(MemoryStorage::new()),
        Box::new(ManualClock::new(start_time())),
        Config::default(),
    )
    .expect("open ledger manager")
}
