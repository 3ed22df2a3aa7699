mod common;

use bookkeeping_core::{
    config::Config,
    ledger::{seed, Ledger, RecordInput, CURRENT_SCHEMA_VERSION},
    storage::{JsonStorage, StorageBackend},
    LedgerError, LedgerManager,
};
use rust_decimal::Decimal;
use std::fs;
use std::path::Path;

fn tmp_path_for(path: &Path) -> std::path::PathBuf {
    let mut tmp = path.to_path_buf();
    let ext = match path.extension().and_then(|ext| ext.to_str()) {
        Some(existing) => format!("{}.tmp", existing),
        None => String::from("tmp"),
    };
    tmp.set_extension(ext);
    tmp
}

#[test]
fn atomic_save_failure_preserves_original_file() {
    let base = common::temp_base();
    let store = JsonStorage::new(Some(base), Some(2)).unwrap();

    let ledger = Ledger::seeded("reliable");
    store.save_outlet(&ledger).expect("initial save");
    let path = store.outlet_path("reliable");
    let original = fs::read_to_string(&path).expect("read original file");

    // A directory at the temp file's path makes File::create fail.
    fs::create_dir_all(tmp_path_for(&path)).unwrap();

    let mut changed = ledger.clone();
    changed.rules.clear();
    assert!(
        store.save_outlet(&changed).is_err(),
        "expected save to fail when temp path is a directory"
    );
    let current = fs::read_to_string(&path).expect("read after failure");
    assert_eq!(original, current, "original file must stay intact");
}

#[test]
fn failed_posting_write_keeps_memory_and_disk_consistent() {
    let base = common::temp_base();
    let store = JsonStorage::new(Some(base.clone()), Some(2)).unwrap();
    let manager = LedgerManager::open(Box::new(store), Config::default()).unwrap();
    let path = JsonStorage::new(Some(base), Some(2)).unwrap().outlet_path("main");

    fs::create_dir_all(tmp_path_for(&path)).unwrap();
    let err = manager
        .record(RecordInput::money_out(Decimal::from(7_500), seed::RENT))
        .expect_err("disk write must fail");
    assert!(matches!(err, LedgerError::Io(_)));
    assert!(manager.snapshot().transactions.is_empty());
    assert!(manager.account(seed::RENT).unwrap().balance.is_zero());

    fs::remove_dir_all(tmp_path_for(&path)).unwrap();
    manager
        .record(RecordInput::money_out(Decimal::from(7_500), seed::RENT))
        .unwrap();
    assert_eq!(manager.snapshot().transactions.len(), 1);
}

#[test]
fn reopen_restores_postings_and_balances() {
    let (manager, _config, base) = common::setup_test_env();
    manager
        .record(RecordInput::money_in(Decimal::from(2_000_000), seed::CAPITAL).with_source(seed::BANK_BCA))
        .unwrap();
    manager
        .record(RecordInput::money_out(Decimal::from(300_000), seed::RENT).with_source(seed::BANK_BCA))
        .unwrap();
    let before = manager.snapshot();
    drop(manager);

    let store = JsonStorage::new(Some(base.join("data")), Some(3)).unwrap();
    let reopened = LedgerManager::open(Box::new(store), Config::default()).unwrap();
    let load = reopened.load_metadata();
    assert!(!load.seeded);
    assert!(load.warnings.is_empty());

    let after = reopened.snapshot();
    assert_eq!(after.accounts, before.accounts);
    assert_eq!(after.transactions, before.transactions);
    assert_eq!(
        reopened.account(seed::BANK_BCA).unwrap().balance,
        Decimal::from(1_700_000)
    );
}

#[test]
fn dangling_references_surface_as_load_warnings() {
    let base = common::temp_base();
    let store = JsonStorage::new(Some(base.clone()), None).unwrap();
    let mut ledger = Ledger::seeded("main");
    ledger.rules.clear();
    ledger.budgets.push(bookkeeping_core::ledger::BudgetPlan::new(
        "acc_removed",
        "Removed",
        Decimal::from(10),
        Default::default(),
    ));
    store.save_outlet(&ledger).unwrap();

    let manager = LedgerManager::open(Box::new(store), Config::default()).unwrap();
    let load = manager.load_metadata();
    assert_eq!(load.warnings.len(), 1);
    assert!(load.warnings[0].contains("acc_removed"));
}

#[test]
fn newer_schema_on_disk_is_rejected() {
    let base = common::temp_base();
    let store = JsonStorage::new(Some(base.clone()), None).unwrap();
    let mut ledger = Ledger::seeded("main");
    ledger.schema_version = CURRENT_SCHEMA_VERSION + 1;
    store.save_outlet(&ledger).unwrap();

    let result = LedgerManager::open(Box::new(store), Config::default());
    assert!(matches!(result, Err(LedgerError::Persistence(_))));
}

#[test]
fn document_uses_readable_field_names() {
    let base = common::temp_base();
    let store = JsonStorage::new(Some(base), None).unwrap();
    store.save_outlet(&Ledger::seeded("main")).unwrap();
    let raw = fs::read_to_string(store.outlet_path("main")).unwrap();
    let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(json["accounts"][seed::CASH]["category"], "ASSET");
    assert_eq!(json["schema_version"], CURRENT_SCHEMA_VERSION);
}

#[test]
fn switching_to_a_colliding_outlet_id_keeps_the_active_ledger() {
    let base = common::temp_base();
    let store = JsonStorage::new(Some(base), None).unwrap();
    let config = Config {
        active_outlet: "Outlet 1".into(),
        ..Config::default()
    };
    let manager = LedgerManager::open(Box::new(store), config).unwrap();
    manager
        .record(RecordInput::money_in(Decimal::from(40_000), seed::SALES_REVENUE))
        .unwrap();

    let err = manager
        .switch_outlet("outlet_1")
        .expect_err("file belongs to another outlet");
    assert!(matches!(err, LedgerError::Persistence(_)));
    assert_eq!(manager.outlet_id(), "Outlet 1");
    assert_eq!(manager.recent(None).len(), 1);
    assert_eq!(manager.list_outlets().unwrap(), vec!["Outlet 1".to_string()]);
}
