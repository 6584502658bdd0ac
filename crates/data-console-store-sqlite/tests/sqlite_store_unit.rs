// crates/data-console-store-sqlite/tests/sqlite_store_unit.rs
// ============================================================================
// Module: SQLite Record Store Tests
// Description: Insert, query, and count behavior of the record store.
// Purpose: Ensure records persist newest-first and identifiers stay whitelisted.
// ============================================================================

//! Record store integration tests.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only assertions and helpers are permitted."
)]

use data_console_store_sqlite::SqliteRecordStore;
use data_console_store_sqlite::SqliteStoreConfig;
use data_console_store_sqlite::SqliteStoreMode;
use data_console_store_sqlite::StoreError;
use proptest::prelude::*;
use serde_json::Map;
use serde_json::Value;
use serde_json::json;
use tempfile::TempDir;

fn open_store() -> (TempDir, SqliteRecordStore) {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = SqliteStoreConfig::new(dir.path().join("db").join("console.db"));
    let store = SqliteRecordStore::new(&config).expect("store opens");
    (dir, store)
}

fn record(value: Value) -> Map<String, Value> {
    value.as_object().cloned().expect("object")
}

#[test]
fn insert_then_query_returns_newest_first() {
    let (_dir, store) = open_store();
    for city in ["Mumbai", "Chennai", "London"] {
        store
            .insert(
                "weather_logs",
                &record(json!({"city": city, "temperature": 30.5, "condition": "Sunny"})),
            )
            .unwrap();
    }
    let records = store.query("weather_logs", 2).unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0]["city"], json!("London"));
    assert_eq!(records[1]["city"], json!("Chennai"));
    assert_eq!(records[0]["temperature"], json!(30.5));
    assert!(records[0]["timestamp"].is_string());
    assert_eq!(store.count("weather_logs").unwrap(), 3);
}

#[test]
fn reports_use_created_at_timestamp() {
    let (_dir, store) = open_store();
    store.insert("reports", &record(json!({"report_name": "q1", "content": "ok"}))).unwrap();
    let records = store.query("reports", 10).unwrap();
    assert!(records[0].contains_key("created_at"));
    assert_eq!(records[0]["id"], json!(1));
}

#[test]
fn unknown_table_and_column_are_rejected() {
    let (_dir, store) = open_store();
    assert_eq!(store.count("users"), Err(StoreError::UnknownTable("users".to_string())));
    let err = store
        .insert("file_logs", &record(json!({"filename": "a", "action); DROP TABLE file_logs;--": "x"})))
        .unwrap_err();
    assert!(matches!(err, StoreError::UnknownColumn { .. }));
    assert_eq!(store.count("file_logs").unwrap(), 0);
}

#[test]
fn non_scalar_and_mistyped_values_are_rejected() {
    let (_dir, store) = open_store();
    let nested = store.insert("reports", &record(json!({"content": {"a": 1}})));
    assert!(matches!(nested, Err(StoreError::InvalidValue { .. })));
    let text_temperature = store.insert("weather_logs", &record(json!({"temperature": "hot"})));
    assert!(matches!(text_temperature, Err(StoreError::InvalidValue { .. })));
    assert!(matches!(store.insert("reports", &Map::new()), Err(StoreError::Invalid(_))));
}

#[test]
fn reopen_preserves_records_in_delete_mode() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = SqliteStoreConfig::new(dir.path().join("console.db"));
    config.journal_mode = SqliteStoreMode::Delete;
    {
        let store = SqliteRecordStore::new(&config).unwrap();
        store.insert("file_logs", &record(json!({"filename": "a.csv", "action": "read"}))).unwrap();
    }
    let store = SqliteRecordStore::new(&config).unwrap();
    assert_eq!(store.count("file_logs").unwrap(), 1);
}

#[test]
fn directory_path_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let config = SqliteStoreConfig::new(dir.path());
    assert!(matches!(SqliteRecordStore::new(&config), Err(StoreError::Invalid(_))));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn text_values_round_trip_verbatim(content in "\\PC{0,64}") {
        let (_dir, store) = open_store();
        store.insert("reports", &record(json!({"report_name": "r", "content": content.clone()}))).unwrap();
        let records = store.query("reports", 1).unwrap();
        prop_assert_eq!(&records[0]["content"], &json!(content));
    }
}
