// crates/data-console-store-sqlite/src/lib.rs
// ============================================================================
// Module: SQLite Record Store
// Description: Record persistence for the data console database tools.
// Purpose: Provide allow-listed, parameterized access to a fixed table set.
// Dependencies: rusqlite, serde, serde_json, thiserror
// ============================================================================

//! ## Overview
//! This crate persists records for the `weather_logs`, `file_logs`, and
//! `reports` tables. Table and column names always come from the fixed
//! [`catalog`]; caller values are bound as parameters and never spliced into
//! SQL text. Security posture: record values are untrusted.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod catalog;
pub mod store;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use catalog::ColumnKind;
pub use catalog::ColumnSpec;
pub use catalog::TABLES;
pub use catalog::TableSpec;
pub use catalog::table_spec;
pub use store::SqliteRecordStore;
pub use store::SqliteStoreConfig;
pub use store::SqliteStoreMode;
pub use store::SqliteSyncMode;
pub use store::StoreError;
