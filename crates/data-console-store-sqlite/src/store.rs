// crates/data-console-store-sqlite/src/store.rs
// ============================================================================
// Module: SQLite Record Store
// Description: Insert, query, and count records in catalogued tables.
// Purpose: Persist tool records with bound parameters and a guarded connection.
// Dependencies: rusqlite, serde, serde_json, thiserror
// ============================================================================

//! ## Overview
//! [`SqliteRecordStore`] owns one `SQLite` connection behind a mutex. The
//! schema is created on open. Every statement is assembled from catalogue
//! identifiers only, and every caller value is bound as a parameter.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;

use rusqlite::Connection;
use rusqlite::OpenFlags;
use rusqlite::params;
use rusqlite::params_from_iter;
use rusqlite::types::Value as SqlValue;
use rusqlite::types::ValueRef;
use serde::Deserialize;
use serde_json::Map;
use serde_json::Number;
use serde_json::Value;
use thiserror::Error;

use crate::catalog::ColumnKind;
use crate::catalog::TABLES;
use crate::catalog::TableSpec;
use crate::catalog::table_spec;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default busy timeout (ms).
const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;
/// Maximum length of a single path component.
const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
const MAX_TOTAL_PATH_LENGTH: usize = 4096;

// ============================================================================
// SECTION: Config
// ============================================================================

/// `SQLite` journal mode configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SqliteStoreMode {
    /// WAL journal mode.
    #[default]
    Wal,
    /// Delete journal mode.
    Delete,
}

impl SqliteStoreMode {
    /// Returns the `SQLite` pragma value.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Wal => "wal",
            Self::Delete => "delete",
        }
    }
}

/// `SQLite` sync mode configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SqliteSyncMode {
    /// Full synchronous mode.
    #[default]
    Full,
    /// Normal synchronous mode.
    Normal,
}

impl SqliteSyncMode {
    /// Returns the `SQLite` pragma value.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Normal => "normal",
        }
    }
}

/// Configuration for the record store.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SqliteStoreConfig {
    /// Path to the `SQLite` database file.
    pub path: PathBuf,
    /// Busy timeout in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    /// `SQLite` journal mode.
    #[serde(default)]
    pub journal_mode: SqliteStoreMode,
    /// `SQLite` sync mode.
    #[serde(default)]
    pub sync_mode: SqliteSyncMode,
}

impl SqliteStoreConfig {
    /// Creates a config with default pragmas for the given path.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
            journal_mode: SqliteStoreMode::default(),
            sync_mode: SqliteSyncMode::default(),
        }
    }
}

/// Returns the default busy timeout for `SQLite` connections.
#[must_use]
pub const fn default_busy_timeout_ms() -> u64 {
    DEFAULT_BUSY_TIMEOUT_MS
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Record store errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// Filesystem error around the database file.
    #[error("sqlite store io error: {0}")]
    Io(String),
    /// `SQLite` engine error.
    #[error("sqlite store db error: {0}")]
    Db(String),
    /// Table is not in the catalogue.
    #[error("unknown table: {0}")]
    UnknownTable(String),
    /// Column is not writable for the table.
    #[error("unknown column `{column}` for table {table}")]
    UnknownColumn {
        /// Table name.
        table: String,
        /// Rejected column name.
        column: String,
    },
    /// Value cannot be stored in the column.
    #[error("invalid value for `{column}`: {reason}")]
    InvalidValue {
        /// Column name.
        column: String,
        /// Reason the value was refused.
        reason: String,
    },
    /// Store configuration or request is invalid.
    #[error("sqlite store invalid data: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Store
// ============================================================================

/// `SQLite`-backed record store.
#[derive(Clone)]
pub struct SqliteRecordStore {
    /// Shared `SQLite` connection guarded by a mutex.
    connection: Arc<Mutex<Connection>>,
}

impl SqliteRecordStore {
    /// Opens the store and creates any missing tables.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the database cannot be opened or
    /// initialized.
    pub fn new(config: &SqliteStoreConfig) -> Result<Self, StoreError> {
        validate_store_path(&config.path)?;
        ensure_parent_dir(&config.path)?;
        let mut connection = open_connection(config)?;
        initialize_schema(&mut connection)?;
        Ok(Self {
            connection: Arc::new(Mutex::new(connection)),
        })
    }

    /// Inserts one record and returns its row id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] for unknown tables or columns, non-scalar
    /// values, empty records, or database failures.
    pub fn insert(&self, table: &str, data: &Map<String, Value>) -> Result<i64, StoreError> {
        let spec = lookup_table(table)?;
        if data.is_empty() {
            return Err(StoreError::Invalid("record data must not be empty".to_string()));
        }
        let mut columns = Vec::with_capacity(data.len());
        let mut values = Vec::with_capacity(data.len());
        for (name, value) in data {
            let column = spec.column(name).ok_or_else(|| StoreError::UnknownColumn {
                table: spec.name.to_string(),
                column: name.clone(),
            })?;
            values.push(bind_value(column.name, column.kind, value)?);
            columns.push(column.name);
        }
        let placeholders: Vec<String> =
            (1 ..= columns.len()).map(|index| format!("?{index}")).collect();
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            spec.name,
            columns.join(", "),
            placeholders.join(", ")
        );
        let guard =
            self.connection.lock().map_err(|_| StoreError::Db("mutex poisoned".to_string()))?;
        guard
            .execute(&sql, params_from_iter(values.iter()))
            .map_err(|err| StoreError::Db(err.to_string()))?;
        Ok(guard.last_insert_rowid())
    }

    /// Returns up to `limit` records, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] for unknown tables or database failures.
    pub fn query(&self, table: &str, limit: u32) -> Result<Vec<Map<String, Value>>, StoreError> {
        let spec = lookup_table(table)?;
        let columns = spec.select_columns();
        let sql = format!(
            "SELECT {} FROM {} ORDER BY id DESC LIMIT ?1",
            columns.join(", "),
            spec.name
        );
        let guard =
            self.connection.lock().map_err(|_| StoreError::Db("mutex poisoned".to_string()))?;
        let mut statement = guard.prepare(&sql).map_err(|err| StoreError::Db(err.to_string()))?;
        let rows = statement
            .query_map(params![limit], |row| {
                let mut record = Map::new();
                for (index, name) in columns.iter().enumerate() {
                    record.insert((*name).to_string(), json_value(row.get_ref(index)?));
                }
                Ok(record)
            })
            .map_err(|err| StoreError::Db(err.to_string()))?;
        let mut records = Vec::new();
        for row in rows {
            records.push(row.map_err(|err| StoreError::Db(err.to_string()))?);
        }
        Ok(records)
    }

    /// Returns the number of records in a table.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] for unknown tables or database failures.
    pub fn count(&self, table: &str) -> Result<u64, StoreError> {
        let spec = lookup_table(table)?;
        let sql = format!("SELECT COUNT(*) FROM {}", spec.name);
        let guard =
            self.connection.lock().map_err(|_| StoreError::Db("mutex poisoned".to_string()))?;
        let count: i64 = guard
            .query_row(&sql, params![], |row| row.get(0))
            .map_err(|err| StoreError::Db(err.to_string()))?;
        u64::try_from(count).map_err(|_| StoreError::Db("negative record count".to_string()))
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Resolves a table name against the catalogue.
fn lookup_table(table: &str) -> Result<&'static TableSpec, StoreError> {
    table_spec(table).ok_or_else(|| StoreError::UnknownTable(table.to_string()))
}

/// Converts a JSON scalar into a bound `SQLite` value.
fn bind_value(column: &str, kind: ColumnKind, value: &Value) -> Result<SqlValue, StoreError> {
    let invalid = |reason: &str| StoreError::InvalidValue {
        column: column.to_string(),
        reason: reason.to_string(),
    };
    match (kind, value) {
        (_, Value::Null) => Ok(SqlValue::Null),
        (_, Value::Number(number)) => {
            if let Some(integer) = number.as_i64()
                && kind == ColumnKind::Text
            {
                return Ok(SqlValue::Integer(integer));
            }
            number.as_f64().map(SqlValue::Real).ok_or_else(|| invalid("number out of range"))
        }
        (ColumnKind::Text, Value::String(text)) => Ok(SqlValue::Text(text.clone())),
        (ColumnKind::Text, Value::Bool(flag)) => Ok(SqlValue::Integer(i64::from(*flag))),
        (ColumnKind::Real, Value::String(_) | Value::Bool(_)) => Err(invalid("expected number")),
        (_, Value::Array(_) | Value::Object(_)) => Err(invalid("expected a scalar value")),
    }
}

/// Converts a `SQLite` value into JSON.
fn json_value(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null | ValueRef::Blob(_) => Value::Null,
        ValueRef::Integer(integer) => Value::from(integer),
        ValueRef::Real(real) => Number::from_f64(real).map_or(Value::Null, Value::Number),
        ValueRef::Text(text) => Value::String(String::from_utf8_lossy(text).into_owned()),
    }
}

/// Ensures the parent directory exists for the store path.
fn ensure_parent_dir(path: &Path) -> Result<(), StoreError> {
    let Some(parent) = path.parent() else {
        return Err(StoreError::Io("store path missing parent directory".to_string()));
    };
    if parent.as_os_str().is_empty() {
        return Ok(());
    }
    std::fs::create_dir_all(parent).map_err(|err| StoreError::Io(err.to_string()))
}

/// Validates store paths for safety limits.
fn validate_store_path(path: &Path) -> Result<(), StoreError> {
    let path_string = path.display().to_string();
    if path_string.trim().is_empty() {
        return Err(StoreError::Invalid("store path must be non-empty".to_string()));
    }
    if path_string.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(StoreError::Invalid("store path exceeds length limit".to_string()));
    }
    for component in path.components() {
        let name = component.as_os_str().to_string_lossy();
        if name.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(StoreError::Invalid(
                "store path contains an overlong component".to_string(),
            ));
        }
    }
    if path.is_dir() {
        return Err(StoreError::Invalid("store path must be a file, not a directory".to_string()));
    }
    Ok(())
}

/// Opens an `SQLite` connection with the configured pragmas.
fn open_connection(config: &SqliteStoreConfig) -> Result<Connection, StoreError> {
    let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
        | OpenFlags::SQLITE_OPEN_CREATE
        | OpenFlags::SQLITE_OPEN_FULL_MUTEX;
    let connection = Connection::open_with_flags(&config.path, flags)
        .map_err(|err| StoreError::Db(err.to_string()))?;
    connection
        .execute_batch(&format!("PRAGMA journal_mode = {};", config.journal_mode.pragma_value()))
        .map_err(|err| StoreError::Db(err.to_string()))?;
    connection
        .execute_batch(&format!("PRAGMA synchronous = {};", config.sync_mode.pragma_value()))
        .map_err(|err| StoreError::Db(err.to_string()))?;
    connection
        .busy_timeout(Duration::from_millis(config.busy_timeout_ms))
        .map_err(|err| StoreError::Db(err.to_string()))?;
    Ok(connection)
}

/// Creates every catalogued table that does not exist yet.
fn initialize_schema(connection: &mut Connection) -> Result<(), StoreError> {
    let tx = connection.transaction().map_err(|err| StoreError::Db(err.to_string()))?;
    for table in TABLES {
        tx.execute_batch(&table.create_statement())
            .map_err(|err| StoreError::Db(err.to_string()))?;
    }
    tx.commit().map_err(|err| StoreError::Db(err.to_string()))
}
