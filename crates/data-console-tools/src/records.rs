// crates/data-console-tools/src/records.rs
// ============================================================================
// Module: Record Tools
// Description: Insert, query, and summarize records in the SQLite store.
// Purpose: Expose allow-listed persistence through granted table names.
// Dependencies: data-console-core, data-console-store-sqlite, serde_json
// ============================================================================

//! ## Overview
//! Record tools receive a [`TableName`] grant from the security policy and
//! pass it to the store, which resolves it against its own catalogue.
//! Store failures caused by caller input surface as rejections; engine
//! failures surface as a generic message with the detail kept for audit.
//!
//! [`TableName`]: data_console_core::TableName

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use data_console_core::OperationError;
use data_console_core::OperationRequest;
use data_console_core::ToolOperation;
use data_console_core::format::display_scalar;
use data_console_core::format::markdown_table;
use data_console_store_sqlite::SqliteRecordStore;
use data_console_store_sqlite::StoreError;
use data_console_store_sqlite::table_spec;
use serde_json::Value;
use serde_json::json;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Records returned when no limit is supplied.
const DEFAULT_QUERY_LIMIT: i64 = 10;

// ============================================================================
// SECTION: Insert
// ============================================================================

/// Inserts one record.
pub struct InsertRecordOperation {
    /// Backing store.
    store: Arc<SqliteRecordStore>,
}

impl InsertRecordOperation {
    /// Creates the operation over a shared store.
    #[must_use]
    pub const fn new(store: Arc<SqliteRecordStore>) -> Self {
        Self {
            store,
        }
    }
}

impl ToolOperation for InsertRecordOperation {
    fn execute(&self, request: &OperationRequest) -> Result<Value, OperationError> {
        let table = request.required_table()?;
        let data = request
            .arguments
            .object("data")
            .ok_or_else(|| OperationError::Rejected("data must be an object".to_string()))?;
        let id = self.store.insert(table.as_str(), data).map_err(store_error)?;
        Ok(json!({
            "table": table,
            "id": id,
            "data": data,
        }))
    }

    fn render_markdown(&self, output: &Value) -> Option<String> {
        let data = output.get("data")?;
        let pretty = serde_json::to_string_pretty(data).unwrap_or_else(|_| data.to_string());
        Some(format!(
            "Successfully inserted record into {}\n\n**Record ID:** {}\n\n```json\n{pretty}\n```",
            output.get("table")?.as_str()?,
            output.get("id")?,
        ))
    }
}

// ============================================================================
// SECTION: Query
// ============================================================================

/// Returns the newest records of a table.
pub struct QueryRecordsOperation {
    /// Backing store.
    store: Arc<SqliteRecordStore>,
}

impl QueryRecordsOperation {
    /// Creates the operation over a shared store.
    #[must_use]
    pub const fn new(store: Arc<SqliteRecordStore>) -> Self {
        Self {
            store,
        }
    }
}

impl ToolOperation for QueryRecordsOperation {
    fn execute(&self, request: &OperationRequest) -> Result<Value, OperationError> {
        let table = request.required_table()?;
        let limit = request.arguments.i64("limit").unwrap_or(DEFAULT_QUERY_LIMIT);
        let limit = u32::try_from(limit)
            .map_err(|_| OperationError::Rejected("limit must be a positive integer".to_string()))?;
        let records = self.store.query(table.as_str(), limit).map_err(store_error)?;
        Ok(json!({
            "table": table,
            "records": records,
        }))
    }

    fn render_markdown(&self, output: &Value) -> Option<String> {
        let table = output.get("table")?.as_str()?;
        let records = output.get("records")?.as_array()?;
        if records.is_empty() {
            return Some(format!("# {table}\n\n**No records found**"));
        }
        let columns: Vec<String> = table_spec(table)?
            .select_columns()
            .into_iter()
            .map(str::to_string)
            .collect();
        let rows: Vec<Vec<String>> = records
            .iter()
            .map(|record| {
                columns
                    .iter()
                    .map(|column| record.get(column).map(display_scalar).unwrap_or_default())
                    .collect()
            })
            .collect();
        Some(format!(
            "# {table} Records\n\n**Count:** {} record(s)\n\n{}",
            records.len(),
            markdown_table(&columns, &rows)
        ))
    }
}

// ============================================================================
// SECTION: Summary
// ============================================================================

/// Counts the records of a table.
pub struct DatabaseSummaryOperation {
    /// Backing store.
    store: Arc<SqliteRecordStore>,
}

impl DatabaseSummaryOperation {
    /// Creates the operation over a shared store.
    #[must_use]
    pub const fn new(store: Arc<SqliteRecordStore>) -> Self {
        Self {
            store,
        }
    }
}

impl ToolOperation for DatabaseSummaryOperation {
    fn execute(&self, request: &OperationRequest) -> Result<Value, OperationError> {
        let table = request.required_table()?;
        let total = self.store.count(table.as_str()).map_err(store_error)?;
        Ok(json!({
            "table": table,
            "total_records": total,
        }))
    }

    fn render_markdown(&self, output: &Value) -> Option<String> {
        Some(format!(
            "# {} Summary\n\n**Total Records:** {}",
            output.get("table")?.as_str()?,
            output.get("total_records")?,
        ))
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Maps store failures onto operation errors.
fn store_error(error: StoreError) -> OperationError {
    match error {
        StoreError::UnknownTable(_)
        | StoreError::UnknownColumn {
            ..
        }
        | StoreError::InvalidValue {
            ..
        }
        | StoreError::Invalid(_) => OperationError::Rejected(error.to_string()),
        StoreError::Io(_) | StoreError::Db(_) => {
            OperationError::internal_with("database operation failed", error.to_string())
        }
    }
}
