// crates/data-console-tools/src/tabular.rs
// ============================================================================
// Module: CSV Tools
// Description: Summary statistics and equality filtering for CSV files.
// Purpose: Analyze tabular files inside the allowed root.
// Dependencies: csv, data-console-core, serde_json
// ============================================================================

//! ## Overview
//! CSV files are read through the same size-limited loader as `read_file` and
//! parsed with a header row. Ragged rows are tolerated; a missing trailing
//! field counts as a missing value. Values are compared as exact strings.

// ============================================================================
// SECTION: Imports
// ============================================================================

use csv::ReaderBuilder;
use csv::StringRecord;
use data_console_core::OperationError;
use data_console_core::OperationRequest;
use data_console_core::ToolOperation;
use data_console_core::format::markdown_table;
use serde_json::Map;
use serde_json::Value;
use serde_json::json;

use crate::files::read_file_limited;

// ============================================================================
// SECTION: Parsing
// ============================================================================

/// Parsed CSV document.
struct CsvDocument {
    /// Header names in file order.
    headers: Vec<String>,
    /// Data rows.
    rows: Vec<StringRecord>,
}

impl CsvDocument {
    /// Loads and parses the granted CSV file.
    fn load(request: &OperationRequest, max_bytes: usize) -> Result<Self, OperationError> {
        let filename = request.required_str("filename")?;
        let bytes = read_file_limited(request.required_path()?, filename, max_bytes)?;
        let malformed =
            |err: csv::Error| OperationError::Rejected(format!("Malformed CSV in {filename}: {err}"));
        let mut reader = ReaderBuilder::new().flexible(true).from_reader(bytes.as_slice());
        let headers: Vec<String> =
            reader.headers().map_err(malformed)?.iter().map(str::to_string).collect();
        let mut rows = Vec::new();
        for record in reader.records() {
            rows.push(record.map_err(malformed)?);
        }
        Ok(Self {
            headers,
            rows,
        })
    }

    /// Returns the position of a header.
    fn column_index(&self, column: &str) -> Option<usize> {
        self.headers.iter().position(|header| header == column)
    }

    /// Converts a row into a header-keyed object.
    fn row_object(&self, row: &StringRecord) -> Value {
        let mut object = Map::new();
        for (index, header) in self.headers.iter().enumerate() {
            let cell = row.get(index).map_or(Value::Null, |cell| Value::String(cell.to_string()));
            object.insert(header.clone(), cell);
        }
        Value::Object(object)
    }
}

// ============================================================================
// SECTION: Summarize
// ============================================================================

/// Row count, columns, and missing values per column.
pub struct SummarizeCsvOperation {
    /// Maximum file size in bytes.
    max_bytes: usize,
}

impl SummarizeCsvOperation {
    /// Creates the operation with a read limit.
    #[must_use]
    pub const fn new(max_bytes: usize) -> Self {
        Self {
            max_bytes,
        }
    }
}

impl ToolOperation for SummarizeCsvOperation {
    fn execute(&self, request: &OperationRequest) -> Result<Value, OperationError> {
        let document = CsvDocument::load(request, self.max_bytes)?;
        let mut missing = Map::new();
        for (index, header) in document.headers.iter().enumerate() {
            let count = document
                .rows
                .iter()
                .filter(|row| row.get(index).is_none_or(str::is_empty))
                .count();
            missing.insert(header.clone(), json!(count));
        }
        Ok(json!({
            "rows": document.rows.len(),
            "columns": document.headers,
            "missing_values": missing,
        }))
    }

    fn render_markdown(&self, output: &Value) -> Option<String> {
        let columns = output.get("columns")?.as_array()?;
        let missing = output.get("missing_values")?.as_object()?;
        let mut text = format!(
            "# CSV File Summary\n\n**Total Rows:** {}\n\n## Columns ({})\n",
            output.get("rows")?,
            columns.len()
        );
        for column in columns.iter().filter_map(Value::as_str) {
            text.push_str(&format!("  - {column}\n"));
        }
        text.push_str("\n## Missing Values\n");
        for column in columns.iter().filter_map(Value::as_str) {
            let count = missing.get(column).map_or_else(|| "0".to_string(), Value::to_string);
            text.push_str(&format!("  - **{column}:** {count}\n"));
        }
        Some(text.trim_end().to_string())
    }
}

// ============================================================================
// SECTION: Filter
// ============================================================================

/// Rows whose column equals a value, with a bounded preview.
pub struct FilterCsvOperation {
    /// Maximum file size in bytes.
    max_bytes: usize,
    /// Number of matching rows included in the preview.
    preview_rows: usize,
}

impl FilterCsvOperation {
    /// Creates the operation with a read limit and preview size.
    #[must_use]
    pub const fn new(max_bytes: usize, preview_rows: usize) -> Self {
        Self {
            max_bytes,
            preview_rows,
        }
    }
}

impl ToolOperation for FilterCsvOperation {
    fn execute(&self, request: &OperationRequest) -> Result<Value, OperationError> {
        let column = request.required_str("column")?;
        let value = request.required_str("value")?;
        let document = CsvDocument::load(request, self.max_bytes)?;
        let index = document
            .column_index(column)
            .ok_or_else(|| OperationError::Rejected(format!("Column '{column}' not found")))?;
        let matching: Vec<&StringRecord> =
            document.rows.iter().filter(|row| row.get(index) == Some(value)).collect();
        let preview: Vec<Value> = matching
            .iter()
            .take(self.preview_rows)
            .map(|row| document.row_object(row))
            .collect();
        Ok(json!({
            "rows_found": matching.len(),
            "columns": document.headers,
            "preview": preview,
        }))
    }

    fn render_markdown(&self, output: &Value) -> Option<String> {
        let found = output.get("rows_found")?;
        let preview = output.get("preview")?.as_array()?;
        if preview.is_empty() {
            return Some(format!("# Filter Results\n\n**Rows Found:** {found}"));
        }
        let columns: Vec<String> = output
            .get("columns")?
            .as_array()?
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect();
        let rows: Vec<Vec<String>> = preview
            .iter()
            .map(|row| {
                columns
                    .iter()
                    .map(|column| {
                        row.get(column).and_then(Value::as_str).unwrap_or_default().to_string()
                    })
                    .collect()
            })
            .collect();
        Some(format!(
            "# Filter Results\n\n**Rows Found:** {found}\n\n## Preview (first {} rows)\n\n{}",
            preview.len(),
            markdown_table(&columns, &rows)
        ))
    }
}
