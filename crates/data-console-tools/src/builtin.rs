// crates/data-console-tools/src/builtin.rs
// ============================================================================
// Module: Built-in Tool Catalogue
// Description: Descriptors, capabilities, and registration of built-in tools.
// Purpose: Declare the public tool surface in one place.
// Dependencies: data-console-config, data-console-core, data-console-store-sqlite
// ============================================================================

//! ## Overview
//! Each built-in tool is declared here with its input schema, behavioral
//! annotations, and sandbox capability. [`register_builtin_tools`] binds the
//! declarations to their operations; registration order is the order clients
//! see in `tools/list`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use data_console_config::ToolsConfig;
use data_console_core::Capability;
use data_console_core::FieldSpec;
use data_console_core::InputSchema;
use data_console_core::RegistryError;
use data_console_core::ToolAnnotations;
use data_console_core::ToolDescriptor;
use data_console_core::ToolRegistry;
use data_console_core::ToolRegistryBuilder;
use data_console_store_sqlite::SqliteRecordStore;
use data_console_store_sqlite::TABLES;
use serde_json::json;

use crate::files::ListFilesOperation;
use crate::files::ReadFileOperation;
use crate::records::DatabaseSummaryOperation;
use crate::records::InsertRecordOperation;
use crate::records::QueryRecordsOperation;
use crate::tabular::FilterCsvOperation;
use crate::tabular::SummarizeCsvOperation;
use crate::weather::WeatherOperation;

// ============================================================================
// SECTION: Shared Fields
// ============================================================================

/// Optional rendering selector shared by most tools.
fn response_format_field() -> FieldSpec {
    FieldSpec::string("response_format")
        .describe("Output format: 'markdown' for human-readable or 'json' for structured data")
        .one_of(["markdown", "json"])
        .with_default(json!("markdown"))
}

/// Filename argument resolved inside the allowed root.
fn filename_field(description: &str) -> FieldSpec {
    FieldSpec::string("filename").describe(description).required().min_length(1).max_length(255)
}

/// Table argument restricted to the catalogued tables.
fn table_field(description: &str) -> FieldSpec {
    FieldSpec::string("table")
        .describe(description)
        .required()
        .one_of(TABLES.iter().map(|table| table.name))
}

// ============================================================================
// SECTION: Registration
// ============================================================================

/// Registers every built-in tool on the builder.
///
/// # Errors
///
/// Returns [`RegistryError`] when a tool conflicts with an existing
/// registration or its declaration is inconsistent.
pub fn register_builtin_tools(
    builder: &mut ToolRegistryBuilder,
    tools: &ToolsConfig,
    store: &Arc<SqliteRecordStore>,
) -> Result<(), RegistryError> {
    builder.register(
        ToolDescriptor::new(
            "get_weather",
            "Get current weather information (temperature, humidity, condition) for a city.",
            InputSchema::new().strip_whitespace()
                .field(
                    FieldSpec::string("city")
                        .describe("City name to get weather for (e.g., 'Mumbai', 'London')")
                        .required()
                        .min_length(1)
                        .max_length(100),
                )
                .field(response_format_field()),
            ToolAnnotations::read_only("Get Weather Information"),
        ),
        Capability::None,
        Arc::new(WeatherOperation::new(tools.weather_seed)),
    )?;
    builder.register(
        ToolDescriptor::new(
            "list_files",
            "List all files available in the data directory.",
            InputSchema::new().strip_whitespace().field(response_format_field()),
            ToolAnnotations::read_only("List Files in Data Directory"),
        ),
        Capability::root_directory(),
        Arc::new(ListFilesOperation),
    )?;
    builder.register(
        ToolDescriptor::new(
            "read_file",
            "Read the contents of a text file from the data directory.",
            InputSchema::new().strip_whitespace()
                .field(filename_field("Name of the file to read (e.g., 'notes.txt')"))
                .field(response_format_field()),
            ToolAnnotations::read_only("Read File Contents"),
        ),
        Capability::file_argument("filename"),
        Arc::new(ReadFileOperation::new(tools.max_file_bytes)),
    )?;
    builder.register(
        ToolDescriptor::new(
            "summarize_csv",
            "Summarize a CSV file: row count, column names, and missing values per column.",
            InputSchema::new().strip_whitespace()
                .field(filename_field("Name of the CSV file to analyze (e.g., 'sales.csv')"))
                .field(response_format_field()),
            ToolAnnotations::read_only("Analyze CSV File"),
        ),
        Capability::file_argument("filename"),
        Arc::new(SummarizeCsvOperation::new(tools.max_file_bytes)),
    )?;
    builder.register(
        ToolDescriptor::new(
            "filter_csv",
            "Filter a CSV file by column value and preview the matching rows.",
            InputSchema::new().strip_whitespace()
                .field(filename_field("Name of the CSV file to filter (e.g., 'sales.csv')"))
                .field(
                    FieldSpec::string("column")
                        .describe("Column name to filter by (e.g., 'Region')")
                        .required()
                        .min_length(1)
                        .max_length(100),
                )
                .field(
                    FieldSpec::string("value")
                        .describe("Value to match exactly in the column (e.g., 'North')")
                        .required(),
                )
                .field(response_format_field()),
            ToolAnnotations::read_only("Filter CSV Data"),
        ),
        Capability::file_argument("filename"),
        Arc::new(FilterCsvOperation::new(tools.max_file_bytes, tools.csv_preview_rows)),
    )?;
    builder.register(
        ToolDescriptor::new(
            "insert_database_record",
            "Insert a record. Columns: weather_logs {city, temperature, condition}; \
             file_logs {filename, action}; reports {report_name, content}.",
            InputSchema::new().strip_whitespace()
                .field(table_field("Table to insert into"))
                .field(
                    FieldSpec::object("data")
                        .describe("Column-value pairs to insert")
                        .required(),
                ),
            ToolAnnotations::mutating("Insert Record into Database"),
        ),
        Capability::table_write("table"),
        Arc::new(InsertRecordOperation::new(Arc::clone(store))),
    )?;
    builder.register(
        ToolDescriptor::new(
            "query_database_records",
            "Fetch the most recent records of a table, newest first.",
            InputSchema::new().strip_whitespace()
                .field(table_field("Table to query"))
                .field(
                    FieldSpec::integer("limit")
                        .describe("Maximum number of records to return")
                        .range(1.0, 100.0)
                        .with_default(json!(10)),
                )
                .field(response_format_field()),
            ToolAnnotations::read_only("Query Database Records"),
        ),
        Capability::table_read("table"),
        Arc::new(QueryRecordsOperation::new(Arc::clone(store))),
    )?;
    builder.register(
        ToolDescriptor::new(
            "get_database_summary",
            "Return the total record count of a table.",
            InputSchema::new().strip_whitespace().field(table_field("Table to summarize")),
            ToolAnnotations::read_only("Get Database Table Summary"),
        ),
        Capability::table_read("table"),
        Arc::new(DatabaseSummaryOperation::new(Arc::clone(store))),
    )?;
    Ok(())
}

/// Builds a registry holding only the built-in tools.
///
/// # Errors
///
/// Returns [`RegistryError`] when a built-in declaration is inconsistent.
pub fn builtin_registry(
    tools: &ToolsConfig,
    store: &Arc<SqliteRecordStore>,
) -> Result<ToolRegistry, RegistryError> {
    let mut builder = ToolRegistryBuilder::new();
    register_builtin_tools(&mut builder, tools, store)?;
    Ok(builder.build())
}
