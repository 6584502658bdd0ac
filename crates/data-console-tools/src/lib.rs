// crates/data-console-tools/src/lib.rs
// ============================================================================
// Module: Data Console Tools
// Description: Built-in backing operations for the data console server.
// Purpose: Provide the weather, file, CSV, and record tools behind the registry.
// Dependencies: data-console-core, data-console-store-sqlite, csv, rand
// ============================================================================

//! ## Overview
//! This crate ships the eight built-in tools and the function that registers
//! them. Every operation works only with the grant issued by the security
//! policy and renders its own deterministic markdown.
//! Security posture: tool arguments and file contents are untrusted.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod builtin;
pub mod files;
pub mod records;
pub mod tabular;
pub mod weather;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use builtin::builtin_registry;
pub use builtin::register_builtin_tools;
pub use files::ListFilesOperation;
pub use files::ReadFileOperation;
pub use records::DatabaseSummaryOperation;
pub use records::InsertRecordOperation;
pub use records::QueryRecordsOperation;
pub use tabular::FilterCsvOperation;
pub use tabular::SummarizeCsvOperation;
pub use weather::WeatherOperation;
