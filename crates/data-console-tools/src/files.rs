// crates/data-console-tools/src/files.rs
// ============================================================================
// Module: File Tools
// Description: Listing and reading files inside the allowed root.
// Purpose: Expose sandboxed file access through granted paths only.
// Dependencies: data-console-core, serde_json
// ============================================================================

//! ## Overview
//! `list_files` reads the allowed root directory and `read_file` reads one
//! UTF-8 file. Both operate solely on the path or directory granted by the
//! security policy, and reads are capped at a configured byte limit.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use data_console_core::OperationError;
use data_console_core::OperationRequest;
use data_console_core::ToolOperation;
use serde_json::Value;
use serde_json::json;

// ============================================================================
// SECTION: List Files
// ============================================================================

/// Lists regular files directly under the allowed root.
pub struct ListFilesOperation;

impl ToolOperation for ListFilesOperation {
    fn execute(&self, request: &OperationRequest) -> Result<Value, OperationError> {
        let root = request
            .directory()
            .ok_or_else(|| OperationError::internal("no directory grant issued"))?;
        let entries = fs::read_dir(root).map_err(|err| {
            OperationError::internal_with("unable to list data directory", err.to_string())
        })?;
        let mut files = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|err| {
                OperationError::internal_with("unable to list data directory", err.to_string())
            })?;
            if entry.file_type().is_ok_and(|kind| kind.is_file()) {
                files.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        files.sort();
        Ok(json!({ "files": files }))
    }

    fn render_markdown(&self, output: &Value) -> Option<String> {
        let files = output.get("files")?.as_array()?;
        if files.is_empty() {
            return Some("**No files found in data directory**".to_string());
        }
        let list: Vec<String> =
            files.iter().filter_map(Value::as_str).map(|name| format!("- {name}")).collect();
        Some(format!(
            "# Files in Data Directory\n\n{}\n\n**Total:** {} file(s)",
            list.join("\n"),
            files.len()
        ))
    }
}

// ============================================================================
// SECTION: Read File
// ============================================================================

/// Reads one UTF-8 file inside the allowed root.
pub struct ReadFileOperation {
    /// Maximum file size in bytes.
    max_bytes: usize,
}

impl ReadFileOperation {
    /// Creates the operation with a read limit.
    #[must_use]
    pub const fn new(max_bytes: usize) -> Self {
        Self {
            max_bytes,
        }
    }
}

impl ToolOperation for ReadFileOperation {
    fn execute(&self, request: &OperationRequest) -> Result<Value, OperationError> {
        let filename = request.required_str("filename")?;
        let bytes = read_file_limited(request.required_path()?, filename, self.max_bytes)?;
        let content = String::from_utf8(bytes).map_err(|_| {
            OperationError::Rejected(format!("File is not valid UTF-8 text: {filename}"))
        })?;
        let lines = content.split('\n').count();
        let characters = content.chars().count();
        Ok(json!({
            "filename": filename,
            "content": content,
            "lines": lines,
            "characters": characters,
        }))
    }

    fn render_markdown(&self, output: &Value) -> Option<String> {
        Some(format!(
            "# File: {}\n\n**Lines:** {} | **Characters:** {}\n\n---\n\n{}",
            output.get("filename")?.as_str()?,
            output.get("lines")?,
            output.get("characters")?,
            output.get("content")?.as_str()?,
        ))
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Reads a granted file while enforcing a maximum byte limit.
///
/// `display_name` is the caller's filename and is the only name that appears
/// in public messages.
pub(crate) fn read_file_limited(
    path: &Path,
    display_name: &str,
    max_bytes: usize,
) -> Result<Vec<u8>, OperationError> {
    if !path.is_file() {
        return Err(OperationError::NotFound(format!("File not found: {display_name}")));
    }
    let file = File::open(path).map_err(|err| {
        OperationError::internal_with(format!("unable to open {display_name}"), err.to_string())
    })?;
    let limit = u64::try_from(max_bytes.saturating_add(1))
        .map_err(|_| OperationError::internal("file size limit exceeds u64"))?;
    let mut buf = Vec::new();
    file.take(limit).read_to_end(&mut buf).map_err(|err| {
        OperationError::internal_with(format!("unable to read {display_name}"), err.to_string())
    })?;
    if buf.len() > max_bytes {
        return Err(OperationError::Rejected(format!(
            "File exceeds size limit of {max_bytes} bytes: {display_name}"
        )));
    }
    Ok(buf)
}
