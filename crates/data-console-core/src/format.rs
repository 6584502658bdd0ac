// crates/data-console-core/src/format.rs
// ============================================================================
// Module: Response Formatter
// Description: Markdown and JSON rendering of operation results.
// Purpose: Produce deterministic content blocks in the caller's preferred form.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! Results are rendered either as a single `json` content block holding the
//! value verbatim, or as a `text` block of markdown. Markdown output is
//! deterministic: object keys are sorted and floats use two decimals.
//! Operations may supply their own renderer through
//! [`ToolOperation::render_markdown`]; otherwise the generic renderer is used.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Map;
use serde_json::Number;
use serde_json::Value;

use crate::operation::ToolOperation;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Rendering requested by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseFormat {
    /// Human-readable markdown.
    #[default]
    Markdown,
    /// Structured JSON.
    Json,
}

impl ResponseFormat {
    /// Resolves a selector; anything other than `json` means markdown.
    #[must_use]
    pub fn from_selector(selector: Option<&str>) -> Self {
        match selector {
            Some("json") => Self::Json,
            _ => Self::Markdown,
        }
    }

    /// Returns the selector label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Markdown => "markdown",
            Self::Json => "json",
        }
    }
}

/// Typed content block in a `tools/call` result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    /// Text content.
    Text {
        /// Rendered text.
        text: String,
    },
    /// Structured content.
    Json {
        /// Value returned by the operation.
        json: Value,
    },
}

// ============================================================================
// SECTION: Rendering
// ============================================================================

/// Renders an operation result into content blocks.
#[must_use]
pub fn render_output(
    output: &Value,
    format: ResponseFormat,
    operation: &dyn ToolOperation,
) -> Vec<ContentBlock> {
    match format {
        ResponseFormat::Json => vec![ContentBlock::Json {
            json: output.clone(),
        }],
        ResponseFormat::Markdown => {
            let text =
                operation.render_markdown(output).unwrap_or_else(|| render_markdown(output));
            vec![ContentBlock::Text {
                text,
            }]
        }
    }
}

/// Generic markdown rendering of any JSON value.
#[must_use]
pub fn render_markdown(value: &Value) -> String {
    match value {
        Value::Object(map) => render_object(map),
        Value::Array(items) => render_array(items),
        scalar => display_scalar(scalar),
    }
}

/// Renders an object as `**key:** value` lines in sorted key order.
fn render_object(map: &Map<String, Value>) -> String {
    let mut keys: Vec<&String> = map.keys().collect();
    keys.sort();
    let mut lines = Vec::with_capacity(keys.len());
    for key in keys {
        let rendered = map.get(key).map(display_inline).unwrap_or_default();
        lines.push(format!("**{key}:** {rendered}"));
    }
    lines.join("\n")
}

/// Renders an array as a table of objects or a bullet list.
fn render_array(items: &[Value]) -> String {
    if items.is_empty() {
        return "_No results._".to_string();
    }
    if items.iter().all(Value::is_object) {
        let columns: BTreeSet<&str> = items
            .iter()
            .filter_map(Value::as_object)
            .flat_map(|row| row.keys().map(String::as_str))
            .collect();
        let columns: Vec<String> = columns.into_iter().map(str::to_string).collect();
        let rows: Vec<Vec<String>> = items
            .iter()
            .filter_map(Value::as_object)
            .map(|row| {
                columns
                    .iter()
                    .map(|column| row.get(column).map(display_inline).unwrap_or_default())
                    .collect()
            })
            .collect();
        return markdown_table(&columns, &rows);
    }
    items.iter().map(|item| format!("- {}", display_inline(item))).collect::<Vec<_>>().join("\n")
}

/// Renders a nested value on one line.
fn display_inline(value: &Value) -> String {
    match value {
        Value::Array(items) if items.iter().all(|item| !item.is_object() && !item.is_array()) => {
            items.iter().map(display_scalar).collect::<Vec<_>>().join(", ")
        }
        Value::Array(_) | Value::Object(_) => value.to_string(),
        scalar => display_scalar(scalar),
    }
}

/// Formats a number; floats use two decimals.
#[must_use]
pub fn format_number(number: &Number) -> String {
    if number.is_i64() || number.is_u64() {
        return number.to_string();
    }
    number.as_f64().map_or_else(|| number.to_string(), |float| format!("{float:.2}"))
}

/// Formats a scalar for display; compound values use compact JSON.
#[must_use]
pub fn display_scalar(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(flag) => flag.to_string(),
        Value::Number(number) => format_number(number),
        Value::String(text) => text.clone(),
        Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}

/// Builds a markdown table; pipes and newlines inside cells are escaped.
#[must_use]
pub fn markdown_table(columns: &[String], rows: &[Vec<String>]) -> String {
    let mut table = String::new();
    let header: Vec<String> = columns.iter().map(|column| escape_cell(column)).collect();
    table.push_str(&format!("| {} |\n", header.join(" | ")));
    table.push_str(&format!("| {} |", vec!["---"; columns.len()].join(" | ")));
    for row in rows {
        let cells: Vec<String> = row.iter().map(|cell| escape_cell(cell)).collect();
        table.push_str(&format!("\n| {} |", cells.join(" | ")));
    }
    table
}

/// Escapes characters that would break a table cell.
fn escape_cell(cell: &str) -> String {
    cell.replace('|', "\\|").replace(['\r', '\n'], " ")
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use serde_json::Value;
    use serde_json::json;

    use super::ContentBlock;
    use super::ResponseFormat;
    use super::render_markdown;
    use super::render_output;
    use crate::operation::OperationError;
    use crate::operation::OperationRequest;
    use crate::operation::ToolOperation;

    struct Plain;

    impl ToolOperation for Plain {
        fn execute(&self, _request: &OperationRequest) -> Result<Value, OperationError> {
            Ok(Value::Null)
        }
    }

    struct Custom;

    impl ToolOperation for Custom {
        fn execute(&self, _request: &OperationRequest) -> Result<Value, OperationError> {
            Ok(Value::Null)
        }

        fn render_markdown(&self, output: &Value) -> Option<String> {
            Some(format!("# {}", output["title"].as_str().unwrap_or_default()))
        }
    }

    #[test]
    fn unknown_selector_falls_back_to_markdown() {
        assert_eq!(ResponseFormat::from_selector(Some("yaml")), ResponseFormat::Markdown);
        assert_eq!(ResponseFormat::from_selector(None), ResponseFormat::Markdown);
        assert_eq!(ResponseFormat::from_selector(Some("json")), ResponseFormat::Json);
    }

    #[test]
    fn json_format_wraps_value_verbatim() {
        let value = json!({"b": 1.234_5, "a": [1, 2]});
        let blocks = render_output(&value, ResponseFormat::Json, &Plain);
        assert_eq!(blocks, vec![ContentBlock::Json {
            json: value
        }]);
    }

    #[test]
    fn string_output_renders_as_itself() {
        assert_eq!(render_markdown(&json!("hello")), "hello");
    }

    #[test]
    fn objects_render_sorted_with_two_decimal_floats() {
        let text = render_markdown(&json!({"zeta": 1, "alpha": 2.5, "mid": "x"}));
        assert_eq!(text, "**alpha:** 2.50\n**mid:** x\n**zeta:** 1");
    }

    #[test]
    fn object_arrays_render_as_tables() {
        let text = render_markdown(&json!([{"id": 2, "name": "a|b"}, {"id": 1}]));
        assert_eq!(text, "| id | name |\n| --- | --- |\n| 2 | a\\|b |\n| 1 |  |");
    }

    #[test]
    fn operation_renderer_takes_precedence() {
        let blocks = render_output(&json!({"title": "Report"}), ResponseFormat::Markdown, &Custom);
        assert_eq!(blocks, vec![ContentBlock::Text {
            text: "# Report".to_string()
        }]);
    }

    #[test]
    fn content_block_wire_shape() {
        let text = serde_json::to_value(ContentBlock::Text {
            text: "hi".to_string(),
        })
        .unwrap_or_default();
        assert_eq!(text, json!({"type": "text", "text": "hi"}));
    }
}
