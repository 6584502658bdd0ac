// crates/data-console-core/tests/format_golden.rs
// ============================================================================
// Module: Formatter Golden Tests
// Description: Golden outputs of the generic markdown renderer.
// Purpose: Keep markdown rendering deterministic across releases.
// ============================================================================

//! Formatter golden tests.

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

mod common;

use data_console_core::ContentBlock;
use data_console_core::ResponseFormat;
use data_console_core::format::render_markdown;
use data_console_core::render_output;
use serde_json::json;

#[test]
fn summary_object_golden() {
    let value = json!({"table": "reports", "total_records": 3});
    assert_eq!(render_markdown(&value), "**table:** reports\n**total_records:** 3");
}

#[test]
fn nested_values_render_inline() {
    let value = json!({"columns": ["a", "b"], "missing": {"a": 0}});
    assert_eq!(render_markdown(&value), "**columns:** a, b\n**missing:** {\"a\":0}");
}

#[test]
fn scalar_arrays_render_as_bullets() {
    assert_eq!(render_markdown(&json!(["x.csv", 2.0])), "- x.csv\n- 2.00");
    assert_eq!(render_markdown(&json!([])), "_No results._");
}

#[test]
fn rendering_is_repeatable() {
    let value = json!({"b": [{"y": 1, "x": 0.125}], "a": null});
    let op = common::CountingOperation::default();
    let first = render_output(&value, ResponseFormat::Markdown, &op);
    let second = render_output(&value, ResponseFormat::Markdown, &op);
    assert_eq!(first, second);
    assert!(matches!(&first[0], ContentBlock::Text { text } if text.starts_with("**a:** null")));
}
