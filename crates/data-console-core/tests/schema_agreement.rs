// crates/data-console-core/tests/schema_agreement.rs
// ============================================================================
// Module: Schema Agreement Tests
// Description: Cross-check rendered input schemas against a JSON Schema engine.
// Purpose: Ensure advertised schemas match what the native validator enforces.
// ============================================================================

//! Rendered schema agreement tests.

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

use data_console_core::FieldSpec;
use data_console_core::InputSchema;
use proptest::prelude::*;
use serde_json::Value;
use serde_json::json;

fn weather_schema() -> InputSchema {
    InputSchema::new()
        .field(FieldSpec::string("city").required().min_length(1).max_length(100))
        .field(
            FieldSpec::string("response_format")
                .one_of(["markdown", "json"])
                .with_default(json!("markdown")),
        )
}

fn agrees(schema: &InputSchema, arguments: &Value) -> (bool, bool) {
    let rendered = schema.to_json_schema();
    let validator = jsonschema::validator_for(&rendered).expect("rendered schema compiles");
    (validator.is_valid(arguments), schema.validate(arguments).is_ok())
}

#[test]
fn rendered_schemas_are_valid_json_schema() {
    for schema in [weather_schema(), common::query_schema()] {
        let rendered = schema.to_json_schema();
        assert!(jsonschema::validator_for(&rendered).is_ok());
    }
}

#[test]
fn fixed_cases_agree_with_json_schema_engine() {
    let cases = [
        json!({"city": "Mumbai"}),
        json!({"city": ""}),
        json!({"city": 12}),
        json!({"city": "Pune", "response_format": "json"}),
        json!({"city": "Pune", "response_format": "yaml"}),
        json!({"city": "Pune", "extra": true}),
        json!({}),
    ];
    let schema = weather_schema();
    for case in cases {
        let (engine, native) = agrees(&schema, &case);
        assert_eq!(engine, native, "disagreement on {case}");
    }
}

proptest! {
    #[test]
    fn query_limits_agree(limit in -5_i64 .. 120, table in prop_oneof![
        Just("weather_logs"), Just("reports"), Just("users"), Just("REPORTS")
    ]) {
        let arguments = json!({"table": table, "limit": limit});
        let (engine, native) = agrees(&common::query_schema(), &arguments);
        prop_assert_eq!(engine, native);
    }

    #[test]
    fn city_lengths_agree(city in "\\PC{0,120}") {
        let arguments = json!({"city": city});
        let (engine, native) = agrees(&weather_schema(), &arguments);
        prop_assert_eq!(engine, native);
    }
}
