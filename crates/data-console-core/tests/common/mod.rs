// crates/data-console-core/tests/common/mod.rs
// ============================================================================
// Module: Core Test Helpers
// Description: Shared descriptors and counting operations for core tests.
// Purpose: Keep integration tests focused on registry and schema behavior.
// ============================================================================

#![allow(dead_code, reason = "Shared test helpers may be unused in some cases.")]

use std::sync::Arc;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;

use data_console_core::FieldSpec;
use data_console_core::InputSchema;
use data_console_core::OperationError;
use data_console_core::OperationRequest;
use data_console_core::ToolAnnotations;
use data_console_core::ToolDescriptor;
use data_console_core::ToolOperation;
use serde_json::Value;
use serde_json::json;

/// Operation that counts invocations and echoes its arguments.
#[derive(Default)]
pub struct CountingOperation {
    calls: AtomicUsize,
}

impl CountingOperation {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ToolOperation for CountingOperation {
    fn execute(&self, request: &OperationRequest) -> Result<Value, OperationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(json!(request.arguments))
    }
}

pub fn counting() -> Arc<CountingOperation> {
    Arc::new(CountingOperation::default())
}

pub fn echo_descriptor(name: &str) -> ToolDescriptor {
    ToolDescriptor::new(
        name,
        "Echo the supplied text",
        InputSchema::new().field(FieldSpec::string("text").required().min_length(1)),
        ToolAnnotations::read_only("Echo"),
    )
}

pub fn query_schema() -> InputSchema {
    InputSchema::new()
        .field(
            FieldSpec::string("table")
                .required()
                .one_of(["weather_logs", "file_logs", "reports"]),
        )
        .field(FieldSpec::integer("limit").range(1.0, 100.0).with_default(json!(10)))
        .field(
            FieldSpec::string("response_format")
                .one_of(["markdown", "json"])
                .with_default(json!("markdown")),
        )
}
