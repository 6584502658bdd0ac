// crates/data-console-mcp/tests/common/mod.rs
// ============================================================================
// Module: Protocol Test Harness
// Description: Stub tools, recording audit sink, and session drivers.
// Purpose: Exercise the server end to end without the built-in tools.
// ============================================================================

#![allow(dead_code, reason = "Shared test helpers may be unused in some cases.")]

use std::fs;
use std::io::Cursor;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;

use data_console_config::ServerConfig;
use data_console_core::Capability;
use data_console_core::FieldSpec;
use data_console_core::FnOperation;
use data_console_core::InputSchema;
use data_console_core::OperationError;
use data_console_core::OperationRequest;
use data_console_core::SecurityPolicy;
use data_console_core::ToolAnnotations;
use data_console_core::ToolDescriptor;
use data_console_core::ToolOperation;
use data_console_core::ToolRegistryBuilder;
use data_console_mcp::Dispatcher;
use data_console_mcp::McpAuditEvent;
use data_console_mcp::McpAuditSink;
use data_console_mcp::McpServer;
use serde_json::Value;
use serde_json::json;
use tempfile::TempDir;

pub const INIT: &str = r#"{"jsonrpc":"2.0","id":0,"method":"initialize","params":{"protocolVersion":"2025-06-18"}}"#;

/// Audit sink that keeps events in memory.
#[derive(Default)]
pub struct RecordingAuditSink {
    events: Mutex<Vec<McpAuditEvent>>,
}

impl RecordingAuditSink {
    pub fn events(&self) -> Vec<McpAuditEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl McpAuditSink for RecordingAuditSink {
    fn record(&self, event: &McpAuditEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}

/// Server with stub tools over a temporary root.
pub struct Harness {
    pub root: TempDir,
    pub server: McpServer,
    pub echo_calls: Arc<AtomicUsize>,
    pub read_calls: Arc<AtomicUsize>,
    pub table_calls: Arc<AtomicUsize>,
    pub audit: Arc<RecordingAuditSink>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_server_config(ServerConfig::default())
    }

    pub fn with_server_config(server: ServerConfig) -> Self {
        let root = tempfile::tempdir().unwrap();
        fs::write(root.path().join("notes.txt"), "inside").unwrap();
        let echo_calls = Arc::new(AtomicUsize::new(0));
        let read_calls = Arc::new(AtomicUsize::new(0));
        let table_calls = Arc::new(AtomicUsize::new(0));
        let mut builder = ToolRegistryBuilder::new();
        builder
            .register(
                ToolDescriptor::new(
                    "echo-op",
                    "Echo the supplied text",
                    InputSchema::new()
                        .field(FieldSpec::string("text").required().min_length(1))
                        .field(
                            FieldSpec::string("response_format")
                                .one_of(["markdown", "json"])
                                .with_default(json!("markdown")),
                        ),
                    ToolAnnotations::read_only("Echo"),
                ),
                Capability::None,
                counted(&echo_calls, |request| {
                    Ok(json!(request.required_str("text")?))
                }),
            )
            .unwrap();
        builder
            .register(
                ToolDescriptor::new(
                    "read-op",
                    "Read a file under the root",
                    InputSchema::new().field(FieldSpec::string("path").required()),
                    ToolAnnotations::read_only("Read"),
                ),
                Capability::file_argument("path"),
                counted(&read_calls, |request| {
                    let path = request.required_path()?;
                    fs::read_to_string(path)
                        .map(Value::String)
                        .map_err(|err| OperationError::internal(err.to_string()))
                }),
            )
            .unwrap();
        builder
            .register(
                ToolDescriptor::new(
                    "table-op",
                    "Name an allow-listed table",
                    InputSchema::new().field(FieldSpec::string("table").required()),
                    ToolAnnotations::read_only("Table"),
                ),
                Capability::table_read("table"),
                counted(&table_calls, |request| Ok(json!({ "table": request.required_table()? }))),
            )
            .unwrap();
        builder
            .register(
                ToolDescriptor::new(
                    "fail-op",
                    "Always fails internally",
                    InputSchema::new(),
                    ToolAnnotations::read_only("Fail"),
                ),
                Capability::None,
                Arc::new(FnOperation::new(|_: &OperationRequest| {
                    Err(OperationError::internal_with("lookup failed", "socket timeout at 10.0.0.7"))
                })),
            )
            .unwrap();
        let policy = SecurityPolicy::new(root.path(), ["reports"]).unwrap();
        let audit = Arc::new(RecordingAuditSink::default());
        let dispatcher = Dispatcher::new(Arc::new(builder.build()), Arc::new(policy));
        let server = McpServer::new(server, dispatcher, Arc::clone(&audit) as Arc<dyn McpAuditSink>);
        Self {
            root,
            server,
            echo_calls,
            read_calls,
            table_calls,
            audit,
        }
    }

    /// Runs one stdio session over the given lines and parses each response.
    pub fn run(&self, frames: &[&str]) -> Vec<Value> {
        let mut input = frames.join("\n");
        input.push('\n');
        self.run_raw(input.as_bytes())
    }

    /// Runs one stdio session over raw input bytes.
    pub fn run_raw(&self, input: &[u8]) -> Vec<Value> {
        parse_lines(&self.run_bytes(input))
    }

    /// Runs one stdio session and returns the raw output.
    pub fn run_bytes(&self, input: &[u8]) -> Vec<u8> {
        let mut output = Vec::new();
        self.server.serve_stdio(Cursor::new(input.to_vec()), &mut output).unwrap();
        output
    }
}

/// Wraps a closure so every invocation bumps `counter`.
fn counted<F>(counter: &Arc<AtomicUsize>, handler: F) -> Arc<dyn ToolOperation>
where
    F: Fn(&OperationRequest) -> Result<Value, OperationError> + Send + Sync + 'static,
{
    let counter = Arc::clone(counter);
    Arc::new(FnOperation::new(move |request: &OperationRequest| {
        counter.fetch_add(1, Ordering::SeqCst);
        handler(request)
    }))
}

/// Parses newline-delimited response frames.
pub fn parse_lines(output: &[u8]) -> Vec<Value> {
    String::from_utf8(output.to_vec())
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}

/// Builds a `tools/call` frame.
pub fn call(id: u64, name: &str, arguments: Value) -> String {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "method": "tools/call",
        "params": { "name": name, "arguments": arguments }
    })
    .to_string()
}
