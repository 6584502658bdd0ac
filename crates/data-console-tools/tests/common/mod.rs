// crates/data-console-tools/tests/common/mod.rs
// ============================================================================
// Module: Tool Test Sandbox
// Description: Temporary data directory, store, and registry for tool tests.
// Purpose: Run built-in operations the way the dispatcher does.
// ============================================================================

#![allow(dead_code, reason = "Shared test helpers may be unused in some cases.")]

use std::fs;
use std::sync::Arc;

use data_console_config::ToolsConfig;
use data_console_core::OperationError;
use data_console_core::OperationRequest;
use data_console_core::SecurityPolicy;
use data_console_core::ToolRegistry;
use data_console_store_sqlite::SqliteRecordStore;
use data_console_store_sqlite::SqliteStoreConfig;
use data_console_tools::builtin_registry;
use serde_json::Value;
use tempfile::TempDir;

pub const SALES_CSV: &str = "Region,Product,Amount\nNorth,Tea,10\nSouth,Coffee,\nNorth,Milk,7\nEast,,3\n";

/// Temporary environment holding every built-in tool.
pub struct Sandbox {
    pub data: TempDir,
    pub state: TempDir,
    pub policy: SecurityPolicy,
    pub registry: ToolRegistry,
}

impl Sandbox {
    pub fn new() -> Self {
        Self::with_config(&ToolsConfig {
            weather_seed: Some(42),
            ..ToolsConfig::default()
        })
    }

    pub fn with_config(tools: &ToolsConfig) -> Self {
        let data = tempfile::tempdir().expect("data dir");
        fs::write(data.path().join("notes.txt"), "first line\nsecond line").unwrap();
        fs::write(data.path().join("sales.csv"), SALES_CSV).unwrap();
        fs::create_dir(data.path().join("archive")).unwrap();
        let state = tempfile::tempdir().expect("state dir");
        let store = Arc::new(
            SqliteRecordStore::new(&SqliteStoreConfig::new(state.path().join("console.db")))
                .expect("store"),
        );
        let policy =
            SecurityPolicy::new(data.path(), ["weather_logs", "file_logs", "reports"]).unwrap();
        let registry = builtin_registry(tools, &store).expect("registry");
        Self {
            data,
            state,
            policy,
            registry,
        }
    }

    /// Validates, gates, and executes a tool call.
    pub fn call(&self, name: &str, arguments: Value) -> Result<Value, OperationError> {
        let tool = self.registry.lookup(name).expect("tool registered");
        let arguments = tool.descriptor.input_schema.validate(&arguments).expect("valid arguments");
        let grant = self.policy.grant(&tool.capability, &arguments).expect("grant issued");
        tool.operation.execute(&OperationRequest {
            arguments,
            grant,
        })
    }

    /// Renders a tool result with the tool's own markdown renderer.
    pub fn markdown(&self, name: &str, output: &Value) -> String {
        let tool = self.registry.lookup(name).expect("tool registered");
        tool.operation.render_markdown(output).expect("tool renders markdown")
    }
}
