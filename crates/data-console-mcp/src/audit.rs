// crates/data-console-mcp/src/audit.rs
// ============================================================================
// Module: MCP Audit Logging
// Description: Structured audit events for request handling.
// Purpose: Emit JSON-line audit records without touching the protocol stream.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! Every answered request produces one [`McpAuditEvent`]. Events carry sizes,
//! outcome, and error classification but never argument values. Internal
//! operation failure detail is recorded here and nowhere else.
//! Stdout belongs to the protocol in stdio mode, so the default sink writes
//! to stderr.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::OpenOptions;
use std::io;
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use serde::Serialize;
use serde::Serializer;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Method classification for audit records.
///
/// Serialized with the wire method name (for example `tools/call`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum McpMethod {
    /// Handshake.
    Initialize,
    /// Tool listing.
    ToolsList,
    /// Tool invocation.
    ToolsCall,
    /// Explicit termination.
    Shutdown,
    /// Frame that could not be decoded.
    Invalid,
    /// Any other method.
    Other,
}

impl McpMethod {
    /// Classifies a method name.
    #[must_use]
    pub fn classify(method: &str) -> Self {
        match method {
            "initialize" => Self::Initialize,
            "tools/list" => Self::ToolsList,
            "tools/call" => Self::ToolsCall,
            "shutdown" => Self::Shutdown,
            _ => Self::Other,
        }
    }

    /// Returns a stable label for the method.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Initialize => "initialize",
            Self::ToolsList => "tools/list",
            Self::ToolsCall => "tools/call",
            Self::Shutdown => "shutdown",
            Self::Invalid => "invalid",
            Self::Other => "other",
        }
    }
}

impl Serialize for McpMethod {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

/// Request outcome classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum McpOutcome {
    /// Successful request.
    Ok,
    /// Failed request.
    Error,
}

/// Audit event payload.
#[derive(Debug, Clone, Serialize)]
pub struct McpAuditEvent {
    /// Event identifier.
    pub event: &'static str,
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: u128,
    /// Session identifier.
    pub session_id: String,
    /// Transport label.
    pub transport: &'static str,
    /// Request identifier when correlatable.
    pub request_id: Option<String>,
    /// Method classification.
    pub method: McpMethod,
    /// Tool name for `tools/call`.
    pub tool: Option<String>,
    /// Request outcome.
    pub outcome: McpOutcome,
    /// JSON-RPC error code when present.
    pub error_code: Option<i64>,
    /// Error taxonomy label when present.
    pub error_kind: Option<&'static str>,
    /// Request frame size in bytes.
    pub request_bytes: usize,
    /// Response frame size in bytes.
    pub response_bytes: usize,
    /// Internal failure detail withheld from the caller.
    pub detail: Option<String>,
}

/// Inputs required to construct an audit event.
pub struct McpAuditEventParams {
    /// Session identifier.
    pub session_id: String,
    /// Transport label.
    pub transport: &'static str,
    /// Request identifier when correlatable.
    pub request_id: Option<String>,
    /// Method classification.
    pub method: McpMethod,
    /// Tool name for `tools/call`.
    pub tool: Option<String>,
    /// JSON-RPC error code when present.
    pub error_code: Option<i64>,
    /// Error taxonomy label when present.
    pub error_kind: Option<&'static str>,
    /// Request frame size in bytes.
    pub request_bytes: usize,
    /// Response frame size in bytes.
    pub response_bytes: usize,
    /// Internal failure detail withheld from the caller.
    pub detail: Option<String>,
}

impl McpAuditEvent {
    /// Creates a new audit event with a consistent timestamp.
    #[must_use]
    pub fn new(params: McpAuditEventParams) -> Self {
        let timestamp_ms =
            SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis();
        let outcome = if params.error_code.is_some() { McpOutcome::Error } else { McpOutcome::Ok };
        Self {
            event: "mcp_request",
            timestamp_ms,
            session_id: params.session_id,
            transport: params.transport,
            request_id: params.request_id,
            method: params.method,
            tool: params.tool,
            outcome,
            error_code: params.error_code,
            error_kind: params.error_kind,
            request_bytes: params.request_bytes,
            response_bytes: params.response_bytes,
            detail: params.detail,
        }
    }
}

// ============================================================================
// SECTION: Sinks
// ============================================================================

/// Audit sink for request events.
pub trait McpAuditSink: Send + Sync {
    /// Record an audit event.
    fn record(&self, event: &McpAuditEvent);
}

/// Audit sink that logs JSON lines to stderr.
pub struct McpStderrAuditSink;

impl McpAuditSink for McpStderrAuditSink {
    fn record(&self, event: &McpAuditEvent) {
        if let Ok(payload) = serde_json::to_string(event) {
            let _ = writeln!(std::io::stderr(), "{payload}");
        }
    }
}

/// Audit sink that appends JSON lines to a file.
pub struct McpFileAuditSink {
    /// File handle used for append-only logging.
    file: Mutex<std::fs::File>,
}

impl McpFileAuditSink {
    /// Opens the audit log file in append mode.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened.
    pub fn new(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }
}

impl McpAuditSink for McpFileAuditSink {
    fn record(&self, event: &McpAuditEvent) {
        if let Ok(payload) = serde_json::to_string(event)
            && let Ok(mut file) = self.file.lock()
        {
            let _ = writeln!(file, "{payload}");
            let _ = file.flush();
        }
    }
}

/// No-op audit sink.
pub struct McpNoopAuditSink;

impl McpAuditSink for McpNoopAuditSink {
    fn record(&self, _event: &McpAuditEvent) {}
}

// ============================================================================
// SECTION: Tests
// ============================================================================
