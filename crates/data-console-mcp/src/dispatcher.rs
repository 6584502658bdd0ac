// crates/data-console-mcp/src/dispatcher.rs
// ============================================================================
// Module: Dispatcher
// Description: Method routing, tool invocation, and error classification.
// Purpose: Run one decoded request against the registry and security policy.
// Dependencies: data-console-core, serde, serde_json, thiserror
// ============================================================================

//! ## Overview
//! The dispatcher holds only shared immutable state: the [`ToolRegistry`] and
//! the [`SecurityPolicy`]. It reads a [`SessionSnapshot`] and reports the
//! state change a request causes as a [`SessionEffect`]; the session applies
//! it. A `tools/call` runs lookup, argument validation, the security gate,
//! invocation, and formatting in that order, and a failure at any step stops
//! the pipeline before the operation is touched.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use data_console_core::ArgumentError;
use data_console_core::ContentBlock;
use data_console_core::OperationError;
use data_console_core::OperationRequest;
use data_console_core::PolicyError;
use data_console_core::ResponseFormat;
use data_console_core::SecurityPolicy;
use data_console_core::ToolDescriptor;
use data_console_core::ToolRegistry;
use data_console_core::render_output;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;
use serde_json::json;
use thiserror::Error;

use crate::codec::ErrorKind;
use crate::codec::JsonRpcError;
use crate::codec::JsonRpcRequest;
use crate::codec::JsonRpcResponse;
use crate::session::SessionState;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Protocol versions the server speaks, newest first.
pub const SUPPORTED_PROTOCOL_VERSIONS: [&str; 3] = ["2025-06-18", "2025-03-26", "2024-11-05"];

/// Server name advertised during the handshake.
pub const SERVER_NAME: &str = "data-console";

/// Argument that selects the response rendering.
const RESPONSE_FORMAT_ARGUMENT: &str = "response_format";

// ============================================================================
// SECTION: Session Interface
// ============================================================================

/// Read-only view of a session used for one dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSnapshot<'a> {
    /// Lifecycle state.
    pub state: SessionState,
    /// Version negotiated by the first `initialize`.
    pub protocol_version: Option<&'a str>,
}

/// State change requested by a dispatched request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEffect {
    /// No change.
    Unchanged,
    /// Handshake completed with the negotiated version.
    Ready {
        /// Negotiated protocol version.
        protocol_version: String,
    },
    /// Session terminates after the response is written.
    Close,
}

/// Result of dispatching one request.
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchOutcome {
    /// Response correlated to the request.
    pub response: JsonRpcResponse,
    /// Session state change to apply.
    pub effect: SessionEffect,
    /// Tool name for `tools/call`, as requested.
    pub tool: Option<String>,
    /// Internal failure detail for the audit log.
    pub detail: Option<String>,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Dispatch failures reported to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    /// Method is not served.
    #[error("method not found: {0}")]
    MethodNotFound(String),
    /// Handshake has not completed.
    #[error("session not initialized")]
    NotReady,
    /// Tool name is not registered.
    #[error("unknown tool: {0}")]
    UnknownTool(String),
    /// Arguments failed schema validation.
    #[error(transparent)]
    InvalidArguments(#[from] ArgumentError),
    /// Security gate refused the call.
    #[error(transparent)]
    Policy(#[from] PolicyError),
    /// Backing operation failed.
    #[error("{message}")]
    ToolExecution {
        /// Sanitized message returned to the caller.
        message: String,
        /// Internal detail recorded in the audit log only.
        detail: Option<String>,
    },
}

impl DispatchError {
    /// Returns the wire taxonomy kind.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::MethodNotFound(_) => ErrorKind::MethodNotFound,
            Self::NotReady => ErrorKind::NotReady,
            Self::UnknownTool(_) => ErrorKind::UnknownTool,
            Self::InvalidArguments(_) => ErrorKind::InvalidArguments,
            Self::Policy(PolicyError::PathEscape(_)) => ErrorKind::PathEscape,
            Self::Policy(PolicyError::TableNotAllowed(_)) => ErrorKind::TableNotAllowed,
            Self::Policy(PolicyError::InvalidRoot(_))
            | Self::ToolExecution {
                ..
            } => ErrorKind::ToolExecutionError,
        }
    }

    /// Builds the error payload returned to the caller.
    #[must_use]
    pub fn to_rpc_error(&self) -> JsonRpcError {
        let kind = self.kind();
        match self {
            Self::MethodNotFound(method) => {
                JsonRpcError::new(kind, self.to_string()).with_data(json!({ "method": method }))
            }
            Self::UnknownTool(tool) => {
                JsonRpcError::new(kind, self.to_string()).with_data(json!({ "tool": tool }))
            }
            Self::InvalidArguments(err) => JsonRpcError::new(kind, self.to_string())
                .with_data(json!({ "field": err.field, "reason": err.reason })),
            Self::Policy(PolicyError::InvalidRoot(_)) => {
                JsonRpcError::new(kind, "operation failed")
            }
            Self::NotReady
            | Self::Policy(_)
            | Self::ToolExecution {
                ..
            } => JsonRpcError::new(kind, self.to_string()),
        }
    }

    /// Returns detail withheld from the caller.
    #[must_use]
    pub fn detail(&self) -> Option<String> {
        match self {
            Self::ToolExecution {
                detail, ..
            } => detail.clone(),
            Self::Policy(err @ PolicyError::InvalidRoot(_)) => Some(err.to_string()),
            _ => None,
        }
    }
}

impl From<OperationError> for DispatchError {
    fn from(error: OperationError) -> Self {
        Self::ToolExecution {
            message: error.public_message().to_string(),
            detail: error.detail().map(str::to_string),
        }
    }
}

// ============================================================================
// SECTION: Payloads
// ============================================================================

/// Tool list response payload.
#[derive(Serialize)]
struct ToolListResult<'a> {
    /// Registered tool descriptors.
    tools: Vec<&'a ToolDescriptor>,
}

/// Tool call response payload.
#[derive(Serialize)]
struct ToolCallResult {
    /// Rendered content blocks.
    content: Vec<ContentBlock>,
}

// ============================================================================
// SECTION: Dispatcher
// ============================================================================

/// Routes requests to protocol handlers and tool operations.
pub struct Dispatcher {
    /// Frozen tool registry.
    registry: Arc<ToolRegistry>,
    /// Frozen security policy.
    policy: Arc<SecurityPolicy>,
}

impl Dispatcher {
    /// Creates a dispatcher over shared registry and policy snapshots.
    #[must_use]
    pub const fn new(registry: Arc<ToolRegistry>, policy: Arc<SecurityPolicy>) -> Self {
        Self {
            registry,
            policy,
        }
    }

    /// Returns the tool registry.
    #[must_use]
    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Dispatches one request and returns its correlated outcome.
    #[must_use]
    pub fn dispatch(
        &self,
        session: &SessionSnapshot<'_>,
        request: &JsonRpcRequest,
    ) -> DispatchOutcome {
        let tool = (request.method == "tools/call")
            .then(|| request.params.get("name").and_then(Value::as_str).map(str::to_string))
            .flatten();
        let result = match request.method.as_str() {
            "initialize" => Ok(initialize(session, &request.params)),
            "shutdown" => Ok((json!({}), SessionEffect::Close)),
            "tools/list" => self.list_tools(session).map(|value| (value, SessionEffect::Unchanged)),
            "tools/call" => {
                self.call_tool(session, &request.params).map(|value| (value, SessionEffect::Unchanged))
            }
            other => Err(DispatchError::MethodNotFound(other.to_string())),
        };
        match result {
            Ok((value, effect)) => DispatchOutcome {
                response: JsonRpcResponse::success(request.id.clone(), value),
                effect,
                tool,
                detail: None,
            },
            Err(err) => DispatchOutcome {
                response: JsonRpcResponse::failure(request.id.clone(), err.to_rpc_error()),
                effect: SessionEffect::Unchanged,
                tool,
                detail: err.detail(),
            },
        }
    }

    /// Lists registered tool descriptors.
    fn list_tools(&self, session: &SessionSnapshot<'_>) -> Result<Value, DispatchError> {
        require_ready(session)?;
        let payload = ToolListResult {
            tools: self.registry.tools().iter().map(|tool| &tool.descriptor).collect(),
        };
        serde_json::to_value(payload).map_err(serialization_error)
    }

    /// Runs the tool call pipeline.
    fn call_tool(
        &self,
        session: &SessionSnapshot<'_>,
        params: &Map<String, Value>,
    ) -> Result<Value, DispatchError> {
        require_ready(session)?;
        let name = match params.get("name") {
            Some(Value::String(name)) if !name.is_empty() => name,
            _ => {
                return Err(DispatchError::InvalidArguments(ArgumentError::new(
                    "name",
                    "tool name must be a non-empty string",
                )));
            }
        };
        let tool = self
            .registry
            .lookup(name)
            .map_err(|_| DispatchError::UnknownTool(name.clone()))?;
        let absent = Value::Null;
        let arguments = tool
            .descriptor
            .input_schema
            .validate(params.get("arguments").unwrap_or(&absent))?;
        let grant = self.policy.grant(&tool.capability, &arguments)?;
        let format = ResponseFormat::from_selector(arguments.str(RESPONSE_FORMAT_ARGUMENT));
        let request = OperationRequest {
            arguments,
            grant,
        };
        let output = tool.operation.execute(&request)?;
        let payload = ToolCallResult {
            content: render_output(&output, format, tool.operation.as_ref()),
        };
        serde_json::to_value(payload).map_err(serialization_error)
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Answers `initialize`, negotiating only on the first call.
fn initialize(session: &SessionSnapshot<'_>, params: &Map<String, Value>) -> (Value, SessionEffect) {
    let (version, effect) = match session.protocol_version {
        Some(version) => (version.to_string(), SessionEffect::Unchanged),
        None => {
            let requested = params.get("protocolVersion").and_then(Value::as_str);
            let version = negotiate_protocol_version(requested).to_string();
            (version.clone(), SessionEffect::Ready {
                protocol_version: version,
            })
        }
    };
    let result = json!({
        "protocolVersion": version,
        "capabilities": { "tools": { "listChanged": false } },
        "serverInfo": { "name": SERVER_NAME, "version": env!("CARGO_PKG_VERSION") },
    });
    (result, effect)
}

/// Echoes a supported requested version, else the newest supported.
#[must_use]
pub fn negotiate_protocol_version(requested: Option<&str>) -> &'static str {
    requested
        .and_then(|requested| {
            SUPPORTED_PROTOCOL_VERSIONS.iter().copied().find(|version| *version == requested)
        })
        .unwrap_or(SUPPORTED_PROTOCOL_VERSIONS[0])
}

/// Fails unless the handshake has completed.
const fn require_ready(session: &SessionSnapshot<'_>) -> Result<(), DispatchError> {
    match session.state {
        SessionState::Ready => Ok(()),
        SessionState::Uninitialized | SessionState::Closed => Err(DispatchError::NotReady),
    }
}

/// Maps a response serialization failure.
fn serialization_error(err: serde_json::Error) -> DispatchError {
    DispatchError::ToolExecution {
        message: "serialization failed".to_string(),
        detail: Some(err.to_string()),
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
