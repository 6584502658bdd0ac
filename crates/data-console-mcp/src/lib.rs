// crates/data-console-mcp/src/lib.rs
// ============================================================================
// Module: Data Console MCP
// Description: JSON-RPC tool-dispatch server for Data Console.
// Purpose: Expose registered tools to MCP clients over stdio and TCP.
// Dependencies: data-console-core, data-console-tools, tokio
// ============================================================================

//! ## Overview
//! Data Console MCP speaks newline-delimited JSON-RPC 2.0. The
//! [`codec`] frames and decodes requests, the [`session`] tracks the
//! handshake, and the [`dispatcher`] routes `initialize`, `tools/list`,
//! `tools/call`, and `shutdown` against the frozen tool registry and
//! security policy. [`McpServer`] assembles everything from configuration.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod audit;
pub mod codec;
pub mod dispatcher;
pub mod server;
pub mod session;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use audit::McpAuditEvent;
pub use audit::McpAuditSink;
pub use audit::McpFileAuditSink;
pub use audit::McpNoopAuditSink;
pub use audit::McpStderrAuditSink;
pub use codec::ErrorKind;
pub use codec::JsonRpcError;
pub use codec::JsonRpcRequest;
pub use codec::JsonRpcResponse;
pub use dispatcher::DispatchError;
pub use dispatcher::DispatchOutcome;
pub use dispatcher::Dispatcher;
pub use dispatcher::SUPPORTED_PROTOCOL_VERSIONS;
pub use server::McpServer;
pub use server::ServerError;
pub use session::Session;
pub use session::SessionState;
