// crates/data-console-mcp/src/session.rs
// ============================================================================
// Module: Session Lifecycle
// Description: Per-connection handshake state and frame handling.
// Purpose: Own session state and turn inbound frames into response frames.
// Dependencies: rand, serde_json
// ============================================================================

//! ## Overview
//! A [`Session`] moves `Uninitialized -> Ready -> Closed` and never back.
//! It decodes each frame, hands requests to the shared [`Dispatcher`],
//! applies the reported [`SessionEffect`], and records one audit event per
//! response. Once closed, frames are dropped unanswered.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;

use rand::RngCore;
use rand::rngs::OsRng;
use serde_json::Value;

use crate::audit::McpAuditEvent;
use crate::audit::McpAuditEventParams;
use crate::audit::McpAuditSink;
use crate::audit::McpMethod;
use crate::codec::DecodeError;
use crate::codec::Inbound;
use crate::codec::JsonRpcResponse;
use crate::codec::RawFrame;
use crate::codec::decode;
use crate::codec::encode;
use crate::dispatcher::Dispatcher;
use crate::dispatcher::SessionEffect;
use crate::dispatcher::SessionSnapshot;

// ============================================================================
// SECTION: State
// ============================================================================

/// Session lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Handshake not yet completed.
    Uninitialized,
    /// Handshake completed; tools are available.
    Ready,
    /// Terminal; no further frames are answered.
    Closed,
}

// ============================================================================
// SECTION: Identifiers
// ============================================================================

/// Boot-scoped session identifier generator.
///
/// # Invariants
/// - Issued identifiers are unique within the process lifetime.
#[derive(Debug)]
pub struct SessionIdGenerator {
    /// Boot-scoped random identifier.
    boot_id: u64,
    /// Monotonic counter for issued identifiers.
    counter: AtomicU64,
}

impl SessionIdGenerator {
    /// Creates a generator with a fresh boot id.
    #[must_use]
    pub fn new() -> Self {
        let mut bytes = [0u8; 8];
        OsRng.fill_bytes(&mut bytes);
        Self {
            boot_id: u64::from_be_bytes(bytes),
            counter: AtomicU64::new(1),
        }
    }

    /// Issues a new session identifier.
    #[must_use]
    pub fn issue(&self) -> String {
        let seq = self.counter.fetch_add(1, Ordering::Relaxed);
        format!("session-{:016x}-{:016x}", self.boot_id, seq)
    }
}

impl Default for SessionIdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// SECTION: Session
// ============================================================================

/// One protocol session over a single inbound/outbound stream pair.
pub struct Session {
    /// Session identifier used in audit records.
    id: String,
    /// Transport label used in audit records.
    transport: &'static str,
    /// Lifecycle state.
    state: SessionState,
    /// Version negotiated by the first `initialize`.
    protocol_version: Option<String>,
    /// Shared dispatcher.
    dispatcher: Arc<Dispatcher>,
    /// Audit sink.
    audit: Arc<dyn McpAuditSink>,
}

impl Session {
    /// Creates an uninitialized session.
    #[must_use]
    pub fn new(
        id: String,
        transport: &'static str,
        dispatcher: Arc<Dispatcher>,
        audit: Arc<dyn McpAuditSink>,
    ) -> Self {
        Self {
            id,
            transport,
            state: SessionState::Uninitialized,
            protocol_version: None,
            dispatcher,
            audit,
        }
    }

    /// Returns the session identifier.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the lifecycle state.
    #[must_use]
    pub const fn state(&self) -> SessionState {
        self.state
    }

    /// Returns the negotiated protocol version, once ready.
    #[must_use]
    pub fn protocol_version(&self) -> Option<&str> {
        self.protocol_version.as_deref()
    }

    /// Marks the session closed, e.g. at end of stream.
    pub const fn close(&mut self) {
        self.state = SessionState::Closed;
    }

    /// Handles one inbound frame, returning the encoded response if any.
    #[must_use]
    pub fn handle_frame(&mut self, frame: RawFrame) -> Option<Vec<u8>> {
        if self.state == SessionState::Closed {
            return None;
        }
        let payload = match frame {
            RawFrame::Oversized => {
                return Some(self.reject(DecodeError::oversized(), 0));
            }
            RawFrame::Payload(payload) => payload,
        };
        let request = match decode(&payload) {
            Ok(Inbound::Request(request)) => request,
            Ok(Inbound::Notification {
                ..
            }) => return None,
            Err(err) => return Some(self.reject(err, payload.len())),
        };
        let snapshot = SessionSnapshot {
            state: self.state,
            protocol_version: self.protocol_version.as_deref(),
        };
        let outcome = self.dispatcher.dispatch(&snapshot, &request);
        let bytes = encode(&outcome.response);
        self.record(
            McpMethod::classify(&request.method),
            &outcome.response,
            (payload.len(), bytes.len()),
            outcome.tool,
            outcome.detail,
        );
        self.apply(outcome.effect);
        Some(bytes)
    }

    /// Answers a frame that failed decoding.
    fn reject(&self, err: DecodeError, request_bytes: usize) -> Vec<u8> {
        let response = err.into_response();
        let bytes = encode(&response);
        self.record(McpMethod::Invalid, &response, (request_bytes, bytes.len()), None, None);
        bytes
    }

    /// Applies a dispatcher-reported state change.
    fn apply(&mut self, effect: SessionEffect) {
        match effect {
            SessionEffect::Unchanged => {}
            SessionEffect::Ready {
                protocol_version,
            } => {
                if self.state == SessionState::Uninitialized {
                    self.state = SessionState::Ready;
                    self.protocol_version = Some(protocol_version);
                }
            }
            SessionEffect::Close => self.state = SessionState::Closed,
        }
    }

    /// Records the audit event for one response.
    fn record(
        &self,
        method: McpMethod,
        response: &JsonRpcResponse,
        (request_bytes, response_bytes): (usize, usize),
        tool: Option<String>,
        detail: Option<String>,
    ) {
        let request_id = match &response.id {
            Value::Null => None,
            Value::String(id) => Some(id.clone()),
            other => Some(other.to_string()),
        };
        let event = McpAuditEvent::new(McpAuditEventParams {
            session_id: self.id.clone(),
            transport: self.transport,
            request_id,
            method,
            tool,
            error_code: response.error.as_ref().map(|error| error.code),
            error_kind: response.error.as_ref().map(|error| error.kind.as_str()),
            request_bytes,
            response_bytes,
            detail,
        });
        self.audit.record(&event);
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(
        clippy::panic,
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::use_debug,
        reason = "Test-only lifecycle assertions."
    )]

    use std::sync::Arc;

    use data_console_core::SecurityPolicy;
    use data_console_core::ToolRegistryBuilder;
    use serde_json::Value;

    use super::Session;
    use super::SessionIdGenerator;
    use super::SessionState;
    use crate::audit::McpNoopAuditSink;
    use crate::codec::RawFrame;
    use crate::dispatcher::Dispatcher;

    fn session(root: &std::path::Path) -> Session {
        let policy = SecurityPolicy::new(root, Vec::<String>::new()).unwrap();
        let dispatcher =
            Dispatcher::new(Arc::new(ToolRegistryBuilder::new().build()), Arc::new(policy));
        Session::new("s-test".to_string(), "stdio", Arc::new(dispatcher), Arc::new(McpNoopAuditSink))
    }

    fn send(session: &mut Session, frame: &str) -> Option<Value> {
        session
            .handle_frame(RawFrame::Payload(frame.as_bytes().to_vec()))
            .map(|bytes| serde_json::from_slice(&bytes).unwrap())
    }

    #[test]
    fn lifecycle_moves_forward_only() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session(dir.path());
        assert_eq!(session.state(), SessionState::Uninitialized);
        assert_eq!(session.id(), "s-test");
        send(&mut session, r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{"protocolVersion":"2025-03-26"}}"#)
            .unwrap();
        assert_eq!(session.state(), SessionState::Ready);
        assert_eq!(session.protocol_version(), Some("2025-03-26"));
        let shutdown = send(&mut session, r#"{"jsonrpc":"2.0","id":2,"method":"shutdown"}"#).unwrap();
        assert_eq!(shutdown["result"], serde_json::json!({}));
        assert_eq!(session.state(), SessionState::Closed);
        assert!(send(&mut session, r#"{"jsonrpc":"2.0","id":3,"method":"initialize"}"#).is_none());
    }

    #[test]
    fn session_ids_are_unique() {
        let generator = SessionIdGenerator::new();
        let first = generator.issue();
        let second = generator.issue();
        assert_ne!(first, second);
        assert!(first.starts_with("session-"));
    }
}
