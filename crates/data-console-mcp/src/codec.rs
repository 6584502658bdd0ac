// crates/data-console-mcp/src/codec.rs
// ============================================================================
// Module: Request Codec
// Description: Newline-delimited JSON-RPC 2.0 framing and envelope codec.
// Purpose: Turn untrusted byte streams into typed requests and back.
// Dependencies: serde, serde_json, thiserror
// ============================================================================

//! ## Overview
//! One frame is one line of UTF-8 JSON. [`FrameReader`] splits an input
//! stream into bounded frames, skipping whitespace-only lines and discarding
//! the remainder of any line longer than the configured limit. [`decode`]
//! checks the JSON-RPC envelope and recovers the request id whenever it can,
//! so malformed requests still receive a correlated error.
//! Security posture: every frame is untrusted input; decoding never panics
//! and never allocates more than the frame limit per line.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io;
use std::io::BufRead;
use std::io::Read;

use serde::Serialize;
use serde_json::Map;
use serde_json::Value;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// JSON-RPC protocol version carried on every response.
pub const JSONRPC_VERSION: &str = "2.0";

/// Method prefix for one-way notifications.
pub const NOTIFICATION_PREFIX: &str = "notifications/";

/// Frame emitted if a response cannot be serialized.
const ENCODE_FALLBACK: &[u8] = br#"{"jsonrpc":"2.0","id":null,"error":{"code":-32050,"kind":"ToolExecutionError","message":"response serialization failed"}}"#;

// ============================================================================
// SECTION: Error Taxonomy
// ============================================================================

/// Error kinds reported on the wire.
///
/// # Invariants
/// - Labels and numeric codes are stable protocol surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ErrorKind {
    /// Payload is not valid JSON.
    ParseError,
    /// Envelope is missing or has ill-typed fields.
    InvalidRequest,
    /// Method is not served.
    MethodNotFound,
    /// Tool arguments failed validation.
    InvalidArguments,
    /// Session has not completed the handshake.
    NotReady,
    /// Tool name is not registered.
    UnknownTool,
    /// Path argument escapes the allowed root.
    PathEscape,
    /// Table argument is not allow-listed.
    TableNotAllowed,
    /// Backing operation failed.
    ToolExecutionError,
}

impl ErrorKind {
    /// Returns the JSON-RPC numeric code.
    #[must_use]
    pub const fn code(self) -> i64 {
        match self {
            Self::ParseError => -32700,
            Self::InvalidRequest => -32600,
            Self::MethodNotFound => -32601,
            Self::InvalidArguments => -32602,
            Self::NotReady => -32002,
            Self::UnknownTool => -32003,
            Self::PathEscape => -32010,
            Self::TableNotAllowed => -32011,
            Self::ToolExecutionError => -32050,
        }
    }

    /// Returns the stable taxonomy label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ParseError => "ParseError",
            Self::InvalidRequest => "InvalidRequest",
            Self::MethodNotFound => "MethodNotFound",
            Self::InvalidArguments => "InvalidArguments",
            Self::NotReady => "NotReady",
            Self::UnknownTool => "UnknownTool",
            Self::PathEscape => "PathEscape",
            Self::TableNotAllowed => "TableNotAllowed",
            Self::ToolExecutionError => "ToolExecutionError",
        }
    }
}

// ============================================================================
// SECTION: Envelopes
// ============================================================================

/// Decoded JSON-RPC request.
#[derive(Debug, Clone, PartialEq)]
pub struct JsonRpcRequest {
    /// Correlation id echoed verbatim (string, number, or null).
    pub id: Value,
    /// Method name.
    pub method: String,
    /// Parameters; empty when absent.
    pub params: Map<String, Value>,
}

/// Decoded inbound frame.
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    /// Request expecting exactly one response.
    Request(JsonRpcRequest),
    /// Id-less notification; never answered.
    Notification {
        /// Notification method name.
        method: String,
    },
}

/// JSON-RPC response envelope.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JsonRpcResponse {
    /// JSON-RPC protocol version.
    pub jsonrpc: &'static str,
    /// Request identifier; null when not correlatable.
    pub id: Value,
    /// Successful result payload.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    /// Error payload when the request fails.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

impl JsonRpcResponse {
    /// Builds a success response.
    #[must_use]
    pub const fn success(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            id,
            result: Some(result),
            error: None,
        }
    }

    /// Builds an error response.
    #[must_use]
    pub const fn failure(id: Value, error: JsonRpcError) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            id,
            result: None,
            error: Some(error),
        }
    }
}

/// JSON-RPC error payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JsonRpcError {
    /// Numeric error code.
    pub code: i64,
    /// Taxonomy label.
    pub kind: ErrorKind,
    /// Sanitized human-readable message.
    pub message: String,
    /// Optional structured context.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl JsonRpcError {
    /// Creates an error payload for the kind.
    #[must_use]
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            code: kind.code(),
            kind,
            message: message.into(),
            data: None,
        }
    }

    /// Attaches structured context.
    #[must_use]
    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }
}

/// Frame that failed envelope decoding.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{}", .error.message)]
pub struct DecodeError {
    /// Recovered id, or null.
    pub id: Value,
    /// Error to report.
    pub error: JsonRpcError,
}

impl DecodeError {
    /// Creates a decode error correlated to `id`.
    fn new(id: Value, kind: ErrorKind, message: &str) -> Self {
        Self {
            id,
            error: JsonRpcError::new(kind, message),
        }
    }

    /// Creates a decode error that cannot be correlated.
    fn uncorrelated(kind: ErrorKind, message: &str) -> Self {
        Self::new(Value::Null, kind, message)
    }

    /// Error reported for a frame over the size limit.
    #[must_use]
    pub fn oversized() -> Self {
        Self::uncorrelated(ErrorKind::InvalidRequest, "frame exceeds maximum size")
    }

    /// Converts the failure into its error response.
    #[must_use]
    pub fn into_response(self) -> JsonRpcResponse {
        JsonRpcResponse::failure(self.id, self.error)
    }
}

// ============================================================================
// SECTION: Decoding
// ============================================================================

/// Decodes one frame payload into a request or notification.
///
/// # Errors
///
/// Returns [`DecodeError`] with kind `ParseError` for invalid JSON and
/// `InvalidRequest` for envelope violations.
pub fn decode(payload: &[u8]) -> Result<Inbound, DecodeError> {
    let value: Value = serde_json::from_slice(payload).map_err(|_| {
        DecodeError::uncorrelated(ErrorKind::ParseError, "payload is not valid JSON")
    })?;
    let Value::Object(mut envelope) = value else {
        return Err(DecodeError::uncorrelated(
            ErrorKind::InvalidRequest,
            "request must be a JSON object",
        ));
    };
    let id = match envelope.remove("id") {
        None => None,
        Some(id @ (Value::String(_) | Value::Number(_) | Value::Null)) => Some(id),
        Some(_) => {
            return Err(DecodeError::uncorrelated(
                ErrorKind::InvalidRequest,
                "id must be a string, number, or null",
            ));
        }
    };
    let correlated = id.clone().unwrap_or(Value::Null);
    match envelope.get("jsonrpc") {
        None => {}
        Some(Value::String(version)) if version == JSONRPC_VERSION => {}
        Some(_) => {
            return Err(DecodeError::new(
                correlated,
                ErrorKind::InvalidRequest,
                "invalid json-rpc version",
            ));
        }
    }
    let method = match envelope.remove("method") {
        Some(Value::String(method)) if !method.is_empty() => method,
        Some(Value::String(_)) => {
            return Err(DecodeError::new(
                correlated,
                ErrorKind::InvalidRequest,
                "method must not be empty",
            ));
        }
        _ => {
            return Err(DecodeError::new(
                correlated,
                ErrorKind::InvalidRequest,
                "missing or non-string method",
            ));
        }
    };
    let params = match envelope.remove("params") {
        None | Some(Value::Null) => Map::new(),
        Some(Value::Object(params)) => params,
        Some(_) => {
            return Err(DecodeError::new(
                correlated,
                ErrorKind::InvalidRequest,
                "params must be an object",
            ));
        }
    };
    match id {
        Some(id) => Ok(Inbound::Request(JsonRpcRequest {
            id,
            method,
            params,
        })),
        None if method.starts_with(NOTIFICATION_PREFIX) => Ok(Inbound::Notification {
            method,
        }),
        None => Err(DecodeError::uncorrelated(ErrorKind::InvalidRequest, "missing id")),
    }
}

// ============================================================================
// SECTION: Encoding
// ============================================================================

/// Serializes a response as one newline-terminated frame.
#[must_use]
pub fn encode(response: &JsonRpcResponse) -> Vec<u8> {
    let mut bytes = serde_json::to_vec(response).unwrap_or_else(|_| ENCODE_FALLBACK.to_vec());
    bytes.push(b'\n');
    bytes
}

// ============================================================================
// SECTION: Framing
// ============================================================================

/// One line read from the inbound stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawFrame {
    /// Frame payload without its line terminator.
    Payload(Vec<u8>),
    /// Line exceeded the frame limit and was discarded.
    Oversized,
}

/// Bounded line reader over an inbound stream.
#[derive(Debug)]
pub struct FrameReader<R> {
    /// Underlying buffered reader.
    reader: R,
    /// Maximum payload size in bytes, excluding the terminator.
    max_frame_bytes: usize,
}

impl<R: BufRead> FrameReader<R> {
    /// Creates a frame reader with a payload limit.
    #[must_use]
    pub const fn new(reader: R, max_frame_bytes: usize) -> Self {
        Self {
            reader,
            max_frame_bytes,
        }
    }

    /// Reads the next non-blank frame; `None` at end of stream.
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error when the stream fails.
    pub fn next_frame(&mut self) -> io::Result<Option<RawFrame>> {
        // Room for the payload plus a CRLF terminator.
        let limit = u64::try_from(self.max_frame_bytes.saturating_add(2)).unwrap_or(u64::MAX);
        loop {
            let mut line = Vec::new();
            let read = self.reader.by_ref().take(limit).read_until(b'\n', &mut line)?;
            if read == 0 {
                return Ok(None);
            }
            let terminated = line.last() == Some(&b'\n');
            if !terminated && u64::try_from(line.len()).unwrap_or(u64::MAX) >= limit {
                self.discard_line()?;
                return Ok(Some(RawFrame::Oversized));
            }
            if terminated {
                line.pop();
            }
            if line.last() == Some(&b'\r') {
                line.pop();
            }
            if line.len() > self.max_frame_bytes {
                return Ok(Some(RawFrame::Oversized));
            }
            if line.iter().all(u8::is_ascii_whitespace) {
                continue;
            }
            return Ok(Some(RawFrame::Payload(line)));
        }
    }

    /// Consumes input up to and including the next newline.
    fn discard_line(&mut self) -> io::Result<()> {
        loop {
            let available = self.reader.fill_buf()?;
            if available.is_empty() {
                return Ok(());
            }
            if let Some(position) = available.iter().position(|byte| *byte == b'\n') {
                self.reader.consume(position + 1);
                return Ok(());
            }
            let consumed = available.len();
            self.reader.consume(consumed);
        }
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
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
        reason = "Test-only framing assertions."
    )]

    use std::io::Cursor;

    use serde_json::Value;
    use serde_json::json;

    use super::ErrorKind;
    use super::FrameReader;
    use super::Inbound;
    use super::JsonRpcError;
    use super::JsonRpcResponse;
    use super::RawFrame;
    use super::decode;
    use super::encode;

    fn frames(input: &str, max: usize) -> Vec<RawFrame> {
        let mut reader = FrameReader::new(Cursor::new(input.as_bytes().to_vec()), max);
        let mut out = Vec::new();
        while let Some(frame) = reader.next_frame().unwrap() {
            out.push(frame);
        }
        out
    }

    fn payload(text: &str) -> RawFrame {
        RawFrame::Payload(text.as_bytes().to_vec())
    }

    #[test]
    fn blank_lines_are_skipped() {
        assert_eq!(frames("\n  \n{}\r\n\n[]", 64), vec![payload("{}"), payload("[]")]);
    }

    #[test]
    fn oversized_line_is_discarded_up_to_newline() {
        let input = format!("{}\n{{\"a\":1}}\n", "x".repeat(40));
        assert_eq!(frames(&input, 16), vec![RawFrame::Oversized, payload("{\"a\":1}")]);
    }

    #[test]
    fn frame_at_limit_is_accepted() {
        assert_eq!(frames("12345678\r\n12345678", 8), vec![payload("12345678"), payload("12345678")]);
        assert_eq!(frames("123456789\n", 8), vec![RawFrame::Oversized]);
    }

    #[test]
    fn invalid_json_is_parse_error_without_id() {
        let err = decode(b"not-json").unwrap_err();
        assert_eq!(err.id, Value::Null);
        assert_eq!(err.error.kind, ErrorKind::ParseError);
        assert_eq!(err.error.code, -32700);
    }

    #[test]
    fn missing_method_echoes_recoverable_id() {
        let err = decode(br#"{"jsonrpc":"2.0","id":"abc"}"#).unwrap_err();
        assert_eq!(err.id, json!("abc"));
        assert_eq!(err.error.kind, ErrorKind::InvalidRequest);
    }

    #[test]
    fn envelope_type_violations_are_invalid_requests() {
        for frame in [
            r#"[1,2]"#,
            r#"{"id":{"nested":true},"method":"initialize"}"#,
            r#"{"id":1,"method":7}"#,
            r#"{"id":1,"method":"tools/list","params":[1]}"#,
            r#"{"jsonrpc":"1.0","id":1,"method":"tools/list"}"#,
            r#"{"method":"tools/list"}"#,
        ] {
            let err = decode(frame.as_bytes()).unwrap_err();
            assert_eq!(err.error.kind, ErrorKind::InvalidRequest, "{frame}");
        }
    }

    #[test]
    fn id_less_notifications_decode_without_response() {
        let inbound = decode(br#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#).unwrap();
        assert_eq!(inbound, Inbound::Notification {
            method: "notifications/initialized".to_string(),
        });
    }

    #[test]
    fn request_params_default_to_empty() {
        let Inbound::Request(request) = decode(br#"{"id":7,"method":"tools/list"}"#).unwrap() else {
            panic!("expected request");
        };
        assert_eq!(request.id, json!(7));
        assert!(request.params.is_empty());
    }

    #[test]
    fn encode_emits_one_line_with_exclusive_result_or_error() {
        let ok = encode(&JsonRpcResponse::success(json!(1), json!({"content": []})));
        assert_eq!(ok, b"{\"jsonrpc\":\"2.0\",\"id\":1,\"result\":{\"content\":[]}}\n");
        let err = encode(&JsonRpcResponse::failure(
            Value::Null,
            JsonRpcError::new(ErrorKind::NotReady, "session not initialized"),
        ));
        let parsed: Value = serde_json::from_slice(&err).unwrap();
        assert_eq!(parsed["error"], json!({
            "code": -32002,
            "kind": "NotReady",
            "message": "session not initialized"
        }));
        assert!(parsed.get("result").is_none());
    }
}
