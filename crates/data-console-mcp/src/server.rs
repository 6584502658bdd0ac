// crates/data-console-mcp/src/server.rs
// ============================================================================
// Module: MCP Server
// Description: Server assembly plus stdio and TCP transports.
// Purpose: Wire config, policy, store, and tools into running sessions.
// Dependencies: data-console-config, data-console-tools, tokio
// ============================================================================

//! ## Overview
//! [`McpServer::from_config`] performs every fallible startup step (config
//! validation, policy root, store, tool registration, audit sink) before a
//! single frame is read. Each stream pair then runs one [`Session`] in strict
//! arrival order. The TCP transport gives every connection its own session on
//! the blocking pool; sessions share only the dispatcher and audit sink.
//! Security posture: frames are untrusted input; TCP binds are loopback-only
//! (enforced by config validation).

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io;
use std::io::BufRead;
use std::io::BufReader;
use std::io::Write;
use std::net::TcpStream;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use data_console_config::DataConsoleConfig;
use data_console_config::ServerAuditConfig;
use data_console_config::ServerConfig;
use data_console_config::ServerTransport;
use data_console_core::SecurityPolicy;
use data_console_store_sqlite::SqliteRecordStore;
use data_console_tools::builtin_registry;
use tokio::net::TcpListener;

use crate::audit::McpAuditSink;
use crate::audit::McpFileAuditSink;
use crate::audit::McpNoopAuditSink;
use crate::audit::McpStderrAuditSink;
use crate::codec::FrameReader;
use crate::dispatcher::Dispatcher;
use crate::session::Session;
use crate::session::SessionIdGenerator;
use crate::session::SessionState;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Pause after a failed accept so a persistent error (e.g. EMFILE) does not spin.
const ACCEPT_RETRY_DELAY: Duration = Duration::from_millis(50);

// ============================================================================
// SECTION: MCP Server
// ============================================================================

/// MCP server instance.
#[derive(Clone)]
pub struct McpServer {
    /// Server configuration.
    server: ServerConfig,
    /// Shared dispatcher.
    dispatcher: Arc<Dispatcher>,
    /// Shared audit sink.
    audit: Arc<dyn McpAuditSink>,
    /// Session identifier generator.
    sessions: Arc<SessionIdGenerator>,
}

impl McpServer {
    /// Builds a server with the built-in tools from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError`] when validation or any startup step fails.
    pub fn from_config(config: DataConsoleConfig) -> Result<Self, ServerError> {
        config.validate().map_err(|err| ServerError::Config(err.to_string()))?;
        let policy = SecurityPolicy::new(
            &config.security.allowed_root,
            config.security.allowed_tables.iter().cloned(),
        )
        .map_err(|err| ServerError::Init(err.to_string()))?;
        let store = SqliteRecordStore::new(&config.store.sqlite_config())
            .map_err(|err| ServerError::Init(err.to_string()))?;
        let registry = builtin_registry(&config.tools, &Arc::new(store))
            .map_err(|err| ServerError::Init(err.to_string()))?;
        let audit = build_audit_sink(&config.server.audit)?;
        let dispatcher = Dispatcher::new(Arc::new(registry), Arc::new(policy));
        Ok(Self::new(config.server, dispatcher, audit))
    }

    /// Builds a server around an assembled dispatcher.
    #[must_use]
    pub fn new(server: ServerConfig, dispatcher: Dispatcher, audit: Arc<dyn McpAuditSink>) -> Self {
        Self {
            server,
            dispatcher: Arc::new(dispatcher),
            audit,
            sessions: Arc::new(SessionIdGenerator::new()),
        }
    }

    /// Returns the dispatcher.
    #[must_use]
    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Serves requests using the configured transport.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError`] when the transport fails.
    pub async fn serve(self) -> Result<(), ServerError> {
        match self.server.transport {
            ServerTransport::Stdio => tokio::task::spawn_blocking(move || {
                let stdin = io::stdin();
                self.serve_stdio(stdin.lock(), io::stdout())
            })
            .await
            .map_err(|err| ServerError::Transport(format!("stdio worker failed: {err}")))?,
            ServerTransport::Tcp => {
                let addr =
                    self.server.bind_addr().map_err(|err| ServerError::Config(err.to_string()))?;
                let listener = TcpListener::bind(addr)
                    .await
                    .map_err(|err| ServerError::Transport(format!("bind {addr} failed: {err}")))?;
                self.serve_tcp(listener).await;
                Ok(())
            }
        }
    }

    /// Runs one stdio session until end of stream or shutdown.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Transport`] when reading or writing fails.
    pub fn serve_stdio<R: BufRead, W: Write>(&self, reader: R, writer: W) -> Result<(), ServerError> {
        let mut session = self.open_session(ServerTransport::Stdio);
        run_session(&mut session, reader, writer, self.server.max_frame_bytes)
    }

    /// Accepts TCP connections, one session each, for as long as the task runs.
    ///
    /// Failures on a single connection (accept, socket setup, session I/O)
    /// are reported on stderr and never stop the listener.
    pub async fn serve_tcp(&self, listener: TcpListener) {
        loop {
            let stream = match listener.accept().await {
                Ok((stream, _peer)) => stream,
                Err(err) => {
                    report(&ServerError::Transport(format!("accept failed: {err}")));
                    tokio::time::sleep(ACCEPT_RETRY_DELAY).await;
                    continue;
                }
            };
            let stream = match into_blocking(stream) {
                Ok(stream) => stream,
                Err(err) => {
                    report(&err);
                    continue;
                }
            };
            let server = self.clone();
            tokio::task::spawn_blocking(move || {
                if let Err(err) = server.serve_connection(stream) {
                    report(&err);
                }
            });
        }
    }

    /// Runs one session over an accepted connection.
    fn serve_connection(&self, stream: TcpStream) -> Result<(), ServerError> {
        let reader = stream
            .try_clone()
            .map_err(|err| ServerError::Transport(format!("socket clone failed: {err}")))?;
        let mut session = self.open_session(ServerTransport::Tcp);
        run_session(&mut session, BufReader::new(reader), stream, self.server.max_frame_bytes)
    }

    /// Opens a fresh session for a transport.
    fn open_session(&self, transport: ServerTransport) -> Session {
        Session::new(
            self.sessions.issue(),
            transport.as_str(),
            Arc::clone(&self.dispatcher),
            Arc::clone(&self.audit),
        )
    }
}

/// Converts an accepted socket into a blocking stream for the session loop.
fn into_blocking(stream: tokio::net::TcpStream) -> Result<TcpStream, ServerError> {
    let stream =
        stream.into_std().map_err(|err| ServerError::Transport(format!("socket setup failed: {err}")))?;
    stream
        .set_nonblocking(false)
        .map_err(|err| ServerError::Transport(format!("socket setup failed: {err}")))?;
    Ok(stream)
}

/// Writes a connection-scoped failure to stderr.
fn report(err: &ServerError) {
    let _ = writeln!(io::stderr(), "data-console: {err}");
}

// ============================================================================
// SECTION: Session Loop
// ============================================================================

/// Drives a session over a stream pair in arrival order.
///
/// # Errors
///
/// Returns [`ServerError::Transport`] when reading or writing fails.
pub fn run_session<R: BufRead, W: Write>(
    session: &mut Session,
    reader: R,
    mut writer: W,
    max_frame_bytes: usize,
) -> Result<(), ServerError> {
    let mut frames = FrameReader::new(reader, max_frame_bytes);
    loop {
        let frame = match frames.next_frame() {
            Ok(Some(frame)) => frame,
            Ok(None) => {
                session.close();
                return Ok(());
            }
            Err(err) => {
                session.close();
                return Err(ServerError::Transport(format!(
                    "session {} read failed: {err}",
                    session.id()
                )));
            }
        };
        if let Some(bytes) = session.handle_frame(frame) {
            writer
                .write_all(&bytes)
                .and_then(|()| writer.flush())
                .map_err(|err| {
                    ServerError::Transport(format!("session {} write failed: {err}", session.id()))
                })?;
        }
        if session.state() == SessionState::Closed {
            return Ok(());
        }
    }
}

/// Selects the audit sink from configuration.
fn build_audit_sink(config: &ServerAuditConfig) -> Result<Arc<dyn McpAuditSink>, ServerError> {
    if !config.enabled {
        return Ok(Arc::new(McpNoopAuditSink));
    }
    match &config.path {
        Some(path) => {
            let sink = McpFileAuditSink::new(Path::new(path))
                .map_err(|err| ServerError::Init(format!("audit log {path}: {err}")))?;
            Ok(Arc::new(sink))
        }
        None => Ok(Arc::new(McpStderrAuditSink)),
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// MCP server errors.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Configuration errors.
    #[error("config error: {0}")]
    Config(String),
    /// Initialization errors.
    #[error("init error: {0}")]
    Init(String),
    /// Transport errors.
    #[error("transport error: {0}")]
    Transport(String),
}
