// crates/data-console-config/src/config.rs
// ============================================================================
// Module: Data Console Configuration
// Description: Configuration loading and validation for the data console.
// Purpose: Provide strict, fail-closed config parsing with hard limits.
// Dependencies: data-console-store-sqlite, serde, toml
// ============================================================================

//! ## Overview
//! Configuration is loaded from a TOML file with strict size and path limits.
//! Missing or invalid configuration fails closed; the server never starts
//! with a partially understood config.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;
use std::env;
use std::fs;
use std::net::SocketAddr;
use std::path::Path;
use std::path::PathBuf;

use data_console_store_sqlite::SqliteStoreConfig;
use data_console_store_sqlite::SqliteStoreMode;
use data_console_store_sqlite::SqliteSyncMode;
use data_console_store_sqlite::table_spec;
use serde::Deserialize;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration filename when no path is specified.
const DEFAULT_CONFIG_NAME: &str = "data-console.toml";
/// Environment variable used to override the config path.
pub const CONFIG_ENV_VAR: &str = "DATA_CONSOLE_CONFIG";
/// Maximum configuration file size in bytes.
pub(crate) const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum length of a single path component.
pub(crate) const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
pub(crate) const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Largest accepted protocol frame.
pub(crate) const MAX_FRAME_BYTES_LIMIT: usize = 16 * 1024 * 1024;
/// Largest file the file tools may read.
pub(crate) const MAX_FILE_BYTES_LIMIT: usize = 64 * 1024 * 1024;
/// Largest CSV filter preview.
pub(crate) const MAX_CSV_PREVIEW_ROWS: usize = 100;
/// Minimum busy timeout in milliseconds.
pub(crate) const MIN_BUSY_TIMEOUT_MS: u64 = 10;
/// Maximum busy timeout in milliseconds.
pub(crate) const MAX_BUSY_TIMEOUT_MS: u64 = 60_000;

// ============================================================================
// SECTION: Top-Level Config
// ============================================================================

/// Data console configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct DataConsoleConfig {
    /// Protocol server settings.
    #[serde(default)]
    pub server: ServerConfig,
    /// Sandbox settings.
    #[serde(default)]
    pub security: SecurityConfig,
    /// Record store settings.
    #[serde(default)]
    pub store: StoreConfig,
    /// Built-in tool settings.
    #[serde(default)]
    pub tools: ToolsConfig,
}

impl DataConsoleConfig {
    /// Loads configuration from disk using the default resolution rules.
    ///
    /// The path comes from the argument, then [`CONFIG_ENV_VAR`], then
    /// `data-console.toml` in the working directory.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let resolved = resolve_path(path)?;
        validate_path(&resolved)?;
        let bytes = fs::read(&resolved).map_err(|err| ConfigError::Io(err.to_string()))?;
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        Self::parse(content)
    }

    /// Parses and validates configuration text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when parsing or validation fails.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.server.validate()?;
        self.security.validate()?;
        self.store.validate()?;
        self.tools.validate()?;
        Ok(())
    }
}

// ============================================================================
// SECTION: Server
// ============================================================================

/// Transport used to serve the protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ServerTransport {
    /// Newline-delimited frames on stdin/stdout.
    #[default]
    Stdio,
    /// Newline-delimited frames on TCP connections.
    Tcp,
}

impl ServerTransport {
    /// Returns the transport label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Stdio => "stdio",
            Self::Tcp => "tcp",
        }
    }
}

/// Protocol server configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Transport type.
    #[serde(default)]
    pub transport: ServerTransport,
    /// Bind address for the TCP transport.
    #[serde(default)]
    pub bind: Option<String>,
    /// Maximum frame size in bytes.
    #[serde(default = "default_max_frame_bytes")]
    pub max_frame_bytes: usize,
    /// Audit logging configuration.
    #[serde(default)]
    pub audit: ServerAuditConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            transport: ServerTransport::Stdio,
            bind: None,
            max_frame_bytes: default_max_frame_bytes(),
            audit: ServerAuditConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Returns the parsed TCP bind address, if configured.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when the bind address is missing or
    /// malformed.
    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        let bind = self.bind.as_deref().unwrap_or_default().trim();
        if bind.is_empty() {
            return Err(ConfigError::Invalid("tcp transport requires bind address".to_string()));
        }
        bind.parse().map_err(|_| ConfigError::Invalid("invalid bind address".to_string()))
    }

    /// Validates server transport configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.max_frame_bytes == 0 {
            return Err(ConfigError::Invalid(
                "max_frame_bytes must be greater than zero".to_string(),
            ));
        }
        if self.max_frame_bytes > MAX_FRAME_BYTES_LIMIT {
            return Err(ConfigError::Invalid(format!(
                "max_frame_bytes must be at most {MAX_FRAME_BYTES_LIMIT}"
            )));
        }
        self.audit.validate()?;
        match self.transport {
            ServerTransport::Tcp => {
                let addr = self.bind_addr()?;
                if !addr.ip().is_loopback() {
                    return Err(ConfigError::Invalid(
                        "non-loopback bind disallowed without authentication".to_string(),
                    ));
                }
            }
            ServerTransport::Stdio => {
                if self.bind.is_some() {
                    return Err(ConfigError::Invalid(
                        "stdio transport does not accept a bind address".to_string(),
                    ));
                }
            }
        }
        Ok(())
    }
}

/// Audit logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerAuditConfig {
    /// Enable structured audit logging.
    #[serde(default = "default_audit_enabled")]
    pub enabled: bool,
    /// Optional audit log path (JSON lines); stderr when absent.
    #[serde(default)]
    pub path: Option<String>,
}

impl Default for ServerAuditConfig {
    fn default() -> Self {
        Self {
            enabled: default_audit_enabled(),
            path: None,
        }
    }
}

impl ServerAuditConfig {
    /// Validates audit configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if let Some(path) = &self.path {
            validate_path_string("server.audit.path", path)?;
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Security
// ============================================================================

/// Sandbox configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SecurityConfig {
    /// Directory the file tools are confined to.
    #[serde(default = "default_allowed_root")]
    pub allowed_root: PathBuf,
    /// Tables the database tools may touch.
    #[serde(default = "default_allowed_tables")]
    pub allowed_tables: Vec<String>,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            allowed_root: default_allowed_root(),
            allowed_tables: default_allowed_tables(),
        }
    }
}

impl SecurityConfig {
    /// Validates sandbox configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        validate_path_string("security.allowed_root", &self.allowed_root.to_string_lossy())?;
        let mut seen = BTreeSet::new();
        for table in &self.allowed_tables {
            if table_spec(table).is_none() {
                return Err(ConfigError::Invalid(format!(
                    "security.allowed_tables contains unknown table: {table}"
                )));
            }
            if !seen.insert(table.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "security.allowed_tables contains duplicate table: {table}"
                )));
            }
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Store
// ============================================================================

/// Record store configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StoreConfig {
    /// `SQLite` database path.
    #[serde(default = "default_store_path")]
    pub path: PathBuf,
    /// Busy timeout in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    /// `SQLite` journal mode.
    #[serde(default)]
    pub journal_mode: SqliteStoreMode,
    /// `SQLite` synchronous mode.
    #[serde(default)]
    pub sync_mode: SqliteSyncMode,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
            busy_timeout_ms: default_busy_timeout_ms(),
            journal_mode: SqliteStoreMode::default(),
            sync_mode: SqliteSyncMode::default(),
        }
    }
}

impl StoreConfig {
    /// Converts the section into the store's own configuration.
    #[must_use]
    pub fn sqlite_config(&self) -> SqliteStoreConfig {
        SqliteStoreConfig {
            path: self.path.clone(),
            busy_timeout_ms: self.busy_timeout_ms,
            journal_mode: self.journal_mode,
            sync_mode: self.sync_mode,
        }
    }

    /// Validates store configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        validate_path_string("store.path", &self.path.to_string_lossy())?;
        if !(MIN_BUSY_TIMEOUT_MS ..= MAX_BUSY_TIMEOUT_MS).contains(&self.busy_timeout_ms) {
            return Err(ConfigError::Invalid(format!(
                "store.busy_timeout_ms must be between {MIN_BUSY_TIMEOUT_MS} and \
                 {MAX_BUSY_TIMEOUT_MS}"
            )));
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Tools
// ============================================================================

/// Built-in tool configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ToolsConfig {
    /// Largest file `read_file` and the CSV tools will load.
    #[serde(default = "default_max_file_bytes")]
    pub max_file_bytes: usize,
    /// Rows included in a `filter_csv` preview.
    #[serde(default = "default_csv_preview_rows")]
    pub csv_preview_rows: usize,
    /// Fixed seed for mock weather; entropy-seeded when absent.
    #[serde(default)]
    pub weather_seed: Option<u64>,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            max_file_bytes: default_max_file_bytes(),
            csv_preview_rows: default_csv_preview_rows(),
            weather_seed: None,
        }
    }
}

impl ToolsConfig {
    /// Validates tool configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.max_file_bytes == 0 || self.max_file_bytes > MAX_FILE_BYTES_LIMIT {
            return Err(ConfigError::Invalid(format!(
                "tools.max_file_bytes must be between 1 and {MAX_FILE_BYTES_LIMIT}"
            )));
        }
        if self.csv_preview_rows == 0 || self.csv_preview_rows > MAX_CSV_PREVIEW_ROWS {
            return Err(ConfigError::Invalid(format!(
                "tools.csv_preview_rows must be between 1 and {MAX_CSV_PREVIEW_ROWS}"
            )));
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration loading or validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O failure while reading configuration.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Defaults
// ============================================================================

/// Default maximum frame size.
const fn default_max_frame_bytes() -> usize {
    1024 * 1024
}

/// Audit logging is on unless disabled.
const fn default_audit_enabled() -> bool {
    true
}

/// Default sandbox root.
fn default_allowed_root() -> PathBuf {
    PathBuf::from("data")
}

/// Every catalogued table.
fn default_allowed_tables() -> Vec<String> {
    vec!["weather_logs".to_string(), "file_logs".to_string(), "reports".to_string()]
}

/// Default database location.
fn default_store_path() -> PathBuf {
    PathBuf::from("data-console.db")
}

/// Default busy timeout.
const fn default_busy_timeout_ms() -> u64 {
    data_console_store_sqlite::store::default_busy_timeout_ms()
}

/// Default file read limit.
const fn default_max_file_bytes() -> usize {
    10 * 1024 * 1024
}

/// Default CSV preview size.
const fn default_csv_preview_rows() -> usize {
    5
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Resolves the config path from CLI or environment defaults.
fn resolve_path(path: Option<&Path>) -> Result<PathBuf, ConfigError> {
    if let Some(path) = path {
        return Ok(path.to_path_buf());
    }
    if let Ok(env_path) = env::var(CONFIG_ENV_VAR) {
        if env_path.len() > MAX_TOTAL_PATH_LENGTH {
            return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
        }
        return Ok(PathBuf::from(env_path));
    }
    Ok(PathBuf::from(DEFAULT_CONFIG_NAME))
}

/// Validates the resolved path against security limits.
fn validate_path(path: &Path) -> Result<(), ConfigError> {
    let text = path.to_string_lossy();
    if text.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
    }
    for component in path.components() {
        let value = component.as_os_str().to_string_lossy();
        if value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid("config path component too long".to_string()));
        }
    }
    Ok(())
}

/// Validates a path string against length constraints.
fn validate_path_string(field: &str, value: &str) -> Result<(), ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must be non-empty")));
    }
    if trimmed.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid(format!("{field} exceeds max length")));
    }
    for component in Path::new(trimmed).components() {
        if component.as_os_str().to_string_lossy().len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid(format!("{field} path component too long")));
        }
    }
    Ok(())
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, reason = "Test-only assertions.")]

    use super::MAX_PATH_COMPONENT_LENGTH;
    use super::validate_path_string;

    #[test]
    fn validate_path_string_rejects_empty_string() {
        let result = validate_path_string("store.path", "  ");
        assert!(result.unwrap_err().to_string().contains("store.path must be non-empty"));
    }

    #[test]
    fn validate_path_string_rejects_component_too_long() {
        let path = format!("./{}", "a".repeat(MAX_PATH_COMPONENT_LENGTH + 1));
        assert!(validate_path_string("store.path", &path).is_err());
    }

    #[test]
    fn validate_path_string_accepts_component_at_max() {
        let path = format!("./{}", "a".repeat(MAX_PATH_COMPONENT_LENGTH));
        assert!(validate_path_string("store.path", &path).is_ok());
    }
}
