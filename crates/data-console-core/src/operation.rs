// crates/data-console-core/src/operation.rs
// ============================================================================
// Module: Backing Operations
// Description: Uniform interface between the dispatcher and tool handlers.
// Purpose: Bind handlers to descriptors with a declared sandbox capability.
// Dependencies: serde_json, thiserror
// ============================================================================

//! ## Overview
//! Every registered tool is backed by a [`ToolOperation`]. The dispatcher
//! never hands an operation raw caller input: it passes an
//! [`OperationRequest`] holding validated arguments and the [`AccessGrant`]
//! that the security policy issued for the operation's [`Capability`].
//! Operations touching files must use the granted path and never re-read the
//! caller's string.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::PathBuf;

use serde_json::Value;
use thiserror::Error;

use crate::identifiers::TableName;
use crate::schema::ValidatedArguments;

// ============================================================================
// SECTION: Capabilities
// ============================================================================

/// Sandbox capability an operation needs before it may run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Capability {
    /// No sandboxed resource is touched.
    None,
    /// Reads from the allowed root.
    FilesystemRead {
        /// Argument holding the candidate path, or `None` for the root itself.
        path_argument: Option<String>,
    },
    /// Reads a persistence table.
    PersistenceRead {
        /// Argument holding the table name.
        table_argument: String,
    },
    /// Writes a persistence table.
    PersistenceWrite {
        /// Argument holding the table name.
        table_argument: String,
    },
}

impl Capability {
    /// Filesystem read guarded on the named argument.
    #[must_use]
    pub fn file_argument(argument: impl Into<String>) -> Self {
        Self::FilesystemRead {
            path_argument: Some(argument.into()),
        }
    }

    /// Filesystem read of the allowed root itself.
    #[must_use]
    pub const fn root_directory() -> Self {
        Self::FilesystemRead {
            path_argument: None,
        }
    }

    /// Persistence read guarded on the named argument.
    #[must_use]
    pub fn table_read(argument: impl Into<String>) -> Self {
        Self::PersistenceRead {
            table_argument: argument.into(),
        }
    }

    /// Persistence write guarded on the named argument.
    #[must_use]
    pub fn table_write(argument: impl Into<String>) -> Self {
        Self::PersistenceWrite {
            table_argument: argument.into(),
        }
    }

    /// Returns the stable label used in listings and audit records.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::FilesystemRead {
                ..
            } => "filesystem-read",
            Self::PersistenceRead {
                ..
            } => "persistence-read",
            Self::PersistenceWrite {
                ..
            } => "persistence-write",
        }
    }

    /// Returns the argument the capability guards, if any.
    #[must_use]
    pub fn guarded_argument(&self) -> Option<&str> {
        match self {
            Self::None => None,
            Self::FilesystemRead {
                path_argument,
            } => path_argument.as_deref(),
            Self::PersistenceRead {
                table_argument,
            }
            | Self::PersistenceWrite {
                table_argument,
            } => Some(table_argument),
        }
    }
}

/// Access issued by the security policy for one call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessGrant {
    /// No resource access was requested.
    None,
    /// Resolved file path inside the allowed root.
    Path(PathBuf),
    /// Canonical allowed root directory.
    Directory(PathBuf),
    /// Allow-listed persistence table.
    Table(TableName),
}

// ============================================================================
// SECTION: Requests
// ============================================================================

/// Input handed to an operation after validation and the security gate.
#[derive(Debug, Clone)]
pub struct OperationRequest {
    /// Validated arguments with defaults applied.
    pub arguments: ValidatedArguments,
    /// Access granted by the security policy.
    pub grant: AccessGrant,
}

impl OperationRequest {
    /// Returns the granted file path, if the grant is a path.
    #[must_use]
    pub const fn path(&self) -> Option<&PathBuf> {
        match &self.grant {
            AccessGrant::Path(path) => Some(path),
            _ => None,
        }
    }

    /// Returns the granted directory, if the grant is a directory.
    #[must_use]
    pub const fn directory(&self) -> Option<&PathBuf> {
        match &self.grant {
            AccessGrant::Directory(path) => Some(path),
            _ => None,
        }
    }

    /// Returns the granted table, if the grant is a table.
    #[must_use]
    pub const fn table(&self) -> Option<&TableName> {
        match &self.grant {
            AccessGrant::Table(table) => Some(table),
            _ => None,
        }
    }

    /// Returns a required string argument.
    ///
    /// # Errors
    ///
    /// Returns [`OperationError::Internal`] when the argument is missing.
    pub fn required_str(&self, name: &str) -> Result<&str, OperationError> {
        self.arguments
            .str(name)
            .ok_or_else(|| OperationError::internal(format!("missing argument {name}")))
    }

    /// Returns the grant required by operations that read files.
    ///
    /// # Errors
    ///
    /// Returns [`OperationError::Internal`] when no path was granted.
    pub fn required_path(&self) -> Result<&PathBuf, OperationError> {
        self.path().ok_or_else(|| OperationError::internal("no path grant issued"))
    }

    /// Returns the grant required by operations that touch tables.
    ///
    /// # Errors
    ///
    /// Returns [`OperationError::Internal`] when no table was granted.
    pub fn required_table(&self) -> Result<&TableName, OperationError> {
        self.table().ok_or_else(|| OperationError::internal("no table grant issued"))
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Failure reported by a backing operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OperationError {
    /// Requested resource does not exist.
    #[error("{0}")]
    NotFound(String),
    /// Operation refused the validated input.
    #[error("{0}")]
    Rejected(String),
    /// Unexpected failure; the detail stays server-side.
    #[error("{message}")]
    Internal {
        /// Sanitized message returned to the caller.
        message: String,
        /// Internal detail recorded in the audit log only.
        detail: Option<String>,
    },
}

impl OperationError {
    /// Creates an internal error with a generic public message.
    #[must_use]
    pub fn internal(detail: impl Into<String>) -> Self {
        Self::Internal {
            message: "operation failed".to_string(),
            detail: Some(detail.into()),
        }
    }

    /// Creates an internal error with a specific public message.
    #[must_use]
    pub fn internal_with(message: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
            detail: Some(detail.into()),
        }
    }

    /// Returns the message safe to return to callers.
    #[must_use]
    pub fn public_message(&self) -> &str {
        match self {
            Self::NotFound(message)
            | Self::Rejected(message)
            | Self::Internal {
                message, ..
            } => message,
        }
    }

    /// Returns the internal detail, if any.
    #[must_use]
    pub fn detail(&self) -> Option<&str> {
        match self {
            Self::Internal {
                detail, ..
            } => detail.as_deref(),
            Self::NotFound(_) | Self::Rejected(_) => None,
        }
    }
}

// ============================================================================
// SECTION: Operation Trait
// ============================================================================

/// Backing handler for one tool.
pub trait ToolOperation: Send + Sync {
    /// Executes the operation.
    ///
    /// # Errors
    ///
    /// Returns [`OperationError`] when the operation fails.
    fn execute(&self, request: &OperationRequest) -> Result<Value, OperationError>;

    /// Renders a result as markdown, or `None` to use the generic renderer.
    fn render_markdown(&self, _output: &Value) -> Option<String> {
        None
    }
}

/// Adapter that turns a closure into a [`ToolOperation`].
pub struct FnOperation<F>(F);

impl<F> FnOperation<F>
where
    F: Fn(&OperationRequest) -> Result<Value, OperationError> + Send + Sync,
{
    /// Wraps the closure.
    #[must_use]
    pub const fn new(handler: F) -> Self {
        Self(handler)
    }
}

impl<F> ToolOperation for FnOperation<F>
where
    F: Fn(&OperationRequest) -> Result<Value, OperationError> + Send + Sync,
{
    fn execute(&self, request: &OperationRequest) -> Result<Value, OperationError> {
        (self.0)(request)
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, reason = "Test-only assertions.")]

    use serde_json::json;

    use super::AccessGrant;
    use super::Capability;
    use super::FnOperation;
    use super::OperationError;
    use super::OperationRequest;
    use super::ToolOperation;
    use crate::schema::InputSchema;

    #[test]
    fn capability_labels_and_arguments() {
        assert_eq!(Capability::None.label(), "none");
        assert_eq!(Capability::root_directory().guarded_argument(), None);
        assert_eq!(Capability::file_argument("filename").guarded_argument(), Some("filename"));
        assert_eq!(Capability::table_write("table").label(), "persistence-write");
    }

    #[test]
    fn internal_error_hides_detail_from_public_message() {
        let err = OperationError::internal("disk I/O error at /srv/db");
        assert_eq!(err.public_message(), "operation failed");
        assert_eq!(err.detail(), Some("disk I/O error at /srv/db"));
        assert_eq!(err.to_string(), "operation failed");
    }

    #[test]
    fn fn_operation_invokes_closure() {
        let op = FnOperation::new(|request: &OperationRequest| {
            Ok(json!(request.required_str("text")?))
        });
        let arguments = InputSchema::new()
            .allow_additional_fields()
            .validate(&json!({"text": "hi"}))
            .unwrap();
        let request = OperationRequest {
            arguments,
            grant: AccessGrant::None,
        };
        assert_eq!(op.execute(&request).unwrap(), json!("hi"));
        assert!(op.render_markdown(&json!("hi")).is_none());
        assert!(request.required_table().is_err());
    }
}
