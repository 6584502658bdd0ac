// crates/data-console-core/src/policy.rs
// ============================================================================
// Module: Security Policy
// Description: Path containment and persistence table allow-listing.
// Purpose: Gate every file and table access before an operation runs.
// Dependencies: thiserror
// ============================================================================

//! ## Overview
//! The [`SecurityPolicy`] holds one canonical root directory and a fixed set
//! of persistence table names. It is built once at startup and consulted by
//! the dispatcher for every call whose operation declares a sandboxed
//! capability.
//!
//! Security posture: candidate paths are untrusted. Any `..` segment is
//! rejected before resolution, symlinks in the existing prefix are resolved,
//! and the result must be a strict descendant of the root.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;
use std::ffi::OsString;
use std::path::Component;
use std::path::Path;
use std::path::PathBuf;

use thiserror::Error;

use crate::identifiers::TableName;
use crate::operation::AccessGrant;
use crate::operation::Capability;
use crate::schema::ValidatedArguments;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Security policy failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PolicyError {
    /// Candidate path resolves outside the allowed root.
    #[error("path escapes allowed root: {0}")]
    PathEscape(String),
    /// Table name is not on the allow-list.
    #[error("table not allowed: {0}")]
    TableNotAllowed(String),
    /// Allowed root is missing or not a directory.
    #[error("invalid allowed root: {0}")]
    InvalidRoot(String),
}

// ============================================================================
// SECTION: Policy
// ============================================================================

/// Immutable sandbox policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecurityPolicy {
    /// Canonical allowed root.
    root: PathBuf,
    /// Allow-listed table names.
    tables: BTreeSet<String>,
}

impl SecurityPolicy {
    /// Builds a policy from a root directory and table allow-list.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError::InvalidRoot`] when the root cannot be
    /// canonicalized or is not a directory.
    pub fn new<I, S>(root: &Path, tables: I) -> Result<Self, PolicyError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let canonical = root
            .canonicalize()
            .map_err(|err| PolicyError::InvalidRoot(format!("{}: {err}", root.display())))?;
        if !canonical.is_dir() {
            return Err(PolicyError::InvalidRoot(format!("{} is not a directory", root.display())));
        }
        Ok(Self {
            root: canonical,
            tables: tables.into_iter().map(Into::into).collect(),
        })
    }

    /// Returns the canonical allowed root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the allow-listed table names in sorted order.
    pub fn tables(&self) -> impl Iterator<Item = &str> {
        self.tables.iter().map(String::as_str)
    }

    /// Resolves a candidate path inside the allowed root.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError::PathEscape`] when the candidate is empty,
    /// contains a NUL byte or a `..` segment, or resolves outside the root.
    pub fn check_path(&self, candidate: &str) -> Result<PathBuf, PolicyError> {
        let escape = || PolicyError::PathEscape(candidate.to_string());
        if candidate.trim().is_empty() || candidate.contains('\0') {
            return Err(escape());
        }
        if candidate.split(['/', '\\']).any(|segment| segment == "..") {
            return Err(escape());
        }
        let relative = Path::new(candidate);
        if relative.components().any(|component| matches!(component, Component::ParentDir)) {
            return Err(escape());
        }
        let joined = self.root.join(relative);
        let resolved = resolve_existing_prefix(&joined).ok_or_else(escape)?;
        if resolved == self.root || !resolved.starts_with(&self.root) {
            return Err(escape());
        }
        Ok(resolved)
    }

    /// Checks a table name against the allow-list.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError::TableNotAllowed`] unless the name matches an
    /// allow-listed table exactly.
    pub fn check_table(&self, name: &str) -> Result<TableName, PolicyError> {
        if self.tables.contains(name) {
            return Ok(TableName::allowed(name.to_string()));
        }
        Err(PolicyError::TableNotAllowed(name.to_string()))
    }

    /// Issues the access grant a capability needs for one call.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError`] when the guarded argument fails its check.
    pub fn grant(
        &self,
        capability: &Capability,
        arguments: &ValidatedArguments,
    ) -> Result<AccessGrant, PolicyError> {
        match capability {
            Capability::None => Ok(AccessGrant::None),
            Capability::FilesystemRead {
                path_argument: None,
            } => Ok(AccessGrant::Directory(self.root.clone())),
            Capability::FilesystemRead {
                path_argument: Some(argument),
            } => self.check_path(arguments.str(argument).unwrap_or_default()).map(AccessGrant::Path),
            Capability::PersistenceRead {
                table_argument,
            }
            | Capability::PersistenceWrite {
                table_argument,
            } => self
                .check_table(arguments.str(table_argument).unwrap_or_default())
                .map(AccessGrant::Table),
        }
    }
}

/// Canonicalizes the deepest existing ancestor and appends the rest lexically.
///
/// Returns `None` when an entry exists but cannot be canonicalized, such as a
/// dangling symlink.
fn resolve_existing_prefix(path: &Path) -> Option<PathBuf> {
    let mut existing = path.to_path_buf();
    let mut tail: Vec<OsString> = Vec::new();
    let base = loop {
        match existing.canonicalize() {
            Ok(canonical) => break canonical,
            Err(_) => {
                if existing.symlink_metadata().is_ok() {
                    return None;
                }
                tail.push(existing.file_name()?.to_os_string());
                if !existing.pop() {
                    return None;
                }
            }
        }
    };
    let mut resolved = base;
    for segment in tail.into_iter().rev() {
        resolved.push(segment);
    }
    Some(resolved)
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, reason = "Test-only assertions.")]

    use std::fs;

    use serde_json::json;

    use super::PolicyError;
    use super::SecurityPolicy;
    use crate::operation::AccessGrant;
    use crate::operation::Capability;
    use crate::schema::FieldSpec;
    use crate::schema::InputSchema;

    fn policy() -> (tempfile::TempDir, SecurityPolicy) {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(dir.path().join("notes.txt"), "hello").unwrap();
        let policy = SecurityPolicy::new(dir.path(), ["reports", "file_logs"]).unwrap();
        (dir, policy)
    }

    #[test]
    fn existing_file_resolves_inside_root() {
        let (_dir, policy) = policy();
        let resolved = policy.check_path("notes.txt").unwrap();
        assert_eq!(resolved, policy.root().join("notes.txt"));
    }

    #[test]
    fn missing_tail_is_appended_lexically() {
        let (_dir, policy) = policy();
        let resolved = policy.check_path("sub/new.csv").unwrap();
        assert_eq!(resolved, policy.root().join("sub").join("new.csv"));
    }

    #[test]
    fn parent_segments_are_rejected() {
        let (_dir, policy) = policy();
        for candidate in ["../etc/passwd", "a/../notes.txt", "..", "a\\..\\b"] {
            assert_eq!(
                policy.check_path(candidate),
                Err(PolicyError::PathEscape(candidate.to_string()))
            );
        }
    }

    #[test]
    fn empty_nul_and_root_candidates_are_rejected() {
        let (_dir, policy) = policy();
        assert!(policy.check_path("").is_err());
        assert!(policy.check_path("a\0b").is_err());
        assert!(policy.check_path(".").is_err());
    }

    #[test]
    fn absolute_path_outside_root_is_rejected() {
        let (_dir, policy) = policy();
        assert!(policy.check_path("/etc/passwd").is_err());
    }

    #[cfg(unix)]
    #[test]
    fn symlink_out_of_root_is_rejected() {
        let (dir, policy) = policy();
        let outside = tempfile::tempdir().unwrap();
        fs::write(outside.path().join("secret.txt"), "s").unwrap();
        std::os::unix::fs::symlink(outside.path(), dir.path().join("link")).unwrap();
        assert!(policy.check_path("link/secret.txt").is_err());
        std::os::unix::fs::symlink(outside.path().join("gone"), dir.path().join("dangling"))
            .unwrap();
        assert!(policy.check_path("dangling").is_err());
    }

    #[test]
    fn table_membership_is_exact() {
        let (_dir, policy) = policy();
        assert_eq!(policy.check_table("reports").unwrap().as_str(), "reports");
        assert!(policy.check_table("Reports").is_err());
        assert!(policy.check_table("reports ").is_err());
        assert!(policy.check_table("users").is_err());
    }

    #[test]
    fn grants_follow_capability() {
        let (_dir, policy) = policy();
        let schema = InputSchema::new()
            .field(FieldSpec::string("filename"))
            .field(FieldSpec::string("table"));
        let args = schema.validate(&json!({"filename": "notes.txt", "table": "Reports"})).unwrap();
        assert_eq!(policy.grant(&Capability::None, &args).unwrap(), AccessGrant::None);
        assert_eq!(
            policy.grant(&Capability::root_directory(), &args).unwrap(),
            AccessGrant::Directory(policy.root().to_path_buf())
        );
        assert_eq!(
            policy.grant(&Capability::file_argument("filename"), &args).unwrap(),
            AccessGrant::Path(policy.root().join("notes.txt"))
        );
        assert_eq!(
            policy.grant(&Capability::table_read("table"), &args),
            Err(PolicyError::TableNotAllowed("Reports".to_string()))
        );
    }

    #[test]
    fn missing_root_is_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let err = SecurityPolicy::new(&dir.path().join("absent"), ["reports"]).unwrap_err();
        assert!(matches!(err, PolicyError::InvalidRoot(_)));
    }
}
