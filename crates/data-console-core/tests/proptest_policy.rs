// crates/data-console-core/tests/proptest_policy.rs
// ============================================================================
// Module: Security Policy Property Tests
// Description: Property tests for path containment.
// Purpose: Ensure traversal candidates never resolve outside the root.
// ============================================================================

//! Property-based tests for the security policy.

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
    reason = "Test-only assertions and helpers are permitted."
)]

use std::fs;

use data_console_core::PolicyError;
use data_console_core::SecurityPolicy;
use proptest::prelude::*;

fn sandbox() -> (tempfile::TempDir, SecurityPolicy) {
    let dir = tempfile::tempdir().expect("tempdir");
    fs::create_dir(dir.path().join("nested")).unwrap();
    fs::write(dir.path().join("nested").join("data.csv"), "a,b\n1,2\n").unwrap();
    let policy = SecurityPolicy::new(dir.path(), ["reports"]).unwrap();
    (dir, policy)
}

fn segment() -> impl Strategy<Value = String> {
    prop_oneof![
        "[a-z]{1,8}",
        Just("nested".to_string()),
        Just("data.csv".to_string()),
        Just(".".to_string()),
    ]
}

proptest! {
    #[test]
    fn any_parent_segment_is_denied(
        prefix in prop::collection::vec(segment(), 0 .. 4),
        suffix in prop::collection::vec(segment(), 0 .. 4),
        separator in prop_oneof![Just("/"), Just("\\")],
    ) {
        let mut parts = prefix;
        parts.push("..".to_string());
        parts.extend(suffix);
        let candidate = parts.join(separator);
        let (_dir, policy) = sandbox();
        prop_assert_eq!(
            policy.check_path(&candidate),
            Err(PolicyError::PathEscape(candidate.clone()))
        );
    }

    #[test]
    fn plain_relative_paths_stay_inside_root(
        parts in prop::collection::vec("[a-z]{1,8}", 1 .. 5),
    ) {
        let candidate = parts.join("/");
        let (_dir, policy) = sandbox();
        let resolved = policy.check_path(&candidate).unwrap();
        prop_assert!(resolved.starts_with(policy.root()));
        prop_assert_ne!(resolved.as_path(), policy.root());
    }

    #[test]
    fn table_check_is_exact(name in "[A-Za-z_ ]{0,12}") {
        let (_dir, policy) = sandbox();
        let allowed = policy.check_table(&name).is_ok();
        prop_assert_eq!(allowed, name == "reports");
    }
}

#[test]
fn existing_nested_file_is_allowed() {
    let (_dir, policy) = sandbox();
    let resolved = policy.check_path("nested/data.csv").unwrap();
    assert_eq!(resolved, policy.root().join("nested").join("data.csv"));
}
