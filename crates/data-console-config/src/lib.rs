// crates/data-console-config/src/lib.rs
// ============================================================================
// Module: Data Console Config Library
// Description: Configuration model and validation for the data console server.
// Purpose: Single source of truth for data-console.toml semantics.
// Dependencies: data-console-store-sqlite, serde, toml
// ============================================================================

//! ## Overview
//! `data-console-config` defines the configuration model for the data
//! console server and validates it strictly before anything starts.
//! Security posture: config inputs are untrusted.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::*;
