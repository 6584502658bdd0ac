// crates/data-console-core/src/lib.rs
// ============================================================================
// Module: Data Console Core
// Description: Tool descriptors, schema validation, and sandbox policy.
// Purpose: Provide the immutable building blocks of the tool dispatcher.
// Dependencies: serde, serde_json, thiserror
// ============================================================================

//! ## Overview
//! Data Console Core holds everything the dispatcher consults but never
//! mutates once the server is running: the [`ToolRegistry`] of declared
//! operations, the [`InputSchema`] validator, the [`SecurityPolicy`] that
//! gates file and persistence access, and the response formatter.
//!
//! Backing operations plug in through the [`ToolOperation`] trait and declare
//! a [`Capability`] so the dispatcher knows which policy check applies before
//! the operation runs.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod descriptor;
pub mod format;
pub mod identifiers;
pub mod operation;
pub mod policy;
pub mod registry;
pub mod schema;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use descriptor::ToolAnnotations;
pub use descriptor::ToolDescriptor;
pub use format::ContentBlock;
pub use format::ResponseFormat;
pub use format::render_output;
pub use identifiers::TableName;
pub use identifiers::ToolName;
pub use operation::AccessGrant;
pub use operation::Capability;
pub use operation::FnOperation;
pub use operation::OperationError;
pub use operation::OperationRequest;
pub use operation::ToolOperation;
pub use policy::PolicyError;
pub use policy::SecurityPolicy;
pub use registry::RegisteredTool;
pub use registry::RegistryError;
pub use registry::ToolRegistry;
pub use registry::ToolRegistryBuilder;
pub use schema::ArgumentError;
pub use schema::Constraint;
pub use schema::FieldSpec;
pub use schema::FieldType;
pub use schema::InputSchema;
pub use schema::SchemaError;
pub use schema::ValidatedArguments;
