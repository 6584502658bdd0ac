// crates/data-console-core/src/registry.rs
// ============================================================================
// Module: Tool Registry
// Description: Startup-time registration of tools and immutable lookup.
// Purpose: Guarantee unique names and checked schemas before serving begins.
// Dependencies: thiserror
// ============================================================================

//! ## Overview
//! Tools are registered through a [`ToolRegistryBuilder`] during startup.
//! Each registration checks the descriptor's schema and the operation's
//! declared [`Capability`]. [`ToolRegistryBuilder::build`] freezes the set
//! into a [`ToolRegistry`] that is shared read-only by every session.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::descriptor::ToolDescriptor;
use crate::operation::Capability;
use crate::operation::ToolOperation;
use crate::schema::FieldType;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Registry failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// A tool with the same name is already registered.
    #[error("duplicate tool name: {0}")]
    DuplicateName(String),
    /// The descriptor or capability is inconsistent.
    #[error("invalid schema for {tool}: {reason}")]
    InvalidSchema {
        /// Tool name.
        tool: String,
        /// Reason the registration was refused.
        reason: String,
    },
    /// No tool with the requested name exists.
    #[error("unknown tool: {0}")]
    UnknownTool(String),
}

// ============================================================================
// SECTION: Registered Tools
// ============================================================================

/// Descriptor bound to its capability and backing operation.
#[derive(Clone)]
pub struct RegisteredTool {
    /// Public descriptor.
    pub descriptor: ToolDescriptor,
    /// Sandbox capability checked before each call.
    pub capability: Capability,
    /// Backing operation.
    pub operation: Arc<dyn ToolOperation>,
}

impl fmt::Debug for RegisteredTool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisteredTool")
            .field("descriptor", &self.descriptor)
            .field("capability", &self.capability)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// SECTION: Builder
// ============================================================================

/// Mutable registration phase of a [`ToolRegistry`].
#[derive(Default)]
pub struct ToolRegistryBuilder {
    /// Tools in registration order.
    tools: Vec<RegisteredTool>,
    /// Name to position index.
    index: BTreeMap<String, usize>,
}

impl ToolRegistryBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a tool.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::DuplicateName`] when the name is taken and
    /// [`RegistryError::InvalidSchema`] when the schema fails its checks or
    /// the capability guards an argument that is not a required string.
    pub fn register(
        &mut self,
        descriptor: ToolDescriptor,
        capability: Capability,
        operation: Arc<dyn ToolOperation>,
    ) -> Result<(), RegistryError> {
        let name = descriptor.name.as_str().to_string();
        if name.trim().is_empty() {
            return Err(RegistryError::InvalidSchema {
                tool: name,
                reason: "tool names must be non-empty".to_string(),
            });
        }
        if self.index.contains_key(&name) {
            return Err(RegistryError::DuplicateName(name));
        }
        descriptor.input_schema.check().map_err(|err| RegistryError::InvalidSchema {
            tool: name.clone(),
            reason: err.to_string(),
        })?;
        if let Some(argument) = capability.guarded_argument() {
            let guarded = descriptor
                .input_schema
                .get(argument)
                .is_some_and(|field| field.required && field.field_type == FieldType::String);
            if !guarded {
                return Err(RegistryError::InvalidSchema {
                    tool: name,
                    reason: format!(
                        "{} capability guards `{argument}`, which is not a required string",
                        capability.label()
                    ),
                });
            }
        }
        self.index.insert(name, self.tools.len());
        self.tools.push(RegisteredTool {
            descriptor,
            capability,
            operation,
        });
        Ok(())
    }

    /// Freezes the registry.
    #[must_use]
    pub fn build(self) -> ToolRegistry {
        ToolRegistry {
            tools: self.tools,
            index: self.index,
        }
    }
}

// ============================================================================
// SECTION: Registry
// ============================================================================

/// Immutable registry of tools shared by all sessions.
#[derive(Debug, Clone)]
pub struct ToolRegistry {
    /// Tools in registration order.
    tools: Vec<RegisteredTool>,
    /// Name to position index.
    index: BTreeMap<String, usize>,
}

impl ToolRegistry {
    /// Looks up a tool by name.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::UnknownTool`] when the name is not registered.
    pub fn lookup(&self, name: &str) -> Result<&RegisteredTool, RegistryError> {
        self.index
            .get(name)
            .and_then(|position| self.tools.get(*position))
            .ok_or_else(|| RegistryError::UnknownTool(name.to_string()))
    }

    /// Returns all descriptors in registration order.
    #[must_use]
    pub fn list(&self) -> Vec<ToolDescriptor> {
        self.tools.iter().map(|tool| tool.descriptor.clone()).collect()
    }

    /// Returns all registered tools in registration order.
    #[must_use]
    pub fn tools(&self) -> &[RegisteredTool] {
        &self.tools
    }

    /// Returns the number of registered tools.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Returns true when no tools are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, reason = "Test-only assertions.")]

    use std::sync::Arc;

    use serde_json::json;

    use super::RegistryError;
    use super::ToolRegistryBuilder;
    use crate::descriptor::ToolAnnotations;
    use crate::descriptor::ToolDescriptor;
    use crate::operation::Capability;
    use crate::operation::FnOperation;
    use crate::operation::OperationRequest;
    use crate::operation::ToolOperation;
    use crate::schema::FieldSpec;
    use crate::schema::InputSchema;

    fn descriptor(name: &str, schema: InputSchema) -> ToolDescriptor {
        ToolDescriptor::new(name, "test tool", schema, ToolAnnotations::read_only(name))
    }

    fn noop() -> Arc<dyn ToolOperation> {
        Arc::new(FnOperation::new(|_: &OperationRequest| Ok(json!(null))))
    }

    #[test]
    fn capability_must_guard_required_string() {
        let mut builder = ToolRegistryBuilder::new();
        let schema = InputSchema::new().field(FieldSpec::string("filename"));
        let err = builder
            .register(descriptor("read", schema), Capability::file_argument("filename"), noop())
            .unwrap_err();
        assert!(matches!(err, RegistryError::InvalidSchema { .. }));
    }

    #[test]
    fn capability_must_name_declared_field() {
        let mut builder = ToolRegistryBuilder::new();
        let err = builder
            .register(descriptor("query", InputSchema::new()), Capability::table_read("table"), noop())
            .unwrap_err();
        assert!(matches!(err, RegistryError::InvalidSchema { .. }));
    }

    #[test]
    fn lookup_unknown_tool_fails() {
        let registry = ToolRegistryBuilder::new().build();
        assert!(registry.is_empty());
        assert_eq!(
            registry.lookup("missing").unwrap_err(),
            RegistryError::UnknownTool("missing".to_string())
        );
    }
}
