// crates/data-console-core/src/descriptor.rs
// ============================================================================
// Module: Tool Descriptors
// Description: Public description of a callable tool.
// Purpose: Carry the name, schema, and behavioral hints advertised by tools/list.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! A [`ToolDescriptor`] is what clients see in `tools/list`. The input schema
//! is held in its native [`InputSchema`] form and rendered to JSON Schema on
//! serialization, so the advertised schema and the enforced schema cannot
//! drift apart.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use serde::ser::SerializeStruct;

use crate::identifiers::ToolName;
use crate::schema::InputSchema;

// ============================================================================
// SECTION: Annotations
// ============================================================================

/// Behavioral hints advertised with a tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolAnnotations {
    /// Optional display title.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Tool never modifies state.
    pub read_only_hint: bool,
    /// Tool may destroy or overwrite data.
    pub destructive_hint: bool,
    /// Repeating a call has no further effect.
    pub idempotent_hint: bool,
    /// Tool reaches outside the local sandbox.
    pub open_world_hint: bool,
}

impl ToolAnnotations {
    /// Hints for a read-only, idempotent tool.
    #[must_use]
    pub fn read_only(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            read_only_hint: true,
            destructive_hint: false,
            idempotent_hint: true,
            open_world_hint: false,
        }
    }

    /// Hints for a tool that writes new state without destroying existing data.
    #[must_use]
    pub fn mutating(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            read_only_hint: false,
            destructive_hint: false,
            idempotent_hint: false,
            open_world_hint: false,
        }
    }
}

// ============================================================================
// SECTION: Descriptor
// ============================================================================

/// Declarative description of one callable tool.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolDescriptor {
    /// Unique tool name.
    pub name: ToolName,
    /// Human-readable summary.
    pub description: String,
    /// Argument schema.
    pub input_schema: InputSchema,
    /// Behavioral hints.
    pub annotations: ToolAnnotations,
}

impl ToolDescriptor {
    /// Creates a descriptor.
    #[must_use]
    pub fn new(
        name: impl Into<ToolName>,
        description: impl Into<String>,
        input_schema: InputSchema,
        annotations: ToolAnnotations,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            input_schema,
            annotations,
        }
    }
}

impl Serialize for ToolDescriptor {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("ToolDescriptor", 4)?;
        state.serialize_field("name", &self.name)?;
        state.serialize_field("description", &self.description)?;
        state.serialize_field("inputSchema", &self.input_schema.to_json_schema())?;
        state.serialize_field("annotations", &self.annotations)?;
        state.end()
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
