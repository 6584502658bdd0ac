// crates/data-console-core/src/schema.rs
// ============================================================================
// Module: Tool Input Schemas
// Description: Declarative argument schemas and the validator that enforces them.
// Purpose: Reject malformed tool arguments before any backing operation runs.
// Dependencies: serde, serde_json, thiserror
// ============================================================================

//! ## Overview
//! An [`InputSchema`] is an ordered list of [`FieldSpec`] entries. Each field
//! has a [`FieldType`], a required flag, an optional default, and a list of
//! tagged [`Constraint`] values. Schemas are checked once, when the tool is
//! registered, and are never mutated afterwards.
//!
//! [`InputSchema::validate`] is all-or-nothing: either every argument passes
//! and a [`ValidatedArguments`] map (with defaults applied) is returned, or
//! the first offending field is reported and nothing is produced.
//!
//! Schemas render to, and parse from, a small JSON Schema subset. Parsing
//! rejects every keyword outside that subset so a descriptor can never
//! advertise a constraint the validator silently ignores.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;
use serde_json::json;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Keywords accepted at the top level of a JSON schema document.
const ROOT_KEYWORDS: &[&str] =
    &["$schema", "title", "description", "type", "properties", "required", "additionalProperties"];
/// Keywords accepted inside a property definition.
const FIELD_KEYWORDS: &[&str] = &[
    "type",
    "title",
    "description",
    "enum",
    "minLength",
    "maxLength",
    "minimum",
    "maximum",
    "default",
];
/// Field label used for errors about the argument object itself.
const ROOT_FIELD: &str = "arguments";

// ============================================================================
// SECTION: Field Types
// ============================================================================

/// Runtime type of a tool argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    /// UTF-8 string.
    String,
    /// Signed or unsigned integer.
    Integer,
    /// Any JSON number.
    Number,
    /// Boolean flag.
    Boolean,
    /// JSON object.
    Object,
    /// JSON array.
    Array,
}

impl FieldType {
    /// Returns the JSON Schema type label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Object => "object",
            Self::Array => "array",
        }
    }

    /// Parses a JSON Schema type label.
    #[must_use]
    pub fn parse(label: &str) -> Option<Self> {
        match label {
            "string" => Some(Self::String),
            "integer" => Some(Self::Integer),
            "number" => Some(Self::Number),
            "boolean" => Some(Self::Boolean),
            "object" => Some(Self::Object),
            "array" => Some(Self::Array),
            _ => None,
        }
    }

    /// Returns true when the JSON value has this runtime type.
    #[must_use]
    pub fn matches(self, value: &Value) -> bool {
        match self {
            Self::String => value.is_string(),
            Self::Integer => value.is_i64() || value.is_u64(),
            Self::Number => value.is_number(),
            Self::Boolean => value.is_boolean(),
            Self::Object => value.is_object(),
            Self::Array => value.is_array(),
        }
    }
}

/// Returns a short label describing the runtime type of a JSON value.
fn value_type_label(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(number) if number.is_i64() || number.is_u64() => "integer",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// ============================================================================
// SECTION: Constraints
// ============================================================================

/// Declarative constraint attached to a field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Constraint {
    /// Value must equal one of the listed values.
    OneOf {
        /// Permitted values.
        values: Vec<Value>,
    },
    /// String must contain at least this many characters.
    MinLength {
        /// Minimum character count.
        value: usize,
    },
    /// String must contain at most this many characters.
    MaxLength {
        /// Maximum character count.
        value: usize,
    },
    /// Number must be greater than or equal to this bound.
    Minimum {
        /// Inclusive lower bound.
        value: f64,
    },
    /// Number must be less than or equal to this bound.
    Maximum {
        /// Inclusive upper bound.
        value: f64,
    },
}

impl Constraint {
    /// Returns true when the constraint can apply to the given field type.
    const fn applies_to(&self, field_type: FieldType) -> bool {
        match self {
            Self::OneOf {
                ..
            } => true,
            Self::MinLength {
                ..
            }
            | Self::MaxLength {
                ..
            } => matches!(field_type, FieldType::String),
            Self::Minimum {
                ..
            }
            | Self::Maximum {
                ..
            } => matches!(field_type, FieldType::Integer | FieldType::Number),
        }
    }

    /// Returns the JSON Schema keyword for the constraint.
    const fn keyword(&self) -> &'static str {
        match self {
            Self::OneOf {
                ..
            } => "enum",
            Self::MinLength {
                ..
            } => "minLength",
            Self::MaxLength {
                ..
            } => "maxLength",
            Self::Minimum {
                ..
            } => "minimum",
            Self::Maximum {
                ..
            } => "maximum",
        }
    }

    /// Checks a value that already matches the field type.
    fn check(&self, value: &Value) -> Result<(), String> {
        match self {
            Self::OneOf {
                values,
            } => {
                if values.contains(value) {
                    return Ok(());
                }
                let allowed = values.iter().map(Value::to_string).collect::<Vec<_>>().join(", ");
                Err(format!("must be one of [{allowed}]"))
            }
            Self::MinLength {
                value: min,
            } => {
                let length = value.as_str().map_or(0, |text| text.chars().count());
                if length < *min {
                    return Err(format!("must be at least {min} characters"));
                }
                Ok(())
            }
            Self::MaxLength {
                value: max,
            } => {
                let length = value.as_str().map_or(0, |text| text.chars().count());
                if length > *max {
                    return Err(format!("must be at most {max} characters"));
                }
                Ok(())
            }
            Self::Minimum {
                value: min,
            } => match value.as_f64() {
                Some(number) if number >= *min => Ok(()),
                _ => Err(format!("must be >= {}", display_bound(*min))),
            },
            Self::Maximum {
                value: max,
            } => match value.as_f64() {
                Some(number) if number <= *max => Ok(()),
                _ => Err(format!("must be <= {}", display_bound(*max))),
            },
        }
    }
}

/// Formats a numeric bound without a trailing `.0` for whole numbers.
fn display_bound(bound: f64) -> String {
    bound_value(bound).to_string()
}

/// Converts a bound into a JSON number, preferring integers when exact.
fn bound_value(bound: f64) -> Value {
    if bound.fract() == 0.0 && bound.abs() < 9.0e15 {
        #[allow(
            clippy::cast_possible_truncation,
            reason = "Whole-number bounds below 2^53 convert to i64 exactly."
        )]
        let whole = bound as i64;
        return Value::from(whole);
    }
    json!(bound)
}

// ============================================================================
// SECTION: Field Specifications
// ============================================================================

/// Declaration of one named tool argument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    /// Argument name.
    pub name: String,
    /// Runtime type of the argument.
    pub field_type: FieldType,
    /// Human-readable description.
    pub description: String,
    /// Whether the caller must supply the argument.
    pub required: bool,
    /// Value applied when an optional argument is absent.
    pub default: Option<Value>,
    /// Constraints applied after the type check.
    pub constraints: Vec<Constraint>,
}

impl FieldSpec {
    /// Creates an optional field of the given type.
    #[must_use]
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            description: String::new(),
            required: false,
            default: None,
            constraints: Vec::new(),
        }
    }

    /// Creates an optional string field.
    #[must_use]
    pub fn string(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::String)
    }

    /// Creates an optional integer field.
    #[must_use]
    pub fn integer(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Integer)
    }

    /// Creates an optional object field.
    #[must_use]
    pub fn object(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Object)
    }

    /// Sets the field description.
    #[must_use]
    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Marks the field as required.
    #[must_use]
    pub const fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Sets the default applied when the field is absent.
    #[must_use]
    pub fn with_default(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }

    /// Adds a constraint.
    #[must_use]
    pub fn constrain(mut self, constraint: Constraint) -> Self {
        self.constraints.push(constraint);
        self
    }

    /// Restricts the field to an enumerated value set.
    #[must_use]
    pub fn one_of<I, V>(self, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.constrain(Constraint::OneOf {
            values: values.into_iter().map(Into::into).collect(),
        })
    }

    /// Sets a minimum string length.
    #[must_use]
    pub fn min_length(self, value: usize) -> Self {
        self.constrain(Constraint::MinLength {
            value,
        })
    }

    /// Sets a maximum string length.
    #[must_use]
    pub fn max_length(self, value: usize) -> Self {
        self.constrain(Constraint::MaxLength {
            value,
        })
    }

    /// Sets an inclusive numeric range.
    #[must_use]
    pub fn range(self, min: f64, max: f64) -> Self {
        self.constrain(Constraint::Minimum {
            value: min,
        })
        .constrain(Constraint::Maximum {
            value: max,
        })
    }

    /// Checks the declaration for internal consistency.
    fn check(&self) -> Result<(), SchemaError> {
        if self.name.trim().is_empty() {
            return Err(SchemaError::Malformed("field names must be non-empty".to_string()));
        }
        let mut min_length = None;
        let mut max_length = None;
        let mut minimum = None;
        let mut maximum = None;
        for constraint in &self.constraints {
            if !constraint.applies_to(self.field_type) {
                return Err(SchemaError::Incompatible {
                    field: self.name.clone(),
                    reason: format!(
                        "{} does not apply to {} fields",
                        constraint.keyword(),
                        self.field_type.as_str()
                    ),
                });
            }
            match constraint {
                Constraint::OneOf {
                    values,
                } => {
                    if values.is_empty() {
                        return Err(self.incompatible("enum must list at least one value"));
                    }
                    if values.iter().any(|value| !self.field_type.matches(value)) {
                        return Err(self.incompatible("enum values must match the field type"));
                    }
                }
                Constraint::MinLength {
                    value,
                } => min_length = Some(*value),
                Constraint::MaxLength {
                    value,
                } => max_length = Some(*value),
                Constraint::Minimum {
                    value,
                } => minimum = Some(*value),
                Constraint::Maximum {
                    value,
                } => maximum = Some(*value),
            }
        }
        if let (Some(min), Some(max)) = (min_length, max_length)
            && min > max
        {
            return Err(self.incompatible("minLength exceeds maxLength"));
        }
        if let (Some(min), Some(max)) = (minimum, maximum)
            && (min.is_nan() || max.is_nan() || min > max)
        {
            return Err(self.incompatible("minimum exceeds maximum"));
        }
        if let Some(default) = &self.default {
            self.check_value(default)
                .map_err(|reason| self.incompatible(&format!("default value {reason}")))?;
        }
        Ok(())
    }

    /// Builds an incompatibility error for this field.
    fn incompatible(&self, reason: &str) -> SchemaError {
        SchemaError::Incompatible {
            field: self.name.clone(),
            reason: reason.to_string(),
        }
    }

    /// Checks a supplied value against the type and every constraint.
    fn check_value(&self, value: &Value) -> Result<(), String> {
        if !self.field_type.matches(value) {
            return Err(format!(
                "expected {}, got {}",
                self.field_type.as_str(),
                value_type_label(value)
            ));
        }
        for constraint in &self.constraints {
            constraint.check(value)?;
        }
        Ok(())
    }

    /// Renders the field as a JSON Schema property.
    fn to_json_schema(&self) -> Value {
        let mut property = Map::new();
        property.insert("type".to_string(), Value::String(self.field_type.as_str().to_string()));
        if !self.description.is_empty() {
            property.insert("description".to_string(), Value::String(self.description.clone()));
        }
        for constraint in &self.constraints {
            let value = match constraint {
                Constraint::OneOf {
                    values,
                } => Value::Array(values.clone()),
                Constraint::MinLength {
                    value,
                }
                | Constraint::MaxLength {
                    value,
                } => Value::from(*value),
                Constraint::Minimum {
                    value,
                }
                | Constraint::Maximum {
                    value,
                } => bound_value(*value),
            };
            property.insert(constraint.keyword().to_string(), value);
        }
        if let Some(default) = &self.default {
            property.insert("default".to_string(), default.clone());
        }
        Value::Object(property)
    }

    /// Parses a JSON Schema property definition.
    fn from_json_schema(name: &str, definition: &Value, required: bool) -> Result<Self, SchemaError> {
        let Value::Object(map) = definition else {
            return Err(SchemaError::Malformed(format!("property `{name}` must be an object")));
        };
        if let Some(keyword) = map.keys().find(|key| !FIELD_KEYWORDS.contains(&key.as_str())) {
            return Err(SchemaError::UnsupportedKeyword {
                field: name.to_string(),
                keyword: keyword.clone(),
            });
        }
        let field_type = map
            .get("type")
            .and_then(Value::as_str)
            .and_then(FieldType::parse)
            .ok_or_else(|| SchemaError::Malformed(format!("property `{name}` needs a known type")))?;
        let mut field = Self::new(name, field_type);
        field.required = required;
        if let Some(description) = map.get("description").and_then(Value::as_str) {
            field.description = description.to_string();
        }
        if let Some(values) = map.get("enum") {
            let Value::Array(values) = values else {
                return Err(SchemaError::Malformed(format!("enum of `{name}` must be an array")));
            };
            field.constraints.push(Constraint::OneOf {
                values: values.clone(),
            });
        }
        if let Some(value) = map.get("minLength") {
            field.constraints.push(Constraint::MinLength {
                value: parse_length(name, "minLength", value)?,
            });
        }
        if let Some(value) = map.get("maxLength") {
            field.constraints.push(Constraint::MaxLength {
                value: parse_length(name, "maxLength", value)?,
            });
        }
        if let Some(value) = map.get("minimum") {
            field.constraints.push(Constraint::Minimum {
                value: parse_bound(name, "minimum", value)?,
            });
        }
        if let Some(value) = map.get("maximum") {
            field.constraints.push(Constraint::Maximum {
                value: parse_bound(name, "maximum", value)?,
            });
        }
        field.default = map.get("default").cloned();
        Ok(field)
    }
}

/// Parses a non-negative length keyword.
fn parse_length(field: &str, keyword: &str, value: &Value) -> Result<usize, SchemaError> {
    value.as_u64().and_then(|length| usize::try_from(length).ok()).ok_or_else(|| {
        SchemaError::Malformed(format!("{keyword} of `{field}` must be a non-negative integer"))
    })
}

/// Parses a numeric bound keyword.
fn parse_bound(field: &str, keyword: &str, value: &Value) -> Result<f64, SchemaError> {
    value
        .as_f64()
        .ok_or_else(|| SchemaError::Malformed(format!("{keyword} of `{field}` must be a number")))
}

// ============================================================================
// SECTION: Input Schema
// ============================================================================

/// Ordered argument schema for one tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputSchema {
    /// Declared fields in declaration order.
    fields: Vec<FieldSpec>,
    /// Whether undeclared arguments are tolerated.
    allow_additional: bool,
    /// Whether string arguments are trimmed before validation.
    #[serde(default)]
    strip_whitespace: bool,
}

impl Default for InputSchema {
    fn default() -> Self {
        Self::new()
    }
}

impl InputSchema {
    /// Creates an empty schema that forbids undeclared arguments.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            fields: Vec::new(),
            allow_additional: false,
            strip_whitespace: false,
        }
    }

    /// Appends a field declaration.
    #[must_use]
    pub fn field(mut self, field: FieldSpec) -> Self {
        self.fields.push(field);
        self
    }

    /// Tolerates arguments that are not declared.
    #[must_use]
    pub const fn allow_additional_fields(mut self) -> Self {
        self.allow_additional = true;
        self
    }

    /// Trims leading and trailing whitespace from every string argument
    /// before constraints are checked.
    #[must_use]
    pub const fn strip_whitespace(mut self) -> Self {
        self.strip_whitespace = true;
        self
    }

    /// Returns the declared fields.
    #[must_use]
    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    /// Looks up a field by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|field| field.name == name)
    }

    /// Checks the schema for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError`] when a field is duplicated, a constraint does
    /// not fit its field type, bounds are inverted, or a default is invalid.
    pub fn check(&self) -> Result<(), SchemaError> {
        let mut seen = BTreeSet::new();
        for field in &self.fields {
            if !seen.insert(field.name.as_str()) {
                return Err(SchemaError::DuplicateField(field.name.clone()));
            }
            field.check()?;
        }
        Ok(())
    }

    /// Validates caller arguments against the schema.
    ///
    /// A `null` or absent argument counts as missing. Defaults are applied
    /// only after every supplied argument has passed. With
    /// [`InputSchema::strip_whitespace`], string arguments are trimmed first
    /// and the trimmed text is what constraints and operations see.
    ///
    /// # Errors
    ///
    /// Returns [`ArgumentError`] naming the first offending field.
    pub fn validate(&self, arguments: &Value) -> Result<ValidatedArguments, ArgumentError> {
        let supplied: Map<String, Value> = match arguments {
            Value::Object(map) => {
                map.iter().map(|(name, value)| (name.clone(), self.normalize(value))).collect()
            }
            Value::Null => Map::new(),
            other => {
                return Err(ArgumentError::new(
                    ROOT_FIELD,
                    format!("expected object, got {}", value_type_label(other)),
                ));
            }
        };
        if !self.allow_additional
            && let Some(name) = supplied.keys().find(|name| self.get(name).is_none())
        {
            return Err(ArgumentError::new(name, "is not a declared argument"));
        }
        for field in &self.fields {
            match supplied.get(&field.name) {
                None | Some(Value::Null) => {
                    if field.required {
                        return Err(ArgumentError::new(&field.name, "is required"));
                    }
                }
                Some(value) => {
                    field
                        .check_value(value)
                        .map_err(|reason| ArgumentError::new(&field.name, reason))?;
                }
            }
        }
        let mut validated: Map<String, Value> =
            supplied.into_iter().filter(|(_, value)| !value.is_null()).collect();
        for field in &self.fields {
            if let Some(default) = &field.default
                && !validated.contains_key(&field.name)
            {
                validated.insert(field.name.clone(), default.clone());
            }
        }
        Ok(ValidatedArguments(validated))
    }

    /// Applies input normalization to one supplied argument.
    fn normalize(&self, value: &Value) -> Value {
        match value {
            Value::String(text) if self.strip_whitespace => Value::String(text.trim().to_string()),
            other => other.clone(),
        }
    }

    /// Renders the schema as a JSON Schema object.
    #[must_use]
    pub fn to_json_schema(&self) -> Value {
        let mut properties = Map::new();
        let mut required = Vec::new();
        for field in &self.fields {
            properties.insert(field.name.clone(), field.to_json_schema());
            if field.required {
                required.push(Value::String(field.name.clone()));
            }
        }
        json!({
            "type": "object",
            "properties": properties,
            "required": required,
            "additionalProperties": self.allow_additional,
        })
    }

    /// Parses a JSON Schema subset into an input schema.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::UnsupportedKeyword`] for any keyword outside the
    /// supported subset and [`SchemaError::Malformed`] for ill-typed keywords.
    pub fn from_json_schema(document: &Value) -> Result<Self, SchemaError> {
        let Value::Object(root) = document else {
            return Err(SchemaError::Malformed("schema must be an object".to_string()));
        };
        if let Some(keyword) = root.keys().find(|key| !ROOT_KEYWORDS.contains(&key.as_str())) {
            return Err(SchemaError::UnsupportedKeyword {
                field: ROOT_FIELD.to_string(),
                keyword: keyword.clone(),
            });
        }
        if let Some(kind) = root.get("type")
            && kind.as_str() != Some("object")
        {
            return Err(SchemaError::Malformed("schema type must be object".to_string()));
        }
        let required = match root.get("required") {
            None => BTreeSet::new(),
            Some(Value::Array(names)) => names
                .iter()
                .map(|name| {
                    name.as_str().map(str::to_string).ok_or_else(|| {
                        SchemaError::Malformed("required entries must be strings".to_string())
                    })
                })
                .collect::<Result<BTreeSet<_>, _>>()?,
            Some(_) => return Err(SchemaError::Malformed("required must be an array".to_string())),
        };
        let allow_additional = match root.get("additionalProperties") {
            None => false,
            Some(Value::Bool(flag)) => *flag,
            Some(_) => {
                return Err(SchemaError::UnsupportedKeyword {
                    field: ROOT_FIELD.to_string(),
                    keyword: "additionalProperties".to_string(),
                });
            }
        };
        let mut schema = Self {
            fields: Vec::new(),
            allow_additional,
            strip_whitespace: false,
        };
        match root.get("properties") {
            None => {}
            Some(Value::Object(properties)) => {
                for (name, definition) in properties {
                    schema.fields.push(FieldSpec::from_json_schema(
                        name,
                        definition,
                        required.contains(name),
                    )?);
                }
            }
            Some(_) => {
                return Err(SchemaError::Malformed("properties must be an object".to_string()));
            }
        }
        if let Some(missing) = required.iter().find(|name| schema.get(name).is_none()) {
            return Err(SchemaError::Malformed(format!(
                "required field `{missing}` is not declared"
            )));
        }
        schema.check()?;
        Ok(schema)
    }
}

// ============================================================================
// SECTION: Validated Arguments
// ============================================================================

/// Argument map that passed schema validation.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(transparent)]
pub struct ValidatedArguments(Map<String, Value>);

impl ValidatedArguments {
    /// Returns an argument by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    /// Returns a string argument by name.
    #[must_use]
    pub fn str(&self, name: &str) -> Option<&str> {
        self.0.get(name).and_then(Value::as_str)
    }

    /// Returns an integer argument by name.
    #[must_use]
    pub fn i64(&self, name: &str) -> Option<i64> {
        self.0.get(name).and_then(Value::as_i64)
    }

    /// Returns an object argument by name.
    #[must_use]
    pub fn object(&self, name: &str) -> Option<&Map<String, Value>> {
        self.0.get(name).and_then(Value::as_object)
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Schema declaration errors raised at registration time.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    /// Schema uses a keyword the validator does not enforce.
    #[error("unsupported constraint `{keyword}` on `{field}`")]
    UnsupportedKeyword {
        /// Field carrying the keyword.
        field: String,
        /// Unsupported keyword.
        keyword: String,
    },
    /// Constraint or default does not fit the field.
    #[error("field `{field}`: {reason}")]
    Incompatible {
        /// Offending field.
        field: String,
        /// Reason the declaration is inconsistent.
        reason: String,
    },
    /// Field declared more than once.
    #[error("duplicate field `{0}`")]
    DuplicateField(String),
    /// Structurally invalid schema document.
    #[error("malformed schema: {0}")]
    Malformed(String),
}

/// Argument validation failure naming the offending field.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid argument `{field}`: {reason}")]
pub struct ArgumentError {
    /// Offending field name.
    pub field: String,
    /// Human-readable reason.
    pub reason: String,
}

impl ArgumentError {
    /// Creates a new argument error.
    #[must_use]
    pub fn new(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            reason: reason.into(),
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
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::use_debug,
        reason = "Test-only schema assertions."
    )]

    use serde_json::json;

    use super::Constraint;
    use super::FieldSpec;
    use super::FieldType;
    use super::InputSchema;
    use super::SchemaError;

    fn weather_schema() -> InputSchema {
        InputSchema::new()
            .field(FieldSpec::string("city").required().min_length(1).max_length(100))
            .field(
                FieldSpec::string("response_format")
                    .one_of(["markdown", "json"])
                    .with_default(json!("markdown")),
            )
    }

    #[test]
    fn validate_applies_defaults_after_success() {
        let args = weather_schema().validate(&json!({"city": "Mumbai"})).unwrap();
        assert_eq!(args.str("city"), Some("Mumbai"));
        assert_eq!(args.str("response_format"), Some("markdown"));
    }

    #[test]
    fn validate_reports_missing_required_field() {
        let err = weather_schema().validate(&json!({})).unwrap_err();
        assert_eq!(err.field, "city");
        assert!(err.reason.contains("required"));
    }

    #[test]
    fn validate_treats_null_as_missing() {
        let err = weather_schema().validate(&json!({"city": null})).unwrap_err();
        assert_eq!(err.field, "city");
    }

    #[test]
    fn validate_rejects_wrong_runtime_type() {
        let err = weather_schema().validate(&json!({"city": 42})).unwrap_err();
        assert_eq!(err.field, "city");
        assert_eq!(err.reason, "expected string, got integer");
    }

    #[test]
    fn validate_rejects_enum_violation() {
        let err = weather_schema()
            .validate(&json!({"city": "Pune", "response_format": "yaml"}))
            .unwrap_err();
        assert_eq!(err.field, "response_format");
        assert!(err.reason.contains("one of"));
    }

    #[test]
    fn validate_rejects_undeclared_field() {
        let err =
            weather_schema().validate(&json!({"city": "Pune", "units": "metric"})).unwrap_err();
        assert_eq!(err.field, "units");
    }

    #[test]
    fn validate_counts_characters_not_bytes() {
        let schema = InputSchema::new().field(FieldSpec::string("name").max_length(3));
        assert!(schema.validate(&json!({"name": "äöü"})).is_ok());
        assert!(schema.validate(&json!({"name": "äöüß"})).is_err());
    }

    #[test]
    fn validate_enforces_integer_range() {
        let schema = InputSchema::new().field(
            FieldSpec::integer("limit").range(1.0, 100.0).with_default(json!(10)),
        );
        assert_eq!(schema.validate(&json!({})).unwrap().i64("limit"), Some(10));
        assert!(schema.validate(&json!({"limit": 0})).is_err());
        assert!(schema.validate(&json!({"limit": 101})).is_err());
        assert!(schema.validate(&json!({"limit": 2.5})).is_err());
    }

    #[test]
    fn validate_trims_strings_when_stripping() {
        let schema = InputSchema::new()
            .strip_whitespace()
            .field(FieldSpec::string("filename").required().min_length(1))
            .field(FieldSpec::string("format").one_of(["markdown", "json"]));
        let args = schema.validate(&json!({"filename": "  notes.txt\n", "format": " json "})).unwrap();
        assert_eq!(args.str("filename"), Some("notes.txt"));
        assert_eq!(args.str("format"), Some("json"));
        let err = schema.validate(&json!({"filename": "   "})).unwrap_err();
        assert_eq!(err.field, "filename");
    }

    #[test]
    fn validate_keeps_whitespace_by_default() {
        let schema = InputSchema::new().field(FieldSpec::string("name"));
        let args = schema.validate(&json!({"name": " padded "})).unwrap();
        assert_eq!(args.str("name"), Some(" padded "));
    }

    #[test]
    fn validate_rejects_non_object_arguments() {
        let err = weather_schema().validate(&json!(["Mumbai"])).unwrap_err();
        assert_eq!(err.field, "arguments");
    }

    #[test]
    fn check_rejects_length_constraint_on_integer() {
        let schema = InputSchema::new().field(FieldSpec::integer("limit").min_length(1));
        assert!(matches!(schema.check(), Err(SchemaError::Incompatible { .. })));
    }

    #[test]
    fn check_rejects_inverted_bounds() {
        let schema = InputSchema::new().field(FieldSpec::integer("limit").range(10.0, 1.0));
        assert!(schema.check().is_err());
    }

    #[test]
    fn check_rejects_invalid_default() {
        let schema = InputSchema::new()
            .field(FieldSpec::string("format").one_of(["a", "b"]).with_default(json!("c")));
        assert!(schema.check().is_err());
    }

    #[test]
    fn check_rejects_duplicate_fields() {
        let schema =
            InputSchema::new().field(FieldSpec::string("a")).field(FieldSpec::string("a"));
        assert_eq!(schema.check(), Err(SchemaError::DuplicateField("a".to_string())));
    }

    #[test]
    fn from_json_schema_rejects_unsupported_keyword() {
        let document = json!({
            "type": "object",
            "properties": {
                "table": {"type": "string", "pattern": "^(reports)$"}
            }
        });
        let err = InputSchema::from_json_schema(&document).unwrap_err();
        assert_eq!(
            err,
            SchemaError::UnsupportedKeyword {
                field: "table".to_string(),
                keyword: "pattern".to_string(),
            }
        );
    }

    #[test]
    fn from_json_schema_reads_rendered_schema() {
        let schema = weather_schema();
        let parsed = InputSchema::from_json_schema(&schema.to_json_schema()).unwrap();
        let city = parsed.get("city").unwrap();
        assert_eq!(city.field_type, FieldType::String);
        assert!(city.required);
        assert!(city.constraints.contains(&Constraint::MaxLength {
            value: 100
        }));
        assert_eq!(parsed.get("response_format").unwrap().default, Some(json!("markdown")));
    }

    #[test]
    fn to_json_schema_renders_whole_bounds_as_integers() {
        let schema = InputSchema::new().field(FieldSpec::integer("limit").range(1.0, 100.0));
        let rendered = schema.to_json_schema();
        assert_eq!(rendered["properties"]["limit"]["minimum"], json!(1));
        assert_eq!(rendered["properties"]["limit"]["maximum"], json!(100));
        assert_eq!(rendered["additionalProperties"], json!(false));
    }
}
