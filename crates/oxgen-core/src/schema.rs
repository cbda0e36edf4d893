//! Operator schemas.
//!
//! A schema describes one version of an operator: the opset version it was
//! introduced in and its attributes with their declared defaults. Builtin
//! generators resolve the schema that applies under an opset ceiling and take
//! their version and attribute defaults from it.

use oxgen_onnx::AttributeValue;
use std::collections::HashMap;

/// Declared default of a schema attribute.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeDefault {
    /// The attribute has this default value.
    Value(AttributeValue),

    /// The attribute is declared without a default.
    NoDefault,

    /// A default exists but has no `AttributeValue` representation
    /// (graphs, sparse tensors, type protos).
    Unrepresentable(String),
}

/// One attribute declared by an operator schema.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaAttribute {
    pub name: String,
    pub default: AttributeDefault,
}

/// One version of an operator's formal definition.
#[derive(Debug, Clone, PartialEq)]
pub struct OpSchema {
    /// Operator name.
    pub name: String,

    /// Opset version this definition was introduced in.
    pub since_version: i64,

    /// Declared attributes.
    pub attributes: Vec<SchemaAttribute>,
}

impl OpSchema {
    /// Create a schema with no attributes.
    pub fn new(name: impl Into<String>, since_version: i64) -> Self {
        Self {
            name: name.into(),
            since_version,
            attributes: Vec::new(),
        }
    }

    /// Declare an attribute with a default value.
    pub fn attr(mut self, name: &str, default: AttributeValue) -> Self {
        self.attributes.push(SchemaAttribute {
            name: name.to_string(),
            default: AttributeDefault::Value(default),
        });
        self
    }

    /// Declare an attribute without a default.
    pub fn no_default(mut self, name: &str) -> Self {
        self.attributes.push(SchemaAttribute {
            name: name.to_string(),
            default: AttributeDefault::NoDefault,
        });
        self
    }

    /// Declare an attribute whose default cannot be represented.
    pub fn opaque(mut self, name: &str, kind: &str) -> Self {
        self.attributes.push(SchemaAttribute {
            name: name.to_string(),
            default: AttributeDefault::Unrepresentable(kind.to_string()),
        });
        self
    }
}

/// Collection of operator schemas across versions.
#[derive(Debug, Clone, Default)]
pub struct SchemaSet {
    /// Per operator, sorted by `since_version` ascending.
    schemas: HashMap<String, Vec<OpSchema>>,
}

impl SchemaSet {
    /// Create an empty schema set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a schema version.
    pub fn insert(&mut self, schema: OpSchema) -> &mut Self {
        let versions = self.schemas.entry(schema.name.clone()).or_default();
        versions.push(schema);
        versions.sort_by_key(|s| s.since_version);
        self
    }

    /// Schema of `op_type` in effect at opset `max_inclusive_version`.
    ///
    /// That is the version with the greatest `since_version` not above the
    /// ceiling. Returns `None` if the operator is unknown or did not exist
    /// yet at that opset.
    pub fn resolve(&self, op_type: &str, max_inclusive_version: i64) -> Option<&OpSchema> {
        self.schemas
            .get(op_type)?
            .iter()
            .rev()
            .find(|s| s.since_version <= max_inclusive_version)
    }

    /// Since-versions of `op_type` not above `max_inclusive_version`, ascending.
    pub fn since_versions(&self, op_type: &str, max_inclusive_version: i64) -> Vec<i64> {
        self.schemas
            .get(op_type)
            .into_iter()
            .flatten()
            .map(|s| s.since_version)
            .filter(|&version| version <= max_inclusive_version)
            .collect()
    }

    /// Number of operators with at least one schema.
    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    /// Check if the set is empty.
    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }
}
