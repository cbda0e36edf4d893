//! Graph representation consumed by the code generators.
//!
//! Nodes reference tensors by name. Constant tensors live in the initializer
//! table and declared shapes live in the value-info table, both keyed by the
//! same names.

use crate::tensor::TensorValue;
use crate::{OnnxError, Result};
use serde::Serialize;
use std::collections::{HashMap, HashSet};

/// Canonical label for the standard ONNX operator domain.
///
/// ONNX encodes the default domain as an empty string; everything in oxgen
/// normalizes that to this label.
pub const DEFAULT_DOMAIN: &str = "ai.onnx";

/// A static computation graph.
#[derive(Debug, Clone, Default)]
pub struct Graph {
    /// All nodes (operations) in execution order.
    pub nodes: Vec<Node>,

    /// Constant tensors, keyed by tensor name.
    pub initializers: HashMap<String, TensorValue>,

    /// Declared tensor shapes, keyed by tensor name.
    pub value_info: HashMap<String, Vec<Dimension>>,

    /// Names of graph input tensors.
    pub inputs: Vec<String>,

    /// Names of graph output tensors.
    pub outputs: Vec<String>,

    /// Graph metadata.
    pub metadata: GraphMetadata,
}

/// Metadata about the graph.
#[derive(Debug, Clone, Default)]
pub struct GraphMetadata {
    /// Graph name.
    pub name: String,

    /// Opset version imported per domain. The default domain is stored
    /// under [`DEFAULT_DOMAIN`].
    pub opset_imports: HashMap<String, i64>,
}

impl Graph {
    /// Create a new empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node to the graph.
    pub fn add_node(&mut self, node: Node) {
        self.nodes.push(node);
    }

    /// Register a constant tensor.
    pub fn add_initializer(&mut self, name: impl Into<String>, value: TensorValue) {
        self.initializers.insert(name.into(), value);
    }

    /// Declare the shape of a tensor.
    pub fn set_shape(&mut self, name: impl Into<String>, dims: Vec<Dimension>) {
        self.value_info.insert(name.into(), dims);
    }

    /// Opset version imported for `domain`, if any.
    ///
    /// An empty domain is looked up as [`DEFAULT_DOMAIN`].
    pub fn opset_version(&self, domain: &str) -> Option<i64> {
        let domain = if domain.is_empty() {
            DEFAULT_DOMAIN
        } else {
            domain
        };
        self.metadata.opset_imports.get(domain).copied()
    }

    /// Check that every consumed tensor is produced somewhere.
    ///
    /// A node input must be a graph input, an initializer, or the output of
    /// an earlier node. Empty names (absent optional inputs) are skipped.
    pub fn validate(&self) -> Result<()> {
        let mut available: HashSet<&str> = self.inputs.iter().map(String::as_str).collect();
        available.extend(self.initializers.keys().map(String::as_str));

        for node in &self.nodes {
            for input in node.inputs.iter().filter(|i| !i.is_empty()) {
                if !available.contains(input.as_str()) {
                    return Err(OnnxError::MissingTensor(format!(
                        "'{}' consumed by node '{}' ({}) is never produced",
                        input, node.name, node.op_type
                    )));
                }
            }
            available.extend(
                node.outputs
                    .iter()
                    .filter(|o| !o.is_empty())
                    .map(String::as_str),
            );
        }

        for output in &self.outputs {
            if !available.contains(output.as_str()) {
                return Err(OnnxError::InvalidGraph(format!(
                    "graph output '{output}' is never produced"
                )));
            }
        }

        Ok(())
    }
}

/// A node (operation) in the graph.
#[derive(Debug, Clone)]
pub struct Node {
    /// Node name (may be empty).
    pub name: String,

    /// Operation type (e.g., "MatMul", "Add", "ReduceSum").
    pub op_type: String,

    /// Input tensor names. Absent optional inputs are empty strings.
    pub inputs: Vec<String>,

    /// Output tensor names.
    pub outputs: Vec<String>,

    /// Attributes explicitly set on the node.
    pub attributes: HashMap<String, AttributeValue>,

    /// Operator domain. Empty means the default ONNX domain.
    pub domain: String,
}

impl Node {
    /// Create a new node.
    pub fn new(op_type: impl Into<String>) -> Self {
        Self {
            name: String::new(),
            op_type: op_type.into(),
            inputs: Vec::new(),
            outputs: Vec::new(),
            attributes: HashMap::new(),
            domain: String::new(),
        }
    }
}

/// Typed lookup of `name` in an attribute map.
///
/// Works on node attributes as well as on defaults merged with them.
pub fn typed_attr<T>(attributes: &HashMap<String, AttributeValue>, name: &str) -> Result<T>
where
    T: TryFrom<AttributeValue, Error = String>,
{
    let value = attributes
        .get(name)
        .ok_or_else(|| OnnxError::MissingAttribute(name.to_string()))?;

    T::try_from(value.clone()).map_err(|actual| OnnxError::TypeMismatch {
        expected: format!("{} for '{name}'", std::any::type_name::<T>()),
        actual,
    })
}

/// Attribute value types.
///
/// Serializes to the plain value (number, string, list) so attributes can be
/// handed straight to template engines.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Float(f32),
    Int(i64),
    String(String),
    Tensor(TensorValue),
    Floats(Vec<f32>),
    Ints(Vec<i64>),
    Strings(Vec<String>),
}

impl AttributeValue {
    /// Short name of the variant, used in diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            AttributeValue::Float(_) => "float",
            AttributeValue::Int(_) => "int",
            AttributeValue::String(_) => "string",
            AttributeValue::Tensor(_) => "tensor",
            AttributeValue::Floats(_) => "floats",
            AttributeValue::Ints(_) => "ints",
            AttributeValue::Strings(_) => "strings",
        }
    }
}

impl TryFrom<AttributeValue> for f32 {
    type Error = String;

    fn try_from(value: AttributeValue) -> std::result::Result<Self, Self::Error> {
        match value {
            AttributeValue::Float(v) => Ok(v),
            other => Err(format!("Not a float ({})", other.kind())),
        }
    }
}

impl TryFrom<AttributeValue> for i64 {
    type Error = String;

    fn try_from(value: AttributeValue) -> std::result::Result<Self, Self::Error> {
        match value {
            AttributeValue::Int(v) => Ok(v),
            other => Err(format!("Not an int ({})", other.kind())),
        }
    }
}

impl TryFrom<AttributeValue> for Vec<i64> {
    type Error = String;

    fn try_from(value: AttributeValue) -> std::result::Result<Self, Self::Error> {
        match value {
            AttributeValue::Ints(v) => Ok(v),
            other => Err(format!("Not an int array ({})", other.kind())),
        }
    }
}

/// A single declared dimension.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Dimension {
    /// Static dimension with known size.
    Static(usize),

    /// Named symbolic dimension (e.g., "batch", "sequence", "N").
    Named(String),
}
