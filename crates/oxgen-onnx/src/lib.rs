//! ONNX graph data model for oxgen.
//!
//! This crate holds the structured, read-only view of an ONNX graph that the
//! code generators consume: nodes with their attributes, the initializer
//! (constant tensor) table and declared tensor shapes. Loading the protobuf
//! itself happens elsewhere; callers build a [`Graph`] from whatever loader
//! they use.
//!
//! # Example
//!
//! ```
//! use oxgen_onnx::{AttributeValue, Graph, Node};
//!
//! let mut graph = Graph::new();
//! let mut node = Node::new("Softmax");
//! node.inputs = vec!["logits".to_string()];
//! node.outputs = vec!["probs".to_string()];
//! node.attributes.insert("axis".to_string(), AttributeValue::Int(-1));
//! graph.add_node(node);
//!
//! assert_eq!(graph.nodes.len(), 1);
//! ```

use thiserror::Error;

pub mod graph;
pub mod tensor;

pub use graph::{AttributeValue, DEFAULT_DOMAIN, Dimension, Graph, GraphMetadata, Node, typed_attr};
pub use tensor::{DataType, TensorData, TensorValue};

/// Errors raised while reading graph data.
#[derive(Debug, Error)]
pub enum OnnxError {
    #[error("Invalid graph structure: {0}")]
    InvalidGraph(String),

    #[error("Missing tensor: {0}")]
    MissingTensor(String),

    #[error("Missing attribute: {0}")]
    MissingAttribute(String),

    #[error("Type mismatch: expected {expected}, got {actual}")]
    TypeMismatch { expected: String, actual: String },
}

/// Result type for graph operations.
pub type Result<T> = std::result::Result<T, OnnxError>;
