//! Core abstractions for oxgen.
//!
//! This crate provides the pieces every code generator and every caller
//! depends on:
//! - The generator contract (`Generator`, `GeneratorBase`, `Generation`)
//! - The per-node emit context with reference and alias resolution (`EmitCtx`)
//! - The tensor usage ledger (`UsageLedger`, `TensorLedger`)
//! - Operator schemas for attribute defaults (`OpSchema`, `SchemaSet`)
//! - The versioned generator registry (`GeneratorRegistry`)

pub mod emit_ctx;
pub mod generator;
pub mod ledger;
pub mod registry;
pub mod schema;

use oxgen_onnx::{AttributeValue, Dimension, TensorValue};
use std::collections::HashMap;

// Re-export commonly used types
pub use emit_ctx::{EmitCtx, Extent};
pub use generator::{Generation, Generator, GeneratorBase};
pub use ledger::{TensorLedger, UsageLedger};
pub use registry::{GeneratorPack, GeneratorRegistry, normalize_domain};
pub use schema::{AttributeDefault, OpSchema, SchemaAttribute, SchemaSet};

/// Constant tensors of a graph, keyed by tensor name.
pub type Initializers = HashMap<String, TensorValue>;

/// Declared tensor shapes, keyed by tensor name.
pub type ShapeInfo = HashMap<String, Vec<Dimension>>;

/// Attribute mapping of a node or a generator's defaults.
pub type Attributes = HashMap<String, AttributeValue>;

/// Result type using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for oxgen-core operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("{generator} only supports constant operands, missing from initializers: {missing:?}")]
    MissingConstants {
        generator: String,
        missing: Vec<String>,
    },

    #[error("Unsupported operation: {0}")]
    Unsupported(String),

    #[error("Programming error: {0}")]
    Programming(String),

    #[error("Attribute error: {0}")]
    Attribute(String),

    #[error("Shape error: {0}")]
    Shape(String),

    #[error("Template error: {0}")]
    Template(String),

    #[error(transparent)]
    Onnx(#[from] oxgen_onnx::OnnxError),
}
