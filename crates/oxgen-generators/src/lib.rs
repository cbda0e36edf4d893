//! Builtin ONNX code generators for oxgen.
//!
//! This crate provides the standard operator catalogue, emitting
//! PyTorch-flavoured Python fragments. Similar operators are collapsed into
//! families that share one implementation.
//!
//! # Operator Families
//!
//! - **Unary elementwise**: Abs, Exp, Identity, Neg, Relu, Sigmoid, Sqrt, Tanh
//! - **Binary elementwise**: Add, Sub, Mul, Div, Pow
//! - **Reduction**: ReduceSum, ReduceMean, ReduceMax, ReduceMin
//!
//! # Individual Operators
//!
//! - Activation (Softmax)
//! - Shape manipulation (Transpose, Reshape, Flatten, Concat)
//! - Linear algebra (Gemm)

pub mod families;
pub mod operators;
pub mod schemas;

mod helpers;
mod registry;

pub use families::{BinaryElementwiseGen, ReductionGen, UnaryElementwiseGen};
pub use registry::{BUILTIN_OPERATORS, BUILTIN_OPSET, builtin_registry, register_builtins};
pub use schemas::builtin_schemas;
