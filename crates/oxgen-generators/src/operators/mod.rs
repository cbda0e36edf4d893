//! Individual generators that don't fit into families.

pub mod gemm;
pub mod shape;
pub mod softmax;

pub use gemm::GemmGen;
pub use shape::{ConcatGen, FlattenGen, ReshapeGen, TransposeGen};
pub use softmax::SoftmaxGen;
