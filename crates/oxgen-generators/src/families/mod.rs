//! Collapsed generator families that eliminate code duplication.
//!
//! These families group similar operators together, implementing shared logic
//! once and parameterizing only the emitted expression.

pub mod binary_elementwise;
pub mod reduction;
pub mod unary_elementwise;

pub use binary_elementwise::BinaryElementwiseGen;
pub use reduction::ReductionGen;
pub use unary_elementwise::UnaryElementwiseGen;
