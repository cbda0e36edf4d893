//! Binary elementwise generator family.
//!
//! Covers: Add, Sub, Mul, Div, Pow

use crate::schemas::builtin_schemas;
use oxgen_core::{EmitCtx, Error, Generation, Generator, GeneratorBase, Result};

/// Binary elementwise generator family.
///
/// All members emit `c = torch.<fn>(a, b)` with NumPy-style broadcasting
/// left to torch. The output may reuse the first input's storage.
pub struct BinaryElementwiseGen {
    base: GeneratorBase,
    function: &'static str,
}

impl BinaryElementwiseGen {
    fn new(name: &'static str, opset: i64, function: &'static str) -> Self {
        Self {
            base: GeneratorBase::from_schema(name, builtin_schemas().resolve(name, opset)),
            function,
        }
    }

    /// Create an Add generator.
    pub fn add(opset: i64) -> Self {
        Self::new("Add", opset, "torch.add")
    }

    /// Create a Sub generator.
    pub fn sub(opset: i64) -> Self {
        Self::new("Sub", opset, "torch.sub")
    }

    /// Create a Mul generator.
    pub fn mul(opset: i64) -> Self {
        Self::new("Mul", opset, "torch.mul")
    }

    /// Create a Div generator.
    pub fn div(opset: i64) -> Self {
        Self::new("Div", opset, "torch.div")
    }

    /// Create a Pow generator.
    pub fn pow(opset: i64) -> Self {
        Self::new("Pow", opset, "torch.pow")
    }
}

impl Generator for BinaryElementwiseGen {
    fn base(&self) -> &GeneratorBase {
        &self.base
    }

    fn generate(&self, ctx: &mut EmitCtx<'_>) -> Result<Generation> {
        let (inputs, outputs) = ctx.references(true, Some(2), Some(1));
        let ([a, b], [c]) = (inputs.as_slice(), outputs.as_slice()) else {
            return Err(Error::Unsupported(format!(
                "{} expects two inputs and one output, got {} and {}",
                self.op_type(),
                inputs.len(),
                outputs.len()
            )));
        };

        Ok(Generation::forward(vec![format!(
            "{c} = {}({a}, {b})",
            self.function
        )]))
    }
}
