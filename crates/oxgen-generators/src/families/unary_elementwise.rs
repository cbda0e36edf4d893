//! Unary elementwise generator family.
//!
//! Covers: Abs, Exp, Identity, Neg, Relu, Sigmoid, Sqrt, Tanh

use crate::schemas::builtin_schemas;
use oxgen_core::{EmitCtx, Generation, Generator, GeneratorBase, Result};

/// Unary elementwise generator family.
///
/// All members emit a single `y = f(x)` line and may write their output in
/// place of the input. The only difference is the expression `f`.
pub struct UnaryElementwiseGen {
    base: GeneratorBase,
    expr: fn(&str) -> String,
    inplace: bool,
}

impl UnaryElementwiseGen {
    fn new(name: &'static str, opset: i64, expr: fn(&str) -> String) -> Self {
        Self {
            base: GeneratorBase::from_schema(name, builtin_schemas().resolve(name, opset)),
            expr,
            inplace: true,
        }
    }

    /// Create an Abs generator.
    pub fn abs(opset: i64) -> Self {
        Self::new("Abs", opset, |x| format!("torch.abs({x})"))
    }

    /// Create an Exp generator.
    pub fn exp(opset: i64) -> Self {
        Self::new("Exp", opset, |x| format!("torch.exp({x})"))
    }

    /// Create an Identity generator.
    ///
    /// Identity never aliases; the copy is the point of the node.
    pub fn identity(opset: i64) -> Self {
        Self {
            inplace: false,
            ..Self::new("Identity", opset, |x| x.to_string())
        }
    }

    /// Create a Neg generator.
    pub fn neg(opset: i64) -> Self {
        Self::new("Neg", opset, |x| format!("torch.neg({x})"))
    }

    /// Create a Relu generator.
    pub fn relu(opset: i64) -> Self {
        Self::new("Relu", opset, |x| format!("F.relu({x})"))
    }

    /// Create a Sigmoid generator.
    pub fn sigmoid(opset: i64) -> Self {
        Self::new("Sigmoid", opset, |x| format!("torch.sigmoid({x})"))
    }

    /// Create a Sqrt generator.
    pub fn sqrt(opset: i64) -> Self {
        Self::new("Sqrt", opset, |x| format!("torch.sqrt({x})"))
    }

    /// Create a Tanh generator.
    pub fn tanh(opset: i64) -> Self {
        Self::new("Tanh", opset, |x| format!("torch.tanh({x})"))
    }
}

impl Generator for UnaryElementwiseGen {
    fn base(&self) -> &GeneratorBase {
        &self.base
    }

    fn generate(&self, ctx: &mut EmitCtx<'_>) -> Result<Generation> {
        let (inputs, outputs) = ctx.references(self.inplace, Some(1), Some(1));
        let (Some(x), Some(y)) = (inputs.first(), outputs.first()) else {
            return Err(oxgen_core::Error::Unsupported(format!(
                "{} expects one input and one output",
                self.op_type()
            )));
        };

        Ok(Generation::forward(vec![format!("{y} = {}", (self.expr)(x))]))
    }
}
