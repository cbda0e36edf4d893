//! Softmax generator.

use crate::helpers::attr_i64;
use crate::schemas::builtin_schemas;
use oxgen_core::{EmitCtx, Error, Generation, Generator, GeneratorBase, Result};

/// Softmax along `axis`.
///
/// The default axis follows the resolved schema (1 before opset 13, -1
/// after).
pub struct SoftmaxGen {
    base: GeneratorBase,
}

impl SoftmaxGen {
    pub fn new(opset: i64) -> Self {
        Self {
            base: GeneratorBase::from_schema("Softmax", builtin_schemas().resolve("Softmax", opset)),
        }
    }
}

impl Generator for SoftmaxGen {
    fn base(&self) -> &GeneratorBase {
        &self.base
    }

    fn generate(&self, ctx: &mut EmitCtx<'_>) -> Result<Generation> {
        let attrs = self.merged_attributes(ctx.node);
        let axis = attr_i64(&attrs, "axis")?;

        let (inputs, outputs) = ctx.references(false, Some(1), Some(1));
        let (Some(x), Some(y)) = (inputs.first(), outputs.first()) else {
            return Err(Error::Unsupported(
                "Softmax expects one input and one output".to_string(),
            ));
        };

        Ok(Generation::forward(vec![format!(
            "{y} = F.softmax({x}, dim={axis})"
        )]))
    }
}
