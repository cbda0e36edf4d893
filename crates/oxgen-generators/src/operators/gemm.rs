//! Gemm generator.

use crate::helpers::{attr_f32, attr_i64, module_name, params_str, py_bool, py_literal};
use crate::schemas::builtin_schemas;
use oxgen_core::{EmitCtx, Error, Generation, Generator, GeneratorBase, Result};
use oxgen_onnx::AttributeValue;

/// General matrix multiply lowered to an `nn.Linear` module.
///
/// `Y = alpha * A' * B' + beta * C` where `B` (and `C` when present) must be
/// initializers. The weight and bias are copied from the program's constant
/// table at construction time, with `alpha` and `beta` folded in.
pub struct GemmGen {
    base: GeneratorBase,
}

impl GemmGen {
    pub fn new(opset: i64) -> Self {
        Self {
            base: GeneratorBase::from_schema("Gemm", builtin_schemas().resolve("Gemm", opset)),
        }
    }
}

fn scaled(expr: String, factor: f32) -> String {
    if factor == 1.0 {
        expr
    } else {
        format!("{expr} * {}", py_literal(&AttributeValue::Float(factor)))
    }
}

impl Generator for GemmGen {
    fn base(&self) -> &GeneratorBase {
        &self.base
    }

    fn generate(&self, ctx: &mut EmitCtx<'_>) -> Result<Generation> {
        let attrs = self.merged_attributes(ctx.node);
        let alpha = attr_f32(&attrs, "alpha")?;
        let beta = attr_f32(&attrs, "beta")?;
        let trans_a = attr_i64(&attrs, "transA")? != 0;
        let trans_b = attr_i64(&attrs, "transB")? != 0;

        let mut targets = Vec::with_capacity(2);
        match ctx.input(1) {
            Some(name) => targets.push(("weight", name)),
            None => {
                return Err(Error::Unsupported(
                    "Gemm expects at least two inputs".to_string(),
                ));
            }
        }
        if let Some(name) = ctx.input(2) {
            targets.push(("bias", name));
        }
        let constants = self.require_constant_operands(&targets, ctx.initializers)?;

        let weight = constants[0];
        let &[rows, cols] = weight.shape.as_slice() else {
            return Err(Error::Shape(format!(
                "Gemm weight '{}' must be 2-D, got shape {:?}",
                targets[0].1, weight.shape
            )));
        };
        // nn.Linear stores its weight as (out_features, in_features).
        let (in_features, out_features) = if trans_b { (cols, rows) } else { (rows, cols) };

        let bias_len = constants.get(1).map(|bias| bias.len());
        if let Some(len) = bias_len.filter(|&len| len != out_features && len != 1) {
            return Err(Error::Shape(format!(
                "Gemm bias '{}' with {len} elements cannot broadcast to {out_features} features",
                targets[1].1
            )));
        }

        let module = module_name(ctx.node);
        let (inputs, outputs) = ctx.references(false, Some(3), Some(1));
        let (Some(a), Some(b), Some(y)) = (inputs.first(), inputs.get(1), outputs.first()) else {
            return Err(Error::Unsupported(
                "Gemm expects two inputs and one output".to_string(),
            ));
        };

        let params = [
            ("in_features", in_features.to_string()),
            ("out_features", out_features.to_string()),
            ("bias", py_bool(bias_len.is_some()).to_string()),
        ];
        let weight_expr = if trans_b { b.clone() } else { format!("{b}.t()") };
        let mut init = vec![
            format!("self.{module} = nn.Linear(**{{{}}})", params_str(&params)),
            format!(
                "self.{module}.weight.data = {}",
                scaled(weight_expr, alpha)
            ),
        ];
        if let (Some(c), Some(len)) = (inputs.get(2), bias_len) {
            let bias_expr = if len == out_features {
                format!("{c}.reshape(-1)")
            } else {
                format!("{c}.reshape(-1).expand({out_features}).clone()")
            };
            init.push(format!("self.{module}.bias.data = {}", scaled(bias_expr, beta)));
        }

        let operand = if trans_a { format!("{a}.t()") } else { a.clone() };
        Ok(Generation::new(
            init,
            vec![format!("{y} = self.{module}({operand})")],
        ))
    }
}
