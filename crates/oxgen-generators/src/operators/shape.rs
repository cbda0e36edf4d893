//! Shape manipulation generators.
//!
//! Covers: Transpose, Reshape, Flatten, Concat

use crate::helpers::{attr_i64, attr_ints, py_list};
use crate::schemas::builtin_schemas;
use oxgen_core::{EmitCtx, Error, Extent, Generation, Generator, GeneratorBase, Result};

fn schema_base(name: &str, opset: i64) -> GeneratorBase {
    GeneratorBase::from_schema(name, builtin_schemas().resolve(name, opset))
}

fn single_io(op: &str, inputs: &[String], outputs: &[String]) -> Result<(String, String)> {
    match (inputs.first(), outputs.first()) {
        (Some(x), Some(y)) => Ok((x.clone(), y.clone())),
        _ => Err(Error::Unsupported(format!(
            "{op} expects a data input and one output"
        ))),
    }
}

/// Transpose with an explicit or reversed permutation.
pub struct TransposeGen {
    base: GeneratorBase,
}

impl TransposeGen {
    pub fn new(opset: i64) -> Self {
        Self {
            base: schema_base("Transpose", opset),
        }
    }
}

impl Generator for TransposeGen {
    fn base(&self) -> &GeneratorBase {
        &self.base
    }

    fn generate(&self, ctx: &mut EmitCtx<'_>) -> Result<Generation> {
        let attrs = self.merged_attributes(ctx.node);
        // Without `perm` ONNX reverses the dimensions.
        let perm = attr_ints(&attrs, "perm")?.or_else(|| {
            ctx.input_rank(0)
                .map(|rank| (0..rank as i64).rev().collect::<Vec<_>>())
        });

        let (inputs, outputs) = ctx.references(false, Some(1), Some(1));
        let (x, y) = single_io("Transpose", &inputs, &outputs)?;

        let line = match perm {
            Some(perm) => format!("{y} = {x}.permute(*{})", py_list(&perm)),
            None => format!("{y} = {x}.permute(*reversed(range({x}.dim())))"),
        };
        Ok(Generation::forward(vec![line]))
    }
}

/// Reshape to a constant target shape.
///
/// Only the form with an initializer `shape` operand is supported.
pub struct ReshapeGen {
    base: GeneratorBase,
}

impl ReshapeGen {
    pub fn new(opset: i64) -> Self {
        Self {
            base: schema_base("Reshape", opset),
        }
    }
}

impl Generator for ReshapeGen {
    fn base(&self) -> &GeneratorBase {
        &self.base
    }

    fn generate(&self, ctx: &mut EmitCtx<'_>) -> Result<Generation> {
        let attrs = self.merged_attributes(ctx.node);
        let allowzero = attrs.contains_key("allowzero") && attr_i64(&attrs, "allowzero")? != 0;

        let shape_name = ctx.input(1).ok_or_else(|| {
            Error::Unsupported("Reshape expects a shape operand as its second input".to_string())
        })?;
        let shape = self.require_constant_operands(&[("shape", shape_name)], ctx.initializers)?[0]
            .to_i64_vec()
            .ok_or_else(|| Error::Attribute(format!("Reshape shape '{shape_name}' must hold integers")))?;
        let declared = ctx
            .input(0)
            .and_then(|name| ctx.declared_shape(name))
            .unwrap_or_default();

        let (inputs, outputs) = ctx.references(false, Some(1), Some(1));
        let (x, y) = single_io("Reshape", &inputs, &outputs)?;

        // A zero copies the input dimension unless `allowzero` is set.
        let dims: Vec<String> = shape
            .iter()
            .enumerate()
            .map(|(i, &d)| match (d, allowzero, declared.get(i)) {
                (0, false, Some(Extent::Fixed(n))) => n.to_string(),
                (0, false, _) => format!("{x}.shape[{i}]"),
                _ => d.to_string(),
            })
            .collect();

        Ok(Generation::forward(vec![format!(
            "{y} = torch.reshape({x}, [{}])",
            dims.join(", ")
        )]))
    }
}

/// Flatten into a 2-D tensor split at `axis`.
pub struct FlattenGen {
    base: GeneratorBase,
}

impl FlattenGen {
    pub fn new(opset: i64) -> Self {
        Self {
            base: schema_base("Flatten", opset),
        }
    }
}

impl Generator for FlattenGen {
    fn base(&self) -> &GeneratorBase {
        &self.base
    }

    fn generate(&self, ctx: &mut EmitCtx<'_>) -> Result<Generation> {
        let attrs = self.merged_attributes(ctx.node);
        let axis = attr_i64(&attrs, "axis")?;

        let (inputs, outputs) = ctx.references(false, Some(1), Some(1));
        let (x, y) = single_io("Flatten", &inputs, &outputs)?;

        let line = if axis == 0 {
            format!("{y} = {x}.reshape(1, -1)")
        } else {
            format!("{y} = {x}.reshape(math.prod({x}.shape[:{axis}]), -1)")
        };
        Ok(Generation::forward(vec![line]))
    }
}

/// Concatenate every input along `axis`.
pub struct ConcatGen {
    base: GeneratorBase,
}

impl ConcatGen {
    pub fn new(opset: i64) -> Self {
        Self {
            base: schema_base("Concat", opset),
        }
    }
}

impl Generator for ConcatGen {
    fn base(&self) -> &GeneratorBase {
        &self.base
    }

    fn generate(&self, ctx: &mut EmitCtx<'_>) -> Result<Generation> {
        let attrs = self.merged_attributes(ctx.node);
        let axis = attr_i64(&attrs, "axis")?;

        let (inputs, outputs) = ctx.references(false, None, Some(1));
        let Some(y) = outputs.first() else {
            return Err(Error::Unsupported("Concat expects one output".to_string()));
        };
        if inputs.is_empty() {
            return Err(Error::Unsupported("Concat expects at least one input".to_string()));
        }

        Ok(Generation::forward(vec![format!(
            "{y} = torch.cat([{}], dim={axis})",
            inputs.join(", ")
        )]))
    }
}
