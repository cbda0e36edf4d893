//! Reduction generator family.
//!
//! Covers: ReduceSum, ReduceMean, ReduceMax, ReduceMin

use crate::helpers::{attr_i64, attr_ints, py_bool, py_list};
use crate::schemas::builtin_schemas;
use oxgen_core::{Attributes, EmitCtx, Error, Generation, Generator, GeneratorBase, Result};

/// Axis set a reduction runs over.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReductionAxes {
    /// Explicit axes, known at generation time.
    Static(Vec<i64>),

    /// Every axis of an input whose rank is only known at run time.
    AllAtRuntime,
}

/// Reduction generator family.
///
/// All members share axis resolution and `keepdims` handling; only the torch
/// function differs. The function must accept a tuple of dims.
pub struct ReductionGen {
    base: GeneratorBase,
    function: &'static str,
}

impl ReductionGen {
    fn new(name: &'static str, opset: i64, function: &'static str) -> Self {
        Self {
            base: GeneratorBase::from_schema(name, builtin_schemas().resolve(name, opset)),
            function,
        }
    }

    /// Create a ReduceSum generator.
    pub fn reduce_sum(opset: i64) -> Self {
        Self::new("ReduceSum", opset, "torch.sum")
    }

    /// Create a ReduceMean generator.
    pub fn reduce_mean(opset: i64) -> Self {
        Self::new("ReduceMean", opset, "torch.mean")
    }

    /// Create a ReduceMax generator.
    pub fn reduce_max(opset: i64) -> Self {
        Self::new("ReduceMax", opset, "torch.amax")
    }

    /// Create a ReduceMin generator.
    pub fn reduce_min(opset: i64) -> Self {
        Self::new("ReduceMin", opset, "torch.amin")
    }

    /// Resolve the axes to reduce over.
    ///
    /// 1. An explicit `axes` attribute is used verbatim.
    /// 2. Otherwise every axis of the input's declared rank.
    /// 3. A second input (opset 13+/18+ form) overrides the default and must
    ///    be an initializer; dynamic axes are not supported.
    pub fn resolve_axes(&self, attrs: &Attributes, ctx: &EmitCtx<'_>) -> Result<ReductionAxes> {
        if let Some(axes) = attr_ints(attrs, "axes")? {
            return Ok(ReductionAxes::Static(axes));
        }

        if let Some(axes_input) = ctx.input(1) {
            let values = self.require_constant_operands(&[("axes", axes_input)], ctx.initializers)?;
            let axes = values[0].to_i64_vec().ok_or_else(|| {
                Error::Attribute(format!(
                    "{} axes input '{axes_input}' must hold integers",
                    self.op_type()
                ))
            })?;
            return Ok(ReductionAxes::Static(axes));
        }

        Ok(match ctx.input_rank(0) {
            Some(rank) => ReductionAxes::Static((0..rank as i64).collect()),
            None => ReductionAxes::AllAtRuntime,
        })
    }
}

impl Generator for ReductionGen {
    fn base(&self) -> &GeneratorBase {
        &self.base
    }

    fn generate(&self, ctx: &mut EmitCtx<'_>) -> Result<Generation> {
        let attrs = self.merged_attributes(ctx.node);
        let axes = self.resolve_axes(&attrs, ctx)?;
        let keepdims = attrs.contains_key("keepdims") && attr_i64(&attrs, "keepdims")? != 0;
        let noop_with_empty_axes =
            attrs.contains_key("noop_with_empty_axes") && attr_i64(&attrs, "noop_with_empty_axes")? != 0;

        let (inputs, outputs) = ctx.references(false, Some(1), Some(1));
        let (Some(x), Some(y)) = (inputs.first(), outputs.first()) else {
            return Err(Error::Unsupported(format!(
                "{} expects one data input and one output",
                self.op_type()
            )));
        };

        let dims = match axes {
            ReductionAxes::Static(axes) if axes.is_empty() && noop_with_empty_axes => {
                return Ok(Generation::forward(vec![format!("{y} = {x}")]));
            }
            ReductionAxes::Static(axes) if axes.is_empty() => format!("tuple(range({x}.dim()))"),
            ReductionAxes::Static(axes) => py_list(&axes),
            ReductionAxes::AllAtRuntime => format!("tuple(range({x}.dim()))"),
        };

        Ok(Generation::forward(vec![format!(
            "{y} = {}({x}, dim={dims}, keepdim={})",
            self.function,
            py_bool(keepdims)
        )]))
    }
}
