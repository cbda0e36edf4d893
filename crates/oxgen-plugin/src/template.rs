//! Template-backed generators.

use crate::source::CustomClass;
use minijinja::{Environment, UndefinedBehavior, Value, context};
use oxgen_core::{
    EmitCtx, Error, Extent, Generation, Generator, GeneratorBase, Result, normalize_domain,
};
use std::sync::Arc;

/// Generator rendering a custom class's templates.
pub struct TemplateGenerator {
    base: GeneratorBase,
    class: Arc<CustomClass>,
}

impl TemplateGenerator {
    pub fn new(class: Arc<CustomClass>) -> Self {
        Self {
            base: GeneratorBase::custom(
                class.domain.clone(),
                class.op_type.clone(),
                class.version,
                class.defaults.clone(),
            ),
            class,
        }
    }

    /// Name of the class this generator was declared as.
    pub fn class_name(&self) -> &str {
        &self.class.name
    }

    fn render(&self, env: &Environment<'_>, templates: &[String], context: &Value) -> Result<Vec<String>> {
        let mut lines = Vec::new();
        for template in templates {
            let rendered = env.render_str(template, context).map_err(|e| {
                Error::Template(format!(
                    "{}::{} ({}): {e}",
                    self.domain(),
                    self.op_type(),
                    self.class.name
                ))
            })?;
            lines.extend(
                rendered
                    .lines()
                    .map(str::trim_end)
                    .filter(|line| !line.trim().is_empty())
                    .map(str::to_string),
            );
        }
        Ok(lines)
    }
}

impl Generator for TemplateGenerator {
    fn base(&self) -> &GeneratorBase {
        &self.base
    }

    #[tracing::instrument(skip_all, fields(class = %self.class.name, node = %ctx.node.name))]
    fn generate(&self, ctx: &mut EmitCtx<'_>) -> Result<Generation> {
        let node = ctx.node;
        let attrs = self.merged_attributes(node);

        // Every declared constant must be a present input backed by an initializer.
        let mut values = Vec::with_capacity(self.class.constants.len());
        let mut missing = Vec::new();
        for &index in &self.class.constants {
            match ctx.input(index) {
                Some(name) => match ctx.initializers.get(name) {
                    Some(tensor) => values.push((index, tensor)),
                    None => missing.push(name.to_string()),
                },
                None => missing.push(format!("<input {index}>")),
            }
        }
        if !missing.is_empty() {
            return Err(Error::MissingConstants {
                generator: format!("{}::{}", self.domain(), self.op_type()),
                missing,
            });
        }

        // Aligned with the inputs; `none` where the input is not declared constant.
        let mut constants: Vec<Option<Value>> = vec![None; node.inputs.len()];
        for (index, tensor) in values {
            constants[index] = Some(Value::from_serialize(&tensor.data));
        }

        // Wildcard dims render as `none`; inputs without a declared shape as `none`.
        let shapes: Vec<Option<Vec<Option<usize>>>> = (0..node.inputs.len())
            .map(|index| {
                let dims = ctx.declared_shape(ctx.input(index)?)?;
                Some(dims.iter().map(Extent::as_fixed).collect())
            })
            .collect();

        let (inputs, outputs) = ctx.references(self.class.inplace, None, None);

        let mut env = Environment::new();
        env.set_undefined_behavior(UndefinedBehavior::Strict);
        let context = context! {
            inputs,
            outputs,
            attrs,
            constants,
            shapes,
            node => context! {
                name => node.name,
                op_type => node.op_type,
                domain => normalize_domain(Some(node.domain.as_str())),
            },
        };

        Ok(Generation::new(
            self.render(&env, &self.class.init, &context)?,
            self.render(&env, &self.class.forward, &context)?,
        ))
    }
}
