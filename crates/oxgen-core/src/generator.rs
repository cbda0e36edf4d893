//! Generator contract.
//!
//! A generator turns one graph node into emitted source fragments. Concrete
//! generators embed a [`GeneratorBase`] carrying their identity (domain,
//! operator, version) and attribute defaults, and implement
//! [`Generator::generate`]. Everything else (attribute merging, constant
//! operand checks) comes from provided trait methods.

use crate::schema::{AttributeDefault, OpSchema};
use crate::{Attributes, EmitCtx, Error, Initializers, Result};
use oxgen_onnx::{DEFAULT_DOMAIN, Node, TensorValue};

/// Source fragments emitted for one node.
///
/// `init` fragments run once when the emitted program is constructed,
/// `forward` fragments run on every invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Generation {
    pub init: Vec<String>,
    pub forward: Vec<String>,
}

impl Generation {
    /// Create a result from both fragment lists.
    pub fn new(init: Vec<String>, forward: Vec<String>) -> Self {
        Self { init, forward }
    }

    /// Create a result with only per-invocation fragments.
    pub fn forward(forward: Vec<String>) -> Self {
        Self {
            init: Vec::new(),
            forward,
        }
    }

    /// Check if nothing was emitted.
    pub fn is_empty(&self) -> bool {
        self.init.is_empty() && self.forward.is_empty()
    }
}

/// Identity and attribute defaults shared by every generator.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratorBase {
    op_type: String,
    domain: String,
    version: i64,
    defaults: Attributes,
}

impl GeneratorBase {
    /// Build the base of a schema-backed generator.
    ///
    /// With a schema, the generator adopts the schema's `since_version` and
    /// every attribute default it declares. An attribute whose default cannot
    /// be extracted is logged and left without a default. Without a schema
    /// the generator has version 1 and no defaults.
    pub fn from_schema(op_type: impl Into<String>, schema: Option<&OpSchema>) -> Self {
        let op_type = op_type.into();
        let mut base = Self {
            op_type,
            domain: DEFAULT_DOMAIN.to_string(),
            version: 1,
            defaults: Attributes::new(),
        };

        let Some(schema) = schema else {
            tracing::debug!(op_type = %base.op_type, "no schema, generator has no attribute defaults");
            return base;
        };

        base.version = schema.since_version;
        for attribute in &schema.attributes {
            match &attribute.default {
                AttributeDefault::Value(value) => {
                    base.defaults.insert(attribute.name.clone(), value.clone());
                }
                AttributeDefault::NoDefault => {
                    tracing::debug!(
                        op_type = %base.op_type,
                        attribute = %attribute.name,
                        "attribute has no default"
                    );
                }
                AttributeDefault::Unrepresentable(kind) => {
                    tracing::warn!(
                        "Cannot get default value for {} of {} ({} default)",
                        attribute.name,
                        base.op_type,
                        kind
                    );
                }
            }
        }

        base
    }

    /// Build the base of a custom generator with explicit defaults.
    pub fn custom(
        domain: impl Into<String>,
        op_type: impl Into<String>,
        version: i64,
        defaults: Attributes,
    ) -> Self {
        Self {
            op_type: op_type.into(),
            domain: domain.into(),
            version,
            defaults,
        }
    }

    /// Attribute defaults.
    pub fn defaults(&self) -> &Attributes {
        &self.defaults
    }
}

/// Trait implemented by every code generator.
///
/// Instances are built fresh for every registry lookup, so implementations
/// never carry state from one node to the next.
///
/// # Example
///
/// ```ignore
/// struct ReluGenerator {
///     base: GeneratorBase,
/// }
///
/// impl Generator for ReluGenerator {
///     fn base(&self) -> &GeneratorBase {
///         &self.base
///     }
///
///     fn generate(&self, ctx: &mut EmitCtx<'_>) -> Result<Generation> {
///         let (inputs, outputs) = ctx.references(true, None, None);
///         Ok(Generation::forward(vec![format!(
///             "{} = F.relu({})",
///             outputs[0], inputs[0]
///         )]))
///     }
/// }
/// ```
pub trait Generator: Send + Sync {
    /// Shared identity and defaults.
    fn base(&self) -> &GeneratorBase;

    /// Emit the source fragments for `ctx.node`.
    fn generate(&self, ctx: &mut EmitCtx<'_>) -> Result<Generation>;

    /// Operator name this generator handles.
    fn op_type(&self) -> &str {
        &self.base().op_type
    }

    /// Operator domain.
    fn domain(&self) -> &str {
        &self.base().domain
    }

    /// Minimum opset version this generator supports.
    fn version(&self) -> i64 {
        self.base().version
    }

    /// Defaults overridden key-by-key by the attributes set on `node`.
    fn merged_attributes(&self, node: &Node) -> Attributes {
        let mut merged = self.base().defaults.clone();
        for (name, value) in &node.attributes {
            merged.insert(name.clone(), value.clone());
        }
        merged
    }

    /// Resolve `(purpose, tensor name)` pairs against the initializers.
    ///
    /// Fails with [`Error::MissingConstants`] listing every name that is not
    /// an initializer.
    fn require_constant_operands<'i>(
        &self,
        targets: &[(&str, &str)],
        initializers: &'i Initializers,
    ) -> Result<Vec<&'i TensorValue>> {
        let mut resolved = Vec::with_capacity(targets.len());
        let mut missing = Vec::new();

        for (_purpose, name) in targets {
            match initializers.get(*name) {
                Some(value) => resolved.push(value),
                None => missing.push(name.to_string()),
            }
        }

        if !missing.is_empty() {
            return Err(Error::MissingConstants {
                generator: format!("{}::{}", self.domain(), self.op_type()),
                missing,
            });
        }
        Ok(resolved)
    }
}

impl Generator for GeneratorBase {
    fn base(&self) -> &GeneratorBase {
        self
    }

    fn generate(&self, _ctx: &mut EmitCtx<'_>) -> Result<Generation> {
        Err(Error::Programming(format!(
            "base generator for '{}' must not be used directly",
            self.op_type
        )))
    }
}
