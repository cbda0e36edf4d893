//! Custom code generators loaded from declarative source units.
//!
//! A source unit is a TOML file declaring any number of generator classes
//! under `[generators.<ClassName>]`. Each class carries optional metadata and
//! minijinja templates for the fragments it emits:
//!
//! ```toml
//! [generators.FooGen]
//! op_type = "Foo"          # default: the class name
//! domain = "custom"        # default: "custom"
//! version = 2              # default: 1
//! inplace = true           # request in-place output, default: false
//! constants = [1]          # input indices that must be initializers
//! init = ["self.{{ node.name }}_scale = {{ constants[1][0] }}"]
//! forward = ["{{ outputs[0] }} = {{ inputs[0] }} * {{ attrs.alpha }}"]
//!
//! [generators.FooGen.defaults]
//! alpha = 0.5
//!
//! [generators.Shared]
//! abstract = true          # never registered
//! ```
//!
//! A class qualifies when it is not abstract and declares at least one
//! `init` or `forward` template. Templates render with these variables:
//!
//! | variable    | content |
//! |-------------|---------|
//! | `inputs`    | input references (canonical names, `self._vars[...]` for initializers, `None` for absent inputs) |
//! | `outputs`   | output references, the first possibly aliased to the first input |
//! | `attrs`     | class defaults overridden by the node's attributes |
//! | `constants` | per input: the initializer's values for declared constants, `none` otherwise |
//! | `shapes`    | per input: declared dims (`none` for symbolic dims), or `none` |
//! | `node`      | `name`, `op_type`, `domain` |
//!
//! Undefined variables are render errors. Each rendered template may produce
//! several lines; blank lines are dropped.
//!
//! ```ignore
//! use oxgen_plugin::RegistryExt;
//!
//! let mut registry = oxgen_generators::builtin_registry();
//! let count = registry.register_from_source("plugins/activations.toml")?;
//! ```

pub mod source;
pub mod template;

use oxgen_core::{Error, GeneratorPack, GeneratorRegistry, Result};
use std::path::Path;
use std::sync::Arc;

pub use source::{CUSTOM_DOMAIN, ClassDecl, CustomClass, SourceUnit};
pub use template::TemplateGenerator;

/// File extension of source units.
pub const SOURCE_EXTENSION: &str = "toml";

/// Load every qualifying class from the source unit at `path`.
///
/// The unit is validated completely before anything is registered, so on
/// error the registry is unchanged. Returns the number of classes
/// registered.
#[tracing::instrument(skip_all, fields(path = %path.as_ref().display()))]
pub fn load_from_source(registry: &mut GeneratorRegistry, path: impl AsRef<Path>) -> Result<usize> {
    let path = path.as_ref();
    validate_path(path)?;

    let with_path = |e: Error| match e {
        Error::Validation(msg) => Error::Validation(format!("'{}': {msg}", path.display())),
        other => other,
    };
    let text = std::fs::read_to_string(path)
        .map_err(|e| Error::Validation(format!("cannot read '{}': {e}", path.display())))?;
    let classes = SourceUnit::parse(&text)
        .and_then(|unit| unit.classes())
        .map_err(with_path)?;

    let label = path.display().to_string();
    for class in &classes {
        tracing::debug!(
            class = %class.name,
            domain = %class.domain,
            op_type = %class.op_type,
            version = class.version,
            "registering custom generator"
        );
        let shared = Arc::new(class.clone());
        registry.register(
            Some(class.domain.as_str()),
            &class.op_type,
            GeneratorPack::new(class.version, label.clone(), move || {
                Box::new(TemplateGenerator::new(Arc::clone(&shared)))
            }),
        );
    }

    tracing::info!("Loaded {} custom code generators from {}.", classes.len(), label);
    Ok(classes.len())
}

fn validate_path(path: &Path) -> Result<()> {
    if !path.exists() {
        return Err(Error::Validation(format!(
            "'{}' does not exist",
            path.display()
        )));
    }
    if !path.is_file() {
        return Err(Error::Validation(format!(
            "'{}' is not a regular file",
            path.display()
        )));
    }
    if path.extension().and_then(|ext| ext.to_str()) != Some(SOURCE_EXTENSION) {
        return Err(Error::Validation(format!(
            "'{}' does not have the .{SOURCE_EXTENSION} extension",
            path.display()
        )));
    }
    Ok(())
}

/// Source loading as a registry method.
pub trait RegistryExt {
    /// See [`load_from_source`].
    fn register_from_source(&mut self, path: impl AsRef<Path>) -> Result<usize>;
}

impl RegistryExt for GeneratorRegistry {
    fn register_from_source(&mut self, path: impl AsRef<Path>) -> Result<usize> {
        load_from_source(self, path)
    }
}
