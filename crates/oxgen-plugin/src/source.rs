//! Source unit parsing and class validation.

use minijinja::Environment;
use oxgen_core::{Attributes, Error, Result, normalize_domain};
use oxgen_onnx::AttributeValue;
use serde::Deserialize;
use std::collections::BTreeMap;

/// Domain assigned to classes that do not declare one.
///
/// A declared empty domain is the default ONNX domain, not this one.
pub const CUSTOM_DOMAIN: &str = "custom";

/// A parsed source unit.
///
/// Classes are keyed by class name; iteration order is by name.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SourceUnit {
    #[serde(default)]
    pub generators: BTreeMap<String, ClassDecl>,
}

/// One `[generators.<ClassName>]` table, as written.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClassDecl {
    pub domain: Option<String>,
    pub op_type: Option<String>,
    pub version: Option<i64>,

    /// Shared declarations other classes are not derived from; never registered.
    #[serde(default, rename = "abstract")]
    pub is_abstract: bool,

    #[serde(default)]
    pub defaults: toml::Table,

    /// Indices of inputs that must be initializers.
    #[serde(default)]
    pub constants: Vec<usize>,

    /// Write the first output in place of the first input when possible.
    #[serde(default)]
    pub inplace: bool,

    #[serde(default)]
    pub init: Vec<String>,

    #[serde(default)]
    pub forward: Vec<String>,
}

/// A validated class, ready to back a generator pack.
#[derive(Debug, Clone)]
pub struct CustomClass {
    pub name: String,
    pub domain: String,
    pub op_type: String,
    pub version: i64,
    pub defaults: Attributes,
    pub constants: Vec<usize>,
    pub inplace: bool,
    pub init: Vec<String>,
    pub forward: Vec<String>,
}

impl SourceUnit {
    /// Parse a unit from TOML text.
    pub fn parse(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| Error::Validation(format!("invalid source unit: {e}")))
    }

    /// Validate every qualifying class.
    ///
    /// Abstract classes and classes without templates are skipped. Fails on
    /// the first class with a broken template, so callers register either
    /// all classes or none.
    pub fn classes(&self) -> Result<Vec<CustomClass>> {
        let env = Environment::new();
        let mut classes = Vec::new();

        for (name, decl) in &self.generators {
            if decl.is_abstract {
                tracing::debug!(class = %name, "skipping abstract class");
                continue;
            }
            if decl.init.is_empty() && decl.forward.is_empty() {
                tracing::debug!(class = %name, "skipping class without templates");
                continue;
            }

            for template in decl.init.iter().chain(&decl.forward) {
                env.template_from_str(template).map_err(|e| {
                    Error::Validation(format!("class '{name}' has a broken template: {e}"))
                })?;
            }

            if let Some(version) = decl.version
                && version < 1
            {
                return Err(Error::Validation(format!(
                    "class '{name}' declares version {version}, versions start at 1"
                )));
            }

            classes.push(CustomClass {
                name: name.clone(),
                domain: match decl.domain.as_deref() {
                    None => CUSTOM_DOMAIN.to_string(),
                    Some(domain) => normalize_domain(Some(domain)).to_string(),
                },
                op_type: decl.op_type.clone().unwrap_or_else(|| name.clone()),
                version: decl.version.unwrap_or(1),
                defaults: attribute_defaults(name, &decl.defaults),
                constants: decl.constants.clone(),
                inplace: decl.inplace,
                init: decl.init.clone(),
                forward: decl.forward.clone(),
            });
        }

        Ok(classes)
    }
}

/// Convert a `defaults` table, dropping values with no attribute form.
fn attribute_defaults(class: &str, table: &toml::Table) -> Attributes {
    let mut defaults = Attributes::new();
    for (key, value) in table {
        match to_attribute(value) {
            Some(attribute) => {
                defaults.insert(key.clone(), attribute);
            }
            None => {
                tracing::warn!(
                    "Cannot get default value for {} of {} ({} default)",
                    key,
                    class,
                    value.type_str()
                );
            }
        }
    }
    defaults
}

fn to_attribute(value: &toml::Value) -> Option<AttributeValue> {
    use toml::Value;

    match value {
        Value::Integer(v) => Some(AttributeValue::Int(*v)),
        Value::Float(v) => Some(AttributeValue::Float(*v as f32)),
        Value::Boolean(v) => Some(AttributeValue::Int(i64::from(*v))),
        Value::String(v) => Some(AttributeValue::String(v.clone())),
        Value::Array(items) => {
            if items.iter().all(Value::is_integer) {
                Some(AttributeValue::Ints(
                    items.iter().filter_map(Value::as_integer).collect(),
                ))
            } else if items.iter().all(|v| v.is_float() || v.is_integer()) {
                Some(AttributeValue::Floats(
                    items
                        .iter()
                        .filter_map(|v| v.as_float().or_else(|| v.as_integer().map(|i| i as f64)))
                        .map(|v| v as f32)
                        .collect(),
                ))
            } else if items.iter().all(Value::is_str) {
                Some(AttributeValue::Strings(
                    items
                        .iter()
                        .filter_map(Value::as_str)
                        .map(str::to_string)
                        .collect(),
                ))
            } else {
                None
            }
        }
        Value::Datetime(_) | Value::Table(_) => None,
    }
}
