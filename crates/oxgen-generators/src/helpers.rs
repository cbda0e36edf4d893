//! Helper functions for generator implementation.

use oxgen_core::{Attributes, Result};
use oxgen_onnx::{AttributeValue, Node, TensorData, typed_attr};

/// Render an attribute value as a Python literal.
pub fn py_literal(value: &AttributeValue) -> String {
    match value {
        AttributeValue::Float(v) => py_float(*v),
        AttributeValue::Int(v) => v.to_string(),
        AttributeValue::String(v) => py_str(v),
        AttributeValue::Tensor(t) => match &t.data {
            TensorData::F32(v) => py_seq(v.iter().map(|x| py_float(*x))),
            TensorData::I64(v) => py_seq(v.iter().map(i64::to_string)),
            TensorData::I32(v) => py_seq(v.iter().map(i32::to_string)),
            TensorData::U8(v) => py_seq(v.iter().map(u8::to_string)),
            TensorData::Bool(v) => py_seq(v.iter().map(|b| py_bool(*b).to_string())),
        },
        AttributeValue::Floats(v) => py_seq(v.iter().map(|x| py_float(*x))),
        AttributeValue::Ints(v) => py_list(v),
        AttributeValue::Strings(v) => py_seq(v.iter().map(|s| py_str(s))),
    }
}

/// Render integers as a Python list.
pub fn py_list(values: &[i64]) -> String {
    py_seq(values.iter().map(i64::to_string))
}

/// Python boolean literal.
pub fn py_bool(value: bool) -> &'static str {
    if value { "True" } else { "False" }
}

fn py_float(value: f32) -> String {
    if value.is_nan() {
        "float('nan')".to_string()
    } else if value.is_infinite() {
        if value > 0.0 {
            "float('inf')".to_string()
        } else {
            "float('-inf')".to_string()
        }
    } else {
        format!("{value:?}")
    }
}

fn py_str(value: &str) -> String {
    format!("'{}'", value.replace('\\', "\\\\").replace('\'', "\\'"))
}

fn py_seq(items: impl Iterator<Item = String>) -> String {
    format!("[{}]", items.collect::<Vec<_>>().join(", "))
}

/// Render keyword parameters as the body of a Python dict literal.
///
/// Values are already rendered expressions.
///
/// ```text
/// [("in_features", "4"), ("bias", "True")] -> 'in_features': 4, 'bias': True
/// ```
pub fn params_str(params: &[(&str, String)]) -> String {
    params
        .iter()
        .map(|(key, value)| format!("'{key}': {value}"))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Attribute name of the `nn.Module` emitted for `node`.
///
/// Uses the node name, falling back to its first output.
pub fn module_name(node: &Node) -> String {
    let raw = if node.name.is_empty() {
        node.outputs.first().map(String::as_str).unwrap_or_default()
    } else {
        node.name.as_str()
    };
    let sanitized: String = raw
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    format!("n_{}_{}", node.op_type, sanitized)
}

/// Get an int attribute from merged attributes.
pub fn attr_i64(attrs: &Attributes, name: &str) -> Result<i64> {
    Ok(typed_attr(attrs, name)?)
}

/// Get an optional ints attribute from merged attributes.
pub fn attr_ints(attrs: &Attributes, name: &str) -> Result<Option<Vec<i64>>> {
    if !attrs.contains_key(name) {
        return Ok(None);
    }
    Ok(Some(typed_attr(attrs, name)?))
}

/// Get a float attribute from merged attributes.
pub fn attr_f32(attrs: &Attributes, name: &str) -> Result<f32> {
    Ok(typed_attr(attrs, name)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use oxgen_core::Error;
    use oxgen_onnx::OnnxError;

    #[test]
    fn test_py_literal() {
        assert_eq!(py_literal(&AttributeValue::Int(-1)), "-1");
        assert_eq!(py_literal(&AttributeValue::Float(1.0)), "1.0");
        assert_eq!(py_literal(&AttributeValue::Float(f32::NEG_INFINITY)), "float('-inf')");
        assert_eq!(py_literal(&AttributeValue::Ints(vec![0, 2])), "[0, 2]");
        assert_eq!(
            py_literal(&AttributeValue::String("it's".to_string())),
            "'it\\'s'"
        );
        assert_eq!(
            py_literal(&AttributeValue::Strings(vec!["a".into(), "b".into()])),
            "['a', 'b']"
        );
    }

    #[test]
    fn test_params_str() {
        let params = [("in_features", "4".to_string()), ("bias", "True".to_string())];
        assert_eq!(params_str(&params), "'in_features': 4, 'bias': True");
    }

    #[test]
    fn test_module_name() {
        let mut node = Node::new("Gemm");
        node.name = "/fc1/Gemm".to_string();
        assert_eq!(module_name(&node), "n_Gemm__fc1_Gemm");

        let mut node = Node::new("Gemm");
        node.outputs = vec!["logits".to_string()];
        assert_eq!(module_name(&node), "n_Gemm_logits");
    }

    #[test]
    fn test_attr_accessors() {
        let mut attrs = Attributes::new();
        attrs.insert("axis".to_string(), AttributeValue::Int(1));
        attrs.insert("alpha".to_string(), AttributeValue::Float(0.5));

        attrs.insert("perm".to_string(), AttributeValue::Ints(vec![1, 0]));

        assert_eq!(attr_i64(&attrs, "axis").unwrap(), 1);
        assert_eq!(attr_f32(&attrs, "alpha").unwrap(), 0.5);
        assert_eq!(attr_ints(&attrs, "perm").unwrap(), Some(vec![1, 0]));
        assert_eq!(attr_ints(&attrs, "pads").unwrap(), None);
    }

    #[test]
    fn test_attr_errors_carry_onnx_variants() {
        let mut attrs = Attributes::new();
        attrs.insert("alpha".to_string(), AttributeValue::Float(0.5));

        let err = attr_i64(&attrs, "alpha").unwrap_err();
        assert!(matches!(
            err,
            Error::Onnx(OnnxError::TypeMismatch { expected, actual })
                if expected.contains("'alpha'") && actual.contains("float")
        ));

        let err = attr_f32(&attrs, "beta").unwrap_err();
        assert!(matches!(err, Error::Onnx(OnnxError::MissingAttribute(name)) if name == "beta"));

        let err = attr_ints(&attrs, "alpha").unwrap_err();
        assert!(matches!(err, Error::Onnx(OnnxError::TypeMismatch { .. })));
    }
}
