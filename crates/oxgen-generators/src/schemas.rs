//! Schema table for the builtin catalogue.
//!
//! Since-versions and attribute defaults follow the ONNX operator changelog.
//! Only operators in the builtin catalogue are listed.

use oxgen_core::{OpSchema, SchemaSet};
use oxgen_onnx::AttributeValue;
use std::sync::LazyLock;

static SCHEMAS: LazyLock<SchemaSet> = LazyLock::new(build);

/// Schemas of every builtin operator, across versions.
pub fn builtin_schemas() -> &'static SchemaSet {
    &SCHEMAS
}

fn build() -> SchemaSet {
    let mut set = SchemaSet::new();

    for (name, versions) in [
        ("Abs", &[1, 6, 13][..]),
        ("Exp", &[1, 6, 13][..]),
        ("Neg", &[1, 6, 13][..]),
        ("Relu", &[1, 6, 13, 14][..]),
        ("Sigmoid", &[1, 6, 13][..]),
        ("Sqrt", &[1, 6, 13][..]),
        ("Tanh", &[1, 6, 13][..]),
        ("Identity", &[1, 13, 14, 16][..]),
        ("Add", &[1, 6, 7, 13, 14][..]),
        ("Sub", &[1, 6, 7, 13, 14][..]),
        ("Mul", &[1, 6, 7, 13, 14][..]),
        ("Div", &[1, 6, 7, 13, 14][..]),
        ("Pow", &[1, 7, 12, 13, 15][..]),
    ] {
        for &version in versions {
            set.insert(OpSchema::new(name, version));
        }
    }

    // ReduceSum moved `axes` to an input at 13, the others at 18.
    for version in [1, 11] {
        set.insert(reduce_with_axes_attr("ReduceSum", version));
    }
    set.insert(reduce_with_axes_input("ReduceSum", 13));
    for name in ["ReduceMean", "ReduceMax", "ReduceMin"] {
        for version in [1, 11, 13] {
            set.insert(reduce_with_axes_attr(name, version));
        }
        set.insert(reduce_with_axes_input(name, 18));
    }

    for version in [1, 11] {
        set.insert(OpSchema::new("Softmax", version).attr("axis", AttributeValue::Int(1)));
    }
    set.insert(OpSchema::new("Softmax", 13).attr("axis", AttributeValue::Int(-1)));

    for version in [1, 13] {
        set.insert(OpSchema::new("Transpose", version).no_default("perm"));
    }

    set.insert(OpSchema::new("Reshape", 5));
    set.insert(OpSchema::new("Reshape", 13));
    set.insert(OpSchema::new("Reshape", 14).attr("allowzero", AttributeValue::Int(0)));

    for version in [1, 9, 11, 13] {
        set.insert(OpSchema::new("Flatten", version).attr("axis", AttributeValue::Int(1)));
    }

    for version in [4, 11, 13] {
        set.insert(OpSchema::new("Concat", version).no_default("axis"));
    }

    for version in [7, 9, 11, 13] {
        set.insert(
            OpSchema::new("Gemm", version)
                .attr("alpha", AttributeValue::Float(1.0))
                .attr("beta", AttributeValue::Float(1.0))
                .attr("transA", AttributeValue::Int(0))
                .attr("transB", AttributeValue::Int(0)),
        );
    }

    set
}

fn reduce_with_axes_attr(name: &str, version: i64) -> OpSchema {
    OpSchema::new(name, version)
        .no_default("axes")
        .attr("keepdims", AttributeValue::Int(1))
}

fn reduce_with_axes_input(name: &str, version: i64) -> OpSchema {
    OpSchema::new(name, version)
        .attr("keepdims", AttributeValue::Int(1))
        .attr("noop_with_empty_axes", AttributeValue::Int(0))
}
