//! Builtin generator registry.
//!
//! Registers every operator in the builtin catalogue under the default
//! domain, with one pack per schema since-version up to the opset ceiling
//! the catalogue targets. A model importing an older opset resolves to the
//! pack built from the schema in effect there.

use oxgen_core::{Generator, GeneratorBase, GeneratorPack, GeneratorRegistry};

use crate::families::{BinaryElementwiseGen, ReductionGen, UnaryElementwiseGen};
use crate::operators::{ConcatGen, FlattenGen, GemmGen, ReshapeGen, SoftmaxGen, TransposeGen};
use crate::schemas::builtin_schemas;

/// Opset ceiling of the builtin catalogue.
///
/// Schema versions introduced after it are not registered. Opsets older
/// than an operator's first schema version are not served by the builtins
/// and need an additional pack.
pub const BUILTIN_OPSET: i64 = 17;

/// Operators in the builtin catalogue.
pub const BUILTIN_OPERATORS: &[&str] = &[
    // Unary elementwise
    "Abs", "Exp", "Identity", "Neg", "Relu", "Sigmoid", "Sqrt", "Tanh",
    // Binary elementwise
    "Add", "Sub", "Mul", "Div", "Pow",
    // Reductions
    "ReduceSum", "ReduceMean", "ReduceMax", "ReduceMin",
    // Individual operators
    "Softmax", "Transpose", "Reshape", "Flatten", "Concat", "Gemm",
];

fn build(op_type: &str, opset: i64) -> Option<Box<dyn Generator>> {
    let generator: Box<dyn Generator> = match op_type {
        "Abs" => Box::new(UnaryElementwiseGen::abs(opset)),
        "Exp" => Box::new(UnaryElementwiseGen::exp(opset)),
        "Identity" => Box::new(UnaryElementwiseGen::identity(opset)),
        "Neg" => Box::new(UnaryElementwiseGen::neg(opset)),
        "Relu" => Box::new(UnaryElementwiseGen::relu(opset)),
        "Sigmoid" => Box::new(UnaryElementwiseGen::sigmoid(opset)),
        "Sqrt" => Box::new(UnaryElementwiseGen::sqrt(opset)),
        "Tanh" => Box::new(UnaryElementwiseGen::tanh(opset)),

        "Add" => Box::new(BinaryElementwiseGen::add(opset)),
        "Sub" => Box::new(BinaryElementwiseGen::sub(opset)),
        "Mul" => Box::new(BinaryElementwiseGen::mul(opset)),
        "Div" => Box::new(BinaryElementwiseGen::div(opset)),
        "Pow" => Box::new(BinaryElementwiseGen::pow(opset)),

        "ReduceSum" => Box::new(ReductionGen::reduce_sum(opset)),
        "ReduceMean" => Box::new(ReductionGen::reduce_mean(opset)),
        "ReduceMax" => Box::new(ReductionGen::reduce_max(opset)),
        "ReduceMin" => Box::new(ReductionGen::reduce_min(opset)),

        "Softmax" => Box::new(SoftmaxGen::new(opset)),
        "Transpose" => Box::new(TransposeGen::new(opset)),
        "Reshape" => Box::new(ReshapeGen::new(opset)),
        "Flatten" => Box::new(FlattenGen::new(opset)),
        "Concat" => Box::new(ConcatGen::new(opset)),
        "Gemm" => Box::new(GemmGen::new(opset)),
        _ => return None,
    };
    Some(generator)
}

/// Register the builtin catalogue into `registry`.
///
/// Returns the number of operators registered.
pub fn register_builtins(registry: &mut GeneratorRegistry) -> usize {
    let mut packs = 0;
    for &op_type in BUILTIN_OPERATORS {
        for version in builtin_schemas().since_versions(op_type, BUILTIN_OPSET) {
            tracing::debug!(op_type, version, "registering builtin generator");
            registry.register(
                None,
                op_type,
                GeneratorPack::new(version, "builtin", move || {
                    // Unknown names fall back to the bare base, which refuses to generate.
                    build(op_type, version)
                        .unwrap_or_else(|| Box::new(GeneratorBase::from_schema(op_type, None)))
                }),
            );
            packs += 1;
        }
    }

    tracing::info!(
        "Loaded {} builtin code generators ({} versions).",
        BUILTIN_OPERATORS.len(),
        packs
    );
    BUILTIN_OPERATORS.len()
}

/// Returns a registry pre-populated with the builtin catalogue.
///
/// Plugin generators can be added to the returned registry afterwards.
pub fn builtin_registry() -> GeneratorRegistry {
    let mut registry = GeneratorRegistry::new();
    register_builtins(&mut registry);
    registry
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_catalogue_entry_builds() {
        for &op_type in BUILTIN_OPERATORS {
            let generator = build(op_type, BUILTIN_OPSET)
                .unwrap_or_else(|| panic!("no generator for {op_type}"));
            assert_eq!(generator.op_type(), op_type);
            assert_eq!(generator.domain(), "ai.onnx");
        }
        assert!(build("LSTM", BUILTIN_OPSET).is_none());
    }

    #[test]
    fn test_builtin_registry_counts_operators() {
        let registry = builtin_registry();

        assert_eq!(registry.count(), BUILTIN_OPERATORS.len());
        assert_eq!(registry.domains().collect::<Vec<_>>(), vec!["ai.onnx"]);
        assert_eq!(registry.versions(None, "Relu"), vec![14, 13, 6, 1]);
        // ReduceMean 18 is above the ceiling.
        assert_eq!(registry.versions(None, "ReduceMean"), vec![13, 11, 1]);
    }

    #[test]
    fn test_builtin_lookup_respects_ceiling() {
        let registry = builtin_registry();

        assert!(registry.lookup(None, "Relu", Some(BUILTIN_OPSET)).is_some());
        assert!(registry.lookup(Some(""), "Relu", Some(21)).is_some());
        assert_eq!(registry.lookup(None, "Relu", Some(BUILTIN_OPSET - 1)).unwrap().version(), 14);
        assert_eq!(registry.lookup(None, "Relu", Some(13)).unwrap().version(), 13);
        // Gemm has no schema before opset 7.
        assert!(registry.lookup(None, "Gemm", Some(6)).is_none());
        assert_eq!(registry.lookup(None, "Gemm", Some(8)).unwrap().version(), 7);
    }

    #[test]
    fn test_generator_reports_schema_version() {
        let registry = builtin_registry();
        let softmax = registry.lookup(None, "Softmax", None).unwrap();

        assert_eq!(softmax.version(), 13);

        let softmax = registry.lookup(None, "Softmax", Some(12)).unwrap();
        assert_eq!(softmax.version(), 11);
    }
}
