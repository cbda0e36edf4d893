//! Per-node emit context.
//!
//! `EmitCtx` bundles what a generator may read while emitting one node (the
//! node, declared shapes, initializers) with the usage ledger it may update
//! for in-place aliasing.

use crate::ledger::UsageLedger;
use crate::{Initializers, ShapeInfo};
use oxgen_onnx::{Dimension, Node, TensorValue};

/// One dimension of a declared shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extent {
    /// Concrete size.
    Fixed(usize),

    /// Symbolic or unknown size.
    Wildcard,
}

impl Extent {
    /// Get the fixed size if available.
    pub fn as_fixed(&self) -> Option<usize> {
        match self {
            Extent::Fixed(n) => Some(*n),
            Extent::Wildcard => None,
        }
    }
}

/// Context passed to `Generator::generate()`.
pub struct EmitCtx<'a> {
    /// The node being generated.
    pub node: &'a Node,

    /// Declared tensor shapes.
    pub shapes: &'a ShapeInfo,

    /// Constant tensors.
    pub initializers: &'a Initializers,

    ledger: &'a mut dyn UsageLedger,
}

impl<'a> EmitCtx<'a> {
    /// Create a new emit context.
    pub fn new(
        node: &'a Node,
        shapes: &'a ShapeInfo,
        initializers: &'a Initializers,
        ledger: &'a mut dyn UsageLedger,
    ) -> Self {
        Self {
            node,
            shapes,
            initializers,
            ledger,
        }
    }

    /// Name of input `index`, or `None` if absent or out of range.
    pub fn input(&self, index: usize) -> Option<&'a str> {
        self.node
            .inputs
            .get(index)
            .map(String::as_str)
            .filter(|name| !name.is_empty())
    }

    /// Constant value of tensor `name`, if it is an initializer.
    pub fn initializer(&self, name: &str) -> Option<&'a TensorValue> {
        self.initializers.get(name)
    }

    /// Declared shape of tensor `name`.
    ///
    /// Symbolic dimensions come back as [`Extent::Wildcard`]. Returns `None`
    /// when no shape was declared.
    pub fn declared_shape(&self, name: &str) -> Option<Vec<Extent>> {
        let dims = self.shapes.get(name)?;
        Some(
            dims.iter()
                .map(|dim| match dim {
                    Dimension::Static(n) => Extent::Fixed(*n),
                    Dimension::Named(_) => Extent::Wildcard,
                })
                .collect(),
        )
    }

    /// Rank of input `index`, if its shape is declared.
    pub fn input_rank(&self, index: usize) -> Option<usize> {
        self.declared_shape(self.input(index)?).map(|s| s.len())
    }

    /// Expressions the emitted code should use for the node's tensors.
    ///
    /// Initializers resolve to `self._vars["<canonical>"]`, everything else to
    /// its canonical local name, absent optional inputs to `None`. At most
    /// `input_count`/`output_count` tensors are returned (all by default).
    ///
    /// With `allow_alias`, the first output reuses the first input's storage
    /// when both are referenced exactly twice graph-wide (produced once,
    /// consumed once) and the input is not an initializer. The ledger is
    /// updated so later nodes read the output under the input's name.
    pub fn references(
        &mut self,
        allow_alias: bool,
        input_count: Option<usize>,
        output_count: Option<usize>,
    ) -> (Vec<String>, Vec<String>) {
        let node = self.node;
        let input_count = input_count.unwrap_or(node.inputs.len());
        let output_count = output_count.unwrap_or(node.outputs.len());

        let inputs = node
            .inputs
            .iter()
            .take(input_count)
            .map(|name| self.reference(name))
            .collect();

        let mut outputs = Vec::with_capacity(output_count.min(node.outputs.len()));
        for (index, name) in node.outputs.iter().take(output_count).enumerate() {
            let tensor = if index == 0 && self.can_alias(allow_alias) {
                let source = node.inputs[0].as_str();
                let canonical = self.ledger.canonical_name(source);
                tracing::debug!(output = %name, input = source, "emitting output in place");
                self.ledger.alias(name, canonical);
                source
            } else {
                name.as_str()
            };
            outputs.push(self.reference(tensor));
        }

        (inputs, outputs)
    }

    /// Whether the first output may alias the first input.
    fn can_alias(&self, allow_alias: bool) -> bool {
        let node = self.node;
        let (Some(input), Some(output)) = (node.inputs.first(), node.outputs.first()) else {
            return false;
        };

        allow_alias
            && !input.is_empty()
            && !self.initializers.contains_key(input)
            && self.ledger.usage_count(output) == 2
            && self.ledger.usage_count(input) == 2
    }

    fn reference(&mut self, tensor: &str) -> String {
        if tensor.is_empty() {
            return "None".to_string();
        }
        let canonical = self.ledger.canonical_name(tensor);
        if self.initializers.contains_key(tensor) {
            format!("self._vars[\"{canonical}\"]")
        } else {
            canonical
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TensorLedger;

    fn unary_node() -> Node {
        let mut node = Node::new("Relu");
        node.inputs = vec!["x".to_string()];
        node.outputs = vec!["y".to_string()];
        node
    }

    /// Ledger where `x` and `y` are each referenced `x_count`/`y_count` times.
    fn ledger_with(x_count: usize, y_count: usize) -> TensorLedger {
        let mut ledger = TensorLedger::new();
        for _ in 0..x_count {
            ledger.record("x");
        }
        for _ in 0..y_count {
            ledger.record("y");
        }
        ledger
    }

    fn emit_refs(
        node: &Node,
        initializers: &Initializers,
        ledger: &mut TensorLedger,
        allow_alias: bool,
    ) -> (Vec<String>, Vec<String>) {
        let shapes = ShapeInfo::new();
        let mut ctx = EmitCtx::new(node, &shapes, initializers, ledger);
        ctx.references(allow_alias, None, None)
    }

    #[test]
    fn test_alias_when_all_conditions_hold() {
        let node = unary_node();
        let mut ledger = ledger_with(2, 2);

        let (inputs, outputs) = emit_refs(&node, &Initializers::new(), &mut ledger, true);

        assert_eq!(inputs, vec!["t_x"]);
        assert_eq!(outputs, vec!["t_x"]);
        assert_eq!(ledger.canonical_name("y"), "t_x");
    }

    #[test]
    fn test_no_alias_when_disabled() {
        let node = unary_node();
        let mut ledger = ledger_with(2, 2);

        let (_, outputs) = emit_refs(&node, &Initializers::new(), &mut ledger, false);

        assert_eq!(outputs, vec!["t_y"]);
    }

    #[test]
    fn test_no_alias_without_inputs() {
        let mut node = Node::new("RandomNormal");
        node.outputs = vec!["y".to_string()];
        let mut ledger = ledger_with(0, 2);

        let (inputs, outputs) = emit_refs(&node, &Initializers::new(), &mut ledger, true);

        assert!(inputs.is_empty());
        assert_eq!(outputs, vec!["t_y"]);
    }

    #[test]
    fn test_no_alias_for_initializer_input() {
        let node = unary_node();
        let mut initializers = Initializers::new();
        initializers.insert("x".to_string(), TensorValue::from_i64s(vec![1, 2]));
        let mut ledger = ledger_with(2, 2);

        let (inputs, outputs) = emit_refs(&node, &initializers, &mut ledger, true);

        assert_eq!(inputs, vec!["self._vars[\"t_x\"]"]);
        assert_eq!(outputs, vec!["t_y"]);
    }

    #[test]
    fn test_no_alias_when_output_used_elsewhere() {
        let node = unary_node();
        let mut ledger = ledger_with(2, 3);

        let (_, outputs) = emit_refs(&node, &Initializers::new(), &mut ledger, true);

        assert_eq!(outputs, vec!["t_y"]);
    }

    #[test]
    fn test_no_alias_when_input_used_elsewhere() {
        let node = unary_node();
        let mut ledger = ledger_with(3, 2);

        let (_, outputs) = emit_refs(&node, &Initializers::new(), &mut ledger, true);

        assert_eq!(outputs, vec!["t_y"]);
        assert_eq!(ledger.resolved("y"), Some("t_y"));
    }

    #[test]
    fn test_only_first_output_aliases() {
        let mut node = Node::new("Split");
        node.inputs = vec!["x".to_string()];
        node.outputs = vec!["y".to_string(), "z".to_string()];
        let mut ledger = ledger_with(2, 2);
        ledger.record("z");
        ledger.record("z");

        let (_, outputs) = emit_refs(&node, &Initializers::new(), &mut ledger, true);

        assert_eq!(outputs, vec!["t_x", "t_z"]);
    }

    #[test]
    fn test_reference_counts_and_absent_inputs() {
        let mut node = Node::new("Clip");
        node.inputs = vec!["x".to_string(), String::new(), "max".to_string()];
        node.outputs = vec!["y".to_string()];
        let mut ledger = ledger_with(2, 2);
        let shapes = ShapeInfo::new();
        let initializers = Initializers::new();
        let mut ctx = EmitCtx::new(&node, &shapes, &initializers, &mut ledger);

        let (inputs, _) = ctx.references(false, Some(2), Some(0));
        assert_eq!(inputs, vec!["t_x", "None"]);

        let (inputs, outputs) = ctx.references(false, None, None);
        assert_eq!(inputs, vec!["t_x", "None", "t_max"]);
        assert_eq!(outputs, vec!["t_y"]);
        assert_eq!(ctx.input(1), None);
        assert_eq!(ctx.input(2), Some("max"));
    }

    #[test]
    fn test_declared_shape_wildcards() {
        let node = unary_node();
        let mut shapes = ShapeInfo::new();
        shapes.insert(
            "x".to_string(),
            vec![
                Dimension::Named("batch".to_string()),
                Dimension::Static(3),
                Dimension::Static(0),
            ],
        );
        let initializers = Initializers::new();
        let mut ledger = TensorLedger::new();
        let ctx = EmitCtx::new(&node, &shapes, &initializers, &mut ledger);

        assert_eq!(
            ctx.declared_shape("x"),
            Some(vec![Extent::Wildcard, Extent::Fixed(3), Extent::Fixed(0)])
        );
        assert_eq!(ctx.declared_shape("y"), None);
        assert_eq!(ctx.input_rank(0), Some(3));
    }
}
