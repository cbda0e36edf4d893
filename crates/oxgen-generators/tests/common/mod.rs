//! Common test utilities for generator tests.
//!
//! Graph builders plus a small driver that walks a graph in node order the
//! way a code emitter would.

use oxgen_core::{EmitCtx, Error, Generation, GeneratorRegistry, Result, TensorLedger};
use oxgen_onnx::{DEFAULT_DOMAIN, Dimension, Graph, Node};

/// Install a test subscriber so generator logs show up with `--nocapture`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_target(false)
        .with_test_writer()
        .try_init();
}

/// Create a linear chain of single-input, single-output nodes.
///
/// Graph structure:
/// - Input: x:[shape]
/// - Operations: op_types[0](x) -> h0 -> op_types[1] -> h1 ... -> y
/// - Output: y
pub fn make_unary_chain_graph(op_types: &[&str], shape: &[usize], opset: i64) -> Graph {
    let mut graph = Graph::new();
    graph.inputs = vec!["x".to_string()];
    graph.outputs = vec!["y".to_string()];
    graph
        .metadata
        .opset_imports
        .insert(DEFAULT_DOMAIN.to_string(), opset);
    graph.metadata.name = "test_chain_graph".to_string();
    graph.set_shape(
        "x",
        shape.iter().map(|&d| Dimension::Static(d)).collect(),
    );

    let mut previous = "x".to_string();
    for (i, op_type) in op_types.iter().enumerate() {
        let output = if i + 1 == op_types.len() {
            "y".to_string()
        } else {
            format!("h{i}")
        };
        let mut node = Node::new(*op_type);
        node.name = format!("{}_{i}", op_type.to_lowercase());
        node.inputs = vec![previous];
        node.outputs = vec![output.clone()];
        graph.add_node(node);
        previous = output;
    }

    graph
}

/// Create a two-input, one-output graph for a binary elementwise operator.
///
/// Graph structure:
/// - Inputs: a, b
/// - Operation: OpType(a, b) -> c
/// - Output: c
pub fn make_binary_elementwise_graph(op_type: &str, opset: i64) -> Graph {
    let mut graph = Graph::new();
    graph.inputs = vec!["a".to_string(), "b".to_string()];
    graph.outputs = vec!["c".to_string()];
    graph
        .metadata
        .opset_imports
        .insert(DEFAULT_DOMAIN.to_string(), opset);

    let mut node = Node::new(op_type);
    node.name = format!("{}_op", op_type.to_lowercase());
    node.inputs = vec!["a".to_string(), "b".to_string()];
    node.outputs = vec!["c".to_string()];
    graph.add_node(node);

    graph
}

/// Generate every node of `graph` in order with one shared ledger.
///
/// Each node resolves its generator at the opset the graph imports for the
/// node's domain. Returns the per-node results and the final ledger.
pub fn emit_graph(
    graph: &Graph,
    registry: &GeneratorRegistry,
) -> Result<(Vec<Generation>, TensorLedger)> {
    let mut ledger = TensorLedger::from_graph(graph);
    let mut generations = Vec::with_capacity(graph.nodes.len());

    for node in &graph.nodes {
        let version = graph.opset_version(&node.domain);
        let generator = registry
            .lookup(Some(&node.domain), &node.op_type, version)
            .ok_or_else(|| {
                Error::Unsupported(format!(
                    "no generator for {} at opset {version:?}",
                    node.op_type
                ))
            })?;

        let mut ctx = EmitCtx::new(node, &graph.value_info, &graph.initializers, &mut ledger);
        generations.push(generator.generate(&mut ctx)?);
    }

    Ok((generations, ledger))
}

/// Concatenate the forward fragments of every generation.
pub fn forward_lines(generations: &[Generation]) -> Vec<String> {
    generations
        .iter()
        .flat_map(|generation| generation.forward.iter().cloned())
        .collect()
}
