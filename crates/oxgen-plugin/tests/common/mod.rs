//! Common test utilities for plugin loader tests.

use oxgen_core::{EmitCtx, Generation, Generator, Initializers, Result, ShapeInfo, TensorLedger};
use oxgen_onnx::Node;
use std::io::Write;
use std::path::PathBuf;
use tempfile::TempDir;

/// Install a test subscriber so loader logs show up with `--nocapture`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_target(false)
        .with_test_writer()
        .try_init();
}

/// Write `content` to `file_name` inside a fresh temporary directory.
///
/// The directory is removed when the returned guard is dropped.
pub fn write_source(file_name: &str, content: &str) -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(file_name);
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(content.as_bytes()).unwrap();
    (dir, path)
}

/// Create a node with the given tensors.
pub fn make_node(op_type: &str, domain: &str, inputs: &[&str], outputs: &[&str]) -> Node {
    let mut node = Node::new(op_type);
    node.name = format!("{}_0", op_type.to_lowercase());
    node.domain = domain.to_string();
    node.inputs = inputs.iter().map(|s| s.to_string()).collect();
    node.outputs = outputs.iter().map(|s| s.to_string()).collect();
    node
}

/// Run one generator against `node` with an empty ledger.
pub fn generate(
    generator: &dyn Generator,
    node: &Node,
    initializers: &Initializers,
) -> Result<Generation> {
    let shapes = ShapeInfo::new();
    let mut ledger = TensorLedger::new();
    let mut ctx = EmitCtx::new(node, &shapes, initializers, &mut ledger);
    generator.generate(&mut ctx)
}
