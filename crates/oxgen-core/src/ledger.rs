//! Tensor usage ledger.
//!
//! Generators never see raw tensor names in emitted code. They ask the ledger
//! for a canonical identifier, and the ledger also knows how many times each
//! tensor is referenced across the whole graph, which is what makes in-place
//! aliasing decisions possible.

use oxgen_onnx::Graph;
use std::collections::{HashMap, HashSet};

/// Graph-wide tensor reference counts and canonical naming.
///
/// The ledger is mutated while nodes are generated, so it must be walked in
/// graph-node order by a single caller.
pub trait UsageLedger {
    /// Number of graph-wide references to `tensor` (producers and consumers).
    fn usage_count(&self, tensor: &str) -> usize;

    /// Canonical identifier for `tensor`, assigning one on first use.
    fn canonical_name(&mut self, tensor: &str) -> String;

    /// Make `tensor` resolve to an existing canonical identifier.
    fn alias(&mut self, tensor: &str, canonical: String);
}

/// Default [`UsageLedger`] built from a graph.
///
/// Canonical names are valid Python identifiers: `t_` followed by the tensor
/// name with every non-alphanumeric character replaced by `_`. Collisions
/// after sanitizing get a numeric suffix.
#[derive(Debug, Clone, Default)]
pub struct TensorLedger {
    counts: HashMap<String, usize>,
    mapping: HashMap<String, String>,
    taken: HashSet<String>,
}

impl TensorLedger {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Count every tensor reference in `graph`.
    ///
    /// Node inputs, node outputs, graph inputs and graph outputs each count
    /// once. Empty names (absent optional inputs) are ignored.
    pub fn from_graph(graph: &Graph) -> Self {
        let mut ledger = Self::new();

        let names = graph
            .inputs
            .iter()
            .chain(graph.outputs.iter())
            .chain(
                graph
                    .nodes
                    .iter()
                    .flat_map(|node| node.inputs.iter().chain(node.outputs.iter())),
            );
        for name in names {
            ledger.record(name);
        }

        ledger
    }

    /// Record one reference to `tensor`.
    pub fn record(&mut self, tensor: &str) {
        if tensor.is_empty() {
            return;
        }
        *self.counts.entry(tensor.to_string()).or_insert(0) += 1;
    }

    /// Canonical name already assigned to `tensor`, without assigning one.
    pub fn resolved(&self, tensor: &str) -> Option<&str> {
        self.mapping.get(tensor).map(String::as_str)
    }

    fn fresh_name(&mut self, tensor: &str) -> String {
        let sanitized: String = tensor
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
            .collect();
        let base = format!("t_{sanitized}");

        let mut candidate = base.clone();
        let mut suffix = 1;
        while self.taken.contains(&candidate) {
            candidate = format!("{base}_{suffix}");
            suffix += 1;
        }
        self.taken.insert(candidate.clone());
        candidate
    }
}

impl UsageLedger for TensorLedger {
    fn usage_count(&self, tensor: &str) -> usize {
        self.counts.get(tensor).copied().unwrap_or(0)
    }

    fn canonical_name(&mut self, tensor: &str) -> String {
        if let Some(name) = self.mapping.get(tensor) {
            return name.clone();
        }
        let name = self.fresh_name(tensor);
        self.mapping.insert(tensor.to_string(), name.clone());
        name
    }

    fn alias(&mut self, tensor: &str, canonical: String) {
        tracing::trace!(tensor, canonical = %canonical, "aliasing tensor");
        self.mapping.insert(tensor.to_string(), canonical);
    }
}
