//! Text summary and dump for inspecting a parsed model.

use std::collections::BTreeMap;
use std::fmt;

use crate::model::ParsedModel;

/// Aggregate counts over a [`ParsedModel`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GraphSummary {
    pub nodes: usize,
    pub edges: usize,
    pub weights: usize,
    pub weight_elements: usize,
    /// Node count per op type.
    pub op_types: BTreeMap<String, usize>,
    /// See [`ParsedModel::graph_inputs`].
    pub graph_inputs: Vec<String>,
}

impl GraphSummary {
    /// Summarize a parsed model.
    pub fn of(model: &ParsedModel) -> Self {
        let mut op_types = BTreeMap::new();
        for node in &model.nodes {
            *op_types.entry(node.op_type.clone()).or_insert(0) += 1;
        }
        Self {
            nodes: model.nodes.len(),
            edges: model.edges.len(),
            weights: model.weights.len(),
            weight_elements: model.weight_elements(),
            op_types,
            graph_inputs: model.graph_inputs().into_iter().map(String::from).collect(),
        }
    }
}

impl fmt::Display for GraphSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} nodes, {} edges, {} weights ({} elements)",
            self.nodes, self.edges, self.weights, self.weight_elements
        )?;
        if !self.graph_inputs.is_empty() {
            writeln!(f, "inputs: {}", self.graph_inputs.join(", "))?;
        }
        for (op, count) in &self.op_types {
            writeln!(f, "  {op:<24} {count}")?;
        }
        Ok(())
    }
}

fn or_dash(field: &Option<String>) -> &str {
    field.as_deref().unwrap_or("-")
}

/// Render every section of a parsed model as indented text.
pub fn dump_model(model: &ParsedModel) -> String {
    let mut out = String::new();
    let meta = &model.model_metadata;

    out.push_str("Metadata:\n");
    out.push_str(&format!(
        "  producer: {} {}\n",
        or_dash(&meta.producer_name),
        or_dash(&meta.producer_version)
    ));
    out.push_str(&format!("  domain: {}\n", or_dash(&meta.domain)));
    out.push_str(&format!("  description: {}\n", or_dash(&meta.description)));

    out.push_str("\nSummary:\n");
    for line in GraphSummary::of(model).to_string().lines() {
        out.push_str(&format!("  {line}\n"));
    }

    if !model.nodes.is_empty() {
        out.push_str("\nNodes:\n");
        for node in &model.nodes {
            out.push_str(&format!(
                "  [{}] {} {}({}) -> ({})\n",
                node.id.index(),
                node.name,
                node.op_type,
                node.inputs.join(", "),
                node.outputs.join(", ")
            ));
            for (name, value) in &node.attributes {
                out.push_str(&format!("      {name} = {value}\n"));
            }
        }
    }

    if !model.edges.is_empty() {
        out.push_str("\nEdges:\n");
        for edge in &model.edges {
            out.push_str(&format!("  {} -> {}  [{}]\n", edge.from, edge.to, edge.label));
        }
    }

    if !model.weights.is_empty() {
        out.push_str("\nWeights:\n");
        for (name, w) in &model.weights {
            out.push_str(&format!("  {name}: {}{:?}\n", w.dtype, w.shape));
        }
    }

    out
}
