//! Response data model.
//!
//! [`ParsedModel`] is the visualization-ready mirror of an ONNX graph:
//! nodes, inferred edges, materialized weights and model metadata.
//! Display identifiers are not unique (unnamed operators fall back to their
//! op type), so every node and edge also carries [`NodeId`]s: the node's
//! position in the source operator list.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::attribute::AttributeValue;
use crate::tensor::TensorValue;

/// Position of a node in the source graph's operator list.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub struct NodeId(pub usize);

impl NodeId {
    /// Returns the zero-based operator index.
    pub fn index(self) -> usize {
        self.0
    }
}

/// One operator instance.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Node {
    #[serde(skip)]
    pub id: NodeId,
    /// Declared name, or the op type when the declared name is empty.
    pub name: String,
    pub op_type: String,
    /// Consumed tensor names, in declared order.
    pub inputs: Vec<String>,
    /// Produced tensor names, in declared order.
    pub outputs: Vec<String>,
    pub attributes: BTreeMap<String, AttributeValue>,
}

/// An inferred data dependency: `from` produces tensor `label`, `to` consumes it.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct Edge {
    #[serde(skip)]
    pub source: NodeId,
    #[serde(skip)]
    pub target: NodeId,
    pub from: String,
    pub to: String,
    pub label: String,
}

/// Descriptive strings copied from the model envelope.
///
/// Unset fields stay `None` (serialized as `null`).
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ModelMetadata {
    pub producer_name: Option<String>,
    pub producer_version: Option<String>,
    pub domain: Option<String>,
    pub description: Option<String>,
}

/// The full extraction result.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ParsedModel {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
    pub weights: BTreeMap<String, TensorValue>,
    pub model_metadata: ModelMetadata,
}

impl ParsedModel {
    /// Look up a node by id.
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index())
    }

    /// Nodes that list `tensor` among their outputs, in graph order.
    ///
    /// A well-formed graph has at most one.
    pub fn producers_of(&self, tensor: &str) -> Vec<&Node> {
        self.nodes
            .iter()
            .filter(|n| n.outputs.iter().any(|o| o == tensor))
            .collect()
    }

    /// Nodes that list `tensor` among their inputs, in graph order.
    pub fn consumers_of(&self, tensor: &str) -> Vec<&Node> {
        self.nodes
            .iter()
            .filter(|n| n.inputs.iter().any(|i| i == tensor))
            .collect()
    }

    /// Tensors consumed by some node that no node produces and that are not
    /// weights: the graph's external inputs.
    ///
    /// The empty name (an omitted optional input) is never reported.
    pub fn graph_inputs(&self) -> BTreeSet<&str> {
        let produced: BTreeSet<&str> = self
            .nodes
            .iter()
            .flat_map(|n| n.outputs.iter().map(String::as_str))
            .collect();
        self.nodes
            .iter()
            .flat_map(|n| n.inputs.iter().map(String::as_str))
            .filter(|t| !t.is_empty() && !produced.contains(t) && !self.weights.contains_key(*t))
            .collect()
    }

    /// Total number of materialized weight elements.
    pub fn weight_elements(&self) -> usize {
        self.weights.values().map(|w| w.values.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tensor::ElementType;

    fn node(index: usize, name: &str, inputs: &[&str], outputs: &[&str]) -> Node {
        Node {
            id: NodeId(index),
            name: name.into(),
            op_type: "Relu".into(),
            inputs: inputs.iter().map(|s| s.to_string()).collect(),
            outputs: outputs.iter().map(|s| s.to_string()).collect(),
            attributes: BTreeMap::new(),
        }
    }

    fn sample() -> ParsedModel {
        let mut weights = BTreeMap::new();
        weights.insert(
            "w".to_string(),
            TensorValue {
                shape: vec![2],
                dtype: ElementType::Float32,
                values: vec![1.0, 2.0],
            },
        );
        ParsedModel {
            nodes: vec![
                node(0, "a", &["x", "w"], &["y"]),
                node(1, "b", &["y", ""], &["z"]),
                node(2, "c", &["y"], &["out"]),
            ],
            edges: Vec::new(),
            weights,
            model_metadata: ModelMetadata::default(),
        }
    }

    #[test]
    fn producer_consumer_queries() {
        let model = sample();
        let producers = model.producers_of("y");
        assert_eq!(producers.len(), 1);
        assert_eq!(producers[0].name, "a");

        let consumers: Vec<_> = model.consumers_of("y").iter().map(|n| n.id).collect();
        assert_eq!(consumers, vec![NodeId(1), NodeId(2)]);

        assert!(model.producers_of("x").is_empty());
    }

    #[test]
    fn graph_inputs_exclude_weights_and_produced() {
        let model = sample();
        let inputs: Vec<_> = model.graph_inputs().into_iter().collect();
        assert_eq!(inputs, vec!["x"]);
    }

    #[test]
    fn node_lookup_and_weight_total() {
        let model = sample();
        assert_eq!(model.node(NodeId(2)).map(|n| n.name.as_str()), Some("c"));
        assert!(model.node(NodeId(3)).is_none());
        assert_eq!(model.weight_elements(), 2);
    }

    #[test]
    fn results_can_cross_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ParsedModel>();
        assert_send_sync::<crate::ExtractError>();
    }

    #[test]
    fn serialized_keys() {
        let edge = Edge {
            source: NodeId(0),
            target: NodeId(1),
            from: "Conv".into(),
            to: "r1".into(),
            label: "y".into(),
        };
        assert_eq!(
            serde_json::to_value(&edge).unwrap(),
            serde_json::json!({"from": "Conv", "to": "r1", "label": "y"})
        );

        let meta = serde_json::to_value(ModelMetadata::default()).unwrap();
        assert_eq!(
            meta,
            serde_json::json!({
                "producer_name": null,
                "producer_version": null,
                "domain": null,
                "description": null,
            })
        );
    }
}
