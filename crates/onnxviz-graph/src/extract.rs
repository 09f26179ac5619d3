//! Graph extraction: decoded ONNX tree to [`ParsedModel`].

use std::collections::BTreeMap;

use onnxviz_proto::{GraphProto, ModelProto, NodeProto};

use crate::attribute::decode_attribute;
use crate::edges::reconstruct_edges;
use crate::error::ExtractError;
use crate::model::{ModelMetadata, Node, NodeId, ParsedModel};
use crate::tensor::{TensorValue, materialize};

/// Decode a serialized model and extract its graph.
pub fn parse_model(bytes: &[u8]) -> Result<ParsedModel, ExtractError> {
    let model = onnxviz_proto::decode_model(bytes)?;
    extract(&model)
}

/// Extract nodes, edges, weights and metadata from a decoded model.
///
/// A model without a graph yields empty node, edge and weight collections.
pub fn extract(model: &ModelProto) -> Result<ParsedModel, ExtractError> {
    let empty = GraphProto::default();
    let graph = model.graph.as_ref().unwrap_or(&empty);

    let nodes = extract_nodes(graph)?;
    let weights = extract_weights(graph)?;
    let edges = reconstruct_edges(&nodes);
    log::debug!(
        "extracted {} nodes, {} edges, {} weights",
        nodes.len(),
        edges.len(),
        weights.len()
    );

    Ok(ParsedModel {
        nodes,
        edges,
        weights,
        model_metadata: extract_metadata(model),
    })
}

/// One [`Node`] per operator, in graph order.
pub fn extract_nodes(graph: &GraphProto) -> Result<Vec<Node>, ExtractError> {
    graph
        .node
        .iter()
        .enumerate()
        .map(|(index, proto)| extract_node(NodeId(index), proto))
        .collect()
}

fn extract_node(id: NodeId, proto: &NodeProto) -> Result<Node, ExtractError> {
    let name = if proto.name.is_empty() {
        proto.op_type.clone()
    } else {
        proto.name.clone()
    };

    let mut attributes = BTreeMap::new();
    for attr in &proto.attribute {
        let value = decode_attribute(attr).map_err(|source| ExtractError::Attribute {
            node: name.clone(),
            attribute: attr.name.clone(),
            source,
        })?;
        if attributes.insert(attr.name.clone(), value).is_some() {
            log::debug!("node '{name}': attribute '{}' repeated, keeping the last", attr.name);
        }
    }

    Ok(Node {
        id,
        name,
        op_type: proto.op_type.clone(),
        inputs: proto.input.clone(),
        outputs: proto.output.clone(),
        attributes,
    })
}

/// Materialize the initializer table, keyed by tensor name.
///
/// A repeated name keeps the last initializer.
pub fn extract_weights(graph: &GraphProto) -> Result<BTreeMap<String, TensorValue>, ExtractError> {
    let mut weights = BTreeMap::new();
    for init in &graph.initializer {
        let value = materialize(init).map_err(|source| ExtractError::Weight {
            name: init.name.clone(),
            source,
        })?;
        if weights.insert(init.name.clone(), value).is_some() {
            log::warn!("initializer '{}' repeated, keeping the last", init.name);
        }
    }
    Ok(weights)
}

/// Copy the descriptive strings of the model envelope.
pub fn extract_metadata(model: &ModelProto) -> ModelMetadata {
    ModelMetadata {
        producer_name: model.producer_name.clone(),
        producer_version: model.producer_version.clone(),
        domain: model.domain.clone(),
        description: model.doc_string.clone(),
    }
}
