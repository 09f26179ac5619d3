//! Edge reconstruction.
//!
//! ONNX carries no edge list: a dependency exists wherever a tensor name
//! appears both in some node's outputs and in another (or the same) node's
//! inputs. An edge `(A -> B, t)` is emitted for every producer `A` of every
//! input `t` of every node `B`.
//!
//! Edges are resolved through a tensor-to-producers index built in one pass,
//! which yields exactly what a nested scan over all node pairs would, in the
//! same order: consumers in graph order, then inputs in declared order, then
//! producers in graph order.

use std::collections::HashMap;

use crate::model::{Edge, Node};

/// Producer positions for each output tensor name, in graph order.
///
/// A node that lists the same output twice is recorded once.
fn producer_index(nodes: &[Node]) -> HashMap<&str, Vec<usize>> {
    let mut index: HashMap<&str, Vec<usize>> = HashMap::new();
    for (pos, node) in nodes.iter().enumerate() {
        for out in &node.outputs {
            let producers = index.entry(out.as_str()).or_default();
            if producers.last() != Some(&pos) {
                producers.push(pos);
            }
        }
    }
    for (tensor, producers) in &index {
        if producers.len() > 1 {
            log::warn!(
                "tensor '{tensor}' is produced by {} nodes; emitting an edge per producer",
                producers.len()
            );
        }
    }
    index
}

/// Derive every producer-to-consumer edge of `nodes`.
///
/// Inputs with no producing node (graph inputs, weights) yield no edge.
pub fn reconstruct_edges(nodes: &[Node]) -> Vec<Edge> {
    let index = producer_index(nodes);
    let mut edges = Vec::new();

    for consumer in nodes {
        for input in &consumer.inputs {
            let Some(producers) = index.get(input.as_str()) else {
                continue;
            };
            for &pos in producers {
                let producer = &nodes[pos];
                log::trace!("edge {} -> {} via '{input}'", producer.name, consumer.name);
                edges.push(Edge {
                    source: producer.id,
                    target: consumer.id,
                    from: producer.name.clone(),
                    to: consumer.name.clone(),
                    label: input.clone(),
                });
            }
        }
    }

    edges
}
