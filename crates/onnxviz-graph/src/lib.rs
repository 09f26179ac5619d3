//! Operator graph extraction for ONNX models.
//!
//! Turns a serialized ONNX model into a [`ParsedModel`]: one [`Node`] per
//! operator, [`Edge`]s re-derived by matching tensor names (ONNX stores no
//! edge list), every initializer materialized as a [`TensorValue`], and the
//! model's descriptive [`ModelMetadata`].
//!
//! The transform is pure: it reads the decoded tree and allocates a fresh
//! result, so independent models can be parsed concurrently.
//!
//! # Example
//! ```no_run
//! let bytes = std::fs::read("model.onnx").unwrap();
//! let parsed = onnxviz_graph::parse_model(&bytes).unwrap();
//! for edge in &parsed.edges {
//!     println!("{} -> {} ({})", edge.from, edge.to, edge.label);
//! }
//! ```

mod attribute;
mod edges;
mod error;
mod extract;
mod model;
mod summary;
mod tensor;

pub use attribute::{AttributeValue, decode_attribute};
pub use edges::reconstruct_edges;
pub use error::{AttributeError, ExtractError, TensorError};
pub use extract::{extract, extract_metadata, extract_nodes, extract_weights, parse_model};
pub use model::{Edge, ModelMetadata, Node, NodeId, ParsedModel};
pub use summary::{GraphSummary, dump_model};
pub use tensor::{ElementType, TensorValue, materialize};
