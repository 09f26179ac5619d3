//! ONNX model decoding for onnxviz.
//!
//! Provides the protobuf message tree ([`ModelProto`] and friends) that the
//! graph extractor consumes, plus [`decode_model`] which turns a serialized
//! `.onnx` buffer into that tree.

use prost::Message;

mod proto;

pub use proto::*;

/// Errors raised while decoding a serialized model.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// The buffer is not a valid `ModelProto` encoding.
    #[error("malformed ONNX protobuf: {0}")]
    Protobuf(#[from] prost::DecodeError),
}

/// Decode a serialized ONNX model.
///
/// A model that carries no `graph` field decodes successfully; callers treat
/// it as an empty graph.
pub fn decode_model(bytes: &[u8]) -> Result<ModelProto, DecodeError> {
    Ok(ModelProto::decode(bytes)?)
}
