//! Attribute decoding.
//!
//! Every recognized attribute kind maps to one [`AttributeValue`] variant.
//! Kinds without a mapping (subgraphs, sparse tensors, type protos, ...)
//! become [`AttributeValue::Unsupported`] instead of failing: attributes are
//! annotations, so losing one must not lose the node.

use std::fmt;

use onnxviz_proto::{AttributeProto, attribute_type};
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};

use crate::error::{AttributeError, TensorError};
use crate::tensor::{TensorValue, materialize};

/// Decoded value of one operator attribute.
///
/// Serializes untagged: scalars as JSON numbers/strings, lists as arrays,
/// tensors as `{"type": "tensor", "shape", "dtype", "values"}` and
/// unsupported kinds as the string `"unsupported type <kind>"`.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Float(f32),
    Int(i64),
    String(String),
    Floats(Vec<f32>),
    Ints(Vec<i64>),
    Strings(Vec<String>),
    #[serde(serialize_with = "serialize_tensor")]
    Tensor(TensorValue),
    /// Raw `AttributeProto.AttributeType` of a kind with no mapping.
    #[serde(serialize_with = "serialize_unsupported")]
    Unsupported(i32),
}

fn serialize_tensor<S: Serializer>(tensor: &TensorValue, serializer: S) -> Result<S::Ok, S::Error> {
    let mut s = serializer.serialize_struct("Tensor", 4)?;
    s.serialize_field("type", "tensor")?;
    s.serialize_field("shape", &tensor.shape)?;
    s.serialize_field("dtype", &tensor.dtype)?;
    s.serialize_field("values", &tensor.values)?;
    s.end()
}

fn serialize_unsupported<S: Serializer>(kind: &i32, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(&format_args!("unsupported type {kind}"))
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Float(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::String(s) => write!(f, "{s:?}"),
            Self::Floats(v) => write!(f, "{v:?}"),
            Self::Ints(v) => write!(f, "{v:?}"),
            Self::Strings(v) => write!(f, "{v:?}"),
            Self::Tensor(t) => write!(f, "tensor<{}>{:?}", t.dtype, t.shape),
            Self::Unsupported(kind) => write!(f, "<unsupported type {kind}>"),
        }
    }
}

/// Decode one attribute record.
///
/// Fails only when a tensor payload cannot be materialized or a string
/// payload is not UTF-8.
pub fn decode_attribute(attr: &AttributeProto) -> Result<AttributeValue, AttributeError> {
    Ok(match attr.r#type {
        attribute_type::FLOAT => AttributeValue::Float(attr.f),
        attribute_type::INT => AttributeValue::Int(attr.i),
        attribute_type::STRING => AttributeValue::String(String::from_utf8(attr.s.clone())?),
        attribute_type::TENSOR => {
            let tensor = attr.t.as_ref().ok_or(TensorError::MissingPayload)?;
            AttributeValue::Tensor(materialize(tensor)?)
        }
        attribute_type::FLOATS => AttributeValue::Floats(attr.floats.clone()),
        attribute_type::INTS => AttributeValue::Ints(attr.ints.clone()),
        attribute_type::STRINGS => AttributeValue::Strings(
            attr.strings
                .iter()
                .map(|s| String::from_utf8(s.clone()))
                .collect::<Result<_, _>>()?,
        ),
        other => {
            log::warn!("attribute '{}' has unsupported type {other}", attr.name);
            AttributeValue::Unsupported(other)
        }
    })
}
