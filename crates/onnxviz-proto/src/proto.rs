//! ONNX protobuf types via prost derive.
//!
//! Hand-defined message types matching the ONNX IR specification (onnx.proto).
//! Field tags correspond to the official ONNX protobuf field numbers. Only the
//! fields a graph reader needs are declared; prost skips the rest on decode.

use prost::Message;

/// ONNX data type constants from `TensorProto.DataType`.
pub mod data_type {
    pub const UNDEFINED: i32 = 0;
    pub const FLOAT: i32 = 1;
    pub const UINT8: i32 = 2;
    pub const INT8: i32 = 3;
    pub const UINT16: i32 = 4;
    pub const INT16: i32 = 5;
    pub const INT32: i32 = 6;
    pub const INT64: i32 = 7;
    pub const STRING: i32 = 8;
    pub const BOOL: i32 = 9;
    pub const FLOAT16: i32 = 10;
    pub const DOUBLE: i32 = 11;
    pub const UINT32: i32 = 12;
    pub const UINT64: i32 = 13;
    pub const COMPLEX64: i32 = 14;
    pub const COMPLEX128: i32 = 15;
    pub const BFLOAT16: i32 = 16;
    pub const FLOAT8E4M3FN: i32 = 17;
    pub const FLOAT8E4M3FNUZ: i32 = 18;
    pub const FLOAT8E5M2: i32 = 19;
    pub const FLOAT8E5M2FNUZ: i32 = 20;
    pub const UINT4: i32 = 21;
    pub const INT4: i32 = 22;
}

/// ONNX attribute kind constants from `AttributeProto.AttributeType`.
pub mod attribute_type {
    pub const UNDEFINED: i32 = 0;
    pub const FLOAT: i32 = 1;
    pub const INT: i32 = 2;
    pub const STRING: i32 = 3;
    pub const TENSOR: i32 = 4;
    pub const GRAPH: i32 = 5;
    pub const FLOATS: i32 = 6;
    pub const INTS: i32 = 7;
    pub const STRINGS: i32 = 8;
    pub const TENSORS: i32 = 9;
    pub const GRAPHS: i32 = 10;
    pub const SPARSE_TENSOR: i32 = 11;
    pub const SPARSE_TENSORS: i32 = 12;
    pub const TYPE_PROTO: i32 = 13;
    pub const TYPE_PROTOS: i32 = 14;
}

/// `TensorProto.DataLocation` values.
pub mod data_location {
    pub const DEFAULT: i32 = 0;
    pub const EXTERNAL: i32 = 1;
}

/// Top-level ONNX model container.
///
/// The descriptive strings are proto2 `optional` fields so that an unset
/// field decodes as `None` rather than an empty string.
#[derive(Clone, PartialEq, Message)]
pub struct ModelProto {
    #[prost(int64, tag = "1")]
    pub ir_version: i64,
    #[prost(string, optional, tag = "2")]
    pub producer_name: Option<String>,
    #[prost(string, optional, tag = "3")]
    pub producer_version: Option<String>,
    #[prost(string, optional, tag = "4")]
    pub domain: Option<String>,
    #[prost(int64, tag = "5")]
    pub model_version: i64,
    #[prost(string, optional, tag = "6")]
    pub doc_string: Option<String>,
    #[prost(message, optional, tag = "7")]
    pub graph: Option<GraphProto>,
    #[prost(message, repeated, tag = "8")]
    pub opset_import: Vec<OperatorSetIdProto>,
    #[prost(message, repeated, tag = "14")]
    pub metadata_props: Vec<StringStringEntryProto>,
}

/// Operator set version declaration.
#[derive(Clone, PartialEq, Message)]
pub struct OperatorSetIdProto {
    #[prost(string, tag = "1")]
    pub domain: String,
    #[prost(int64, tag = "2")]
    pub version: i64,
}

/// Free-form key/value pair.
#[derive(Clone, PartialEq, Message)]
pub struct StringStringEntryProto {
    #[prost(string, tag = "1")]
    pub key: String,
    #[prost(string, tag = "2")]
    pub value: String,
}

/// A computation graph.
#[derive(Clone, PartialEq, Message)]
pub struct GraphProto {
    #[prost(message, repeated, tag = "1")]
    pub node: Vec<NodeProto>,
    #[prost(string, tag = "2")]
    pub name: String,
    #[prost(message, repeated, tag = "5")]
    pub initializer: Vec<TensorProto>,
    #[prost(string, tag = "10")]
    pub doc_string: String,
}

/// A single operator invocation.
#[derive(Clone, PartialEq, Message)]
pub struct NodeProto {
    #[prost(string, repeated, tag = "1")]
    pub input: Vec<String>,
    #[prost(string, repeated, tag = "2")]
    pub output: Vec<String>,
    #[prost(string, tag = "3")]
    pub name: String,
    #[prost(string, tag = "4")]
    pub op_type: String,
    #[prost(message, repeated, tag = "5")]
    pub attribute: Vec<AttributeProto>,
    #[prost(string, tag = "6")]
    pub doc_string: String,
    #[prost(string, tag = "7")]
    pub domain: String,
}

impl NodeProto {
    /// Create a node without attributes.
    pub fn simple(
        op_type: impl Into<String>,
        name: impl Into<String>,
        input: Vec<String>,
        output: Vec<String>,
    ) -> Self {
        Self::with_attrs(op_type, name, input, output, Vec::new())
    }

    /// Create a node carrying the given attributes.
    pub fn with_attrs(
        op_type: impl Into<String>,
        name: impl Into<String>,
        input: Vec<String>,
        output: Vec<String>,
        attribute: Vec<AttributeProto>,
    ) -> Self {
        Self {
            input,
            output,
            name: name.into(),
            op_type: op_type.into(),
            attribute,
            doc_string: String::new(),
            domain: String::new(),
        }
    }
}

/// A named, typed operator attribute.
///
/// Exactly one payload field is meaningful, selected by `r#type`.
#[derive(Clone, PartialEq, Message)]
pub struct AttributeProto {
    #[prost(string, tag = "1")]
    pub name: String,
    #[prost(float, tag = "2")]
    pub f: f32,
    #[prost(int64, tag = "3")]
    pub i: i64,
    #[prost(bytes = "vec", tag = "4")]
    pub s: Vec<u8>,
    #[prost(message, optional, tag = "5")]
    pub t: Option<TensorProto>,
    #[prost(message, optional, tag = "6")]
    pub g: Option<GraphProto>,
    #[prost(float, repeated, packed = "false", tag = "7")]
    pub floats: Vec<f32>,
    #[prost(int64, repeated, packed = "false", tag = "8")]
    pub ints: Vec<i64>,
    #[prost(bytes = "vec", repeated, tag = "9")]
    pub strings: Vec<Vec<u8>>,
    #[prost(message, repeated, tag = "10")]
    pub tensors: Vec<TensorProto>,
    #[prost(message, repeated, tag = "11")]
    pub graphs: Vec<GraphProto>,
    #[prost(string, tag = "13")]
    pub doc_string: String,
    #[prost(int32, tag = "20")]
    pub r#type: i32,
}

impl AttributeProto {
    fn typed(name: impl Into<String>, kind: i32) -> Self {
        Self {
            name: name.into(),
            r#type: kind,
            ..Default::default()
        }
    }

    /// A single float attribute.
    pub fn float(name: impl Into<String>, value: f32) -> Self {
        Self {
            f: value,
            ..Self::typed(name, attribute_type::FLOAT)
        }
    }

    /// A single integer attribute.
    pub fn int(name: impl Into<String>, value: i64) -> Self {
        Self {
            i: value,
            ..Self::typed(name, attribute_type::INT)
        }
    }

    /// A UTF-8 string attribute.
    pub fn string(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            s: value.into().into_bytes(),
            ..Self::typed(name, attribute_type::STRING)
        }
    }

    /// An embedded tensor attribute.
    pub fn tensor(name: impl Into<String>, value: TensorProto) -> Self {
        Self {
            t: Some(value),
            ..Self::typed(name, attribute_type::TENSOR)
        }
    }

    /// A list-of-floats attribute.
    pub fn floats(name: impl Into<String>, values: Vec<f32>) -> Self {
        Self {
            floats: values,
            ..Self::typed(name, attribute_type::FLOATS)
        }
    }

    /// A list-of-integers attribute.
    pub fn ints(name: impl Into<String>, values: Vec<i64>) -> Self {
        Self {
            ints: values,
            ..Self::typed(name, attribute_type::INTS)
        }
    }

    /// A list-of-strings attribute.
    pub fn strings(name: impl Into<String>, values: Vec<String>) -> Self {
        Self {
            strings: values.into_iter().map(String::into_bytes).collect(),
            ..Self::typed(name, attribute_type::STRINGS)
        }
    }

    /// A subgraph attribute (e.g. the body of `If`/`Loop`).
    pub fn graph(name: impl Into<String>, value: GraphProto) -> Self {
        Self {
            g: Some(value),
            ..Self::typed(name, attribute_type::GRAPH)
        }
    }
}

/// A constant tensor: initializer or embedded attribute payload.
///
/// Element data lives either in `raw_data` (little-endian, packed) or in the
/// typed field that `onnx.proto` assigns to `data_type`.
#[derive(Clone, PartialEq, Message)]
pub struct TensorProto {
    #[prost(int64, repeated, tag = "1")]
    pub dims: Vec<i64>,
    #[prost(int32, tag = "2")]
    pub data_type: i32,
    #[prost(float, repeated, tag = "4")]
    pub float_data: Vec<f32>,
    #[prost(int32, repeated, tag = "5")]
    pub int32_data: Vec<i32>,
    #[prost(bytes = "vec", repeated, tag = "6")]
    pub string_data: Vec<Vec<u8>>,
    #[prost(int64, repeated, tag = "7")]
    pub int64_data: Vec<i64>,
    #[prost(string, tag = "8")]
    pub name: String,
    #[prost(bytes = "vec", tag = "9")]
    pub raw_data: Vec<u8>,
    #[prost(double, repeated, tag = "10")]
    pub double_data: Vec<f64>,
    #[prost(uint64, repeated, tag = "11")]
    pub uint64_data: Vec<u64>,
    #[prost(string, tag = "12")]
    pub doc_string: String,
    #[prost(message, repeated, tag = "13")]
    pub external_data: Vec<StringStringEntryProto>,
    #[prost(int32, tag = "14")]
    pub data_location: i32,
}

impl TensorProto {
    /// A float32 tensor stored in `float_data`.
    pub fn from_f32(name: impl Into<String>, dims: Vec<i64>, values: Vec<f32>) -> Self {
        Self {
            name: name.into(),
            dims,
            data_type: data_type::FLOAT,
            float_data: values,
            ..Default::default()
        }
    }

    /// An int64 tensor stored in `int64_data`.
    pub fn from_i64(name: impl Into<String>, dims: Vec<i64>, values: Vec<i64>) -> Self {
        Self {
            name: name.into(),
            dims,
            data_type: data_type::INT64,
            int64_data: values,
            ..Default::default()
        }
    }

    /// A tensor of any element type stored as packed little-endian bytes.
    pub fn from_raw(
        name: impl Into<String>,
        data_type: i32,
        dims: Vec<i64>,
        raw_data: Vec<u8>,
    ) -> Self {
        Self {
            name: name.into(),
            dims,
            data_type,
            raw_data,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prost::Message;

    #[test]
    fn model_roundtrip() {
        let model = ModelProto {
            ir_version: 8,
            producer_name: Some("pytorch".into()),
            producer_version: Some("2.1.0".into()),
            graph: Some(GraphProto {
                name: "test".into(),
                node: vec![NodeProto::with_attrs(
                    "Conv",
                    "conv_0",
                    vec!["X".into(), "W".into()],
                    vec!["Y".into()],
                    vec![AttributeProto::ints("strides", vec![1, 1])],
                )],
                initializer: vec![TensorProto::from_f32("W", vec![1, 1, 1, 1], vec![0.5])],
                ..Default::default()
            }),
            opset_import: vec![OperatorSetIdProto {
                domain: String::new(),
                version: 17,
            }],
            ..Default::default()
        };

        let bytes = model.encode_to_vec();
        let decoded = ModelProto::decode(bytes.as_slice()).unwrap();
        assert_eq!(model, decoded);
    }

    #[test]
    fn unset_metadata_decodes_as_none() {
        let model = ModelProto {
            ir_version: 8,
            ..Default::default()
        };
        let decoded = ModelProto::decode(model.encode_to_vec().as_slice()).unwrap();
        assert_eq!(decoded.producer_name, None);
        assert_eq!(decoded.producer_version, None);
        assert_eq!(decoded.domain, None);
        assert_eq!(decoded.doc_string, None);
    }

    #[test]
    fn empty_metadata_string_is_preserved() {
        let model = ModelProto {
            producer_name: Some(String::new()),
            ..Default::default()
        };
        let decoded = ModelProto::decode(model.encode_to_vec().as_slice()).unwrap();
        assert_eq!(decoded.producer_name.as_deref(), Some(""));
    }

    #[test]
    fn attribute_helpers_set_kind() {
        assert_eq!(AttributeProto::float("alpha", 0.1).r#type, attribute_type::FLOAT);
        assert_eq!(AttributeProto::int("axis", 1).r#type, attribute_type::INT);
        assert_eq!(
            AttributeProto::string("mode", "constant").s,
            b"constant".to_vec()
        );
        let strings = AttributeProto::strings("dirs", vec!["forward".into(), "reverse".into()]);
        assert_eq!(strings.r#type, attribute_type::STRINGS);
        assert_eq!(strings.strings.len(), 2);
        let t = AttributeProto::tensor("value", TensorProto::from_i64("", vec![1], vec![3]));
        assert_eq!(t.r#type, attribute_type::TENSOR);
        assert!(t.t.is_some());
    }

    #[test]
    fn unpacked_ints_decode() {
        // onnx.proto declares `ints` without [packed = true]; make sure the
        // encoding prost emits for it survives a round trip.
        let attr = AttributeProto::ints("pads", vec![0, 1, 0, 1]);
        let decoded = AttributeProto::decode(attr.encode_to_vec().as_slice()).unwrap();
        assert_eq!(decoded.ints, vec![0, 1, 0, 1]);
    }

    #[test]
    fn graph_io_declarations_are_skipped() {
        // input { name: "x" }, output { name: "y" }, then node { op_type: "Relu" }
        let bytes = [
            0x5a, 0x03, 0x0a, 0x01, b'x', //
            0x62, 0x03, 0x0a, 0x01, b'y', //
            0x0a, 0x06, 0x22, 0x04, b'R', b'e', b'l', b'u',
        ];
        let graph = GraphProto::decode(bytes.as_slice()).unwrap();
        assert_eq!(graph.node.len(), 1);
        assert_eq!(graph.node[0].op_type, "Relu");
    }
}
