//! Tensor materialization.
//!
//! Turns a [`TensorProto`] into a [`TensorValue`]: the declared shape, the
//! element type name, and every element widened to `f64` in storage
//! (row-major) order. Nothing is truncated; a payload that disagrees with its
//! declared shape or type is an error, never a partial tensor.

use std::fmt;

use half::{bf16, f16};
use onnxviz_proto::{TensorProto, data_location, data_type};
use serde::{Serialize, Serializer};

use crate::error::TensorError;

/// Element types that have a numeric rendering.
///
/// Serialized names follow NumPy / `ml_dtypes` spelling (`float32`, `int64`,
/// `float8_e4m3fn`, ...).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ElementType {
    Float32,
    Uint8,
    Int8,
    Uint16,
    Int16,
    Int32,
    Int64,
    Bool,
    Float16,
    Float64,
    Uint32,
    Uint64,
    BFloat16,
    Float8E4M3FN,
    Float8E4M3FNUZ,
    Float8E5M2,
    Float8E5M2FNUZ,
    Uint4,
    Int4,
}

impl ElementType {
    /// Maps a `TensorProto.DataType` code, or `None` for types without a
    /// numeric rendering.
    pub fn from_onnx(code: i32) -> Option<Self> {
        Some(match code {
            data_type::FLOAT => Self::Float32,
            data_type::UINT8 => Self::Uint8,
            data_type::INT8 => Self::Int8,
            data_type::UINT16 => Self::Uint16,
            data_type::INT16 => Self::Int16,
            data_type::INT32 => Self::Int32,
            data_type::INT64 => Self::Int64,
            data_type::BOOL => Self::Bool,
            data_type::FLOAT16 => Self::Float16,
            data_type::DOUBLE => Self::Float64,
            data_type::UINT32 => Self::Uint32,
            data_type::UINT64 => Self::Uint64,
            data_type::BFLOAT16 => Self::BFloat16,
            data_type::FLOAT8E4M3FN => Self::Float8E4M3FN,
            data_type::FLOAT8E4M3FNUZ => Self::Float8E4M3FNUZ,
            data_type::FLOAT8E5M2 => Self::Float8E5M2,
            data_type::FLOAT8E5M2FNUZ => Self::Float8E5M2FNUZ,
            data_type::UINT4 => Self::Uint4,
            data_type::INT4 => Self::Int4,
            _ => return None,
        })
    }

    /// Canonical dtype name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Float32 => "float32",
            Self::Uint8 => "uint8",
            Self::Int8 => "int8",
            Self::Uint16 => "uint16",
            Self::Int16 => "int16",
            Self::Int32 => "int32",
            Self::Int64 => "int64",
            Self::Bool => "bool",
            Self::Float16 => "float16",
            Self::Float64 => "float64",
            Self::Uint32 => "uint32",
            Self::Uint64 => "uint64",
            Self::BFloat16 => "bfloat16",
            Self::Float8E4M3FN => "float8_e4m3fn",
            Self::Float8E4M3FNUZ => "float8_e4m3fnuz",
            Self::Float8E5M2 => "float8_e5m2",
            Self::Float8E5M2FNUZ => "float8_e5m2fnuz",
            Self::Uint4 => "uint4",
            Self::Int4 => "int4",
        }
    }

    /// Size in bytes of one storage unit in `raw_data`.
    ///
    /// 4-bit types pack two elements into each byte.
    pub fn byte_width(self) -> usize {
        match self {
            Self::Uint8 | Self::Int8 | Self::Bool | Self::Uint4 | Self::Int4 => 1,
            Self::Float8E4M3FN
            | Self::Float8E4M3FNUZ
            | Self::Float8E5M2
            | Self::Float8E5M2FNUZ => 1,
            Self::Uint16 | Self::Int16 | Self::Float16 | Self::BFloat16 => 2,
            Self::Float32 | Self::Int32 | Self::Uint32 => 4,
            Self::Int64 | Self::Float64 | Self::Uint64 => 8,
        }
    }

    /// Whether elements are 4-bit nibbles, low nibble first.
    pub fn is_nibble(self) -> bool {
        matches!(self, Self::Uint4 | Self::Int4)
    }

    /// Decodes one little-endian element. `b.len()` must equal [`byte_width`](Self::byte_width).
    ///
    /// Not used for nibble types; see [`unpack_nibbles`].
    fn decode_le(self, b: &[u8]) -> f64 {
        match self {
            Self::Uint8 | Self::Uint4 => f64::from(b[0]),
            Self::Int8 | Self::Int4 => f64::from(b[0] as i8),
            Self::Bool => f64::from(u8::from(b[0] != 0)),
            Self::Float8E4M3FN => match b[0] & 0x7f {
                0x7f => f64::NAN,
                _ => float8(b[0], 3, 7),
            },
            Self::Float8E4M3FNUZ => match b[0] {
                0x80 => f64::NAN,
                bits => float8(bits, 3, 8),
            },
            Self::Float8E5M2 => match (b[0] & 0x7c, b[0] & 0x03) {
                (0x7c, 0) if b[0] & 0x80 != 0 => f64::NEG_INFINITY,
                (0x7c, 0) => f64::INFINITY,
                (0x7c, _) => f64::NAN,
                _ => float8(b[0], 2, 15),
            },
            Self::Float8E5M2FNUZ => match b[0] {
                0x80 => f64::NAN,
                bits => float8(bits, 2, 16),
            },
            Self::Uint16 => f64::from(u16::from_le_bytes([b[0], b[1]])),
            Self::Int16 => f64::from(i16::from_le_bytes([b[0], b[1]])),
            Self::Float16 => f16::from_le_bytes([b[0], b[1]]).to_f64(),
            Self::BFloat16 => bf16::from_le_bytes([b[0], b[1]]).to_f64(),
            Self::Float32 => f64::from(f32::from_le_bytes([b[0], b[1], b[2], b[3]])),
            Self::Int32 => f64::from(i32::from_le_bytes([b[0], b[1], b[2], b[3]])),
            Self::Uint32 => f64::from(u32::from_le_bytes([b[0], b[1], b[2], b[3]])),
            Self::Int64 => {
                i64::from_le_bytes([b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]]) as f64
            }
            Self::Uint64 => {
                u64::from_le_bytes([b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]]) as f64
            }
            Self::Float64 => f64::from_le_bytes([b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]]),
        }
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Serialize for ElementType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

/// Finite value of an 8-bit float with `mant_bits` mantissa bits and the
/// given exponent bias. NaN and infinity encodings are the caller's job.
fn float8(bits: u8, mant_bits: u32, bias: i32) -> f64 {
    let sign = if bits & 0x80 != 0 { -1.0 } else { 1.0 };
    let exp = i32::from((bits & 0x7f) >> mant_bits);
    let scale = f64::from(1u8 << mant_bits);
    let mant = f64::from(bits & ((1u8 << mant_bits) - 1)) / scale;
    let magnitude = if exp == 0 {
        mant * 2f64.powi(1 - bias)
    } else {
        (1.0 + mant) * 2f64.powi(exp - bias)
    };
    sign * magnitude
}

/// Two elements per byte, low nibble first. A trailing padding nibble is
/// trimmed by [`materialize`] once the element count is known.
fn unpack_nibbles(dtype: ElementType, bytes: &[u8]) -> Vec<f64> {
    let widen = |n: u8| match dtype {
        ElementType::Int4 => f64::from(((n << 4) as i8) >> 4),
        _ => f64::from(n),
    };
    bytes
        .iter()
        .flat_map(|&b| [widen(b & 0x0f), widen(b >> 4)])
        .collect()
}

/// A fully materialized constant tensor.
///
/// Invariant: `values.len() == shape.iter().product()` (1 for a scalar).
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TensorValue {
    /// Dimension sizes, outermost first.
    pub shape: Vec<usize>,
    /// Element type of the source tensor.
    pub dtype: ElementType,
    /// Flattened elements in row-major order.
    pub values: Vec<f64>,
}

impl TensorValue {
    /// Number of elements implied by the shape.
    pub fn element_count(&self) -> usize {
        self.shape.iter().product()
    }

    /// Whether the tensor is a rank-0 scalar.
    pub fn is_scalar(&self) -> bool {
        self.shape.is_empty()
    }
}

/// Materialize a constant tensor.
pub fn materialize(tensor: &TensorProto) -> Result<TensorValue, TensorError> {
    if tensor.data_location == data_location::EXTERNAL {
        return Err(TensorError::ExternalData);
    }
    let dtype = ElementType::from_onnx(tensor.data_type)
        .ok_or(TensorError::UnsupportedDtype(tensor.data_type))?;

    let shape = tensor
        .dims
        .iter()
        .map(|&d| usize::try_from(d).map_err(|_| TensorError::NegativeDimension(d)))
        .collect::<Result<Vec<_>, _>>()?;
    let expected = shape
        .iter()
        .try_fold(1usize, |acc, &d| acc.checked_mul(d))
        .ok_or_else(|| TensorError::ShapeOverflow(tensor.dims.clone()))?;

    let mut values = if tensor.raw_data.is_empty() {
        typed_values(dtype, tensor)?
    } else {
        unpack_raw(dtype, &tensor.raw_data)?
    };

    if dtype.is_nibble() && expected % 2 == 1 && values.len() == expected.saturating_add(1) {
        values.pop();
    }

    if values.len() != expected {
        return Err(TensorError::ElementCount {
            shape,
            expected,
            actual: values.len(),
        });
    }

    Ok(TensorValue {
        shape,
        dtype,
        values,
    })
}

fn unpack_raw(dtype: ElementType, raw: &[u8]) -> Result<Vec<f64>, TensorError> {
    if dtype.is_nibble() {
        return Ok(unpack_nibbles(dtype, raw));
    }
    let width = dtype.byte_width();
    if raw.len() % width != 0 {
        return Err(TensorError::RawLength {
            dtype: dtype.name(),
            len: raw.len(),
            width,
        });
    }
    Ok(raw.chunks_exact(width).map(|c| dtype.decode_le(c)).collect())
}

/// Reads the typed field `onnx.proto` assigns to `dtype`.
///
/// Types narrower than 32 bits travel in `int32_data`; float16, bfloat16 and
/// float8 are stored there as raw bit patterns, 4-bit types as packed bytes.
fn typed_values(dtype: ElementType, tensor: &TensorProto) -> Result<Vec<f64>, TensorError> {
    let int32 = |f: fn(i32) -> f64| -> Vec<f64> {
        tensor.int32_data.iter().map(|&v| f(v)).collect()
    };
    Ok(match dtype {
        ElementType::Float32 => tensor.float_data.iter().map(|&v| f64::from(v)).collect(),
        ElementType::Float64 => tensor.double_data.clone(),
        ElementType::Int64 => tensor.int64_data.iter().map(|&v| v as f64).collect(),
        ElementType::Uint32 => tensor
            .uint64_data
            .iter()
            .map(|&v| {
                u32::try_from(v)
                    .map(f64::from)
                    .map_err(|_| TensorError::OutOfRange {
                        dtype: dtype.name(),
                        value: v,
                    })
            })
            .collect::<Result<Vec<f64>, _>>()?,
        ElementType::Uint64 => tensor.uint64_data.iter().map(|&v| v as f64).collect(),
        ElementType::Int32 => int32(f64::from),
        ElementType::Int16 => int32(|v| f64::from(v as i16)),
        ElementType::Uint16 => int32(|v| f64::from(v as u16)),
        ElementType::Int8 => int32(|v| f64::from(v as i8)),
        ElementType::Uint8 => int32(|v| f64::from(v as u8)),
        ElementType::Bool => int32(|v| f64::from(u8::from(v != 0))),
        ElementType::Float16 => int32(|v| f16::from_bits(v as u16).to_f64()),
        ElementType::BFloat16 => int32(|v| bf16::from_bits(v as u16).to_f64()),
        ElementType::Float8E4M3FN
        | ElementType::Float8E4M3FNUZ
        | ElementType::Float8E5M2
        | ElementType::Float8E5M2FNUZ => tensor
            .int32_data
            .iter()
            .map(|&v| dtype.decode_le(&[v as u8]))
            .collect(),
        ElementType::Uint4 | ElementType::Int4 => {
            let packed: Vec<u8> = tensor.int32_data.iter().map(|&v| v as u8).collect();
            unpack_nibbles(dtype, &packed)
        }
    })
}
