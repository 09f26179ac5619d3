//! Error types for graph extraction.

/// Errors that make a constant tensor impossible to materialize.
#[derive(Debug, thiserror::Error)]
pub enum TensorError {
    /// The element type has no numeric rendering (string, complex, ...).
    #[error("unsupported tensor element type {0}")]
    UnsupportedDtype(i32),

    /// A declared dimension is negative.
    #[error("negative dimension {0} in tensor shape")]
    NegativeDimension(i64),

    /// The product of the declared dimensions does not fit in `usize`.
    #[error("tensor shape {0:?} overflows the element count")]
    ShapeOverflow(Vec<i64>),

    /// `raw_data` is not a whole number of elements.
    #[error("raw data of {len} bytes is not a multiple of the {width}-byte {dtype} element")]
    RawLength {
        dtype: &'static str,
        len: usize,
        width: usize,
    },

    /// The number of stored elements disagrees with the declared shape.
    #[error("shape {shape:?} expects {expected} elements, found {actual}")]
    ElementCount {
        shape: Vec<usize>,
        expected: usize,
        actual: usize,
    },

    /// A typed-field value does not fit the declared element type.
    #[error("value {value} is out of range for {dtype}")]
    OutOfRange { dtype: &'static str, value: u64 },

    /// The tensor references data stored outside the model buffer.
    #[error("tensor data is stored externally")]
    ExternalData,

    /// A tensor attribute carries no tensor payload.
    #[error("tensor attribute has no payload")]
    MissingPayload,
}

/// Errors raised while decoding a single attribute.
#[derive(Debug, thiserror::Error)]
pub enum AttributeError {
    /// The embedded tensor could not be materialized.
    #[error(transparent)]
    Tensor(#[from] TensorError),

    /// A string payload is not valid UTF-8.
    #[error("string payload is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// Errors that abort extraction of a whole model.
///
/// There is no partial result: any of these means the response is not built.
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    /// The input buffer could not be decoded into a model.
    #[error("invalid model: {0}")]
    InvalidModel(#[from] onnxviz_proto::DecodeError),

    /// An initializer could not be materialized.
    #[error("failed to materialize weight '{name}': {source}")]
    Weight {
        name: String,
        #[source]
        source: TensorError,
    },

    /// An attribute payload of a node could not be decoded.
    #[error("failed to decode attribute '{attribute}' of node '{node}': {source}")]
    Attribute {
        node: String,
        attribute: String,
        #[source]
        source: AttributeError,
    },
}
