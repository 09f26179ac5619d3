//! End-to-end tests for onnxviz live under `tests/`.
