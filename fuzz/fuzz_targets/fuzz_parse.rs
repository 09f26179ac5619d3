#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Arbitrary bytes must yield a model or an error, never a panic.
    if let Ok(parsed) = onnxviz_graph::parse_model(data) {
        for w in parsed.weights.values() {
            assert_eq!(w.values.len(), w.element_count());
        }
    }
});
