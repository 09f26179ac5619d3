use onnxviz_graph::ParsedModel;
use onnxviz_proto::{
    AttributeProto, GraphProto, ModelProto, NodeProto, OperatorSetIdProto, TensorProto,
    data_type,
};
use prost::Message;

/// Serialize a model the way an exporter would write it to disk.
#[allow(dead_code)]
pub fn encode(model: &ModelProto) -> Vec<u8> {
    model.encode_to_vec()
}

/// Encode, then run the full byte-level pipeline.
#[allow(dead_code)]
pub fn parse(model: &ModelProto) -> ParsedModel {
    onnxviz_graph::parse_model(&encode(model)).expect("model extraction failed")
}

/// Wrap a graph in a model envelope with an opset import and no metadata.
#[allow(dead_code)]
pub fn model_of(graph: GraphProto) -> ModelProto {
    ModelProto {
        ir_version: 9,
        graph: Some(graph),
        opset_import: vec![OperatorSetIdProto {
            domain: String::new(),
            version: 17,
        }],
        ..Default::default()
    }
}

#[allow(dead_code)]
pub fn strs(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

/// Unnamed `Conv` feeding `Relu` "r1", with a one-element weight `w`.
#[allow(dead_code)]
pub fn conv_relu() -> ModelProto {
    model_of(GraphProto {
        name: "conv_relu".into(),
        node: vec![
            NodeProto::simple("Conv", "", strs(&["x", "w"]), strs(&["y"])),
            NodeProto::simple("Relu", "r1", strs(&["y"]), strs(&["z"])),
        ],
        initializer: vec![TensorProto::from_f32("w", vec![1], vec![0.5])],
        ..Default::default()
    })
}

/// A small attention-like block with fan-out, fan-in, optional inputs,
/// repeated op types and attributes of most kinds.
#[allow(dead_code)]
pub fn attention_block() -> ModelProto {
    let raw_bias: Vec<u8> = [0.1f32, 0.2, 0.3, 0.4]
        .iter()
        .flat_map(|v| v.to_le_bytes())
        .collect();
    let mut graph = GraphProto {
        name: "attention".into(),
        node: vec![
            NodeProto::simple("MatMul", "q_proj", strs(&["x", "wq"]), strs(&["q"])),
            NodeProto::simple("MatMul", "k_proj", strs(&["x", "wk"]), strs(&["k"])),
            NodeProto::with_attrs(
                "Transpose",
                "",
                strs(&["k"]),
                strs(&["kt"]),
                vec![AttributeProto::ints("perm", vec![1, 0])],
            ),
            NodeProto::simple("MatMul", "scores", strs(&["q", "kt"]), strs(&["s"])),
            NodeProto::with_attrs(
                "Softmax",
                "",
                strs(&["s"]),
                strs(&["p"]),
                vec![
                    AttributeProto::int("axis", -1),
                    AttributeProto::int("axis", 1),
                ],
            ),
            NodeProto::with_attrs(
                "Clip",
                "",
                strs(&["p", "", "hi"]),
                strs(&["pc"]),
                vec![AttributeProto::string("note", "clamp")],
            ),
            NodeProto::with_attrs(
                "Constant",
                "hi_const",
                vec![],
                strs(&["hi"]),
                vec![AttributeProto::tensor(
                    "value",
                    TensorProto::from_f32("", vec![], vec![1.0]),
                )],
            ),
            NodeProto::with_attrs(
                "Add",
                "out",
                strs(&["pc", "bias"]),
                strs(&["y"]),
                vec![
                    AttributeProto::floats("scales", vec![0.5, 2.0]),
                    AttributeProto::strings("tags", vec!["a".into(), "b".into()]),
                    AttributeProto::float("alpha", 0.25),
                    AttributeProto::graph("body", GraphProto::default()),
                ],
            ),
        ],
        initializer: vec![
            TensorProto::from_f32("wq", vec![2, 2], vec![1.0, 0.0, 0.0, 1.0]),
            TensorProto::from_f32("wk", vec![2, 2], vec![0.5, 0.5, 0.5, 0.5]),
            TensorProto::from_raw("bias", data_type::FLOAT, vec![2, 2], raw_bias),
        ],
        ..Default::default()
    };
    graph.doc_string = "toy attention".into();
    let mut model = model_of(graph);
    model.producer_name = Some("onnxviz-tests".into());
    model.producer_version = Some("0.1".into());
    model
}
