use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use miette::{Context, IntoDiagnostic};
use serde_json::Value;
use tracing_subscriber::EnvFilter;

use onnxviz_graph::ParsedModel;

/// onnxviz — extract an ONNX model's operator graph for visualization
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Input ONNX model
    input: PathBuf,

    /// Output path (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = Format::Json)]
    format: Format,

    /// Pretty-print JSON output
    #[arg(long)]
    pretty: bool,

    /// Leave tensor value arrays out of JSON output
    #[arg(long)]
    no_values: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace); RUST_LOG overrides
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Format {
    /// Nodes, edges, weights and metadata as JSON
    Json,
    /// Human-readable text dump
    Summary,
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err:?}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run() -> miette::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    // 1. Read model file.
    let bytes = std::fs::read(&cli.input)
        .into_diagnostic()
        .wrap_err_with(|| format!("failed to read {}", cli.input.display()))?;
    log::info!("read {} bytes from {}", bytes.len(), cli.input.display());

    // 2. Decode and extract the graph.
    let parsed = onnxviz_graph::parse_model(&bytes)
        .map_err(|e| miette::miette!("{e}"))
        .wrap_err_with(|| format!("failed to parse {}", cli.input.display()))?;
    log::info!("{} nodes, {} edges", parsed.nodes.len(), parsed.edges.len());

    // 3. Render.
    let rendered = match cli.format {
        Format::Json => render_json(&parsed, cli.pretty, cli.no_values)?,
        Format::Summary => onnxviz_graph::dump_model(&parsed),
    };

    // 4. Write output.
    match &cli.output {
        Some(path) => std::fs::write(path, rendered)
            .into_diagnostic()
            .wrap_err_with(|| format!("failed to write {}", path.display()))?,
        None => print!("{rendered}"),
    }

    Ok(())
}

fn render_json(parsed: &ParsedModel, pretty: bool, no_values: bool) -> miette::Result<String> {
    let mut text = if no_values {
        let mut value = serde_json::to_value(parsed).into_diagnostic()?;
        strip_values(&mut value);
        to_json_string(&value, pretty)
    } else {
        to_json_string(parsed, pretty)
    }
    .into_diagnostic()
    .wrap_err("failed to serialize model")?;
    text.push('\n');
    Ok(text)
}

fn to_json_string<T: serde::Serialize + ?Sized>(
    value: &T,
    pretty: bool,
) -> serde_json::Result<String> {
    if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    }
}

/// Drops `values` from weights and from tensor-valued attributes.
fn strip_values(model: &mut Value) {
    if let Some(weights) = model.get_mut("weights").and_then(Value::as_object_mut) {
        for weight in weights.values_mut() {
            if let Some(obj) = weight.as_object_mut() {
                obj.remove("values");
            }
        }
    }
    let Some(nodes) = model.get_mut("nodes").and_then(Value::as_array_mut) else {
        return;
    };
    for node in nodes {
        let Some(attrs) = node.get_mut("attributes").and_then(Value::as_object_mut) else {
            continue;
        };
        for attr in attrs.values_mut() {
            if let Some(obj) = attr.as_object_mut() {
                if obj.get("type").and_then(Value::as_str) == Some("tensor") {
                    obj.remove("values");
                }
            }
        }
    }
}
