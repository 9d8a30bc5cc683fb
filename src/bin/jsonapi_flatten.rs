//! jsonapi-flatten: Flatten JSON:API documents into plain JSON
//!
//! Usage:
//!   # Read a document from a file, output to stdout
//!   jsonapi-flatten response.json
//!
//!   # Read from stdin with snake_case keys
//!   curl -s https://api.example.com/articles/1 | jsonapi-flatten --case snake_case
//!
//!   # Process NDJSON (one document per line) with compact output
//!   jsonapi-flatten --ndjson responses.jsonl --compact

// Use MiMalloc allocator for better performance (recommended by simd-json)
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use anyhow::{Context, Result};
use clap::Parser;
use jsonapi_flatten::{flatten_json, flatten_value, FlattenConfig, KeyCase};
use serde_json::Value;
use std::fs::File;
use std::io::{stdin, BufRead, BufReader, Read};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "jsonapi-flatten")]
#[command(about = "Flatten JSON:API documents into plain JSON", long_about = None)]
struct Args {
    /// Input file (use stdin if omitted)
    #[arg(value_name = "FILE")]
    input: Option<String>,

    /// Process newline-delimited JSON (one document per line)
    #[arg(long)]
    ndjson: bool,

    /// Compact output (no pretty-printing)
    #[arg(long)]
    compact: bool,

    /// Key casing: camelCase, CamelCase, kebab-case (dash-case, lisp-case,
    /// spinal-case) or snake_case (underscore_case)
    #[arg(long = "case", value_name = "CONVENTION", default_value = "camelCase")]
    key_case: KeyCase,

    /// Deepest relationship level to expand; deeper included targets become `{"id": ...}`
    #[arg(long, value_name = "DEPTH")]
    max_depth: Option<usize>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Diagnostics go to stderr so stdout stays valid JSON; RUST_LOG controls verbosity
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let mut config = FlattenConfig::default().with_key_case(args.key_case);
    if let Some(max_depth) = args.max_depth {
        config = config.with_max_depth(max_depth);
    }

    let reader: Box<dyn BufRead> = if let Some(file_path) = &args.input {
        Box::new(BufReader::new(
            File::open(file_path).with_context(|| format!("Failed to open {}", file_path))?,
        ))
    } else {
        Box::new(BufReader::new(stdin()))
    };

    let outputs = if args.ndjson {
        flatten_json(reader, &config).await?
    } else {
        let document = read_document(reader)?;
        vec![flatten_value(document, &config)
            .await
            .context("Failed to flatten document")?]
    };

    if outputs.is_empty() {
        eprintln!("Warning: No JSON:API documents found in input");
    }

    for output in outputs {
        let rendered = if args.compact {
            serde_json::to_string(&output)?
        } else {
            serde_json::to_string_pretty(&output)?
        };
        println!("{}", rendered);
    }

    Ok(())
}

/// Read one whole document, using SIMD-accelerated parsing when possible
fn read_document(mut reader: Box<dyn BufRead>) -> Result<Value> {
    let mut content = Vec::new();
    reader
        .read_to_end(&mut content)
        .context("Failed to read input")?;

    // simd-json parses in place, so keep the original bytes for the fallback
    let mut scratch = content.clone();
    match simd_json::serde::from_slice::<Value>(&mut scratch) {
        Ok(value) => Ok(value),
        Err(err) => {
            debug!(error = %err, "simd-json rejected input, retrying with serde_json");
            serde_json::from_slice(&content).context("Failed to parse JSON")
        }
    }
}
