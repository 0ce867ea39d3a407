//! flatpack-unpack: flatten nested NDJSON into a flat table
//!
//! Usage:
//!   # Read from file, output flat NDJSON to stdout
//!   flatpack-unpack complex.schema complex.ndjson
//!
//!   # Read data from stdin
//!   echo '{"text": "foobar", "json": [0, 1, 2, 3]}' | flatpack-unpack my.schema
//!
//!   # Only unpack the first 3 records
//!   flatpack-unpack --limit 3 complex.schema complex.ndjson

// Use MiMalloc allocator for better performance (recommended by simd-json)
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use anyhow::{Context, Result};
use clap::Parser;
use flatpack::{parse_schema, unpack_rows, Frame};
use serde_json::Value;
use std::fs::File;
use std::io::{BufRead, BufReader, Read, Write};

#[derive(Parser, Debug)]
#[command(name = "flatpack-unpack")]
#[command(about = "Flatten nested NDJSON into a flat table", long_about = None)]
struct Args {
    /// Plain-text schema file describing the JSON content
    #[arg(value_name = "SCHEMA")]
    schema: String,

    /// Input NDJSON file (use stdin if omitted)
    #[arg(value_name = "FILE")]
    input: Option<String>,

    /// Only unpack the first N records
    #[arg(long)]
    limit: Option<usize>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let source = std::fs::read_to_string(&args.schema)
        .with_context(|| format!("Failed to read schema {}", args.schema))?;
    let tree = parse_schema(&source)?;

    let reader: Box<dyn Read> = if let Some(file_path) = &args.input {
        Box::new(File::open(file_path).with_context(|| format!("Failed to open {file_path}"))?)
    } else {
        Box::new(std::io::stdin())
    };
    let rows = read_rows(reader, args.limit)?;

    let frame = unpack_rows(&rows, &tree)?;
    write_frame(&frame)
}

/// Read NDJSON rows using SIMD-accelerated JSON parsing.
fn read_rows(reader: Box<dyn Read>, limit: Option<usize>) -> Result<Vec<Value>> {
    let mut rows = Vec::new();
    for line in BufReader::new(reader).lines() {
        let line = line.context("Failed to read line")?;
        if line.trim().is_empty() {
            continue;
        }
        let mut bytes = line.into_bytes();
        let value: Value =
            simd_json::serde::from_slice(&mut bytes).context("Failed to parse JSON")?;
        rows.push(value);
        if limit.is_some_and(|n| rows.len() >= n) {
            break;
        }
    }
    Ok(rows)
}

/// Write the flat frame as NDJSON, one object per row.
fn write_frame(frame: &Frame) -> Result<()> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    for row in frame.to_rows() {
        serde_json::to_writer(&mut out, &row).context("Failed to serialize row")?;
        out.write_all(b"\n").context("Failed to write row")?;
    }
    out.flush().context("Failed to flush stdout")
}
