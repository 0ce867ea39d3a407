//! flatpack-infer: print the inferred plain-text schema for NDJSON data
//!
//! A head start for writing a schema by hand: scan the data, infer the
//! nested type tree (with date/datetime/time detection on strings), and
//! print it in the same syntax `flatpack-unpack` consumes.
//!
//! Usage:
//!   # Read from file, output to stdout
//!   flatpack-infer complex.ndjson
//!
//!   # Read from stdin
//!   echo '{"attribute": "test", "nested": {"foo": 1.23}}' | flatpack-infer

// Use MiMalloc allocator for better performance (recommended by simd-json)
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use anyhow::{Context, Result};
use clap::Parser;
use flatpack::infer_type;
use serde_json::Value;
use std::fs::File;
use std::io::{stdin, BufRead, BufReader, Read};

#[derive(Parser, Debug)]
#[command(name = "flatpack-infer")]
#[command(about = "Infer a plain-text schema from NDJSON data", long_about = None)]
struct Args {
    /// Input NDJSON file (use stdin if omitted)
    #[arg(value_name = "FILE")]
    input: Option<String>,

    /// Only scan the first N records
    #[arg(long)]
    sample_size: Option<usize>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let reader: Box<dyn Read> = if let Some(file_path) = &args.input {
        Box::new(File::open(file_path).with_context(|| format!("Failed to open {file_path}"))?)
    } else {
        Box::new(stdin())
    };

    let mut rows: Vec<Value> = Vec::new();
    for line in BufReader::new(reader).lines() {
        let line = line.context("Failed to read line")?;
        if line.trim().is_empty() {
            continue;
        }
        let mut bytes = line.into_bytes();
        let value: Value =
            simd_json::serde::from_slice(&mut bytes).context("Failed to parse JSON")?;
        rows.push(value);
        if args.sample_size.is_some_and(|n| rows.len() >= n) {
            break;
        }
    }

    if rows.is_empty() {
        eprintln!("Warning: No JSON objects found in input");
    }

    println!("{}", infer_type(&rows).schema_text());

    Ok(())
}
