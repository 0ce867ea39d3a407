//! # Flatpack - Schema-Driven JSON Unpacking
//!
//! A library for flattening nested JSON into flat tables: describe the
//! content in a compact plain-text schema, and the unpacker explodes lists
//! and unnests structs until one column per leaf path remains, applying
//! field renames along the way.
//!
//! ## Modules
//!
//! - **schema**: type tree, schema-text parser, rename map, type inference
//! - **frame**: minimal columnar frame with `explode`/`unnest`/`rename`
//! - **unpack**: the recursive flattening core
//!
//! ## Quick Start
//!
//! ### Schema-driven unpacking
//!
//! ```rust
//! use flatpack::{parse_schema, unpack_rows};
//! use serde_json::json;
//!
//! # fn main() -> anyhow::Result<()> {
//! let schema = parse_schema(
//!     "column: Utf8
//!      nested: List(
//!          Struct(
//!              attr: UInt8
//!              attr2=renamed: UInt8
//!          )
//!      )
//!      missing_from_source: Float32",
//! )?;
//!
//! let rows = [json!({
//!     "column": "content",
//!     "nested": [{"attr": 0, "attr2": 2}, {"attr": 1, "attr2": 3}],
//!     "omitted_in_schema": "ignored"
//! })];
//!
//! let frame = unpack_rows(&rows, &schema)?;
//! // one row per list element, scalars duplicated, declared-but-absent
//! // columns null-filled, renames applied
//! assert_eq!(frame.height(), 2);
//! assert_eq!(
//!     frame.column_names(),
//!     vec!["column", "nested.attr", "renamed", "missing_from_source"]
//! );
//! # Ok(())
//! # }
//! ```
//!
//! ### Schema-free unpacking
//!
//! ```rust
//! use flatpack::unpack_rows_inferred;
//! use serde_json::json;
//!
//! # fn main() -> anyhow::Result<()> {
//! let frame = unpack_rows_inferred(&[json!({"nested": {"foo": 1, "bar": 2}})])?;
//! assert_eq!(frame.column_names(), vec!["nested.bar", "nested.foo"]);
//! # Ok(())
//! # }
//! ```

use anyhow::{Context, Result};
use serde_json::Value;
use std::io::BufRead;
use std::path::Path;

pub mod frame;
pub mod schema;
pub mod unpack;

// Re-export commonly used types for convenience
pub use frame::{Column, Frame, UnpackError};
pub use schema::{infer_type, parse_schema, DataType, Field, ScalarKind, SchemaError};
pub use unpack::{unpack_rows, unpack_rows_inferred};

/// Read newline-delimited JSON into row values, skipping blank lines.
pub fn read_ndjson<R: BufRead>(reader: R) -> Result<Vec<Value>> {
    let mut rows = Vec::new();
    for line in reader.lines() {
        let line = line.context("Failed to read line")?;
        if line.trim().is_empty() {
            continue;
        }
        rows.push(serde_json::from_str(&line).context("Failed to parse JSON")?);
    }
    Ok(rows)
}

/// Main entry point: unpack an NDJSON file according to a plain-text schema
/// file.
pub fn unpack_ndjson<P: AsRef<Path>, Q: AsRef<Path>>(path_schema: P, path_data: Q) -> Result<Frame> {
    let source = std::fs::read_to_string(&path_schema).with_context(|| {
        format!("Failed to read schema {}", path_schema.as_ref().display())
    })?;
    let tree = parse_schema(&source)?;

    let file = std::fs::File::open(&path_data)
        .with_context(|| format!("Failed to open {}", path_data.as_ref().display()))?;
    let rows = read_ndjson(std::io::BufReader::new(file))?;

    Ok(unpack_rows(&rows, &tree)?)
}

/// Scan an NDJSON file and return its inferred schema as plain text, a
/// head start for writing a schema by hand.
pub fn infer_schema<P: AsRef<Path>>(path_data: P) -> Result<String> {
    let file = std::fs::File::open(&path_data)
        .with_context(|| format!("Failed to open {}", path_data.as_ref().display()))?;
    let rows = read_ndjson(std::io::BufReader::new(file))?;
    Ok(infer_type(&rows).schema_text())
}
