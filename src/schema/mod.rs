//! Plain-text schema handling
//!
//! This module owns the type tree, the schema-text parser, the rename map
//! derived from the tree, and type inference from sample rows.

pub mod error;
pub mod infer;
pub mod parser;
pub mod rename;
pub mod types;

pub use error::SchemaError;
pub use infer::infer_type;
pub use parser::parse_schema;
pub use rename::{join_path, rename_map, SEPARATOR};
pub use types::{DataType, Field, ScalarKind};
