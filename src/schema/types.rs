//! The type tree: the parsed, immutable description of nested JSON content.
//!
//! A schema string parses into a [`DataType`] whose root is always a
//! [`DataType::Struct`] (the implicit top level). The tree is built once by
//! the parser and consumed read-only by the unpacker.

use std::fmt;

/// Primitive (leaf) type identifiers.
///
/// Each scalar leaf in the type tree contributes exactly one column to the
/// flattened output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarKind {
    Null,
    Bool,
    Int8,
    Int16,
    Int32,
    Int64,
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    Float32,
    Float64,
    String,
    Date,
    Datetime,
    Time,
    Binary,
}

impl ScalarKind {
    /// Look up a schema keyword. Matching is case-sensitive over the
    /// canonical names plus a handful of lowercase shorthands.
    pub fn from_keyword(token: &str) -> Option<Self> {
        let kind = match token {
            "Null" => ScalarKind::Null,
            "Bool" | "Boolean" | "bool" => ScalarKind::Bool,
            "Int8" => ScalarKind::Int8,
            "Int16" => ScalarKind::Int16,
            "Int32" => ScalarKind::Int32,
            "Int64" | "int" | "integer" => ScalarKind::Int64,
            "UInt8" => ScalarKind::UInt8,
            "UInt16" => ScalarKind::UInt16,
            "UInt32" => ScalarKind::UInt32,
            "UInt64" => ScalarKind::UInt64,
            "Float32" => ScalarKind::Float32,
            "Float64" | "float" | "real" => ScalarKind::Float64,
            "String" | "Utf8" | "string" => ScalarKind::String,
            "Date" => ScalarKind::Date,
            "Datetime" => ScalarKind::Datetime,
            "Time" => ScalarKind::Time,
            "Binary" => ScalarKind::Binary,
            _ => return None,
        };
        Some(kind)
    }

    /// Canonical keyword, as emitted when serializing a tree back to schema
    /// text.
    pub fn keyword(self) -> &'static str {
        match self {
            ScalarKind::Null => "Null",
            ScalarKind::Bool => "Bool",
            ScalarKind::Int8 => "Int8",
            ScalarKind::Int16 => "Int16",
            ScalarKind::Int32 => "Int32",
            ScalarKind::Int64 => "Int64",
            ScalarKind::UInt8 => "UInt8",
            ScalarKind::UInt16 => "UInt16",
            ScalarKind::UInt32 => "UInt32",
            ScalarKind::UInt64 => "UInt64",
            ScalarKind::Float32 => "Float32",
            ScalarKind::Float64 => "Float64",
            ScalarKind::String => "String",
            ScalarKind::Date => "Date",
            ScalarKind::Datetime => "Datetime",
            ScalarKind::Time => "Time",
            ScalarKind::Binary => "Binary",
        }
    }
}

/// A node in the type tree.
#[derive(Debug, Clone, PartialEq)]
pub enum DataType {
    /// A primitive leaf; passed through unchanged by the unpacker.
    Scalar(ScalarKind),
    /// Ordered homogeneous repetition of one element type; unpacked by
    /// exploding one row per element.
    List(Box<DataType>),
    /// Named fields in declaration order; unpacked by unnesting one sibling
    /// column per field.
    Struct(Vec<Field>),
}

impl DataType {
    pub fn is_scalar(&self) -> bool {
        matches!(self, DataType::Scalar(_))
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            DataType::Scalar(kind) => kind.keyword(),
            DataType::List(_) => "List",
            DataType::Struct(_) => "Struct",
        }
    }

    /// Number of scalar leaves, i.e. the number of columns unpacking this
    /// tree produces.
    pub fn leaf_count(&self) -> usize {
        match self {
            DataType::Scalar(_) => 1,
            DataType::List(element) => element.leaf_count(),
            DataType::Struct(fields) => fields.iter().map(|f| f.dtype.leaf_count()).sum(),
        }
    }

    /// Render the tree as schema text, treating the root struct as the
    /// implicit top level (one field per line, no wrapping `Struct(...)`).
    ///
    /// Re-parsing the returned text yields a structurally equal tree.
    pub fn schema_text(&self) -> String {
        let mut out = String::new();
        match self {
            DataType::Struct(fields) => {
                for field in fields {
                    write_field(&mut out, field, 0);
                }
            }
            other => write_dtype(&mut out, other, 0),
        }
        out.truncate(out.trim_end().len());
        out
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = String::new();
        write_dtype(&mut out, self, 0);
        f.write_str(out.trim_end())
    }
}

/// A named struct member, optionally carrying a user-requested output name.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    /// Name on the source (JSON) side; used to address the nested value.
    pub name: String,
    /// User-requested output name, from the `name=rename` schema syntax.
    pub rename: Option<String>,
    pub dtype: DataType,
}

impl Field {
    pub fn new(name: impl Into<String>, dtype: DataType) -> Self {
        Field {
            name: name.into(),
            rename: None,
            dtype,
        }
    }

    pub fn renamed(name: impl Into<String>, rename: impl Into<String>, dtype: DataType) -> Self {
        Field {
            name: name.into(),
            rename: Some(rename.into()),
            dtype,
        }
    }

    /// The name this field surfaces under in the output; the source name
    /// unless a rename was declared.
    pub fn output_name(&self) -> &str {
        self.rename.as_deref().unwrap_or(&self.name)
    }
}

const INDENT: &str = "    ";

fn write_field(out: &mut String, field: &Field, depth: usize) {
    for _ in 0..depth {
        out.push_str(INDENT);
    }
    if !field.name.is_empty() {
        out.push_str(&field.name);
        if let Some(rename) = &field.rename {
            out.push('=');
            out.push_str(rename);
        }
        out.push_str(": ");
    }
    write_dtype(out, &field.dtype, depth);
}

fn write_dtype(out: &mut String, dtype: &DataType, depth: usize) {
    match dtype {
        DataType::Scalar(kind) => {
            out.push_str(kind.keyword());
            out.push('\n');
        }
        DataType::List(element) if element.is_scalar() => {
            out.push_str("List(");
            out.push_str(element.type_name());
            out.push_str(")\n");
        }
        DataType::List(element) => {
            out.push_str("List(\n");
            for _ in 0..=depth {
                out.push_str(INDENT);
            }
            write_dtype(out, element, depth + 1);
            for _ in 0..depth {
                out.push_str(INDENT);
            }
            out.push_str(")\n");
        }
        DataType::Struct(fields) => {
            out.push_str("Struct(\n");
            for field in fields {
                write_field(out, field, depth + 1);
            }
            for _ in 0..depth {
                out.push_str(INDENT);
            }
            out.push_str(")\n");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyword_lookup() {
        assert_eq!(ScalarKind::from_keyword("Int64"), Some(ScalarKind::Int64));
        assert_eq!(ScalarKind::from_keyword("Utf8"), Some(ScalarKind::String));
        assert_eq!(ScalarKind::from_keyword("int"), Some(ScalarKind::Int64));
        assert_eq!(ScalarKind::from_keyword("real"), Some(ScalarKind::Float64));
        // case-sensitive: no titlecased shorthands, no lowercased canonicals
        assert_eq!(ScalarKind::from_keyword("Uint8"), None);
        assert_eq!(ScalarKind::from_keyword("INT64"), None);
    }

    #[test]
    fn test_leaf_count() {
        let tree = DataType::Struct(vec![
            Field::new("text", DataType::Scalar(ScalarKind::String)),
            Field::new(
                "json",
                DataType::List(Box::new(DataType::Struct(vec![
                    Field::new("foo", DataType::Scalar(ScalarKind::Int64)),
                    Field::new("bar", DataType::Scalar(ScalarKind::Int64)),
                ]))),
            ),
        ]);
        assert_eq!(tree.leaf_count(), 3);
    }

    #[test]
    fn test_schema_text_flat() {
        let tree = DataType::Struct(vec![
            Field::new("text", DataType::Scalar(ScalarKind::String)),
            Field::renamed("attr", "renamed", DataType::Scalar(ScalarKind::UInt8)),
        ]);
        assert_eq!(tree.schema_text(), "text: String\nattr=renamed: UInt8");
    }

    #[test]
    fn test_schema_text_nested() {
        let tree = DataType::Struct(vec![Field::new(
            "nested",
            DataType::Struct(vec![
                Field::new("foo", DataType::Scalar(ScalarKind::Float32)),
                Field::new("vector", DataType::List(Box::new(DataType::Scalar(ScalarKind::UInt8)))),
            ]),
        )]);
        assert_eq!(
            tree.schema_text(),
            "nested: Struct(\n    foo: Float32\n    vector: List(UInt8)\n)"
        );
    }
}
