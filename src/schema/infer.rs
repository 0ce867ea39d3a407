//! Type-tree inference from sample JSON rows.
//!
//! Scanning a handful of NDJSON records yields a [`DataType`] tree that can
//! drive schema-free unpacking, or be pretty-printed as a head start for a
//! hand-written schema. Types are merged across rows: integers widen to
//! floats, nulls yield to whatever else was seen, struct fields union (in
//! `serde_json::Map` key order), and list elements merge recursively.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};

use crate::schema::types::{DataType, Field, ScalarKind};

// Pre-compiled patterns for temporal format detection
static ISO_DATETIME_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}(\.\d+)?(Z|[+-]\d{2}:\d{2})?$").unwrap()
});

static ISO_DATE_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").unwrap());

static ISO_TIME_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{2}:\d{2}:\d{2}(\.\d+)?$").unwrap());

/// Infer a type tree from example rows. The root is always a struct; a
/// non-object row contributes a single anonymous field, mirroring how a
/// bare `"Int64"` schema parses.
pub fn infer_type(examples: &[Value]) -> DataType {
    let mut merged: Option<DataType> = None;
    for example in examples {
        let row = match example {
            Value::Object(obj) => DataType::Struct(infer_fields(obj)),
            other => DataType::Struct(vec![Field::new("", infer_value(other))]),
        };
        merged = Some(match merged {
            Some(tree) => merge(tree, row),
            None => row,
        });
    }
    merged.unwrap_or_else(|| DataType::Struct(vec![Field::new("", DataType::Scalar(ScalarKind::Null))]))
}

fn infer_fields(obj: &Map<String, Value>) -> Vec<Field> {
    obj.iter()
        .map(|(key, value)| Field::new(key.clone(), infer_value(value)))
        .collect()
}

fn infer_value(value: &Value) -> DataType {
    match value {
        Value::Null => DataType::Scalar(ScalarKind::Null),
        Value::Bool(_) => DataType::Scalar(ScalarKind::Bool),
        Value::Number(n) => {
            if n.is_f64() {
                DataType::Scalar(ScalarKind::Float64)
            } else {
                DataType::Scalar(ScalarKind::Int64)
            }
        }
        Value::String(s) => DataType::Scalar(detect_temporal(s).unwrap_or(ScalarKind::String)),
        Value::Array(items) => {
            let mut element: Option<DataType> = None;
            for item in items {
                let inferred = infer_value(item);
                element = Some(match element {
                    Some(current) => merge(current, inferred),
                    None => inferred,
                });
            }
            DataType::List(Box::new(
                element.unwrap_or(DataType::Scalar(ScalarKind::Null)),
            ))
        }
        Value::Object(obj) => DataType::Struct(infer_fields(obj)),
    }
}

/// Merge two inferred trees into one that describes both.
fn merge(a: DataType, b: DataType) -> DataType {
    use DataType::*;
    use ScalarKind::*;

    match (a, b) {
        (a, b) if a == b => a,
        // null yields to anything
        (Scalar(Null), other) | (other, Scalar(Null)) => other,
        (Scalar(Int64), Scalar(Float64)) | (Scalar(Float64), Scalar(Int64)) => Scalar(Float64),
        // disagreeing string formats fall back to plain strings
        (Scalar(String), Scalar(Date | Datetime | Time))
        | (Scalar(Date | Datetime | Time), Scalar(String)) => Scalar(String),
        (List(a), List(b)) => List(Box::new(merge(*a, *b))),
        (Struct(a), Struct(b)) => Struct(merge_fields(a, b)),
        // irreconcilable shapes degrade to strings rather than failing:
        // inference is a convenience, the schema path is the dominant one
        _ => Scalar(String),
    }
}

fn merge_fields(mut a: Vec<Field>, b: Vec<Field>) -> Vec<Field> {
    for field in b {
        match a.iter_mut().find(|f| f.name == field.name) {
            Some(existing) => {
                let merged = merge(
                    std::mem::replace(&mut existing.dtype, DataType::Scalar(ScalarKind::Null)),
                    field.dtype,
                );
                existing.dtype = merged;
            }
            None => a.push(field),
        }
    }
    a
}

fn detect_temporal(value: &str) -> Option<ScalarKind> {
    let len = value.len();
    let bytes = value.as_bytes();

    // cheap shape checks before reaching for the regexes
    if len == 10 && bytes[4] == b'-' && bytes[7] == b'-' && ISO_DATE_REGEX.is_match(value) {
        return Some(ScalarKind::Date);
    }
    if len >= 19 && bytes[10] == b'T' && ISO_DATETIME_REGEX.is_match(value) {
        return Some(ScalarKind::Datetime);
    }
    if len >= 8 && bytes[2] == b':' && ISO_TIME_REGEX.is_match(value) {
        return Some(ScalarKind::Time);
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_flat_object() {
        let tree = infer_type(&[json!({"name": "Alice", "age": 30})]);
        // serde_json::Map iterates keys alphabetically
        assert_eq!(
            tree,
            DataType::Struct(vec![
                Field::new("age", DataType::Scalar(ScalarKind::Int64)),
                Field::new("name", DataType::Scalar(ScalarKind::String)),
            ])
        );
    }

    #[test]
    fn test_nested() {
        let tree = infer_type(&[json!({
            "attribute": "test",
            "nested": {"foo": 1.23, "bar": -8, "vector": [0, 1, 2]}
        })]);
        assert_eq!(
            tree,
            DataType::Struct(vec![
                Field::new("attribute", DataType::Scalar(ScalarKind::String)),
                Field::new(
                    "nested",
                    DataType::Struct(vec![
                        Field::new("bar", DataType::Scalar(ScalarKind::Int64)),
                        Field::new("foo", DataType::Scalar(ScalarKind::Float64)),
                        Field::new(
                            "vector",
                            DataType::List(Box::new(DataType::Scalar(ScalarKind::Int64))),
                        ),
                    ])
                ),
            ])
        );
    }

    #[test]
    fn test_merge_across_rows() {
        let tree = infer_type(&[
            json!({"a": 1, "b": null}),
            json!({"a": 1.5, "b": "x", "c": true}),
        ]);
        assert_eq!(
            tree,
            DataType::Struct(vec![
                Field::new("a", DataType::Scalar(ScalarKind::Float64)),
                Field::new("b", DataType::Scalar(ScalarKind::String)),
                Field::new("c", DataType::Scalar(ScalarKind::Bool)),
            ])
        );
    }

    #[test]
    fn test_temporal_detection() {
        let tree = infer_type(&[json!({
            "d": "2021-01-01",
            "dt": "2021-01-01T12:00:00Z",
            "t": "12:34:56",
            "s": "plain",
        })]);
        assert_eq!(
            tree,
            DataType::Struct(vec![
                Field::new("d", DataType::Scalar(ScalarKind::Date)),
                Field::new("dt", DataType::Scalar(ScalarKind::Datetime)),
                Field::new("s", DataType::Scalar(ScalarKind::String)),
                Field::new("t", DataType::Scalar(ScalarKind::Time)),
            ])
        );
    }

    #[test]
    fn test_non_object_rows() {
        let tree = infer_type(&[json!(1), json!(2)]);
        assert_eq!(
            tree,
            DataType::Struct(vec![Field::new("", DataType::Scalar(ScalarKind::Int64))])
        );
    }

    #[test]
    fn test_empty_list_element_yields_to_later_rows() {
        let tree = infer_type(&[json!({"v": []}), json!({"v": [1, 2]})]);
        assert_eq!(
            tree,
            DataType::Struct(vec![Field::new(
                "v",
                DataType::List(Box::new(DataType::Scalar(ScalarKind::Int64)))
            )])
        );
    }
}
