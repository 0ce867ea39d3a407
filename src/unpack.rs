//! The recursive unpacker: nested columns in, flat table out.
//!
//! The algorithm is directed entirely by the type tree and descends one
//! level per step, so it terminates at the tree's depth:
//!
//! * a scalar column is already flat and is left alone;
//! * a list column is exploded (one row per element, siblings duplicated),
//!   picking up one repeated path segment per nesting level;
//! * a struct column is unnested into one sibling column per field, in
//!   declaration order, each child at `parent.child`.
//!
//! The top level is the implicit struct: the frame is conformed to it
//! (declared columns only, missing ones null-filled) without adding a path
//! segment. When the recursion is done, the rename map computed from the
//! tree is applied once, settling both user renames and the repeated list
//! segments.
//!
//! Schema-free unpacking runs the identical core over a tree built from the
//! columns' own declared types; with no rename annotations the map then
//! only collapses list paths.

use serde_json::Value;

use crate::frame::{Frame, UnpackError};
use crate::schema::rename::exploded_path;
use crate::schema::{infer_type, join_path, rename_map, DataType, Field};

impl Frame {
    /// Flatten this frame according to a type tree (conceptually the
    /// implicit top-level struct produced by the schema parser).
    pub fn unpack(self, tree: &DataType) -> Result<Frame, UnpackError> {
        let anonymous;
        let fields = match tree {
            DataType::Struct(fields) => fields.as_slice(),
            other => {
                anonymous = [Field::new("", other.clone())];
                anonymous.as_slice()
            }
        };

        let mut frame = self.conform(fields);
        for field in fields {
            frame = descend(frame, &field.dtype, &field.name)?;
        }
        frame.apply_renames(&rename_map(tree));
        Ok(frame)
    }

    /// Flatten without an explicit schema, driven by the columns' own
    /// declared nested types.
    pub fn unpack_inferred(self) -> Result<Frame, UnpackError> {
        let tree = DataType::Struct(
            self.columns()
                .iter()
                .map(|c| Field::new(c.name.clone(), c.dtype.clone()))
                .collect(),
        );
        self.unpack(&tree)
    }
}

fn descend(mut frame: Frame, dtype: &DataType, path: &str) -> Result<Frame, UnpackError> {
    match dtype {
        DataType::Scalar(_) => Ok(frame),
        DataType::List(element) => {
            let next = exploded_path(path);
            if next != path {
                frame.rename_column(path, &next)?;
            }
            frame.explode(&next)?;
            descend(frame, element, &next)
        }
        DataType::Struct(fields) => {
            frame.unnest(path)?;
            for field in fields {
                frame = descend(frame, &field.dtype, &join_path(path, &field.name))?;
            }
            Ok(frame)
        }
    }
}

/// Build a frame from row values and unpack it under an explicit tree.
pub fn unpack_rows(rows: &[Value], tree: &DataType) -> Result<Frame, UnpackError> {
    Frame::from_rows(rows, tree).unpack(tree)
}

/// Schema-free variant: infer the tree from the rows first, then run the
/// same recursion.
pub fn unpack_rows_inferred(rows: &[Value]) -> Result<Frame, UnpackError> {
    let tree = infer_type(rows);
    Frame::from_rows(rows, &tree).unpack(&tree)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::parse_schema;
    use serde_json::json;

    fn unpack(schema: &str, rows: &[Value]) -> Frame {
        let tree = parse_schema(schema).unwrap();
        unpack_rows(rows, &tree).unwrap()
    }

    #[test]
    fn test_lone_scalar() {
        let f = unpack("Int64", &[json!(1)]);
        assert_eq!(f.width(), 1);
        assert_eq!(f.height(), 1);
        assert_eq!(f.columns()[0].values, vec![json!(1)]);
    }

    #[test]
    fn test_list_of_scalars() {
        let f = unpack(
            "text:String,json:List(Int64)",
            &[json!({"text": "foobar", "json": [0, 1, 2, 3]})],
        );
        assert_eq!(f.height(), 4);
        assert_eq!(f.column_names(), vec!["text", "json"]);
        assert_eq!(f.column("text").unwrap().values, vec![json!("foobar"); 4]);
        assert_eq!(
            f.column("json").unwrap().values,
            vec![json!(0), json!(1), json!(2), json!(3)]
        );
    }

    #[test]
    fn test_struct_of_scalars() {
        let f = unpack(
            "text:String,json:Struct(foo:Int64,bar:Int64)",
            &[json!({"text": "foobar", "json": {"foo": 0, "bar": 1}})],
        );
        assert_eq!(f.height(), 1);
        assert_eq!(f.column_names(), vec!["text", "json.foo", "json.bar"]);
        assert_eq!(f.column("json.foo").unwrap().values, vec![json!(0)]);
        assert_eq!(f.column("json.bar").unwrap().values, vec![json!(1)]);
    }

    #[test]
    fn test_renames() {
        let f = unpack(
            "text=string:String,json:Struct(foo=fox:Int64,bar=bax:Int64)",
            &[json!({"text": "foobar", "json": {"foo": 0, "bar": 1}})],
        );
        assert_eq!(f.column_names(), vec!["string", "fox", "bax"]);
        assert_eq!(f.column("string").unwrap().values, vec![json!("foobar")]);
        assert_eq!(f.column("fox").unwrap().values, vec![json!(0)]);
        assert_eq!(f.column("bax").unwrap().values, vec![json!(1)]);
    }

    #[test]
    fn test_triple_nested_list() {
        // 2x2x2 nested array: three explosions, 8 rows, and the repeated
        // engine path `json.json.json.json` collapses back to `json`
        let f = unpack(
            "json:List(List(List(Int64)))",
            &[json!({"json": [[[0, 1], [2, 3]], [[4, 5], [6, 7]]]})],
        );
        assert_eq!(f.height(), 8);
        assert_eq!(f.column_names(), vec!["json"]);
        assert_eq!(
            f.column("json").unwrap().values,
            (0..8).map(|i| json!(i)).collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_struct_nested_in_list() {
        let f = unpack(
            "text:String,json:List(Struct(attr:UInt8,attr2=renamed:UInt8))",
            &[json!({
                "text": "foobar",
                "json": [{"attr": 0, "attr2": 2}, {"attr": 1, "attr2": 3}]
            })],
        );
        assert_eq!(f.height(), 2);
        assert_eq!(f.column_names(), vec!["text", "json.attr", "renamed"]);
        assert_eq!(f.column("json.attr").unwrap().values, vec![json!(0), json!(1)]);
        assert_eq!(f.column("renamed").unwrap().values, vec![json!(2), json!(3)]);
    }

    #[test]
    fn test_list_nested_in_struct() {
        let f = unpack(
            "json:Struct(foo:Struct(fox:Int64,foz:Int64),bar:List(Int64))",
            &[json!({"json": {"foo": {"fox": 0, "foz": 2}, "bar": [1, 3]}})],
        );
        assert_eq!(f.height(), 2);
        assert_eq!(
            f.column_names(),
            vec!["json.foo.fox", "json.foo.foz", "json.bar"]
        );
        assert_eq!(f.column("json.bar").unwrap().values, vec![json!(1), json!(3)]);
    }

    #[test]
    fn test_column_count_matches_leaf_count() {
        for schema in [
            "a: Int64",
            "a: List(List(Int64))",
            "a: Struct(b: Int64, c: List(Struct(d: Int64, e: String)))",
            "a: Int64, b: Struct(c: Struct(d: Struct(e: Float64)))",
        ] {
            let tree = parse_schema(schema).unwrap();
            let f = unpack_rows(&[], &tree).unwrap();
            assert_eq!(f.width(), tree.leaf_count(), "{schema}");
        }
    }

    #[test]
    fn test_scalar_only_tree_is_identity_modulo_renames() {
        let rows = [json!({"a": 1, "b": "x"}), json!({"a": 2, "b": "y"})];
        let f = unpack("a: Int64, b=c: String", &rows);
        assert_eq!(f.height(), 2);
        assert_eq!(f.column_names(), vec!["a", "c"]);
        assert_eq!(f.column("a").unwrap().values, vec![json!(1), json!(2)]);
        assert_eq!(f.column("c").unwrap().values, vec![json!("x"), json!("y")]);
    }

    #[test]
    fn test_missing_declared_field_is_null_filled() {
        let f = unpack(
            "column: String, missing_from_source: Float32",
            &[json!({"column": "content", "omitted_in_schema": "ignored"})],
        );
        assert_eq!(f.column_names(), vec!["column", "missing_from_source"]);
        assert_eq!(
            f.column("missing_from_source").unwrap().values,
            vec![Value::Null]
        );
    }

    #[test]
    fn test_shape_mismatch_surfaces_path() {
        let tree = parse_schema("json: Struct(foo: Int64)").unwrap();
        let err = unpack_rows(&[json!({"json": 42})], &tree).unwrap_err();
        match err {
            UnpackError::SchemaMismatch { path, .. } => assert_eq!(path, "json"),
            other => panic!("expected mismatch, got {other:?}"),
        }
    }

    #[test]
    fn test_unpack_inferred() {
        let rows = [
            json!({"text": "foo", "json": [0, 1]}),
            json!({"text": "bar", "json": [2]}),
        ];
        let f = unpack_rows_inferred(&rows).unwrap();
        // inferred field order follows serde_json::Map key order
        assert_eq!(f.column_names(), vec!["json", "text"]);
        assert_eq!(f.height(), 3);
        assert_eq!(
            f.column("json").unwrap().values,
            vec![json!(0), json!(1), json!(2)]
        );
        assert_eq!(
            f.column("text").unwrap().values,
            vec![json!("foo"), json!("foo"), json!("bar")]
        );
    }

    #[test]
    fn test_unpack_inferred_nested_struct() {
        let rows = [json!({"nested": {"attr": 0, "attr2": 2}})];
        let f = unpack_rows_inferred(&rows).unwrap();
        assert_eq!(f.column_names(), vec!["nested.attr", "nested.attr2"]);
    }
}
