//! Mapping from engine-generated column paths to user-facing output names.
//!
//! As the unpacker descends a type tree it names columns by their full
//! dotted source path: unnesting a struct prefixes each child with the
//! parent path, and exploding a list re-appends the column's own last
//! segment once per nesting level (`json` becomes `json.json`, then
//! `json.json.json`, ...). The map computed here associates every generated
//! path whose user-facing name differs with the name it should surface
//! under, so one `rename` at the end of the recursion settles all columns.

use std::collections::BTreeMap;

use crate::schema::types::DataType;

/// Separator joining field names into dotted column paths.
pub const SEPARATOR: char = '.';

/// Join a path prefix and a segment, tolerating either side being empty
/// (anonymous fields and the implicit top level contribute no segment).
pub fn join_path(prefix: &str, segment: &str) -> String {
    if prefix.is_empty() {
        segment.to_string()
    } else if segment.is_empty() {
        prefix.to_string()
    } else {
        format!("{prefix}{SEPARATOR}{segment}")
    }
}

/// The path a list column takes after one explosion: its own last segment
/// is appended again. Empty paths (anonymous top-level lists) stay put.
pub fn exploded_path(path: &str) -> String {
    if path.is_empty() {
        return String::new();
    }
    let last = path.rsplit(SEPARATOR).next().unwrap_or(path);
    format!("{path}{SEPARATOR}{last}")
}

/// Compute the rename map for a type tree. Pure; keys are unique because
/// source paths are unique by construction (field names are unique within
/// each struct level and lists only ever repeat their parent's segment).
pub fn rename_map(tree: &DataType) -> BTreeMap<String, String> {
    let mut map = BTreeMap::new();
    walk(tree, "", "", &mut map);
    map
}

fn walk(node: &DataType, source: &str, output: &str, map: &mut BTreeMap<String, String>) {
    match node {
        DataType::Scalar(_) => {
            if source != output {
                map.insert(source.to_string(), output.to_string());
            }
        }
        DataType::List(element) => {
            walk(element, &exploded_path(source), output, map);
        }
        DataType::Struct(fields) => {
            for field in fields {
                let field_source = join_path(source, &field.name);
                // a rename declared directly on a scalar leaf names the
                // output column outright; everywhere else the rename only
                // substitutes its own segment in the dotted path
                let field_output = match (&field.rename, field.dtype.is_scalar()) {
                    (Some(rename), true) => rename.clone(),
                    _ => join_path(output, field.output_name()),
                };
                // struct-level pairs are recorded too; applying the whole
                // map at once only matches final column names, so the
                // extra entries are inert
                if field_source != field_output && !field.dtype.is_scalar() {
                    map.insert(field_source.clone(), field_output.clone());
                }
                walk(&field.dtype, &field_source, &field_output, map);
            }
        }
    }
}

/// Final output column names for a tree, one per scalar leaf, in
/// declaration order. Lists contribute no output segment (the repeated
/// engine paths collapse back). A duplicate here means two leaves would
/// surface under the same column; the parser rejects such schemas.
pub fn output_columns(tree: &DataType) -> Vec<String> {
    let mut names = Vec::new();
    collect(tree, "", &mut names);
    names
}

fn collect(node: &DataType, output: &str, names: &mut Vec<String>) {
    match node {
        DataType::Scalar(_) => names.push(output.to_string()),
        DataType::List(element) => collect(element, output, names),
        DataType::Struct(fields) => {
            for field in fields {
                let field_output = match (&field.rename, field.dtype.is_scalar()) {
                    (Some(rename), true) => rename.clone(),
                    _ => join_path(output, field.output_name()),
                };
                collect(&field.dtype, &field_output, names);
            }
        }
    }
}
