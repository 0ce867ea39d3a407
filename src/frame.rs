//! A minimal in-memory columnar frame over JSON values.
//!
//! This is the collaborator the unpacker drives: same-length columns of
//! `serde_json::Value` cells, each carrying a declared [`DataType`], with
//! the three primitives the flattening recursion needs (`explode`,
//! `unnest`, `rename`). It is deliberately small: no expression engine, no
//! storage format, just enough structure to turn nested records into a flat
//! table.

use serde_json::{Map, Value};
use thiserror::Error;

use crate::schema::{join_path, DataType, Field};

/// Errors raised while flattening. Terminal: the frame is consumed and no
/// partial output is returned.
#[derive(Debug, Error)]
pub enum UnpackError {
    /// The declared type tree disagrees with the actual value shape at this
    /// path. Detected at the point of divergence, not pre-validated.
    #[error("type mismatch at `{path}`: expected {expected}, found {found}")]
    SchemaMismatch {
        path: String,
        expected: String,
        found: String,
    },

    #[error("no column named `{name}`")]
    UnknownColumn { name: String },
}

/// One named, typed column.
#[derive(Debug, Clone)]
pub struct Column {
    pub name: String,
    pub dtype: DataType,
    pub values: Vec<Value>,
}

/// A table of same-length columns.
#[derive(Debug, Clone)]
pub struct Frame {
    columns: Vec<Column>,
    height: usize,
}

impl Frame {
    pub fn new(columns: Vec<Column>) -> Self {
        let height = columns.first().map_or(0, |c| c.values.len());
        debug_assert!(columns.iter().all(|c| c.values.len() == height));
        Frame { columns, height }
    }

    /// Build a frame from row values, conformed to the given top-level
    /// struct: declared columns in declared order, missing keys null-filled.
    /// Keys the schema does not mention are dropped (the schema is
    /// dominant). An anonymous field takes the whole row as its value,
    /// which is how bare non-object rows come in.
    pub fn from_rows(rows: &[Value], tree: &DataType) -> Self {
        let anonymous;
        let fields = match tree {
            DataType::Struct(fields) => fields.as_slice(),
            other => {
                anonymous = [Field::new("", other.clone())];
                anonymous.as_slice()
            }
        };

        let columns = fields
            .iter()
            .map(|field| Column {
                name: field.name.clone(),
                dtype: field.dtype.clone(),
                values: rows
                    .iter()
                    .map(|row| {
                        if field.name.is_empty() {
                            row.clone()
                        } else {
                            row.get(&field.name).cloned().unwrap_or(Value::Null)
                        }
                    })
                    .collect(),
            })
            .collect();

        Frame {
            columns,
            height: rows.len(),
        }
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    fn index_of(&self, name: &str) -> Result<usize, UnpackError> {
        self.columns
            .iter()
            .position(|c| c.name == name)
            .ok_or_else(|| UnpackError::UnknownColumn {
                name: name.to_string(),
            })
    }

    /// Align this frame to a declared field list: declared columns in
    /// declared order (types overridden by the declaration), missing
    /// columns added as all-null, undeclared columns dropped.
    pub fn conform(mut self, fields: &[Field]) -> Frame {
        let height = self.height;
        let columns = fields
            .iter()
            .map(|field| match self.columns.iter().position(|c| c.name == field.name) {
                Some(i) => {
                    let mut column = self.columns.swap_remove(i);
                    column.dtype = field.dtype.clone();
                    column
                }
                None => Column {
                    name: field.name.clone(),
                    dtype: field.dtype.clone(),
                    values: vec![Value::Null; height],
                },
            })
            .collect();
        Frame { columns, height }
    }

    pub fn rename_column(&mut self, from: &str, to: &str) -> Result<(), UnpackError> {
        let idx = self.index_of(from)?;
        self.columns[idx].name = to.to_string();
        Ok(())
    }

    /// Apply a rename map to every column it mentions. Used once at the end
    /// of the unpacking recursion.
    pub fn apply_renames(&mut self, renames: &std::collections::BTreeMap<String, String>) {
        for column in &mut self.columns {
            if let Some(target) = renames.get(&column.name) {
                column.name = target.clone();
            }
        }
    }

    /// Explode a list column: one output row per element, sibling values
    /// duplicated per element. The column is retyped to the list's element
    /// type.
    ///
    /// Policy: an empty list contributes zero rows (its parent row is
    /// dropped); a null cell contributes a single null row, so fields
    /// declared in the schema but absent from the data do not erase the
    /// dataset.
    pub fn explode(&mut self, name: &str) -> Result<(), UnpackError> {
        let idx = self.index_of(name)?;

        let element = match &self.columns[idx].dtype {
            DataType::List(element) => (**element).clone(),
            other => {
                return Err(UnpackError::SchemaMismatch {
                    path: name.to_string(),
                    expected: "List".to_string(),
                    found: other.type_name().to_string(),
                })
            }
        };

        let mut counts = Vec::with_capacity(self.height);
        for value in &self.columns[idx].values {
            match value {
                Value::Array(items) => counts.push(items.len()),
                Value::Null => counts.push(1),
                other => {
                    return Err(UnpackError::SchemaMismatch {
                        path: name.to_string(),
                        expected: "a list value".to_string(),
                        found: value_kind(other).to_string(),
                    })
                }
            }
        }
        let new_height = counts.iter().sum();

        for (i, column) in self.columns.iter_mut().enumerate() {
            let old = std::mem::take(&mut column.values);
            let mut values = Vec::with_capacity(new_height);
            if i == idx {
                for value in old {
                    match value {
                        Value::Array(items) => values.extend(items),
                        _ => values.push(Value::Null),
                    }
                }
                column.dtype = element.clone();
            } else {
                for (value, &count) in old.into_iter().zip(&counts) {
                    values.extend(std::iter::repeat(value).take(count));
                }
            }
            column.values = values;
        }
        self.height = new_height;

        Ok(())
    }

    /// Unnest a struct column into one sibling column per declared field,
    /// in declaration order, at the position the struct column held. Child
    /// columns are named `parent.child`; missing keys become null, keys not
    /// in the declaration are dropped.
    pub fn unnest(&mut self, name: &str) -> Result<(), UnpackError> {
        let idx = self.index_of(name)?;

        let fields = match &self.columns[idx].dtype {
            DataType::Struct(fields) => fields.clone(),
            other => {
                return Err(UnpackError::SchemaMismatch {
                    path: name.to_string(),
                    expected: "Struct".to_string(),
                    found: other.type_name().to_string(),
                })
            }
        };

        for value in &self.columns[idx].values {
            if !matches!(value, Value::Object(_) | Value::Null) {
                return Err(UnpackError::SchemaMismatch {
                    path: name.to_string(),
                    expected: "a struct value".to_string(),
                    found: value_kind(value).to_string(),
                });
            }
        }

        let parent = self.columns.remove(idx);
        let children: Vec<Column> = fields
            .iter()
            .map(|field| Column {
                name: join_path(name, &field.name),
                dtype: field.dtype.clone(),
                values: parent
                    .values
                    .iter()
                    .map(|value| match value {
                        Value::Object(map) => {
                            map.get(&field.name).cloned().unwrap_or(Value::Null)
                        }
                        _ => Value::Null,
                    })
                    .collect(),
            })
            .collect();
        self.columns.splice(idx..idx, children);

        Ok(())
    }

    /// Materialize the frame back into row objects, in column order.
    pub fn to_rows(&self) -> Vec<Map<String, Value>> {
        (0..self.height)
            .map(|i| {
                self.columns
                    .iter()
                    .map(|c| (c.name.clone(), c.values[i].clone()))
                    .collect()
            })
            .collect()
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list value",
        Value::Object(_) => "a struct value",
    }
}
