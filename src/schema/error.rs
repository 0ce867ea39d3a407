//! Schema parsing errors.
//!
//! All variants are terminal: parsing aborts at the first violation and no
//! partial tree is returned.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    /// Malformed schema text: unbalanced brackets, missing separators,
    /// dangling `=` or `:`, trailing garbage.
    #[error("schema syntax error at offset {position}: expected {expected}, found {found}")]
    Syntax {
        position: usize,
        expected: &'static str,
        found: String,
    },

    /// A type token that is not in the primitive keyword table.
    #[error("unknown type `{token}` at offset {position}")]
    UnknownType { token: String, position: usize },

    /// Two fields in the same struct level share a source name.
    #[error("duplicate field `{name}` at offset {position}")]
    DuplicateField { name: String, position: usize },

    /// Two scalar leaves would surface under the same output column name,
    /// through renames or otherwise.
    #[error("duplicate output column `{name}`")]
    DuplicateColumn { name: String },
}
