//! Frame construction and access errors.

use super::ColumnKind;

/// Errors raised by [`Frame`](super::Frame) operations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FrameError {
    #[error("missing column: {0}")]
    MissingColumn(String),

    #[error("duplicate column: {0}")]
    DuplicateColumn(String),

    #[error("column {column} has {got} rows, expected {expected}")]
    LengthMismatch {
        column: String,
        expected: usize,
        got: usize,
    },

    #[error("index has {got} labels, expected {expected}")]
    IndexLength { expected: usize, got: usize },

    #[error("duplicate index label: {0}")]
    DuplicateIndex(usize),

    #[error("column {column}: expected {expected} values, got {got}")]
    ColumnTypeMismatch {
        column: String,
        expected: ColumnKind,
        got: ColumnKind,
    },

    #[error("cannot concatenate frames with different columns: {0}")]
    SchemaMismatch(String),
}
