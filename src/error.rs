//! Error types for tables and views.

use crate::column::ValueKind;
use thiserror::Error;

/// Errors raised by table mutations and by writes routed through a view.
///
/// Lookups that have a natural "nothing there" answer (an unsorted column, a
/// hidden column, a row outside the view) return `Option` or a sentinel
/// instead of one of these.
#[derive(Debug, Error)]
pub enum TableError {
    #[error("column '{0}' not found")]
    ColumnNotFound(String),

    #[error("column '{0}' already exists")]
    DuplicateColumn(String),

    #[error("row {row} out of range [0, {len})")]
    RowOutOfRange { row: usize, len: usize },

    #[error("column {column} out of range [0, {len})")]
    ColumnOutOfRange { column: usize, len: usize },

    #[error("column '{column}' expects {expected:?}, got {found}")]
    KindMismatch {
        column: String,
        expected: ValueKind,
        found: String,
    },

    #[error("column '{0}' is not nullable")]
    NullNotAllowed(String),

    #[error("cell ({row}, {column}) is read-only")]
    ReadOnlyCell { row: usize, column: usize },

    #[error("missing value for column '{0}'")]
    MissingValue(String),

    #[error("invalid table data: {0}")]
    InvalidData(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, TableError>;
