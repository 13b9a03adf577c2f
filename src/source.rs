//! The tabular data source a view decorates.

use crate::changeset::ChangeLog;
use crate::column::{Value, ValueKind};
use crate::error::Result;

/// Name and kind of one source column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMeta {
    pub name: String,
    pub kind: ValueKind,
}

/// A mutable table owned outside of any view.
///
/// Implementors must record every mutation in their `ChangeLog`. Any change
/// to the row count, the column count or a column's name must be logged as a
/// structural change; a view relies on that to know when its cached
/// indices are stale.
pub trait TableSource {
    fn row_count(&self) -> usize;

    fn column_count(&self) -> usize;

    fn column_name(&self, column: usize) -> &str;

    fn column_kind(&self, column: usize) -> ValueKind;

    /// Value at `(row, column)`. Out-of-range positions read as `Value::Null`.
    fn value_at(&self, row: usize, column: usize) -> Value;

    fn set_value_at(&mut self, row: usize, column: usize, value: Value) -> Result<()>;

    fn is_cell_editable(&self, row: usize, column: usize) -> bool;

    fn change_log(&self) -> &ChangeLog;

    /// Current column list in source order.
    fn column_meta(&self) -> Vec<ColumnMeta> {
        (0..self.column_count())
            .map(|i| ColumnMeta {
                name: self.column_name(i).to_string(),
                kind: self.column_kind(i),
            })
            .collect()
    }
}
