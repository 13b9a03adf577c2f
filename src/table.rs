//! In-memory column-oriented table.
//!
//! `Table` is the reference `TableSource`: a collection of typed columns
//! with a schema, row and column operations, and a change log that records
//! every mutation for the views built on top of it.
//!
//! # Examples
//!
//! ```
//! use sortview::{Schema, Table, Value, ValueKind};
//! use std::collections::HashMap;
//!
//! let schema = Schema::new(vec![
//!     ("id".to_string(), ValueKind::Int32, false),
//!     ("name".to_string(), ValueKind::String, false),
//!     ("age".to_string(), ValueKind::Int32, true),
//! ]);
//!
//! let mut table = Table::new("users".to_string(), schema);
//!
//! let mut row = HashMap::new();
//! row.insert("id".to_string(), Value::Int32(1));
//! row.insert("name".to_string(), Value::String("Alice".to_string()));
//! row.insert("age".to_string(), Value::Int32(30));
//! table.append_row(row).unwrap();
//!
//! assert_eq!(table.len(), 1);
//! assert_eq!(table.get_value(0, "name").unwrap().as_string(), Some("Alice"));
//! ```

use crate::changeset::{ChangeLog, SourceChange};
use crate::column::{Column, Value, ValueKind};
use crate::error::{Result, TableError};
use crate::source::TableSource;
use std::collections::HashMap;

/// Schema definition with column names, kinds and nullability.
///
/// # Examples
///
/// ```
/// use sortview::{Schema, ValueKind};
///
/// let schema = Schema::new(vec![
///     ("id".to_string(), ValueKind::Int32, false),
///     ("email".to_string(), ValueKind::String, false),
///     ("age".to_string(), ValueKind::Int32, true),
/// ]);
///
/// assert_eq!(schema.len(), 3);
/// assert_eq!(schema.get_column_index("email"), Some(1));
/// ```
#[derive(Debug, Clone)]
pub struct Schema {
    columns: Vec<(String, ValueKind, bool)>, // (name, kind, nullable)
}

impl Schema {
    pub fn new(columns: Vec<(String, ValueKind, bool)>) -> Self {
        Schema { columns }
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn get_column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|(name, _, _)| name.as_str()).collect()
    }

    /// Index of the first column with this name.
    pub fn get_column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|(n, _, _)| n == name)
    }

    pub fn get_column_info(&self, index: usize) -> Option<(&str, ValueKind, bool)> {
        self.columns
            .get(index)
            .map(|(name, kind, nullable)| (name.as_str(), *kind, *nullable))
    }
}

pub struct Table {
    name: String,
    columns: Vec<Column>,
    row_count: usize,
    log: ChangeLog,
}

impl Table {
    pub fn new(name: String, schema: Schema) -> Self {
        let columns = schema
            .columns
            .into_iter()
            .map(|(name, kind, nullable)| Column::new(name, kind, nullable))
            .collect();

        Table {
            name,
            columns,
            row_count: 0,
            log: ChangeLog::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Snapshot of the current schema.
    pub fn schema(&self) -> Schema {
        Schema::new(
            self.columns
                .iter()
                .map(|c| (c.name().to_string(), c.kind(), c.is_nullable()))
                .collect(),
        )
    }

    pub fn len(&self) -> usize {
        self.row_count
    }

    pub fn is_empty(&self) -> bool {
        self.row_count == 0
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name() == name)
    }

    fn require_column(&self, name: &str) -> Result<usize> {
        self.column_index(name)
            .ok_or_else(|| TableError::ColumnNotFound(name.to_string()))
    }

    fn require_row(&self, row: usize) -> Result<()> {
        if row >= self.row_count {
            return Err(TableError::RowOutOfRange {
                row,
                len: self.row_count,
            });
        }
        Ok(())
    }

    fn require_unique(&self, name: &str) -> Result<()> {
        if self.column_index(name).is_some() {
            return Err(TableError::DuplicateColumn(name.to_string()));
        }
        Ok(())
    }

    pub fn get_value(&self, row: usize, column: &str) -> Result<Value> {
        let col_idx = self.require_column(column)?;
        self.get_value_by_index(row, col_idx)
    }

    pub fn get_value_by_index(&self, row: usize, col_idx: usize) -> Result<Value> {
        let column = self.columns.get(col_idx).ok_or(TableError::ColumnOutOfRange {
            column: col_idx,
            len: self.columns.len(),
        })?;
        column.get(row).cloned().ok_or(TableError::RowOutOfRange {
            row,
            len: self.row_count,
        })
    }

    /// Sets one cell and returns the value it replaced.
    pub fn set_value(&mut self, row: usize, column: &str, value: Value) -> Result<Value> {
        let col_idx = self.require_column(column)?;
        self.set_value_by_index(row, col_idx, value)
    }

    pub fn set_value_by_index(&mut self, row: usize, col_idx: usize, value: Value) -> Result<Value> {
        let len = self.columns.len();
        let column = self
            .columns
            .get_mut(col_idx)
            .ok_or(TableError::ColumnOutOfRange { column: col_idx, len })?;
        let old = column.set(row, value)?;

        self.log.push(SourceChange::cell(row, col_idx));
        Ok(old)
    }

    pub fn get_row(&self, row: usize) -> Result<HashMap<String, Value>> {
        self.require_row(row)?;

        let mut result = HashMap::new();
        for col in &self.columns {
            if let Some(value) = col.get(row) {
                result.entry(col.name().to_string()).or_insert_with(|| value.clone());
            }
        }
        Ok(result)
    }

    /// Orders a name-keyed row by column position and validates every value,
    /// without touching the table.
    fn positional_row(&self, row: &HashMap<String, Value>) -> Result<Vec<Value>> {
        self.columns
            .iter()
            .map(|col| {
                let value = row
                    .get(col.name())
                    .cloned()
                    .ok_or_else(|| TableError::MissingValue(col.name().to_string()))?;
                col.validate_value(value)
            })
            .collect()
    }

    fn validate_positional(&self, values: Vec<Value>) -> Result<Vec<Value>> {
        if values.len() != self.columns.len() {
            return Err(TableError::InvalidData(format!(
                "expected {} values, got {}",
                self.columns.len(),
                values.len()
            )));
        }
        self.columns
            .iter()
            .zip(values)
            .map(|(col, value)| col.validate_value(value))
            .collect()
    }

    fn insert_validated(&mut self, index: usize, values: Vec<Value>) -> Result<()> {
        for (col, value) in self.columns.iter_mut().zip(values) {
            col.insert(index, value)?;
        }
        self.row_count += 1;
        Ok(())
    }

    pub fn append_row(&mut self, row: HashMap<String, Value>) -> Result<()> {
        self.insert_row(self.row_count, row)
    }

    /// Appends a row given as values in column order.
    pub fn push_row(&mut self, values: Vec<Value>) -> Result<()> {
        let values = self.validate_positional(values)?;
        let index = self.row_count;
        self.insert_validated(index, values)?;
        self.log.push(SourceChange::rows_structural(index, index));
        Ok(())
    }

    /// Appends several rows. Every row is validated before any is inserted,
    /// and the whole batch is logged as one change.
    ///
    /// # Example
    ///
    /// ```
    /// use sortview::{Schema, Table, TableSource, Value, ValueKind};
    /// use std::collections::HashMap;
    ///
    /// let schema = Schema::new(vec![
    ///     ("id".to_string(), ValueKind::Int32, false),
    ///     ("name".to_string(), ValueKind::String, false),
    /// ]);
    /// let mut table = Table::new("users".to_string(), schema);
    ///
    /// let rows = vec![
    ///     HashMap::from([
    ///         ("id".to_string(), Value::Int32(1)),
    ///         ("name".to_string(), Value::String("Alice".to_string())),
    ///     ]),
    ///     HashMap::from([
    ///         ("id".to_string(), Value::Int32(2)),
    ///         ("name".to_string(), Value::String("Bob".to_string())),
    ///     ]),
    /// ];
    ///
    /// assert_eq!(table.append_rows(rows).unwrap(), 2);
    /// assert_eq!(table.len(), 2);
    /// assert_eq!(table.change_log().len(), 1);
    /// ```
    pub fn append_rows(&mut self, rows: Vec<HashMap<String, Value>>) -> Result<usize> {
        if rows.is_empty() {
            return Ok(0);
        }

        let validated = rows
            .iter()
            .map(|row| self.positional_row(row))
            .collect::<Result<Vec<_>>>()?;

        let start = self.row_count;
        let count = validated.len();
        for values in validated {
            let index = self.row_count;
            self.insert_validated(index, values)?;
        }

        self.log
            .push(SourceChange::rows_structural(start, start + count - 1));
        Ok(count)
    }

    pub fn insert_row(&mut self, index: usize, row: HashMap<String, Value>) -> Result<()> {
        if index > self.row_count {
            return Err(TableError::RowOutOfRange {
                row: index,
                len: self.row_count,
            });
        }

        let values = self.positional_row(&row)?;
        self.insert_validated(index, values)?;
        self.log.push(SourceChange::rows_structural(index, index));
        Ok(())
    }

    pub fn delete_row(&mut self, index: usize) -> Result<HashMap<String, Value>> {
        self.require_row(index)?;

        let mut result = HashMap::new();
        for col in self.columns.iter_mut() {
            let value = col.delete(index)?;
            result.entry(col.name().to_string()).or_insert(value);
        }
        self.row_count -= 1;

        self.log.push(SourceChange::rows_structural(index, index));
        Ok(result)
    }

    /// Overwrites the given columns of one row, logged as a whole-row change.
    /// Columns absent from `values` keep their current value.
    pub fn update_row(&mut self, index: usize, values: HashMap<String, Value>) -> Result<()> {
        self.require_row(index)?;

        let mut updates = Vec::with_capacity(values.len());
        for (name, value) in values {
            let col_idx = self.require_column(&name)?;
            let value = self.columns[col_idx].validate_value(value)?;
            updates.push((col_idx, value));
        }

        for (col_idx, value) in updates {
            self.columns[col_idx].set(index, value)?;
        }

        self.log.push(SourceChange::rows(index, index));
        Ok(())
    }

    // === Column operations (all structural) ===

    /// Appends a column, filling existing rows with `fill`.
    pub fn add_column(
        &mut self,
        name: &str,
        kind: ValueKind,
        nullable: bool,
        fill: Value,
    ) -> Result<()> {
        self.insert_column(self.columns.len(), name, kind, nullable, fill)
    }

    pub fn insert_column(
        &mut self,
        index: usize,
        name: &str,
        kind: ValueKind,
        nullable: bool,
        fill: Value,
    ) -> Result<()> {
        if index > self.columns.len() {
            return Err(TableError::ColumnOutOfRange {
                column: index,
                len: self.columns.len(),
            });
        }
        self.require_unique(name)?;

        let column = Column::filled(name, kind, nullable, fill, self.row_count)?;
        self.columns.insert(index, column);

        self.log.push(SourceChange::structural());
        Ok(())
    }

    pub fn remove_column(&mut self, name: &str) -> Result<()> {
        let col_idx = self.require_column(name)?;
        self.columns.remove(col_idx);

        self.log.push(SourceChange::structural());
        Ok(())
    }

    pub fn rename_column(&mut self, old_name: &str, new_name: &str) -> Result<()> {
        let col_idx = self.require_column(old_name)?;
        if old_name == new_name {
            return Ok(());
        }
        self.require_unique(new_name)?;
        self.columns[col_idx].rename(new_name.to_string());

        self.log.push(SourceChange::structural());
        Ok(())
    }

    /// Moves a column to a new position, shifting the columns in between.
    pub fn move_column(&mut self, name: &str, to: usize) -> Result<()> {
        let from = self.require_column(name)?;
        if to >= self.columns.len() {
            return Err(TableError::ColumnOutOfRange {
                column: to,
                len: self.columns.len(),
            });
        }
        if from == to {
            return Ok(());
        }
        let column = self.columns.remove(from);
        self.columns.insert(to, column);

        self.log.push(SourceChange::structural());
        Ok(())
    }

    /// Marks a column writable or read-only. Not a data change, so nothing is
    /// logged.
    pub fn set_column_editable(&mut self, name: &str, editable: bool) -> Result<()> {
        let col_idx = self.require_column(name)?;
        self.columns[col_idx].set_editable(editable);
        Ok(())
    }

    // === Change log ===

    /// Discards logged changes before `up_to`. Views whose cursor is older
    /// fall back to a full rebuild on their next sync.
    pub fn compact_changes(&mut self, up_to: u64) {
        self.log.compact(up_to);
    }

    pub fn has_pending_changes(&self) -> bool {
        !self.log.is_empty()
    }

    // === JSON ===

    /// Exports the table as a pretty-printed JSON array of row objects.
    ///
    /// ```
    /// use sortview::{Schema, Table, Value, ValueKind};
    ///
    /// let schema = Schema::new(vec![
    ///     ("id".to_string(), ValueKind::Int32, false),
    ///     ("name".to_string(), ValueKind::String, false),
    /// ]);
    /// let mut table = Table::new("test".to_string(), schema);
    /// table.push_row(vec![Value::Int32(1), Value::String("Alice".to_string())]).unwrap();
    ///
    /// let json = table.to_json().unwrap();
    /// assert!(json.contains("\"id\": 1"));
    /// assert!(json.contains("\"name\": \"Alice\""));
    /// ```
    pub fn to_json(&self) -> Result<String> {
        let rows: Vec<serde_json::Value> = (0..self.row_count)
            .map(|row| {
                let obj: serde_json::Map<String, serde_json::Value> = self
                    .columns
                    .iter()
                    .map(|col| {
                        let value = col.get(row).map(Value::to_json).unwrap_or_default();
                        (col.name().to_string(), value)
                    })
                    .collect();
                serde_json::Value::Object(obj)
            })
            .collect();

        Ok(serde_json::to_string_pretty(&rows)?)
    }

    /// Builds a table from a JSON array of row objects.
    ///
    /// Columns follow the key order of the first object. Kinds are inferred
    /// from its values: integers that fit in 32 bits become `Int32`, larger
    /// ones `Int64`, other numbers `Float64`, strings `String`, booleans
    /// `Bool`, and nulls `Any`. Every column is nullable.
    ///
    /// ```
    /// use sortview::Table;
    ///
    /// let json = r#"[{"id": 1, "name": "Alice"}, {"id": 2, "name": "Bob"}]"#;
    /// let table = Table::from_json("users", json).unwrap();
    /// assert_eq!(table.len(), 2);
    /// assert_eq!(table.column_index("name"), Some(1));
    /// ```
    pub fn from_json(name: &str, json: &str) -> Result<Table> {
        let parsed: Vec<serde_json::Map<String, serde_json::Value>> = serde_json::from_str(json)?;

        let first = parsed
            .first()
            .ok_or_else(|| TableError::InvalidData("JSON array is empty".to_string()))?;

        let schema = Schema::new(
            first
                .iter()
                .map(|(key, value)| (key.clone(), infer_kind(value), true))
                .collect(),
        );
        let mut table = Table::new(name.to_string(), schema);

        for obj in &parsed {
            let values = table
                .columns
                .iter()
                .map(|col| {
                    let json = obj.get(col.name()).unwrap_or(&serde_json::Value::Null);
                    Value::from_json(json, col.kind()).ok_or_else(|| TableError::KindMismatch {
                        column: col.name().to_string(),
                        expected: col.kind(),
                        found: json.to_string(),
                    })
                })
                .collect::<Result<Vec<_>>>()?;
            let index = table.row_count;
            table.insert_validated(index, values)?;
        }

        Ok(table)
    }
}

fn infer_kind(value: &serde_json::Value) -> ValueKind {
    match value {
        serde_json::Value::Number(n) => match n.as_i64() {
            Some(i) if i32::try_from(i).is_ok() => ValueKind::Int32,
            Some(_) => ValueKind::Int64,
            None => ValueKind::Float64,
        },
        serde_json::Value::String(_) => ValueKind::String,
        serde_json::Value::Bool(_) => ValueKind::Bool,
        _ => ValueKind::Any,
    }
}

impl TableSource for Table {
    fn row_count(&self) -> usize {
        self.row_count
    }

    fn column_count(&self) -> usize {
        self.columns.len()
    }

    fn column_name(&self, column: usize) -> &str {
        self.columns.get(column).map(Column::name).unwrap_or("")
    }

    fn column_kind(&self, column: usize) -> ValueKind {
        self.columns
            .get(column)
            .map(Column::kind)
            .unwrap_or(ValueKind::Any)
    }

    fn value_at(&self, row: usize, column: usize) -> Value {
        self.columns
            .get(column)
            .and_then(|c| c.get(row))
            .cloned()
            .unwrap_or(Value::Null)
    }

    fn set_value_at(&mut self, row: usize, column: usize, value: Value) -> Result<()> {
        let read_only = self.columns.get(column).is_some_and(|c| !c.is_editable());
        if read_only && row < self.row_count {
            return Err(TableError::ReadOnlyCell { row, column });
        }
        self.set_value_by_index(row, column, value).map(|_| ())
    }

    fn is_cell_editable(&self, row: usize, column: usize) -> bool {
        row < self.row_count
            && self
                .columns
                .get(column)
                .map(Column::is_editable)
                .unwrap_or(false)
    }

    fn change_log(&self) -> &ChangeLog {
        &self.log
    }
}

impl std::fmt::Debug for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Table")
            .field("name", &self.name)
            .field("columns", &self.columns.iter().map(Column::name).collect::<Vec<_>>())
            .field("row_count", &self.row_count)
            .field("pending_changes", &self.log.len())
            .finish()
    }
}
