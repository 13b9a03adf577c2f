//! Column values, value kinds and column storage.
//!
//! A `Column` is a named, typed vector of `Value`s. Every column declares a
//! `ValueKind`; the kind decides which values the column accepts and which
//! comparator a sort on that column uses.

use crate::error::{Result, TableError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Declared kind of the values in a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueKind {
    Int32,
    Int64,
    Float32,
    Float64,
    String,
    Bool,
    /// Heterogeneous column. Accepts any value and has no natural order;
    /// sorting falls back to the values' text.
    Any,
}

impl ValueKind {
    /// Returns true if values of this kind have a natural total order.
    pub fn is_ordered(&self) -> bool {
        !matches!(self, ValueKind::Any)
    }

    /// Returns true if `value` may be stored in a column of this kind.
    /// Null is accepted here; nullability is a column property.
    pub fn accepts(&self, value: &Value) -> bool {
        matches!(
            (self, value),
            (_, Value::Null)
                | (ValueKind::Any, _)
                | (ValueKind::Int32, Value::Int32(_))
                | (ValueKind::Int64, Value::Int64(_))
                | (ValueKind::Float32, Value::Float32(_))
                | (ValueKind::Float64, Value::Float64(_))
                | (ValueKind::String, Value::String(_))
                | (ValueKind::Bool, Value::Bool(_))
        )
    }
}

/// A single cell value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int32(i32),
    Int64(i64),
    Float32(f32),
    Float64(f64),
    String(String),
    Bool(bool),
    Null,
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// The narrowest kind that accepts this value. Null maps to `Any`.
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Int32(_) => ValueKind::Int32,
            Value::Int64(_) => ValueKind::Int64,
            Value::Float32(_) => ValueKind::Float32,
            Value::Float64(_) => ValueKind::Float64,
            Value::String(_) => ValueKind::String,
            Value::Bool(_) => ValueKind::Bool,
            Value::Null => ValueKind::Any,
        }
    }

    pub fn as_i32(&self) -> Option<i32> {
        match self {
            Value::Int32(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int64(v) => Some(*v),
            Value::Int32(v) => Some(i64::from(*v)),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float64(v) => Some(*v),
            Value::Float32(v) => Some(f64::from(*v)),
            _ => None,
        }
    }

    pub fn as_string(&self) -> Option<&str> {
        match self {
            Value::String(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// Converts to a JSON value. Non-finite floats become `null`.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Int32(n) => serde_json::Value::from(*n),
            Value::Int64(n) => serde_json::Value::from(*n),
            Value::Float32(f) => serde_json::Number::from_f64(f64::from(*f))
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::Float64(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Null => serde_json::Value::Null,
        }
    }

    /// Converts a JSON scalar into a value of the given kind.
    pub fn from_json(json: &serde_json::Value, kind: ValueKind) -> Option<Value> {
        use serde_json::Value as Json;

        let value = match (json, kind) {
            (Json::Null, _) => Value::Null,
            (Json::Number(n), ValueKind::Int32) => Value::Int32(i32::try_from(n.as_i64()?).ok()?),
            (Json::Number(n), ValueKind::Int64) => Value::Int64(n.as_i64()?),
            (Json::Number(n), ValueKind::Float32) => Value::Float32(n.as_f64()? as f32),
            (Json::Number(n), ValueKind::Float64) => Value::Float64(n.as_f64()?),
            (Json::Number(n), ValueKind::Any) => match n.as_i64() {
                Some(i) => Value::Int64(i),
                None => Value::Float64(n.as_f64()?),
            },
            (Json::String(s), ValueKind::String | ValueKind::Any) => Value::String(s.clone()),
            (Json::Bool(b), ValueKind::Bool | ValueKind::Any) => Value::Bool(*b),
            _ => return None,
        };
        Some(value)
    }
}

/// Textual representation, used by the lexical comparator. Null renders empty.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int32(v) => write!(f, "{v}"),
            Value::Int64(v) => write!(f, "{v}"),
            Value::Float32(v) => write!(f, "{v}"),
            Value::Float64(v) => write!(f, "{v}"),
            Value::String(v) => f.write_str(v),
            Value::Bool(v) => write!(f, "{v}"),
            Value::Null => Ok(()),
        }
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int32(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int64(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float64(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

/// Named, typed storage for one column of a `Table`.
#[derive(Debug, Clone)]
pub struct Column {
    name: String,
    kind: ValueKind,
    nullable: bool,
    editable: bool,
    values: Vec<Value>,
}

impl Column {
    pub fn new(name: impl Into<String>, kind: ValueKind, nullable: bool) -> Self {
        Column {
            name: name.into(),
            kind,
            nullable,
            editable: true,
            values: Vec::new(),
        }
    }

    /// Creates a column holding `len` copies of `fill`.
    pub fn filled(
        name: impl Into<String>,
        kind: ValueKind,
        nullable: bool,
        fill: Value,
        len: usize,
    ) -> Result<Self> {
        let mut column = Column::new(name, kind, nullable);
        let fill = column.validate_value(fill)?;
        column.values = vec![fill; len];
        Ok(column)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn rename(&mut self, name: String) {
        self.name = name;
    }

    pub fn kind(&self) -> ValueKind {
        self.kind
    }

    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    pub fn is_editable(&self) -> bool {
        self.editable
    }

    pub fn set_editable(&mut self, editable: bool) {
        self.editable = editable;
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Checks a value against the column's kind and nullability.
    pub fn validate_value(&self, value: Value) -> Result<Value> {
        if value.is_null() {
            if !self.nullable {
                return Err(TableError::NullNotAllowed(self.name.clone()));
            }
            return Ok(Value::Null);
        }

        if !self.kind.accepts(&value) {
            return Err(TableError::KindMismatch {
                column: self.name.clone(),
                expected: self.kind,
                found: format!("{value:?}"),
            });
        }
        Ok(value)
    }

    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    pub fn set(&mut self, index: usize, value: Value) -> Result<Value> {
        let len = self.values.len();
        let value = self.validate_value(value)?;
        let slot = self
            .values
            .get_mut(index)
            .ok_or(TableError::RowOutOfRange { row: index, len })?;
        Ok(std::mem::replace(slot, value))
    }

    pub fn insert(&mut self, index: usize, value: Value) -> Result<()> {
        if index > self.values.len() {
            return Err(TableError::RowOutOfRange {
                row: index,
                len: self.values.len(),
            });
        }
        let value = self.validate_value(value)?;
        self.values.insert(index, value);
        Ok(())
    }

    pub fn append(&mut self, value: Value) -> Result<()> {
        let value = self.validate_value(value)?;
        self.values.push(value);
        Ok(())
    }

    pub fn delete(&mut self, index: usize) -> Result<Value> {
        if index >= self.values.len() {
            return Err(TableError::RowOutOfRange {
                row: index,
                len: self.values.len(),
            });
        }
        Ok(self.values.remove(index))
    }
}
