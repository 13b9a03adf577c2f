//! Comparator resolution by column kind.
//!
//! Null handling is not done here: the row mapper orders nulls before any
//! non-null value and only hands non-null pairs to a comparator.

use crate::column::{Value, ValueKind};
use std::cmp::Ordering;

/// Orders two non-null values of the same column.
pub type Comparator = fn(&Value, &Value) -> Ordering;

/// Returns the comparator used to sort a column of the given kind.
///
/// Ordered kinds get their natural order. `ValueKind::Any` gets a
/// case-insensitive comparison of the values' text.
pub fn resolve(kind: ValueKind) -> Comparator {
    if kind.is_ordered() {
        natural_order
    } else {
        lexical_order
    }
}

/// Natural order for same-variant values. Floats use IEEE total ordering so
/// NaN has a defined place. Values of different variants (which a
/// kind-checked column never holds) fall back to lexical order.
pub fn natural_order(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Int32(a), Value::Int32(b)) => a.cmp(b),
        (Value::Int64(a), Value::Int64(b)) => a.cmp(b),
        (Value::Float32(a), Value::Float32(b)) => a.total_cmp(b),
        (Value::Float64(a), Value::Float64(b)) => a.total_cmp(b),
        (Value::String(a), Value::String(b)) => a.cmp(b),
        (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
        (a, b) => lexical_order(a, b),
    }
}

/// Case-insensitive order over `Display` output.
pub fn lexical_order(a: &Value, b: &Value) -> Ordering {
    let a = a.to_string();
    let b = b.to_string();
    a.chars()
        .flat_map(char::to_lowercase)
        .cmp(b.chars().flat_map(char::to_lowercase))
}
