//! Change notifications between a source and its views.
//!
//! A source records every mutation as a `SourceChange` in its `ChangeLog`.
//! Views keep a cursor into the log, pull whatever arrived since they last
//! synced, and translate each change into zero or more `ViewChange`s for
//! their own subscribers.
//!
//! # Change kinds
//!
//! - `Structural`: rows or columns were added or removed, or a column was
//!   renamed or moved. Cached indices are stale.
//! - `CellOrRowRange`: values changed inside an unchanged shape, either in
//!   one column or across all columns of a row range.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Structural,
    CellOrRowRange,
}

/// Which columns a change touches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnSpan {
    All,
    Column(usize),
}

/// A single change to a source, in source coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceChange {
    pub kind: ChangeKind,
    pub first_row: usize,
    /// Inclusive
    pub last_row: usize,
    pub column: ColumnSpan,
}

impl SourceChange {
    /// Shape of the whole source changed.
    pub fn structural() -> Self {
        SourceChange {
            kind: ChangeKind::Structural,
            first_row: 0,
            last_row: usize::MAX,
            column: ColumnSpan::All,
        }
    }

    /// Rows `first..=last` were inserted or deleted.
    pub fn rows_structural(first_row: usize, last_row: usize) -> Self {
        SourceChange {
            kind: ChangeKind::Structural,
            first_row,
            last_row,
            column: ColumnSpan::All,
        }
    }

    /// One cell changed.
    pub fn cell(row: usize, column: usize) -> Self {
        SourceChange::range(row, row, ColumnSpan::Column(column))
    }

    /// All columns of rows `first..=last` changed.
    pub fn rows(first_row: usize, last_row: usize) -> Self {
        SourceChange::range(first_row, last_row, ColumnSpan::All)
    }

    pub fn range(first_row: usize, last_row: usize, column: ColumnSpan) -> Self {
        SourceChange {
            kind: ChangeKind::CellOrRowRange,
            first_row,
            last_row,
            column,
        }
    }

    pub fn is_structural(&self) -> bool {
        self.kind == ChangeKind::Structural
    }

    /// Returns `(row, column)` if this change touches exactly one cell.
    pub fn single_cell(&self) -> Option<(usize, usize)> {
        match (self.kind, self.column) {
            (ChangeKind::CellOrRowRange, ColumnSpan::Column(column))
                if self.first_row == self.last_row =>
            {
                Some((self.first_row, column))
            }
            _ => None,
        }
    }
}

/// A change re-emitted by a view, in view coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ViewChange {
    /// Row count, column count or column identities changed
    StructureChanged,
    /// Any cell may have changed and rows may have moved
    DataChanged,
    /// Rows `first_row..=last_row` changed in place
    RowsChanged {
        first_row: usize,
        last_row: usize,
        column: ColumnSpan,
    },
    /// One cell changed in place
    CellChanged { row: usize, column: usize },
}

/// Append-only log of source changes addressed by absolute sequence number.
///
/// Sequence numbers keep growing across `compact` calls, so a consumer's
/// cursor stays meaningful. A cursor older than the compaction point can no
/// longer be served and `since` returns `None` for it.
#[derive(Debug, Clone, Default)]
pub struct ChangeLog {
    changes: Vec<SourceChange>,
    /// Sequence number of `changes[0]`
    offset: u64,
}

impl ChangeLog {
    pub fn new() -> Self {
        ChangeLog::default()
    }

    pub fn push(&mut self, change: SourceChange) {
        self.changes.push(change);
    }

    /// Cursor positioned after the newest change.
    pub fn end(&self) -> u64 {
        self.offset + self.changes.len() as u64
    }

    /// Oldest sequence number still retained.
    pub fn start(&self) -> u64 {
        self.offset
    }

    /// Changes from `cursor` to the end of the log.
    pub fn since(&self, cursor: u64) -> Option<&[SourceChange]> {
        if cursor < self.offset {
            return None;
        }
        let skip = usize::try_from(cursor - self.offset).ok()?;
        Some(self.changes.get(skip..).unwrap_or(&[]))
    }

    /// Discards changes with sequence numbers below `up_to`.
    pub fn compact(&mut self, up_to: u64) {
        let up_to = up_to.min(self.end());
        if up_to <= self.offset {
            return;
        }
        let count = (up_to - self.offset) as usize;
        self.changes.drain(..count);
        self.offset = up_to;
    }

    /// Retained change count.
    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }
}

/// A view kept in step with its source by replaying source changes.
pub trait IncrementalView {
    /// Applies changes from the source in order.
    /// Returns true if any of them affected the view.
    fn apply_changes(&mut self, changes: &[SourceChange]) -> bool;

    /// Change-log cursor the view has consumed up to.
    fn last_synced_cursor(&self) -> u64;

    /// Drops all cached state; it is rebuilt on next access.
    fn rebuild(&mut self);
}
