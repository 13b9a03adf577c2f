//! SortView - Sortable Views over Mutable Tables
//!
//! A sortable, column-indirected view that decorates a mutable table source.
//! Views reorder rows by a compound sort without copying source data, keep
//! the sort attached to its columns across structural changes, and translate
//! source change notifications into view coordinates.

pub mod changeset;
pub mod column;
pub mod comparator;
pub mod directive;
pub mod error;
pub mod indirection;
pub mod row_map;
pub mod source;
pub mod table;
pub mod view;

pub use changeset::{ChangeKind, ChangeLog, ColumnSpan, IncrementalView, SourceChange, ViewChange};
pub use column::{Column, Value, ValueKind};
pub use comparator::Comparator;
pub use directive::{Activation, DirectiveStack, SortDirection, SortDirective};
pub use error::{Result, TableError};
pub use indirection::{ColumnIndirection, ColumnLayout};
pub use row_map::RowIndexMap;
pub use source::{ColumnMeta, TableSource};
pub use table::{Schema, Table};
pub use view::{SortableView, SubscriptionId, ViewOptions};
