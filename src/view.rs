//! Sortable view over a mutable table source.
//!
//! A `SortableView` never copies or reorders source data. It keeps a
//! directive stack describing the compound sort, a lazily built row index
//! mapping view rows to source rows, and a column indirection mapping view
//! columns to source columns. Source changes are pulled from the source's
//! change log and translated into view-coordinate notifications.

use crate::changeset::{ColumnSpan, IncrementalView, SourceChange, ViewChange};
use crate::column::{Value, ValueKind};
use crate::directive::{Activation, DirectiveStack, SortDirection};
use crate::error::{Result, TableError};
use crate::indirection::{ColumnIndirection, ColumnLayout};
use crate::row_map::RowIndexMap;
use crate::source::{ColumnMeta, TableSource};
use log::{debug, trace};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// Construction options for a `SortableView`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewOptions {
    /// Which source columns are shown, in which order
    pub columns: ColumnLayout,
    /// Translate single-cell edits outside the sort keys without re-sorting.
    /// When off, every non-structural change to a sorted view re-sorts.
    pub fast_path: bool,
}

impl Default for ViewOptions {
    fn default() -> Self {
        ViewOptions {
            columns: ColumnLayout::All,
            fast_path: true,
        }
    }
}

impl ViewOptions {
    /// Parses options from JSON, e.g. `{"columns": {"named": ["name", "id"]}}`.
    /// Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Handle returned by `SortableView::subscribe`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(usize);

type Listener = Box<dyn FnMut(&ViewChange)>;

/// A sorted, column-indirected projection of a `TableSource`.
///
/// Reads build whatever cached state they need on demand. Mutations of the
/// source reach the view through `sync`, which replays the source's change
/// log and notifies subscribers.
///
/// # Examples
///
/// ```
/// use sortview::{Schema, SortDirection, SortableView, Table, Value, ValueKind};
/// use std::cell::RefCell;
/// use std::rc::Rc;
///
/// let schema = Schema::new(vec![
///     ("name".to_string(), ValueKind::String, false),
///     ("score".to_string(), ValueKind::Int32, false),
/// ]);
/// let table = Rc::new(RefCell::new(Table::new("students".to_string(), schema)));
/// {
///     let mut t = table.borrow_mut();
///     t.push_row(vec!["Bob".into(), 85.into()]).unwrap();
///     t.push_row(vec!["Alice".into(), 92.into()]).unwrap();
/// }
///
/// let mut view = SortableView::new("by_score".to_string(), table.clone());
/// view.set_sort_direction(1, SortDirection::Descending);
///
/// assert_eq!(view.row_count(), 2);
/// assert_eq!(view.value_at(0, 0), Some(Value::String("Alice".to_string())));
/// assert_eq!(view.model_index_of(0), Some(1));
/// ```
pub struct SortableView<S: TableSource> {
    name: String,
    source: Rc<RefCell<S>>,
    options: ViewOptions,
    directives: DirectiveStack,
    rows: RefCell<RowIndexMap>,
    /// Absent until first needed after construction or a structural change
    columns: RefCell<Option<ColumnIndirection>>,
    listeners: Vec<(SubscriptionId, Listener)>,
    next_subscription: usize,
    /// Change-log position consumed so far
    cursor: u64,
}

impl<S: TableSource> SortableView<S> {
    pub fn new(name: String, source: Rc<RefCell<S>>) -> Self {
        SortableView::with_options(name, source, ViewOptions::default())
    }

    pub fn with_options(name: String, source: Rc<RefCell<S>>, options: ViewOptions) -> Self {
        let cursor = source.borrow().change_log().end();
        SortableView {
            name,
            source,
            options,
            directives: DirectiveStack::new(),
            rows: RefCell::new(RowIndexMap::new()),
            columns: RefCell::new(None),
            listeners: Vec::new(),
            next_subscription: 0,
            cursor,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn options(&self) -> &ViewOptions {
        &self.options
    }

    pub fn source(&self) -> &Rc<RefCell<S>> {
        &self.source
    }

    // === Shape ===

    pub fn row_count(&self) -> usize {
        self.source.borrow().row_count()
    }

    pub fn column_count(&self) -> usize {
        self.with_columns(ColumnIndirection::len)
    }

    fn with_columns<R>(&self, f: impl FnOnce(&ColumnIndirection) -> R) -> R {
        let mut cache = self.columns.borrow_mut();
        let columns = cache.get_or_insert_with(|| {
            ColumnIndirection::build(&self.options.columns, &self.source.borrow().column_meta())
        });
        f(columns)
    }

    pub fn source_column_for(&self, view_column: usize) -> Option<usize> {
        self.with_columns(|c| c.source_column_for(view_column))
    }

    /// `None` when the source column is hidden by the layout.
    pub fn view_column_for(&self, source_column: usize) -> Option<usize> {
        self.with_columns(|c| c.view_column_for(source_column))
    }

    pub fn column_name(&self, view_column: usize) -> Option<String> {
        let column = self.source_column_for(view_column)?;
        Some(self.source.borrow().column_name(column).to_string())
    }

    pub fn column_kind(&self, view_column: usize) -> Option<ValueKind> {
        let column = self.source_column_for(view_column)?;
        Some(self.source.borrow().column_kind(column))
    }

    // === Row mapping ===

    /// Source row shown at `view_row`.
    pub fn model_index_of(&self, view_row: usize) -> Option<usize> {
        let source = self.source.borrow();
        if !self.is_sorting() {
            return (view_row < source.row_count()).then_some(view_row);
        }
        let mut rows = self.rows.borrow_mut();
        rows.view_to_model(&*source, &self.directives)
            .get(view_row)
            .copied()
    }

    /// View row at which `model_row` is shown.
    pub fn view_index_of(&self, model_row: usize) -> Option<usize> {
        let source = self.source.borrow();
        if !self.is_sorting() {
            return (model_row < source.row_count()).then_some(model_row);
        }
        let mut rows = self.rows.borrow_mut();
        rows.model_to_view(&*source, &self.directives)
            .get(model_row)
            .copied()
    }

    /// Full view-to-model array in view order.
    pub fn view_to_model(&self) -> Vec<usize> {
        let source = self.source.borrow();
        let mut rows = self.rows.borrow_mut();
        rows.view_to_model(&*source, &self.directives).to_vec()
    }

    /// True if the sorted row index is cached and will not be rebuilt on the
    /// next read.
    pub fn has_cached_index(&self) -> bool {
        self.rows.borrow().is_built()
    }

    // === Cells ===

    pub fn value_at(&self, view_row: usize, view_column: usize) -> Option<Value> {
        let column = self.source_column_for(view_column)?;
        let row = self.model_index_of(view_row)?;
        Some(self.source.borrow().value_at(row, column))
    }

    pub fn is_cell_editable(&self, view_row: usize, view_column: usize) -> bool {
        match (self.model_index_of(view_row), self.source_column_for(view_column)) {
            (Some(row), Some(column)) => self.source.borrow().is_cell_editable(row, column),
            _ => false,
        }
    }

    /// Writes through to the source cell behind `(view_row, view_column)` and
    /// syncs, so subscribers see the resulting notification immediately.
    pub fn set_value_at(&mut self, view_row: usize, view_column: usize, value: Value) -> Result<()> {
        let column = self
            .source_column_for(view_column)
            .ok_or_else(|| TableError::ColumnOutOfRange {
                column: view_column,
                len: self.column_count(),
            })?;
        let row = self
            .model_index_of(view_row)
            .ok_or_else(|| TableError::RowOutOfRange {
                row: view_row,
                len: self.row_count(),
            })?;

        self.source.borrow_mut().set_value_at(row, column, value)?;
        self.sync();
        Ok(())
    }

    // === Sort state ===

    pub fn is_sorting(&self) -> bool {
        !self.directives.is_empty()
    }

    pub fn directives(&self) -> &DirectiveStack {
        &self.directives
    }

    /// Sets the sort direction of a view column. `NotSorted` removes it from
    /// the compound sort; other directions add it as the lowest-priority key
    /// or change it in place.
    pub fn set_sort_direction(&mut self, view_column: usize, direction: SortDirection) {
        if self.set_directive(view_column, direction) {
            self.sorting_changed();
        }
    }

    /// `NotSorted` for unsorted or unknown columns.
    pub fn sort_direction_of(&self, view_column: usize) -> SortDirection {
        self.source_column_for(view_column)
            .map(|c| self.directives.direction_of(c))
            .unwrap_or_default()
    }

    /// Position of the column in the compound sort, 0 being the primary key.
    pub fn sort_priority_of(&self, view_column: usize) -> Option<usize> {
        let column = self.source_column_for(view_column)?;
        self.directives.priority_of(column)
    }

    /// Active sort keys as `(view_column, direction)` in priority order.
    /// Keys on hidden columns are skipped.
    pub fn sort_keys(&self) -> Vec<(usize, SortDirection)> {
        self.directives
            .iter()
            .filter_map(|d| {
                self.view_column_for(d.source_column)
                    .map(|view_column| (view_column, d.direction))
            })
            .collect()
    }

    pub fn cancel_sorting(&mut self) {
        if self.directives.cancel_all() {
            self.sorting_changed();
        }
    }

    /// Applies a header activation: cycles the column's direction, replacing
    /// the whole sort unless the activation is additive.
    pub fn activate(&mut self, view_column: usize, activation: Activation) {
        let Some(column) = self.source_column_for(view_column) else {
            return;
        };
        let next = self.directives.direction_of(column).cycle(activation.reverse);

        let mut changed = false;
        if !activation.additive {
            changed |= self.directives.cancel_all();
        }
        changed |= self.set_directive(view_column, next);

        if changed {
            self.sorting_changed();
        }
    }

    fn set_directive(&mut self, view_column: usize, direction: SortDirection) -> bool {
        let Some(column) = self.source_column_for(view_column) else {
            debug!("view '{}': no column {} to sort", self.name, view_column);
            return false;
        };
        let meta = {
            let source = self.source.borrow();
            ColumnMeta {
                name: source.column_name(column).to_string(),
                kind: source.column_kind(column),
            }
        };
        self.directives.set_direction(column, direction, &meta)
    }

    fn sorting_changed(&mut self) {
        debug!(
            "view '{}': sort changed, {} keys",
            self.name,
            self.directives.len()
        );
        self.rows.get_mut().invalidate();
        self.emit(ViewChange::DataChanged);
    }

    // === Notifications ===

    pub fn subscribe<F>(&mut self, listener: F) -> SubscriptionId
    where
        F: FnMut(&ViewChange) + 'static,
    {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Returns false if the subscription was already gone.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(existing, _)| *existing != id);
        self.listeners.len() != before
    }

    fn emit(&mut self, change: ViewChange) {
        trace!("view '{}': emit {:?}", self.name, change);
        for (_, listener) in self.listeners.iter_mut() {
            listener(&change);
        }
    }

    /// Pulls and applies every source change logged since the last sync.
    /// Returns true if any of them affected the view.
    pub fn sync(&mut self) -> bool {
        let (pending, end) = {
            let source = self.source.borrow();
            let log = source.change_log();
            let pending = match log.since(self.cursor) {
                Some(changes) => changes.to_vec(),
                None => {
                    debug!(
                        "view '{}': change log compacted past cursor {}, rebuilding",
                        self.name, self.cursor
                    );
                    vec![SourceChange::structural()]
                }
            };
            (pending, log.end())
        };

        self.cursor = end;
        self.apply_changes(&pending)
    }

    /// Translates one source change. Returns true if it affected the view.
    fn apply_change(&mut self, change: &SourceChange) -> bool {
        if change.is_structural() {
            self.structure_changed();
            return true;
        }

        if !self.is_sorting() {
            return self.pass_through(change);
        }

        if self.options.fast_path {
            if let Some((model_row, column)) = change.single_cell() {
                if !self.directives.contains(column) && self.rows.get_mut().has_inverse() {
                    let view_row = self
                        .rows
                        .get_mut()
                        .cached_model_to_view()
                        .and_then(|m| m.get(model_row).copied());

                    match (view_row, self.view_column_for(column)) {
                        (Some(row), Some(column)) => {
                            self.emit(ViewChange::CellChanged { row, column });
                            return true;
                        }
                        // Hidden column: nothing visible changed, order unaffected
                        (Some(_), None) => return false,
                        // Row outside the cached index; fall back to re-sorting
                        (None, _) => {}
                    }
                }
            }
        }

        self.rows.get_mut().invalidate();
        self.emit(ViewChange::DataChanged);
        true
    }

    fn structure_changed(&mut self) {
        *self.columns.get_mut() = None;

        let columns = self.source.borrow().column_meta();
        for identity in self.directives.reconcile(&columns) {
            debug!(
                "view '{}': column '{}' is gone, dropping its sort",
                self.name, identity
            );
        }

        self.rows.get_mut().invalidate();
        self.emit(ViewChange::StructureChanged);
    }

    /// Unsorted views show source rows in place, so only the column needs
    /// translating.
    fn pass_through(&mut self, change: &SourceChange) -> bool {
        let column = match change.column {
            ColumnSpan::All => ColumnSpan::All,
            ColumnSpan::Column(column) => match self.view_column_for(column) {
                Some(view_column) => ColumnSpan::Column(view_column),
                None => return false,
            },
        };

        let translated = match (change.single_cell(), column) {
            (Some((row, _)), ColumnSpan::Column(column)) => ViewChange::CellChanged { row, column },
            _ => ViewChange::RowsChanged {
                first_row: change.first_row,
                last_row: change.last_row,
                column,
            },
        };
        self.emit(translated);
        true
    }
}

impl<S: TableSource> IncrementalView for SortableView<S> {
    fn apply_changes(&mut self, changes: &[SourceChange]) -> bool {
        let mut modified = false;
        for change in changes {
            modified |= self.apply_change(change);
        }
        modified
    }

    fn last_synced_cursor(&self) -> u64 {
        self.cursor
    }

    fn rebuild(&mut self) {
        self.rows.get_mut().invalidate();
        *self.columns.get_mut() = None;
    }
}

impl<S: TableSource> fmt::Debug for SortableView<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SortableView")
            .field("name", &self.name)
            .field("options", &self.options)
            .field("directives", &self.directives)
            .field("cached_index", &self.rows.borrow().is_built())
            .field("listeners", &self.listeners.len())
            .field("cursor", &self.cursor)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::{Schema, Table};
    use std::collections::HashMap;

    fn init_logging() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn record<S: TableSource>(view: &mut SortableView<S>) -> Rc<RefCell<Vec<ViewChange>>> {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        view.subscribe(move |change| sink.borrow_mut().push(*change));
        seen
    }

    /// Ten rows: rank 0..10, note "n0".."n9"
    fn ranked_table() -> Rc<RefCell<Table>> {
        let schema = Schema::new(vec![
            ("rank".to_string(), ValueKind::Int32, false),
            ("note".to_string(), ValueKind::String, true),
        ]);
        let table = Rc::new(RefCell::new(Table::new("ranked".to_string(), schema)));
        {
            let mut t = table.borrow_mut();
            for i in 0..10 {
                t.push_row(vec![Value::Int32(i), Value::String(format!("n{i}"))])
                    .unwrap();
            }
        }
        table
    }

    fn people_table() -> Rc<RefCell<Table>> {
        let schema = Schema::new(vec![
            ("Id".to_string(), ValueKind::Int32, false),
            ("Score".to_string(), ValueKind::Int32, false),
            ("Name".to_string(), ValueKind::String, false),
        ]);
        let table = Rc::new(RefCell::new(Table::new("people".to_string(), schema)));
        {
            let mut t = table.borrow_mut();
            t.push_row(vec![1.into(), 70.into(), "Carol".into()]).unwrap();
            t.push_row(vec![2.into(), 90.into(), "Alice".into()]).unwrap();
            t.push_row(vec![3.into(), 80.into(), "Dave".into()]).unwrap();
            t.push_row(vec![4.into(), 60.into(), "Bob".into()]).unwrap();
        }
        table
    }

    fn names(view: &SortableView<Table>, column: usize) -> Vec<String> {
        (0..view.row_count())
            .map(|r| view.value_at(r, column).unwrap().to_string())
            .collect()
    }

    #[test]
    fn test_unsorted_view_is_identity() {
        let table = people_table();
        let view = SortableView::new("v".to_string(), table.clone());

        assert!(!view.is_sorting());
        assert_eq!(view.row_count(), 4);
        assert_eq!(view.column_count(), 3);
        assert_eq!(view.model_index_of(2), Some(2));
        assert_eq!(view.view_index_of(3), Some(3));
        assert_eq!(view.model_index_of(4), None);
        assert_eq!(view.value_at(1, 2), Some(Value::String("Alice".to_string())));
        // Identity lookups never build the index
        assert!(!view.has_cached_index());
    }

    #[test]
    fn test_sort_ascending_by_name() {
        init_logging();
        let table = people_table();
        let mut view = SortableView::new("by_name".to_string(), table.clone());
        view.set_sort_direction(2, SortDirection::Ascending);

        assert_eq!(names(&view, 2), vec!["Alice", "Bob", "Carol", "Dave"]);
        assert_eq!(view.sort_direction_of(2), SortDirection::Ascending);
        assert_eq!(view.sort_direction_of(0), SortDirection::NotSorted);
        assert_eq!(view.sort_direction_of(99), SortDirection::NotSorted);
    }

    #[test]
    fn test_compound_sort_scenario() {
        let schema = Schema::new(vec![
            ("k".to_string(), ValueKind::String, false),
            ("n".to_string(), ValueKind::Int32, false),
        ]);
        let table = Rc::new(RefCell::new(Table::new("t".to_string(), schema)));
        {
            let mut t = table.borrow_mut();
            t.push_row(vec!["b".into(), 2.into()]).unwrap();
            t.push_row(vec!["a".into(), 1.into()]).unwrap();
            t.push_row(vec!["a".into(), 3.into()]).unwrap();
        }

        let mut view = SortableView::new("v".to_string(), table.clone());
        view.set_sort_direction(0, SortDirection::Ascending);
        view.set_sort_direction(1, SortDirection::Descending);

        assert_eq!(view.view_to_model(), vec![2, 1, 0]);
        assert_eq!(view.sort_keys(), vec![(0, SortDirection::Ascending), (1, SortDirection::Descending)]);
        assert_eq!(view.sort_priority_of(1), Some(1));
    }

    #[test]
    fn test_null_ordering() {
        let schema = Schema::new(vec![("v".to_string(), ValueKind::String, true)]);
        let table = Rc::new(RefCell::new(Table::new("t".to_string(), schema)));
        {
            let mut t = table.borrow_mut();
            t.push_row(vec![Value::Null]).unwrap();
            t.push_row(vec!["b".into()]).unwrap();
            t.push_row(vec!["a".into()]).unwrap();
        }

        let mut view = SortableView::new("v".to_string(), table.clone());
        view.set_sort_direction(0, SortDirection::Ascending);
        assert_eq!(view.view_to_model(), vec![0, 2, 1]);

        view.set_sort_direction(0, SortDirection::Descending);
        assert_eq!(view.view_to_model(), vec![1, 2, 0]);
    }

    #[test]
    fn test_inverse_consistency() {
        let table = people_table();
        let mut view = SortableView::new("v".to_string(), table.clone());
        view.set_sort_direction(1, SortDirection::Descending);

        let forward = view.view_to_model();
        for (v, &m) in forward.iter().enumerate() {
            assert_eq!(view.model_index_of(v), Some(m));
            assert_eq!(view.view_index_of(m), Some(v));
        }
    }

    #[test]
    fn test_fast_path_single_cell_edit() {
        init_logging();
        let table = ranked_table();
        let mut view = SortableView::new("v".to_string(), table.clone());
        view.set_sort_direction(0, SortDirection::Descending);

        // Build the inverse; row 5 sits at view row 4 when sorted 9..0
        assert_eq!(view.view_index_of(5), Some(4));
        let before = view.view_to_model();
        let seen = record(&mut view);

        table.borrow_mut().set_value(5, "note", "edited".into()).unwrap();
        assert!(view.sync());

        assert_eq!(*seen.borrow(), vec![ViewChange::CellChanged { row: 4, column: 1 }]);
        assert!(view.has_cached_index());
        assert_eq!(view.view_to_model(), before);
        assert_eq!(view.value_at(4, 1), Some(Value::String("edited".to_string())));
    }

    #[test]
    fn test_fast_path_needs_built_inverse() {
        let table = ranked_table();
        let mut view = SortableView::new("v".to_string(), table.clone());
        view.set_sort_direction(0, SortDirection::Descending);
        view.view_to_model();
        let seen = record(&mut view);

        table.borrow_mut().set_value(5, "note", "edited".into()).unwrap();
        view.sync();

        assert_eq!(*seen.borrow(), vec![ViewChange::DataChanged]);
        assert!(!view.has_cached_index());
    }

    #[test]
    fn test_fast_path_can_be_disabled() {
        let table = ranked_table();
        let options = ViewOptions {
            fast_path: false,
            ..ViewOptions::default()
        };
        let mut view = SortableView::with_options("v".to_string(), table.clone(), options);
        view.set_sort_direction(0, SortDirection::Descending);
        view.view_index_of(0);
        let seen = record(&mut view);

        table.borrow_mut().set_value(5, "note", "edited".into()).unwrap();
        view.sync();

        assert_eq!(*seen.borrow(), vec![ViewChange::DataChanged]);
    }

    #[test]
    fn test_edit_in_sorted_column_resorts() {
        let table = ranked_table();
        let mut view = SortableView::new("v".to_string(), table.clone());
        view.set_sort_direction(0, SortDirection::Descending);
        view.view_index_of(0);
        let seen = record(&mut view);

        table.borrow_mut().set_value(0, "rank", Value::Int32(100)).unwrap();
        view.sync();

        assert_eq!(*seen.borrow(), vec![ViewChange::DataChanged]);
        assert!(!view.has_cached_index());
        // Row 0 now has the highest rank
        assert_eq!(view.model_index_of(0), Some(0));
        assert_eq!(view.model_index_of(1), Some(9));
    }

    #[test]
    fn test_bulk_row_change_resorts() {
        let table = ranked_table();
        let mut view = SortableView::new("v".to_string(), table.clone());
        view.set_sort_direction(0, SortDirection::Ascending);
        view.view_index_of(0);
        let seen = record(&mut view);

        table
            .borrow_mut()
            .update_row(3, HashMap::from([("note".to_string(), Value::Null)]))
            .unwrap();
        view.sync();

        assert_eq!(*seen.borrow(), vec![ViewChange::DataChanged]);
    }

    #[test]
    fn test_structural_reconciliation_keeps_sort() {
        init_logging();
        let table = people_table();
        let mut view = SortableView::new("v".to_string(), table.clone());
        view.set_sort_direction(2, SortDirection::Ascending);
        let order_before = names(&view, 2);
        let seen = record(&mut view);

        table.borrow_mut().remove_column("Score").unwrap();
        view.sync();

        assert_eq!(*seen.borrow(), vec![ViewChange::StructureChanged]);
        assert_eq!(view.column_count(), 2);
        assert_eq!(view.sort_direction_of(1), SortDirection::Ascending);
        assert_eq!(view.directives().get(1).unwrap().column_identity, "Name");
        assert_eq!(names(&view, 1), order_before);
    }

    #[test]
    fn test_removing_sorted_column_drops_directive() {
        let table = people_table();
        let mut view = SortableView::new("v".to_string(), table.clone());
        view.set_sort_direction(1, SortDirection::Descending);
        assert!(view.is_sorting());

        table.borrow_mut().remove_column("Score").unwrap();
        view.sync();

        assert!(!view.is_sorting());
        assert_eq!(view.view_to_model(), vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_renamed_sorted_column_is_dropped() {
        let table = people_table();
        let mut view = SortableView::new("v".to_string(), table.clone());
        view.set_sort_direction(2, SortDirection::Ascending);

        table.borrow_mut().rename_column("Name", "FullName").unwrap();
        view.sync();

        assert!(!view.is_sorting());
        assert_eq!(view.column_name(2).as_deref(), Some("FullName"));
    }

    #[test]
    fn test_row_insert_is_structural() {
        let table = people_table();
        let mut view = SortableView::new("v".to_string(), table.clone());
        view.set_sort_direction(2, SortDirection::Ascending);
        view.view_index_of(0);
        let seen = record(&mut view);

        table
            .borrow_mut()
            .push_row(vec![5.into(), 50.into(), "Aaron".into()])
            .unwrap();
        view.sync();

        assert_eq!(*seen.borrow(), vec![ViewChange::StructureChanged]);
        assert_eq!(view.row_count(), 5);
        assert_eq!(view.model_index_of(0), Some(4));
        assert_eq!(names(&view, 2), vec!["Aaron", "Alice", "Bob", "Carol", "Dave"]);
    }

    #[test]
    fn test_burst_of_changes_sorts_once_on_read() {
        let table = ranked_table();
        let mut view = SortableView::new("v".to_string(), table.clone());
        view.set_sort_direction(0, SortDirection::Ascending);
        view.view_to_model();

        {
            let mut t = table.borrow_mut();
            for row in 0..10 {
                t.set_value(row, "rank", Value::Int32(10 - row as i32)).unwrap();
            }
        }
        view.sync();
        assert!(!view.has_cached_index());

        assert_eq!(view.view_to_model(), vec![9, 8, 7, 6, 5, 4, 3, 2, 1, 0]);
    }

    #[test]
    fn test_unsorted_pass_through() {
        let table = people_table();
        let mut view = SortableView::new("v".to_string(), table.clone());
        let seen = record(&mut view);

        table.borrow_mut().set_value(2, "Score", 81.into()).unwrap();
        table
            .borrow_mut()
            .update_row(1, HashMap::from([("Score".to_string(), Value::Int32(91))]))
            .unwrap();
        view.sync();

        assert_eq!(
            *seen.borrow(),
            vec![
                ViewChange::CellChanged { row: 2, column: 1 },
                ViewChange::RowsChanged {
                    first_row: 1,
                    last_row: 1,
                    column: ColumnSpan::All
                },
            ]
        );
        assert!(!view.has_cached_index());
    }

    #[test]
    fn test_set_value_through_sorted_view() {
        let table = ranked_table();
        let mut view = SortableView::new("v".to_string(), table.clone());
        view.set_sort_direction(0, SortDirection::Descending);
        view.view_index_of(0);
        let seen = record(&mut view);

        // View row 0 is model row 9
        view.set_value_at(0, 1, "top".into()).unwrap();

        assert_eq!(table.borrow().value_at(9, 1), Value::String("top".to_string()));
        assert_eq!(*seen.borrow(), vec![ViewChange::CellChanged { row: 0, column: 1 }]);
    }

    #[test]
    fn test_set_value_errors() {
        let table = people_table();
        table.borrow_mut().set_column_editable("Id", false).unwrap();
        let mut view = SortableView::new("v".to_string(), table.clone());

        assert!(!view.is_cell_editable(0, 0));
        assert!(view.is_cell_editable(0, 1));
        assert!(!view.is_cell_editable(10, 1));

        assert!(matches!(
            view.set_value_at(10, 1, 1.into()),
            Err(TableError::RowOutOfRange { row: 10, len: 4 })
        ));
        assert!(matches!(
            view.set_value_at(0, 7, 1.into()),
            Err(TableError::ColumnOutOfRange { column: 7, len: 3 })
        ));
        assert!(matches!(
            view.set_value_at(0, 0, 9.into()),
            Err(TableError::ReadOnlyCell { .. })
        ));
        assert!(matches!(
            view.set_value_at(0, 1, "high".into()),
            Err(TableError::KindMismatch { .. })
        ));
    }

    #[test]
    fn test_activation_toggle_policy() {
        let table = people_table();
        let mut view = SortableView::new("v".to_string(), table.clone());

        view.activate(2, Activation::plain());
        assert_eq!(view.sort_direction_of(2), SortDirection::Ascending);
        view.activate(2, Activation::plain());
        assert_eq!(view.sort_direction_of(2), SortDirection::Descending);
        view.activate(2, Activation::plain());
        assert_eq!(view.sort_direction_of(2), SortDirection::NotSorted);

        view.activate(1, Activation::reversed());
        assert_eq!(view.sort_direction_of(1), SortDirection::Descending);

        // Plain activation on another column replaces the sort
        view.activate(2, Activation::plain());
        assert_eq!(view.sort_keys(), vec![(2, SortDirection::Ascending)]);

        // Additive activation extends it
        view.activate(1, Activation::additive());
        assert_eq!(
            view.sort_keys(),
            vec![(2, SortDirection::Ascending), (1, SortDirection::Ascending)]
        );
        view.activate(1, Activation::additive());
        assert_eq!(view.sort_direction_of(1), SortDirection::Descending);
        assert_eq!(view.sort_priority_of(1), Some(1));
    }

    #[test]
    fn test_sort_changes_notify_once() {
        let table = people_table();
        let mut view = SortableView::new("v".to_string(), table.clone());
        let seen = record(&mut view);

        view.set_sort_direction(2, SortDirection::Ascending);
        view.set_sort_direction(2, SortDirection::Ascending);
        view.activate(1, Activation::plain());
        view.cancel_sorting();
        view.cancel_sorting();

        assert_eq!(
            *seen.borrow(),
            vec![ViewChange::DataChanged, ViewChange::DataChanged, ViewChange::DataChanged]
        );
        assert!(!view.is_sorting());
    }

    #[test]
    fn test_named_layout() {
        let table = people_table();
        let options = ViewOptions {
            columns: ColumnLayout::Named(vec!["Name".to_string(), "Id".to_string()]),
            ..ViewOptions::default()
        };
        let mut view = SortableView::with_options("v".to_string(), table.clone(), options);

        assert_eq!(view.column_count(), 2);
        assert_eq!(view.column_name(0).as_deref(), Some("Name"));
        assert_eq!(view.column_kind(1), Some(ValueKind::Int32));
        assert_eq!(view.view_column_for(1), None);

        view.set_sort_direction(0, SortDirection::Descending);
        assert_eq!(names(&view, 0), vec!["Dave", "Carol", "Bob", "Alice"]);
        assert_eq!(view.value_at(0, 1), Some(Value::Int32(3)));

        // Edits to the hidden column are invisible once the inverse exists
        view.view_index_of(0);
        let seen = record(&mut view);
        table.borrow_mut().set_value(0, "Score", 10.into()).unwrap();
        assert!(!view.sync());
        assert!(seen.borrow().is_empty());
        assert!(view.has_cached_index());
    }

    #[test]
    fn test_compacted_log_forces_rebuild() {
        let table = people_table();
        let mut view = SortableView::new("v".to_string(), table.clone());
        view.set_sort_direction(2, SortDirection::Ascending);
        let seen = record(&mut view);

        {
            let mut t = table.borrow_mut();
            t.set_value(0, "Name", "Zoe".into()).unwrap();
            let end = t.change_log().end();
            t.compact_changes(end);
        }
        view.sync();

        assert_eq!(*seen.borrow(), vec![ViewChange::StructureChanged]);
        assert_eq!(view.last_synced_cursor(), table.borrow().change_log().end());
        assert_eq!(names(&view, 2), vec!["Alice", "Bob", "Dave", "Zoe"]);
    }

    #[test]
    fn test_empty_source() {
        let table = Rc::new(RefCell::new(Table::new(
            "empty".to_string(),
            Schema::new(vec![("a".to_string(), ValueKind::Int32, false)]),
        )));
        let mut view = SortableView::new("v".to_string(), table.clone());
        view.set_sort_direction(0, SortDirection::Ascending);

        assert_eq!(view.row_count(), 0);
        assert!(view.view_to_model().is_empty());
        assert_eq!(view.model_index_of(0), None);
        assert_eq!(view.view_index_of(0), None);
        assert_eq!(view.value_at(0, 0), None);
    }

    #[test]
    fn test_zero_columns() {
        let table = Rc::new(RefCell::new(Table::new("none".to_string(), Schema::new(vec![]))));
        let mut view = SortableView::new("v".to_string(), table.clone());

        assert_eq!(view.column_count(), 0);
        view.set_sort_direction(0, SortDirection::Ascending);
        assert!(!view.is_sorting());
        assert_eq!(view.column_name(0), None);
    }

    #[test]
    fn test_unsubscribe() {
        let table = people_table();
        let mut view = SortableView::new("v".to_string(), table.clone());
        let count = Rc::new(RefCell::new(0));
        let counter = count.clone();
        let id = view.subscribe(move |_| *counter.borrow_mut() += 1);

        view.set_sort_direction(0, SortDirection::Ascending);
        assert!(view.unsubscribe(id));
        assert!(!view.unsubscribe(id));
        view.cancel_sorting();

        assert_eq!(*count.borrow(), 1);
    }

    #[test]
    fn test_sync_without_changes() {
        let table = people_table();
        let mut view = SortableView::new("v".to_string(), table.clone());
        assert!(!view.sync());
        assert_eq!(view.last_synced_cursor(), table.borrow().change_log().end());
    }

    #[test]
    fn test_view_options_from_json() {
        let options = ViewOptions::from_json(r#"{"columns": {"named": ["Name", "Id"]}}"#).unwrap();
        assert_eq!(
            options.columns,
            ColumnLayout::Named(vec!["Name".to_string(), "Id".to_string()])
        );
        assert!(options.fast_path);

        let options = ViewOptions::from_json(r#"{"fast_path": false}"#).unwrap();
        assert_eq!(options.columns, ColumnLayout::All);
        assert!(!options.fast_path);

        assert!(ViewOptions::from_json("not json").is_err());
    }
}
