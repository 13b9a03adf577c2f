//! Sort directives and the priority-ordered directive stack.
//!
//! A directive is one column's contribution to a compound sort. The stack
//! keeps at most one directive per source column; the first directive is the
//! primary key and later ones only break ties.

use crate::comparator::{self, Comparator};
use crate::source::ColumnMeta;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Sort direction of a single column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    /// Column does not take part in the sort
    #[default]
    NotSorted,
    /// Smallest first (nulls first)
    Ascending,
    /// Largest first (nulls last)
    Descending,
}

impl SortDirection {
    pub fn is_sorted(self) -> bool {
        self != SortDirection::NotSorted
    }

    /// Applies this direction to an ascending comparison result.
    pub fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            SortDirection::Descending => ordering.reverse(),
            _ => ordering,
        }
    }

    /// Next state in the header-click cycle.
    ///
    /// Forward: `NotSorted -> Ascending -> Descending -> NotSorted`.
    /// Reverse runs the same cycle backwards.
    pub fn cycle(self, reverse: bool) -> SortDirection {
        use SortDirection::*;
        match (self, reverse) {
            (NotSorted, false) => Ascending,
            (Ascending, false) => Descending,
            (Descending, false) => NotSorted,
            (NotSorted, true) => Descending,
            (Descending, true) => Ascending,
            (Ascending, true) => NotSorted,
        }
    }
}

/// How a column header was activated by the input layer.
///
/// `reverse` is the shift-style modifier that cycles directions backwards.
/// `additive` is the control-style modifier that extends the compound sort
/// instead of replacing it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Activation {
    pub reverse: bool,
    pub additive: bool,
}

impl Activation {
    pub fn plain() -> Self {
        Activation::default()
    }

    pub fn reversed() -> Self {
        Activation {
            reverse: true,
            additive: false,
        }
    }

    pub fn additive() -> Self {
        Activation {
            reverse: false,
            additive: true,
        }
    }
}

/// One column's entry in the compound sort.
#[derive(Debug, Clone)]
pub struct SortDirective {
    /// Source column currently holding the sorted values
    pub source_column: usize,
    /// Never `NotSorted` while stored in a `DirectiveStack`
    pub direction: SortDirection,
    pub comparator: Comparator,
    /// Column name when the directive was created; used to find the column
    /// again after its index shifts
    pub column_identity: String,
}

impl SortDirective {
    pub fn new(source_column: usize, direction: SortDirection, column: &ColumnMeta) -> Self {
        SortDirective {
            source_column,
            direction,
            comparator: comparator::resolve(column.kind),
            column_identity: column.name.clone(),
        }
    }
}

/// Priority-ordered list of active sort directives.
#[derive(Debug, Clone, Default)]
pub struct DirectiveStack {
    directives: Vec<SortDirective>,
}

impl DirectiveStack {
    pub fn new() -> Self {
        DirectiveStack::default()
    }

    pub fn len(&self) -> usize {
        self.directives.len()
    }

    pub fn is_empty(&self) -> bool {
        self.directives.is_empty()
    }

    /// Directives in priority order, primary key first.
    pub fn iter(&self) -> impl Iterator<Item = &SortDirective> {
        self.directives.iter()
    }

    pub fn get(&self, source_column: usize) -> Option<&SortDirective> {
        self.directives
            .iter()
            .find(|d| d.source_column == source_column)
    }

    pub fn contains(&self, source_column: usize) -> bool {
        self.get(source_column).is_some()
    }

    /// Direction for a column, `NotSorted` when it has no directive.
    pub fn direction_of(&self, source_column: usize) -> SortDirection {
        self.get(source_column)
            .map(|d| d.direction)
            .unwrap_or_default()
    }

    /// Position of the column's directive in the stack (0 = primary key).
    pub fn priority_of(&self, source_column: usize) -> Option<usize> {
        self.directives
            .iter()
            .position(|d| d.source_column == source_column)
    }

    /// Sets, replaces or removes the directive for a column.
    ///
    /// `NotSorted` removes it. A replaced directive keeps its priority; a new
    /// one becomes the lowest-priority key. Returns true if the stack changed.
    pub fn set_direction(
        &mut self,
        source_column: usize,
        direction: SortDirection,
        column: &ColumnMeta,
    ) -> bool {
        let position = self.priority_of(source_column);

        match (position, direction.is_sorted()) {
            (Some(pos), false) => {
                self.directives.remove(pos);
                true
            }
            (None, false) => false,
            (Some(pos), true) => {
                let changed = self.directives[pos].direction != direction;
                self.directives[pos] = SortDirective::new(source_column, direction, column);
                changed
            }
            (None, true) => {
                self.directives
                    .push(SortDirective::new(source_column, direction, column));
                true
            }
        }
    }

    /// Removes every directive. Returns true if any were active.
    pub fn cancel_all(&mut self) -> bool {
        let had_any = !self.directives.is_empty();
        self.directives.clear();
        had_any
    }

    /// Re-locates every directive by column name after a structural change.
    ///
    /// A directive whose column moved gets its index rewritten in place and
    /// its comparator re-resolved from the column's current kind. A directive
    /// whose column is gone, or whose name now resolves to a column already
    /// claimed by a higher-priority directive, is dropped. Duplicate names
    /// resolve to the first match.
    ///
    /// Returns the identities of dropped directives.
    pub fn reconcile(&mut self, columns: &[ColumnMeta]) -> Vec<String> {
        let mut dropped = Vec::new();
        let mut claimed: Vec<usize> = Vec::with_capacity(self.directives.len());

        self.directives.retain_mut(|directive| {
            let found = columns
                .iter()
                .position(|c| c.name == directive.column_identity);

            match found {
                Some(index) if !claimed.contains(&index) => {
                    claimed.push(index);
                    directive.source_column = index;
                    directive.comparator = comparator::resolve(columns[index].kind);
                    true
                }
                _ => {
                    dropped.push(directive.column_identity.clone());
                    false
                }
            }
        });

        dropped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::ValueKind;

    fn meta(name: &str, kind: ValueKind) -> ColumnMeta {
        ColumnMeta {
            name: name.to_string(),
            kind,
        }
    }

    #[test]
    fn test_direction_cycle() {
        use SortDirection::*;
        assert_eq!(NotSorted.cycle(false), Ascending);
        assert_eq!(Ascending.cycle(false), Descending);
        assert_eq!(Descending.cycle(false), NotSorted);

        assert_eq!(NotSorted.cycle(true), Descending);
        assert_eq!(Descending.cycle(true), Ascending);
        assert_eq!(Ascending.cycle(true), NotSorted);
    }

    #[test]
    fn test_set_direction_adds_in_priority_order() {
        let mut stack = DirectiveStack::new();
        stack.set_direction(2, SortDirection::Ascending, &meta("city", ValueKind::String));
        stack.set_direction(0, SortDirection::Descending, &meta("age", ValueKind::Int32));

        let order: Vec<usize> = stack.iter().map(|d| d.source_column).collect();
        assert_eq!(order, vec![2, 0]);
        assert_eq!(stack.priority_of(0), Some(1));
        assert_eq!(stack.direction_of(0), SortDirection::Descending);
        assert_eq!(stack.direction_of(1), SortDirection::NotSorted);
    }

    #[test]
    fn test_replace_keeps_priority_and_single_entry() {
        let mut stack = DirectiveStack::new();
        let city = meta("city", ValueKind::String);
        stack.set_direction(2, SortDirection::Ascending, &city);
        stack.set_direction(0, SortDirection::Ascending, &meta("age", ValueKind::Int32));

        assert!(stack.set_direction(2, SortDirection::Descending, &city));
        assert_eq!(stack.len(), 2);
        assert_eq!(stack.priority_of(2), Some(0));
        assert_eq!(stack.direction_of(2), SortDirection::Descending);

        // Same direction again is not a change
        assert!(!stack.set_direction(2, SortDirection::Descending, &city));
    }

    #[test]
    fn test_not_sorted_removes_and_is_never_stored() {
        let mut stack = DirectiveStack::new();
        let name = meta("name", ValueKind::String);
        assert!(!stack.set_direction(1, SortDirection::NotSorted, &name));
        assert!(stack.is_empty());

        stack.set_direction(1, SortDirection::Ascending, &name);
        assert!(stack.set_direction(1, SortDirection::NotSorted, &name));
        assert!(stack.is_empty());
    }

    #[test]
    fn test_cancel_all() {
        let mut stack = DirectiveStack::new();
        assert!(!stack.cancel_all());
        stack.set_direction(0, SortDirection::Ascending, &meta("a", ValueKind::Int32));
        assert!(stack.cancel_all());
        assert!(stack.is_empty());
    }

    #[test]
    fn test_reconcile_follows_moved_column() {
        let mut stack = DirectiveStack::new();
        stack.set_direction(2, SortDirection::Ascending, &meta("Name", ValueKind::String));
        stack.set_direction(0, SortDirection::Descending, &meta("Id", ValueKind::Int32));

        // "Age" (old index 1) removed, "Id" moved to the end
        let columns = vec![meta("Name", ValueKind::String), meta("Id", ValueKind::Int32)];
        let dropped = stack.reconcile(&columns);

        assert!(dropped.is_empty());
        let order: Vec<(usize, SortDirection)> =
            stack.iter().map(|d| (d.source_column, d.direction)).collect();
        assert_eq!(
            order,
            vec![(0, SortDirection::Ascending), (1, SortDirection::Descending)]
        );
    }

    #[test]
    fn test_reconcile_drops_missing_column() {
        let mut stack = DirectiveStack::new();
        stack.set_direction(0, SortDirection::Ascending, &meta("Name", ValueKind::String));
        stack.set_direction(1, SortDirection::Ascending, &meta("Age", ValueKind::Int32));

        let dropped = stack.reconcile(&[meta("Age", ValueKind::Int32)]);
        assert_eq!(dropped, vec!["Name".to_string()]);
        assert_eq!(stack.len(), 1);
        assert_eq!(stack.direction_of(0), SortDirection::Ascending);
    }

    #[test]
    fn test_reconcile_duplicate_names_first_match_wins() {
        let mut stack = DirectiveStack::new();
        stack.set_direction(3, SortDirection::Ascending, &meta("x", ValueKind::Int32));
        stack.set_direction(5, SortDirection::Descending, &meta("x", ValueKind::Int32));

        let columns = vec![
            meta("y", ValueKind::Int32),
            meta("x", ValueKind::Int32),
            meta("x", ValueKind::Int32),
        ];
        let dropped = stack.reconcile(&columns);

        // Both resolve to index 1; the lower-priority one is dropped
        assert_eq!(dropped.len(), 1);
        assert_eq!(stack.len(), 1);
        assert_eq!(stack.direction_of(1), SortDirection::Ascending);
    }

    #[test]
    fn test_reconcile_re_resolves_comparator() {
        let mut stack = DirectiveStack::new();
        stack.set_direction(0, SortDirection::Ascending, &meta("v", ValueKind::String));
        stack.reconcile(&[meta("v", ValueKind::Any)]);

        let directive = stack.get(0).unwrap();
        // Lexical comparator ignores case
        assert_eq!(
            (directive.comparator)(&"A".into(), &"a".into()),
            Ordering::Equal
        );
    }
}
