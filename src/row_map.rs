//! Lazily built view/model row index mapping.
//!
//! `view_to_model[v]` is the source row shown at view row `v`, and
//! `model_to_view` is its inverse. Both start absent, the forward array is
//! built on first read and the inverse only when someone asks for it.
//! Invalidation just drops them, so a burst of changes costs one sort on
//! the next read instead of one per change.

use crate::directive::DirectiveStack;
use crate::source::TableSource;
use log::debug;
use std::cmp::Ordering;

#[derive(Debug, Clone, Default)]
pub struct RowIndexMap {
    view_to_model: Option<Vec<usize>>,
    model_to_view: Option<Vec<usize>>,
}

impl RowIndexMap {
    pub fn new() -> Self {
        RowIndexMap::default()
    }

    pub fn invalidate(&mut self) {
        self.view_to_model = None;
        self.model_to_view = None;
    }

    pub fn is_built(&self) -> bool {
        self.view_to_model.is_some()
    }

    pub fn has_inverse(&self) -> bool {
        self.model_to_view.is_some()
    }

    /// Forward array if it has been built, without building it.
    pub fn cached_view_to_model(&self) -> Option<&[usize]> {
        self.view_to_model.as_deref()
    }

    /// Inverse array if it has been built, without building it.
    pub fn cached_model_to_view(&self) -> Option<&[usize]> {
        self.model_to_view.as_deref()
    }

    /// Forward array, building it first if absent.
    pub fn view_to_model<S>(&mut self, source: &S, directives: &DirectiveStack) -> &[usize]
    where
        S: TableSource + ?Sized,
    {
        self.view_to_model
            .get_or_insert_with(|| sorted_rows(source, directives))
    }

    /// Inverse array, building it (and the forward array) first if absent.
    pub fn model_to_view<S>(&mut self, source: &S, directives: &DirectiveStack) -> &[usize]
    where
        S: TableSource + ?Sized,
    {
        if self.model_to_view.is_none() {
            let inverse = invert(self.view_to_model(source, directives));
            self.model_to_view = Some(inverse);
        }
        self.model_to_view.as_deref().unwrap_or_default()
    }
}

/// Source rows in view order: identity when there are no directives,
/// otherwise stable-sorted by the directive stack.
fn sorted_rows<S>(source: &S, directives: &DirectiveStack) -> Vec<usize>
where
    S: TableSource + ?Sized,
{
    let row_count = source.row_count();
    let mut rows: Vec<usize> = (0..row_count).collect();

    if !directives.is_empty() {
        // sort_by is stable: rows tied on every key keep source order
        rows.sort_by(|&a, &b| compare_rows(source, directives, a, b));
    }

    debug!(
        "built row index: {} rows, {} sort keys",
        row_count,
        directives.len()
    );
    rows
}

/// Compares two source rows under the directive stack.
///
/// For each directive in priority order: null sorts before non-null, two
/// nulls tie, otherwise the directive's comparator decides. Descending
/// reverses the whole result, nulls included. The first non-equal key wins.
pub fn compare_rows<S>(source: &S, directives: &DirectiveStack, a: usize, b: usize) -> Ordering
where
    S: TableSource + ?Sized,
{
    for directive in directives.iter() {
        let val_a = source.value_at(a, directive.source_column);
        let val_b = source.value_at(b, directive.source_column);

        let ordering = match (val_a.is_null(), val_b.is_null()) {
            (true, true) => Ordering::Equal,
            (true, false) => Ordering::Less,
            (false, true) => Ordering::Greater,
            (false, false) => (directive.comparator)(&val_a, &val_b),
        };

        let ordering = directive.direction.apply(ordering);
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    Ordering::Equal
}

fn invert(view_to_model: &[usize]) -> Vec<usize> {
    let mut model_to_view = vec![0; view_to_model.len()];
    for (view_row, &model_row) in view_to_model.iter().enumerate() {
        model_to_view[model_row] = view_row;
    }
    model_to_view
}
