//! View column to source column mapping.

use crate::source::ColumnMeta;
use serde::{Deserialize, Serialize};

/// Which source columns a view shows, and in what order.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnLayout {
    /// Every source column, in source order
    #[default]
    All,
    /// The named columns in the listed order. Names that match no source
    /// column are skipped; duplicate source names resolve to the first match.
    Named(Vec<String>),
}

/// Mapping between view columns and source columns, built from a snapshot of
/// the source's column list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnIndirection {
    view_to_source: Vec<usize>,
}

impl ColumnIndirection {
    pub fn build(layout: &ColumnLayout, columns: &[ColumnMeta]) -> Self {
        let view_to_source = match layout {
            ColumnLayout::All => (0..columns.len()).collect(),
            ColumnLayout::Named(names) => {
                let mut mapped: Vec<usize> = Vec::with_capacity(names.len());
                for name in names {
                    if let Some(index) = columns.iter().position(|c| &c.name == name) {
                        if !mapped.contains(&index) {
                            mapped.push(index);
                        }
                    }
                }
                mapped
            }
        };
        ColumnIndirection { view_to_source }
    }

    pub fn len(&self) -> usize {
        self.view_to_source.len()
    }

    pub fn is_empty(&self) -> bool {
        self.view_to_source.is_empty()
    }

    pub fn source_column_for(&self, view_column: usize) -> Option<usize> {
        self.view_to_source.get(view_column).copied()
    }

    /// `None` when the source column is not shown.
    pub fn view_column_for(&self, source_column: usize) -> Option<usize> {
        self.view_to_source
            .iter()
            .position(|&c| c == source_column)
    }
}
