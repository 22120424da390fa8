//! Column layout projections and header decoration

use ahash::AHashSet;
use serde::{Deserialize, Serialize};

use crate::consts::{CUSTOM_VIEW_NAME, DEFAULT_VIEW_NAME};
use crate::error::GridError;
use crate::order::SortDirection;

/// A named column layout: visible columns in order plus the hidden remainder
///
/// Equality compares layout only: the hidden set ignoring order, and the
/// visible order exactly. Names are not compared.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewProjection {
    pub name: String,
    pub column_order: Vec<String>,
    pub hidden_cols: Vec<String>,
}

impl PartialEq for ViewProjection {
    fn eq(&self, other: &Self) -> bool {
        if self.column_order != other.column_order || self.hidden_cols.len() != other.hidden_cols.len() {
            return false;
        }
        let hidden: AHashSet<&String> = self.hidden_cols.iter().collect();
        other.hidden_cols.iter().all(|c| hidden.contains(c))
    }
}

impl ViewProjection {
    pub fn new(name: impl Into<String>, column_order: Vec<String>, hidden_cols: Vec<String>) -> Self {
        Self {
            name: name.into(),
            column_order,
            hidden_cols,
        }
    }

    /// All columns visible in declared order
    pub fn default_for(columns: &[String]) -> Self {
        Self::new(DEFAULT_VIEW_NAME, columns.to_vec(), Vec::new())
    }

    /// Check that visible and hidden columns partition `all_columns`
    pub fn validate(&self, all_columns: &[String]) -> Result<(), GridError> {
        let mut seen: AHashSet<&str> = AHashSet::with_capacity(all_columns.len());
        for column in self.column_order.iter().chain(&self.hidden_cols) {
            if !all_columns.iter().any(|c| c == column) {
                return Err(GridError::InvalidProjection(format!(
                    "view '{}' references unknown column '{}'",
                    self.name, column
                )));
            }
            if !seen.insert(column.as_str()) {
                return Err(GridError::InvalidProjection(format!(
                    "view '{}' lists column '{}' more than once",
                    self.name, column
                )));
            }
        }
        if seen.len() != all_columns.len() {
            return Err(GridError::InvalidProjection(format!(
                "view '{}' does not place every column",
                self.name
            )));
        }
        Ok(())
    }

    pub fn is_visible(&self, column: &str) -> bool {
        self.column_order.iter().any(|c| c == column)
    }

    pub fn is_hidden(&self, column: &str) -> bool {
        self.hidden_cols.iter().any(|c| c == column)
    }

    /// Copy of this layout with `column` hidden, tagged as Custom
    pub fn with_hidden(&self, column: &str) -> Self {
        let mut next = self.clone();
        next.name = CUSTOM_VIEW_NAME.to_string();
        if let Some(pos) = next.column_order.iter().position(|c| c == column) {
            let removed = next.column_order.remove(pos);
            next.hidden_cols.push(removed);
        }
        next
    }

    /// Copy of this layout with the visible column at `from` moved to `to`
    pub fn with_moved(&self, from: usize, to: usize) -> Self {
        let mut next = self.clone();
        next.name = CUSTOM_VIEW_NAME.to_string();
        if from < next.column_order.len() {
            let column = next.column_order.remove(from);
            let to = to.min(next.column_order.len());
            next.column_order.insert(to, column);
        }
        next
    }
}

/// Header decoration reflecting filter and sort state of a column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HeaderIcon {
    Default,
    Filter,
    SortAscending,
    SortDescending,
    FilterSortAscending,
    FilterSortDescending,
}

impl HeaderIcon {
    pub fn resolve(filtered: bool, sort: Option<SortDirection>) -> Self {
        match (filtered, sort) {
            (true, Some(SortDirection::Ascending)) => HeaderIcon::FilterSortAscending,
            (true, Some(SortDirection::Descending)) => HeaderIcon::FilterSortDescending,
            (true, None) => HeaderIcon::Filter,
            (false, Some(SortDirection::Ascending)) => HeaderIcon::SortAscending,
            (false, Some(SortDirection::Descending)) => HeaderIcon::SortDescending,
            (false, None) => HeaderIcon::Default,
        }
    }
}
