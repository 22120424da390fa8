//! Multi-column sort order

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use sg_core::{compare_keys, SortDirection, SortKey, TypedValueFormatter};
use sg_data::TabularDataSource;
use tracing::{debug, warn};

/// Ordered column -> direction mapping; the first entry is the primary key
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SortSpec {
    levels: IndexMap<String, SortDirection>,
}

impl SortSpec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set or remove the sort on `column`; returns whether anything changed
    ///
    /// A column that is already sorted keeps its precedence.
    pub fn set(&mut self, column: &str, direction: Option<SortDirection>) -> bool {
        match direction {
            Some(direction) => self.levels.insert(column.to_string(), direction) != Some(direction),
            None => self.levels.shift_remove(column).is_some(),
        }
    }

    pub fn clear(&mut self) -> bool {
        let changed = !self.levels.is_empty();
        self.levels.clear();
        changed
    }

    pub fn direction(&self, column: &str) -> Option<SortDirection> {
        self.levels.get(column).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    /// Levels in precedence order
    pub fn levels(&self) -> Vec<(String, SortDirection)> {
        self.levels.iter().map(|(c, d)| (c.clone(), *d)).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &SortDirection)> {
        self.levels.iter()
    }

    /// Reorder `positions` (source row positions) by this spec
    ///
    /// Single-column stable sorts run from the lowest-priority level to the
    /// highest. Levels on hidden columns stay recorded but are skipped.
    pub fn apply<F>(&self, source: &dyn TabularDataSource, positions: &mut [usize], is_hidden: F)
    where
        F: Fn(&str) -> bool,
    {
        for (column, direction) in self.levels.iter().rev() {
            if is_hidden(column) {
                debug!("Skipping sort on hidden column '{}'", column);
                continue;
            }
            let Some(def) = source.schema().column(column) else {
                warn!("Ignoring sort on unknown column '{}'", column);
                continue;
            };
            let Some(col_idx) = source.schema().index_of(column) else {
                continue;
            };

            let keys: Vec<Option<SortKey>> = (0..source.row_count())
                .map(|pos| {
                    source
                        .value_at(pos, col_idx)
                        .and_then(|v| TypedValueFormatter::sort_key(v, def.dtype))
                })
                .collect();

            positions.sort_by(|a, b| {
                compare_keys(
                    keys.get(*a).and_then(Option::as_ref),
                    keys.get(*b).and_then(Option::as_ref),
                    *direction,
                )
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sg_core::{CellValue, ColumnDef, DataType, TableSchema};
    use sg_data::MemoryTable;

    fn pairs(rows: &[(Option<i64>, &str)]) -> MemoryTable {
        let schema = TableSchema::new(vec![
            ColumnDef::new("n", DataType::Int),
            ColumnDef::new("s", DataType::Text),
        ])
        .unwrap();
        MemoryTable::from_rows(
            schema,
            rows.iter().map(|(n, s)| vec![CellValue::from(*n), CellValue::text(*s)]).collect(),
        )
        .unwrap()
    }

    fn sorted(table: &MemoryTable, spec: &SortSpec, hidden: &[&str]) -> Vec<usize> {
        let mut positions: Vec<usize> = (0..table.row_count()).collect();
        spec.apply(table, &mut positions, |c| hidden.contains(&c));
        positions
    }

    #[test]
    fn test_multi_sort_tie_break() {
        let table = pairs(&[(Some(1), "b"), (Some(1), "a"), (Some(2), "a")]);
        let mut spec = SortSpec::new();
        spec.set("n", Some(SortDirection::Ascending));
        spec.set("s", Some(SortDirection::Ascending));

        assert_eq!(sorted(&table, &spec, &[]), vec![1, 0, 2]);
    }

    #[test]
    fn test_precedence_follows_insertion_order() {
        let table = pairs(&[(Some(1), "b"), (Some(1), "a"), (Some(2), "a")]);
        let mut spec = SortSpec::new();
        spec.set("s", Some(SortDirection::Ascending));
        spec.set("n", Some(SortDirection::Descending));

        assert_eq!(sorted(&table, &spec, &[]), vec![2, 1, 0]);
    }

    #[test]
    fn test_missing_values_last_both_directions() {
        let table = pairs(&[(None, "x"), (Some(5), "y"), (Some(2), "z")]);
        let mut spec = SortSpec::new();
        spec.set("n", Some(SortDirection::Ascending));
        assert_eq!(sorted(&table, &spec, &[]), vec![2, 1, 0]);

        spec.set("n", Some(SortDirection::Descending));
        assert_eq!(sorted(&table, &spec, &[]), vec![1, 2, 0]);
    }

    #[test]
    fn test_hidden_columns_are_skipped_but_kept() {
        let table = pairs(&[(Some(2), "a"), (Some(1), "b")]);
        let mut spec = SortSpec::new();
        spec.set("n", Some(SortDirection::Ascending));

        assert_eq!(sorted(&table, &spec, &["n"]), vec![0, 1]);
        assert_eq!(spec.direction("n"), Some(SortDirection::Ascending));
        assert_eq!(sorted(&table, &spec, &[]), vec![1, 0]);
    }

    #[test]
    fn test_set_reports_changes() {
        let mut spec = SortSpec::new();
        assert!(spec.set("n", Some(SortDirection::Ascending)));
        assert!(!spec.set("n", Some(SortDirection::Ascending)));
        assert!(spec.set("n", Some(SortDirection::Descending)));
        assert!(spec.set("n", None));
        assert!(!spec.clear());
    }
}
