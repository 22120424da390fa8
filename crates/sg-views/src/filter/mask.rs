//! Per-column accepted-value sets and the row inclusion mask

use ahash::AHashSet;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use sg_core::CellValue;
use sg_data::TabularDataSource;
use tracing::warn;

/// Accepted raw values for one column
///
/// Never empty. `CellValue::Null` in the list accepts missing values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterSet {
    values: Vec<CellValue>,
}

impl FilterSet {
    /// Build a filter set; an empty list means "no filter" and yields `None`
    pub fn new(values: Vec<CellValue>) -> Option<Self> {
        let mut seen = AHashSet::with_capacity(values.len());
        let values: Vec<CellValue> = values.into_iter().filter(|v| seen.insert(v.clone())).collect();
        if values.is_empty() {
            None
        } else {
            Some(Self { values })
        }
    }

    pub fn values(&self) -> &[CellValue] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn contains(&self, value: &CellValue) -> bool {
        self.values.contains(value)
    }

    /// Whether missing values pass this filter
    pub fn accepts_missing(&self) -> bool {
        self.values.iter().any(CellValue::is_null)
    }

    fn matcher(&self) -> FilterMatcher<'_> {
        FilterMatcher {
            accepts_missing: self.accepts_missing(),
            accepted: self.values.iter().filter(|v| !v.is_null()).collect(),
        }
    }
}

/// `isnull(value) OR value in accepted`, split once per recompute
struct FilterMatcher<'a> {
    accepts_missing: bool,
    accepted: AHashSet<&'a CellValue>,
}

impl FilterMatcher<'_> {
    fn accepts(&self, value: &CellValue) -> bool {
        if value.is_null() {
            self.accepts_missing
        } else {
            self.accepted.contains(value)
        }
    }
}

/// Active column filters, in the order they were first set
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterMap {
    filters: IndexMap<String, FilterSet>,
}

impl FilterMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set or remove the filter on `column`; returns whether anything changed
    ///
    /// `None` and an empty list both remove the entry.
    pub fn set(&mut self, column: &str, values: Option<Vec<CellValue>>) -> bool {
        match values.and_then(FilterSet::new) {
            Some(set) => {
                if self.filters.get(column) == Some(&set) {
                    return false;
                }
                self.filters.insert(column.to_string(), set);
                true
            }
            None => self.remove(column),
        }
    }

    pub fn remove(&mut self, column: &str) -> bool {
        self.filters.shift_remove(column).is_some()
    }

    pub fn clear(&mut self) -> bool {
        let changed = !self.filters.is_empty();
        self.filters.clear();
        changed
    }

    pub fn get(&self, column: &str) -> Option<&FilterSet> {
        self.filters.get(column)
    }

    pub fn contains(&self, column: &str) -> bool {
        self.filters.contains_key(column)
    }

    pub fn is_active(&self) -> bool {
        !self.filters.is_empty()
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    pub fn columns(&self) -> Vec<String> {
        self.filters.keys().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &FilterSet)> {
        self.filters.iter()
    }
}

/// Boolean inclusion flag per source row position
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowFilterMask {
    bits: Vec<bool>,
}

impl RowFilterMask {
    /// Mask that includes every row
    pub fn all(rows: usize) -> Self {
        Self { bits: vec![true; rows] }
    }

    /// AND of every active filter over the source rows
    pub fn compute(source: &dyn TabularDataSource, filters: &FilterMap) -> Self {
        Self::compute_excluding(source, filters, None)
    }

    /// Like [`RowFilterMask::compute`] but ignoring the filter on `skip`
    pub fn compute_excluding(source: &dyn TabularDataSource, filters: &FilterMap, skip: Option<&str>) -> Self {
        let rows = source.row_count();
        let mut mask = Self::all(rows);

        for (column, set) in filters.iter() {
            if skip == Some(column.as_str()) {
                continue;
            }
            let Some(col_idx) = source.schema().index_of(column) else {
                warn!("Ignoring filter on unknown column '{}'", column);
                continue;
            };
            let matcher = set.matcher();
            for (pos, included) in mask.bits.iter_mut().enumerate() {
                if *included {
                    let value = source.value_at(pos, col_idx).unwrap_or(&CellValue::Null);
                    *included = matcher.accepts(value);
                }
            }
        }
        mask
    }

    pub fn len(&self) -> usize {
        self.bits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    pub fn includes(&self, position: usize) -> bool {
        self.bits.get(position).copied().unwrap_or(false)
    }

    /// Number of included rows
    pub fn count(&self) -> usize {
        self.bits.iter().filter(|b| **b).count()
    }

    /// Positions of included rows in source order
    pub fn included_positions(&self) -> Vec<usize> {
        self.bits
            .iter()
            .enumerate()
            .filter_map(|(pos, included)| included.then_some(pos))
            .collect()
    }

    pub fn as_slice(&self) -> &[bool] {
        &self.bits
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sg_core::{ColumnDef, DataType, TableSchema};
    use sg_data::MemoryTable;

    fn letters() -> MemoryTable {
        let schema = TableSchema::new(vec![
            ColumnDef::new("L", DataType::Text),
            ColumnDef::new("N", DataType::Int),
        ])
        .unwrap();
        MemoryTable::from_rows(
            schema,
            vec![
                vec!["A".into(), 1i64.into()],
                vec!["B".into(), 2i64.into()],
                vec![CellValue::Null, 3i64.into()],
                vec!["C".into(), CellValue::Null],
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_missing_sentinel_in_filter() {
        let table = letters();
        let mut filters = FilterMap::new();
        filters.set("L", Some(vec![CellValue::Null, "A".into()]));

        let mask = RowFilterMask::compute(&table, &filters);
        assert_eq!(mask.as_slice(), &[true, false, true, false]);
    }

    #[test]
    fn test_empty_list_removes_filter() {
        let mut filters = FilterMap::new();
        assert!(filters.set("L", Some(vec!["A".into()])));
        assert!(filters.set("L", Some(vec![])));
        assert!(!filters.is_active());
        assert!(!filters.set("L", None));
    }

    #[test]
    fn test_clear_is_idempotent() {
        let table = letters();
        let mut filters = FilterMap::new();
        filters.set("N", Some(vec![1i64.into()]));
        assert!(filters.clear());
        assert!(!filters.clear());
        assert_eq!(RowFilterMask::compute(&table, &filters).count(), 4);
    }

    #[test]
    fn test_filters_combine_with_and() {
        let table = letters();
        let mut filters = FilterMap::new();
        filters.set("L", Some(vec!["A".into(), "B".into(), "C".into()]));
        filters.set("N", Some(vec![2i64.into(), CellValue::Null]));

        let mask = RowFilterMask::compute(&table, &filters);
        assert_eq!(mask.included_positions(), vec![1, 3]);

        let others = RowFilterMask::compute_excluding(&table, &filters, Some("L"));
        assert_eq!(others.included_positions(), vec![1, 3]);
        let others = RowFilterMask::compute_excluding(&table, &filters, Some("N"));
        assert_eq!(others.included_positions(), vec![0, 1, 3]);
    }

    #[test]
    fn test_filter_set_dedupes() {
        let set = FilterSet::new(vec!["A".into(), "A".into(), CellValue::Null]).unwrap();
        assert_eq!(set.len(), 2);
        assert!(set.accepts_missing());
        assert!(FilterSet::new(vec![]).is_none());
    }
}
