//! Total, filtered and selected aggregates for summary columns

use sg_core::consts::{MAX_SUMMARY_ATTRIBUTES, RECORD_COUNT_NAME};
use sg_core::format::{format_grouped_fixed, format_grouped_int};
use sg_core::{title_case, DataType, GridError, TableSchema};
use sg_data::TabularDataSource;
use tracing::debug;

/// Which tracked value a lookup refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SummaryKey<'a> {
    RecordCount,
    /// Sum of a source column, by its column name
    Column(&'a str),
}

impl<'a> From<&'a str> for SummaryKey<'a> {
    fn from(column: &'a str) -> Self {
        SummaryKey::Column(column)
    }
}

/// One tracked summary value
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryAttribute {
    /// Title-cased display name
    pub name: String,
    pub dtype: DataType,
    /// Source column; `None` for the record count
    column: Option<String>,
    total: f64,
    filtered: f64,
    selected: f64,
}

impl SummaryAttribute {
    fn for_column(column: &str, dtype: DataType) -> Self {
        Self {
            name: title_case(column),
            dtype,
            column: Some(column.to_string()),
            total: 0.0,
            filtered: 0.0,
            selected: 0.0,
        }
    }

    fn record_count() -> Self {
        Self {
            name: RECORD_COUNT_NAME.to_string(),
            dtype: DataType::Int,
            column: None,
            total: 0.0,
            filtered: 0.0,
            selected: 0.0,
        }
    }

    pub fn column(&self) -> Option<&str> {
        self.column.as_deref()
    }

    pub fn is_record_count(&self) -> bool {
        self.column.is_none()
    }

    pub fn total(&self) -> f64 {
        self.total
    }

    pub fn filtered(&self) -> f64 {
        self.filtered
    }

    pub fn selected(&self) -> f64 {
        self.selected
    }

    /// Render a value the way this attribute's type is shown
    pub fn format_value(&self, value: f64) -> String {
        match self.dtype {
            DataType::Int => format_grouped_int(value.round() as i64),
            DataType::Float => format_grouped_fixed(value, 2),
            DataType::Currency => format!("$ {}", format_grouped_fixed(value, 2)),
            _ => value.to_string(),
        }
    }

    pub fn total_text(&self) -> String {
        self.format_value(self.total)
    }

    pub fn filtered_text(&self) -> String {
        self.format_value(self.filtered)
    }

    pub fn selected_text(&self) -> String {
        self.format_value(self.selected)
    }

    /// The filtered subtotal is only shown when non-zero
    pub fn shows_filtered(&self) -> bool {
        self.filtered != 0.0
    }

    pub fn shows_selected(&self) -> bool {
        self.selected != 0.0
    }

    /// Sum over row positions; missing values count as zero
    fn sum(&self, source: &dyn TabularDataSource, positions: impl Iterator<Item = usize>) -> f64 {
        match &self.column {
            None => positions.count() as f64,
            Some(column) => {
                let Some(col_idx) = source.schema().index_of(column) else {
                    return 0.0;
                };
                positions
                    .filter_map(|pos| source.value_at(pos, col_idx).and_then(|v| v.as_f64()))
                    .sum()
            }
        }
    }
}

/// Summary attributes of one table
#[derive(Debug, Clone, Default)]
pub struct SummaryAggregator {
    attributes: Vec<SummaryAttribute>,
}

impl SummaryAggregator {
    /// Validate and create the tracked attributes
    ///
    /// The record count comes first when enabled and counts toward the limit.
    pub fn new(schema: &TableSchema, columns: &[String], record_count: bool) -> Result<Self, GridError> {
        let count = columns.len() + usize::from(record_count);
        if count > MAX_SUMMARY_ATTRIBUTES {
            return Err(GridError::TooManySummaries {
                count,
                max: MAX_SUMMARY_ATTRIBUTES,
            });
        }

        let mut attributes = Vec::with_capacity(count);
        if record_count {
            attributes.push(SummaryAttribute::record_count());
        }
        for column in columns {
            let def = schema.require(column)?;
            if !def.dtype.is_numeric() {
                return Err(GridError::NonNumericSummary(column.clone()));
            }
            attributes.push(SummaryAttribute::for_column(column, def.dtype));
        }
        Ok(Self { attributes })
    }

    pub fn attributes(&self) -> &[SummaryAttribute] {
        &self.attributes
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    /// Look up the record count or a column's attribute
    pub fn get<'a>(&self, key: impl Into<SummaryKey<'a>>) -> Option<&SummaryAttribute> {
        match key.into() {
            SummaryKey::RecordCount => self.attributes.iter().find(|a| a.is_record_count()),
            SummaryKey::Column(column) => self.attributes.iter().find(|a| a.column() == Some(column)),
        }
    }

    pub fn total<'a>(&self, key: impl Into<SummaryKey<'a>>) -> Option<f64> {
        self.get(key).map(|a| a.total)
    }

    pub fn filtered<'a>(&self, key: impl Into<SummaryKey<'a>>) -> Option<f64> {
        self.get(key).map(|a| a.filtered)
    }

    pub fn selected<'a>(&self, key: impl Into<SummaryKey<'a>>) -> Option<f64> {
        self.get(key).map(|a| a.selected)
    }

    /// Recompute totals over every source row
    pub fn recompute_totals(&mut self, source: &dyn TabularDataSource) {
        let rows = source.row_count();
        for attr in &mut self.attributes {
            attr.total = attr.sum(source, 0..rows);
        }
        debug!("Recomputed {} summary totals", self.attributes.len());
    }

    /// Recompute subtotals over the projected rows
    ///
    /// Reads zero while no filter is active and for hidden columns.
    pub fn recompute_filtered<F>(
        &mut self,
        source: &dyn TabularDataSource,
        filters_active: bool,
        positions: &[usize],
        is_visible: F,
    ) where
        F: Fn(&str) -> bool,
    {
        for attr in &mut self.attributes {
            attr.filtered = match attr.column() {
                _ if !filters_active => 0.0,
                Some(column) if !is_visible(column) => 0.0,
                _ => attr.sum(source, positions.iter().copied()),
            };
        }
    }

    /// Recompute aggregates over the selected rows; hidden columns read zero
    pub fn recompute_selected<F>(&mut self, source: &dyn TabularDataSource, positions: &[usize], is_visible: F)
    where
        F: Fn(&str) -> bool,
    {
        for attr in &mut self.attributes {
            attr.selected = match attr.column() {
                Some(column) if !is_visible(column) => 0.0,
                _ => attr.sum(source, positions.iter().copied()),
            };
        }
    }
}
