//! The grid proxy: filter, sort and view projection over a data source
//!
//! Every mutation runs the same pipeline before returning: row mask and
//! sort order first, then summary aggregates, then events on the bus.

pub mod config;
pub mod editors;
pub mod views;

use std::sync::Arc;

use ahash::AHashSet;
use sg_core::events::events::{
    CellChanged, DataReset, FiltersChanged, HiddenColumnsChanged, RowsRemoved, SavedViewsChanged, SelectionChanged,
    SortChanged, SummaryChanged, ViewChanged,
};
use sg_core::{
    Alignment, CellValue, DataType, EventBus, GridError, HeaderIcon, SortDirection, SortKey, TableIdCounter,
    TypedValueFormatter, ValidationError, ViewProjection,
};
use sg_data::{RowKey, SourceChange, SourceObserver, TabularDataSource, ViewStore};
use tracing::{debug, info, warn};

use crate::adv_sort::AdvSortEditor;
use crate::filter::{FilterAction, FilterMap, FilterSession, RowFilterMask};
use crate::sort::SortSpec;
use crate::stats::SummaryAggregator;
use crate::ViewsError;

pub use config::GridConfig;
pub use editors::CellEditor;
pub use views::{ViewEditor, ViewRegistry};

/// Filtered, sorted and column-projected view of one data source
pub struct GridProxy {
    name: String,
    source: Box<dyn TabularDataSource>,
    config: GridConfig,
    filters: FilterMap,
    mask: RowFilterMask,
    sort: SortSpec,
    views: ViewRegistry,
    /// Source positions in display order
    rows: Vec<usize>,
    selection: Vec<RowKey>,
    summary: SummaryAggregator,
    events: EventBus,
}

impl GridProxy {
    /// Wrap `source`; configuration errors fail construction
    pub fn new(source: Box<dyn TabularDataSource>, config: GridConfig, ids: &TableIdCounter) -> Result<Self, GridError> {
        let name = config.resolve_name(ids);
        let views = ViewRegistry::new(name.clone(), source.schema().names());
        Self::build(name, source, config, views)
    }

    /// Wrap `source` and load saved views for this table from `store`
    pub fn with_store(
        source: Box<dyn TabularDataSource>,
        config: GridConfig,
        ids: &TableIdCounter,
        store: Arc<dyn ViewStore>,
    ) -> Result<Self, GridError> {
        let name = config.resolve_name(ids);
        let views = ViewRegistry::with_store(name.clone(), source.schema().names(), store);
        Self::build(name, source, config, views)
    }

    fn build(
        name: String,
        source: Box<dyn TabularDataSource>,
        config: GridConfig,
        views: ViewRegistry,
    ) -> Result<Self, GridError> {
        config.validate(source.schema())?;
        let summary = SummaryAggregator::new(source.schema(), &config.summary_columns, config.sum_record_count)?;
        let mut proxy = Self {
            name,
            mask: RowFilterMask::all(source.row_count()),
            source,
            config,
            filters: FilterMap::new(),
            sort: SortSpec::new(),
            views,
            rows: Vec::new(),
            selection: Vec::new(),
            summary,
            events: EventBus::new(),
        };
        proxy.refilter();
        proxy.recompute_summaries(true);
        info!("Created grid '{}' over {} rows", proxy.name, proxy.source.row_count());
        Ok(proxy)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn source(&self) -> &dyn TabularDataSource {
        self.source.as_ref()
    }

    pub fn config(&self) -> &GridConfig {
        &self.config
    }

    /// Subscribe here for grid events
    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn filters(&self) -> &FilterMap {
        &self.filters
    }

    pub fn mask(&self) -> &RowFilterMask {
        &self.mask
    }

    pub fn sort_spec(&self) -> &SortSpec {
        &self.sort
    }

    pub fn views(&self) -> &ViewRegistry {
        &self.views
    }

    pub fn current_view(&self) -> &ViewProjection {
        self.views.current()
    }

    pub fn summary(&self) -> &SummaryAggregator {
        &self.summary
    }

    // --- presentation queries ---

    /// Number of rows passing the filters
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Visible columns in display order
    pub fn columns(&self) -> &[String] {
        &self.views.current().column_order
    }

    pub fn column_count(&self) -> usize {
        self.columns().len()
    }

    pub fn hidden_columns(&self) -> &[String] {
        &self.views.current().hidden_cols
    }

    pub fn column_name(&self, index: usize) -> Option<&str> {
        self.columns().get(index).map(String::as_str)
    }

    pub fn column_dtype(&self, column: &str) -> Option<DataType> {
        self.source.schema().dtype(column)
    }

    /// Source position of a display row
    pub fn source_position(&self, row: usize) -> Option<usize> {
        self.rows.get(row).copied()
    }

    pub fn row_key(&self, row: usize) -> Option<RowKey> {
        self.source_position(row).and_then(|pos| self.source.key_at(pos))
    }

    /// Display row currently showing the row with `key`
    pub fn row_of_key(&self, key: RowKey) -> Option<usize> {
        let position = self.source.position_of(key)?;
        self.rows.iter().position(|p| *p == position)
    }

    pub fn value(&self, row: usize, column: &str) -> Option<&CellValue> {
        let position = self.source_position(row)?;
        let col_idx = self.source.schema().index_of(column)?;
        self.source.value_at(position, col_idx)
    }

    pub fn display_value(&self, row: usize, column: &str) -> Option<String> {
        let def = self.source.schema().column(column)?;
        let value = self.value(row, column)?;
        Some(TypedValueFormatter::display(value, def.dtype, &def.constraints))
    }

    pub fn sort_key(&self, row: usize, column: &str) -> Option<SortKey> {
        let dtype = self.column_dtype(column)?;
        TypedValueFormatter::sort_key(self.value(row, column)?, dtype)
    }

    pub fn alignment(&self, column: &str) -> Alignment {
        TypedValueFormatter::alignment(self.column_dtype(column).unwrap_or(DataType::Object))
    }

    pub fn is_editable(&self, column: &str) -> bool {
        self.config.editable_columns.contains_key(column)
    }

    /// Background colour for cells of `column`, if it has one
    pub fn background(&self, column: &str) -> Option<[u8; 4]> {
        self.is_editable(column).then_some(self.config.editable_bg)
    }

    pub fn header_icon(&self, column: &str) -> HeaderIcon {
        HeaderIcon::resolve(self.filters.contains(column), self.sort.direction(column))
    }

    /// Display strings of the projected grid, row by row
    pub fn display_rows(&self) -> Vec<Vec<String>> {
        (0..self.row_count())
            .map(|row| {
                self.columns()
                    .iter()
                    .map(|column| self.display_value(row, column).unwrap_or_default())
                    .collect()
            })
            .collect()
    }

    // --- filtering ---

    /// Set or remove the filter on a visible `column`; an empty list removes it
    pub fn set_filter(&mut self, column: &str, values: Option<Vec<CellValue>>) -> Result<bool, GridError> {
        self.require_visible(column)?;
        if !self.filters.set(column, values) {
            return Ok(false);
        }
        self.after_filter_change();
        Ok(true)
    }

    pub fn clear_filters(&mut self) -> bool {
        if !self.filters.clear() {
            return false;
        }
        self.after_filter_change();
        true
    }

    fn after_filter_change(&mut self) {
        let selection_changed = self.refilter();
        self.recompute_summaries(false);
        self.publish_filters();
        self.publish_summary();
        if selection_changed {
            self.publish_selection();
        }
    }

    /// Open the filter popup for a visible column
    ///
    /// Candidates are the column's values over rows passing every other filter.
    pub fn open_filter(&self, column: &str) -> Result<FilterSession, GridError> {
        let dtype = self.require_visible(column)?;
        let col_idx = self
            .source
            .schema()
            .index_of(column)
            .ok_or_else(|| GridError::UnknownColumn(column.to_string()))?;
        let others = RowFilterMask::compute_excluding(self.source.as_ref(), &self.filters, Some(column));
        let values = others
            .included_positions()
            .into_iter()
            .filter_map(|pos| self.source.value_at(pos, col_idx).cloned());
        Ok(FilterSession::new(
            column,
            dtype,
            values,
            self.filters.get(column).map(|f| f.values().to_vec()),
            self.sort.direction(column),
            self.config.time_resolution,
        ))
    }

    /// Hidden columns cannot be filtered
    fn require_visible(&self, column: &str) -> Result<DataType, GridError> {
        let dtype = self.source.schema().require(column)?.dtype;
        if self.views.current().is_hidden(column) {
            return Err(GridError::UnknownColumn(column.to_string()));
        }
        Ok(dtype)
    }

    /// Carry out what the filter popup resolved to
    pub fn apply_filter_action(&mut self, column: &str, action: FilterAction) -> Result<bool, GridError> {
        debug!("Filter popup on '{}' resolved to {:?}", column, action);
        match action {
            FilterAction::NoAction => Ok(false),
            FilterAction::SortAscending => self.sort_only_by(column, SortDirection::Ascending),
            FilterAction::SortDescending => self.sort_only_by(column, SortDirection::Descending),
            FilterAction::ClearSort => Ok(self.clear_sort()),
            FilterAction::ClearFilter => self.set_filter(column, None),
            FilterAction::HideColumn => self.hide_column(column),
            FilterAction::NewFilter(values) => self.set_filter(column, Some(values)),
        }
    }

    // --- sorting ---

    /// Set or remove one sort level, keeping the others
    pub fn set_sort(&mut self, column: &str, direction: Option<SortDirection>) -> Result<bool, GridError> {
        self.source.schema().require(column)?;
        if !self.sort.set(column, direction) {
            return Ok(false);
        }
        self.after_sort_change();
        Ok(true)
    }

    pub fn clear_sort(&mut self) -> bool {
        if !self.sort.clear() {
            return false;
        }
        self.after_sort_change();
        true
    }

    /// Replace the whole sort with `levels`, first level highest priority
    pub fn set_sort_levels(&mut self, levels: &[(String, SortDirection)]) -> Result<bool, GridError> {
        for (column, _) in levels {
            self.source.schema().require(column)?;
        }
        if self.sort.levels() == levels {
            return Ok(false);
        }
        self.sort.clear();
        for (column, direction) in levels {
            self.sort.set(column, Some(*direction));
        }
        self.after_sort_change();
        Ok(true)
    }

    fn sort_only_by(&mut self, column: &str, direction: SortDirection) -> Result<bool, GridError> {
        self.set_sort_levels(&[(column.to_string(), direction)])
    }

    /// Editor for the advanced sort dialog, over the visible columns
    pub fn adv_sort_editor(&self) -> AdvSortEditor {
        let columns = self
            .columns()
            .iter()
            .filter_map(|c| self.column_dtype(c).map(|dtype| (c.clone(), dtype)))
            .collect();
        AdvSortEditor::new(columns, &self.sort.levels())
    }

    /// Apply an accepted advanced sort; incomplete rows are rejected
    pub fn apply_adv_sort(&mut self, editor: &AdvSortEditor) -> Result<bool, ViewsError> {
        let levels = editor.accept()?;
        Ok(self.set_sort_levels(&levels)?)
    }

    fn after_sort_change(&mut self) {
        self.resort();
        self.publish(SortChanged {
            table: self.name.clone(),
            sort: self.sort.levels(),
        });
    }

    // --- views ---

    /// Make `projection` current
    ///
    /// Filters and sorts on columns the new layout hides are dropped.
    pub fn set_current_view(&mut self, projection: ViewProjection) -> Result<bool, GridError> {
        let previous_hidden = self.views.current().hidden_cols.clone();
        if !self.views.set_current(projection)? {
            return Ok(false);
        }
        self.after_view_change(&previous_hidden);
        Ok(true)
    }

    /// Switch to a saved view (or Default) by name
    pub fn select_view(&mut self, name: &str) -> Result<bool, ValidationError> {
        let previous_hidden = self.views.current().hidden_cols.clone();
        if !self.views.select(name)? {
            return Ok(false);
        }
        self.after_view_change(&previous_hidden);
        Ok(true)
    }

    /// Save the current custom layout; returns the stored name
    pub fn save_view(&mut self, name: &str) -> Result<String, ValidationError> {
        let saved = self.views.save_current(name)?;
        self.publish_view();
        self.publish_saved_views();
        Ok(saved)
    }

    pub fn delete_view(&mut self, name: &str) -> Result<(), ValidationError> {
        self.views.delete(name)?;
        self.publish_view();
        self.publish_saved_views();
        Ok(())
    }

    /// Hide a visible column; its filter and sort are cleared
    pub fn hide_column(&mut self, column: &str) -> Result<bool, GridError> {
        self.source.schema().require(column)?;
        let current = self.views.current();
        if current.is_hidden(column) {
            return Ok(false);
        }
        let next = current.with_hidden(column);
        self.set_current_view(next)
    }

    /// Header drag from one visible index to another
    pub fn move_column(&mut self, from: usize, to: usize) -> Result<bool, GridError> {
        let count = self.column_count();
        if from >= count || to >= count {
            return Err(GridError::InvalidProjection(format!(
                "cannot move column {} to {} with {} visible columns",
                from, to, count
            )));
        }
        let next = self.views.current().with_moved(from, to);
        self.set_current_view(next)
    }

    /// Working copy of the current layout for the customise dialog
    pub fn view_editor(&self) -> ViewEditor {
        ViewEditor::from_view(self.views.current())
    }

    pub fn apply_view_editor(&mut self, editor: &ViewEditor) -> Result<bool, GridError> {
        self.set_current_view(editor.build())
    }

    fn after_view_change(&mut self, previous_hidden: &[String]) {
        let hidden = self.views.current().hidden_cols.clone();
        let mut filters_changed = false;
        let mut sort_changed = false;
        for column in &hidden {
            filters_changed |= self.filters.remove(column);
            sort_changed |= self.sort.set(column, None);
        }

        let selection_changed = if filters_changed { self.refilter() } else { self.resort() };
        self.recompute_summaries(false);

        self.publish_view();
        if filters_changed {
            self.publish_filters();
        }
        if sort_changed {
            self.publish(SortChanged {
                table: self.name.clone(),
                sort: self.sort.levels(),
            });
        }
        let mut before: Vec<&String> = previous_hidden.iter().collect();
        let mut after: Vec<&String> = hidden.iter().collect();
        before.sort();
        after.sort();
        if before != after {
            self.publish(HiddenColumnsChanged {
                table: self.name.clone(),
                hidden,
            });
        }
        self.publish_summary();
        if selection_changed {
            self.publish_selection();
        }
    }

    // --- selection ---

    /// Select display rows, replacing the previous selection
    pub fn select_rows(&mut self, rows: &[usize]) -> Result<(), GridError> {
        let mut keys = Vec::with_capacity(rows.len());
        for row in rows {
            let key = self.row_key(*row).ok_or(GridError::RowOutOfRange(*row))?;
            if !keys.contains(&key) {
                keys.push(key);
            }
        }
        self.selection = keys;
        self.after_selection_change();
        Ok(())
    }

    pub fn clear_selection(&mut self) -> bool {
        if self.selection.is_empty() {
            return false;
        }
        self.selection.clear();
        self.after_selection_change();
        true
    }

    pub fn selected_keys(&self) -> &[RowKey] {
        &self.selection
    }

    /// Display rows of the selection, in display order
    pub fn selected_rows(&self) -> Vec<usize> {
        let mut rows: Vec<usize> = self.selection.iter().filter_map(|k| self.row_of_key(*k)).collect();
        rows.sort_unstable();
        rows
    }

    fn after_selection_change(&mut self) {
        self.recompute_summaries(false);
        self.publish_selection();
        self.publish_summary();
    }

    // --- editing ---

    /// Validate `input` with the column's editor and write it
    pub fn edit_cell(&mut self, row: usize, column: &str, input: &str) -> Result<CellValue, ViewsError> {
        let editor = self
            .config
            .editable_columns
            .get(column)
            .ok_or_else(|| ValidationError::ColumnNotEditable(column.to_string()))?;
        let key = self.row_key(row).ok_or(GridError::RowOutOfRange(row))?;
        let controlling = editor.controlling_column().and_then(|c| self.source.get(key, c));
        let value = editor.parse(input, controlling)?;
        self.set_cell(key, column, value.clone())?;
        Ok(value)
    }

    /// Write a cell through the proxy so dependents stay current
    pub fn set_cell(&mut self, key: RowKey, column: &str, value: CellValue) -> Result<(), ViewsError> {
        let change = self.source.set(key, column, value)?;
        change.dispatch(self);
        Ok(())
    }

    /// Remove rows from the source
    pub fn remove_rows(&mut self, keys: &[RowKey]) -> Result<(), ViewsError> {
        let mut removed = Vec::with_capacity(keys.len());
        let mut failure = None;
        for key in keys {
            match self.source.remove_row(*key) {
                Ok(SourceChange::RowsRemoved(mut gone)) => removed.append(&mut gone),
                Ok(_) => {}
                Err(e) => {
                    failure = Some(e);
                    break;
                }
            }
        }
        // Rows already removed must still reach the pipeline
        if !removed.is_empty() {
            self.on_rows_removed(&removed);
        }
        match failure {
            Some(e) => Err(e.into()),
            None => Ok(()),
        }
    }

    /// Swap in a new data source with the same columns
    pub fn replace_source(&mut self, source: Box<dyn TabularDataSource>) -> Result<(), GridError> {
        if source.schema().names() != self.source.schema().names() {
            return Err(GridError::Schema(format!(
                "replacement data for '{}' has different columns",
                self.name
            )));
        }
        self.source = source;
        self.on_reset();
        Ok(())
    }

    // --- pipeline ---

    /// Rebuild the mask and the row order; returns whether the selection shrank
    fn refilter(&mut self) -> bool {
        self.mask = RowFilterMask::compute(self.source.as_ref(), &self.filters);
        debug!("{}: {} of {} rows pass the filters", self.name, self.mask.count(), self.mask.len());
        self.resort()
    }

    fn resort(&mut self) -> bool {
        let mut rows = self.mask.included_positions();
        let view = self.views.current();
        self.sort.apply(self.source.as_ref(), &mut rows, |c| view.is_hidden(c));
        self.rows = rows;
        self.prune_selection()
    }

    fn prune_selection(&mut self) -> bool {
        if self.selection.is_empty() {
            return false;
        }
        let shown: AHashSet<usize> = self.rows.iter().copied().collect();
        let before = self.selection.len();
        let source = self.source.as_ref();
        self.selection
            .retain(|key| source.position_of(*key).is_some_and(|pos| shown.contains(&pos)));
        before != self.selection.len()
    }

    fn recompute_summaries(&mut self, totals: bool) {
        let view = self.views.current();
        let source = self.source.as_ref();
        if totals {
            self.summary.recompute_totals(source);
        }
        self.summary
            .recompute_filtered(source, self.filters.is_active(), &self.rows, |c| view.is_visible(c));
        let selected: Vec<usize> = self.selection.iter().filter_map(|k| source.position_of(*k)).collect();
        self.summary.recompute_selected(source, &selected, |c| view.is_visible(c));
    }

    fn publish<E: sg_core::events::Event>(&self, event: E) {
        self.events.publish(event);
    }

    fn publish_filters(&self) {
        self.publish(FiltersChanged {
            table: self.name.clone(),
            filtered_columns: self.filters.columns(),
            visible_rows: self.rows.len(),
        });
    }

    fn publish_view(&self) {
        self.publish(ViewChanged {
            table: self.name.clone(),
            view_name: self.views.current().name.clone(),
            is_custom: self.views.is_custom(),
        });
    }

    fn publish_saved_views(&self) {
        self.publish(SavedViewsChanged {
            table: self.name.clone(),
            names: self.views.names(),
        });
    }

    fn publish_summary(&self) {
        if !self.summary.is_empty() {
            self.publish(SummaryChanged {
                table: self.name.clone(),
            });
        }
    }

    fn publish_selection(&self) {
        self.publish(SelectionChanged {
            table: self.name.clone(),
            selected: self.selection.len(),
        });
    }
}

impl SourceObserver for GridProxy {
    fn on_reset(&mut self) {
        let schema = self.source.schema();
        let stale: Vec<String> = self.filters.columns().into_iter().filter(|c| !schema.contains(c)).collect();
        for column in stale {
            warn!("Dropping filter on '{}', no longer in the data", column);
            self.filters.remove(&column);
        }
        self.refilter();
        self.recompute_summaries(true);
        self.publish(DataReset {
            table: self.name.clone(),
            row_count: self.source.row_count(),
        });
        self.publish_summary();
    }

    fn on_cell_changed(&mut self, key: RowKey, column: &str) {
        self.recompute_summaries(true);
        self.publish(CellChanged {
            table: self.name.clone(),
            row_key: key,
            column: column.to_string(),
        });
        self.publish_summary();
    }

    fn on_rows_removed(&mut self, keys: &[RowKey]) {
        self.selection.retain(|k| !keys.contains(k));
        self.refilter();
        self.recompute_summaries(true);
        self.publish(RowsRemoved {
            table: self.name.clone(),
            row_keys: keys.to_vec(),
        });
        self.publish_summary();
        self.publish_selection();
    }
}
