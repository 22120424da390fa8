//! Filter popup logic: candidates, search and the resulting action

use ahash::AHashSet;
use regex::RegexBuilder;
use serde::{Deserialize, Serialize};
use sg_core::consts::{clipping_warning, FILTER_MAX_ROW_LIMIT};
use sg_core::{compare_keys, CellValue, DataType, SortDirection, SortKey, TypedValueFormatter};
use tracing::{debug, warn};

use super::tree::FilterOptionTree;

/// How search text is matched against candidate labels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SearchMode {
    /// Case-insensitive substring
    #[default]
    Text,
    /// Case-insensitive regular expression
    Regex,
}

/// What the grid should do once the popup closes
#[derive(Debug, Clone, PartialEq)]
pub enum FilterAction {
    NoAction,
    SortAscending,
    SortDescending,
    ClearSort,
    ClearFilter,
    HideColumn,
    NewFilter(Vec<CellValue>),
}

/// State of one open filter popup
pub struct FilterSession {
    column: String,
    dtype: DataType,
    time_resolution: bool,
    candidates: Vec<CellValue>,
    total_candidates: usize,
    current_filter: Option<Vec<CellValue>>,
    current_sort: Option<SortDirection>,
    search: Option<(String, SearchMode)>,
    tree: FilterOptionTree,
}

impl FilterSession {
    /// Open a popup over `values`, the column values of rows passing every other filter
    pub fn new(
        column: impl Into<String>,
        dtype: DataType,
        values: impl IntoIterator<Item = CellValue>,
        current_filter: Option<Vec<CellValue>>,
        current_sort: Option<SortDirection>,
        time_resolution: bool,
    ) -> Self {
        let column = column.into();
        let mut seen = AHashSet::new();
        let mut distinct: Vec<CellValue> = values.into_iter().filter(|v| seen.insert(v.clone())).collect();

        // Newest first for dates, ascending otherwise
        let direction = if dtype.is_temporal() { SortDirection::Descending } else { SortDirection::Ascending };
        let keys: Vec<Option<SortKey>> = distinct.iter().map(|v| TypedValueFormatter::sort_key(v, dtype)).collect();
        let mut order: Vec<usize> = (0..distinct.len()).collect();
        order.sort_by(|a, b| compare_keys(keys[*a].as_ref(), keys[*b].as_ref(), direction));
        let mut slots: Vec<Option<CellValue>> = distinct.drain(..).map(Some).collect();
        let mut candidates: Vec<CellValue> = order.into_iter().filter_map(|i| slots[i].take()).collect();

        let total_candidates = candidates.len();
        if total_candidates > FILTER_MAX_ROW_LIMIT {
            warn!(
                "Column '{}' has {} distinct values, listing the first {}",
                column, total_candidates, FILTER_MAX_ROW_LIMIT
            );
            candidates.truncate(FILTER_MAX_ROW_LIMIT);
        }

        let current_filter = current_filter.filter(|f| !f.is_empty());
        let tree = FilterOptionTree::build(&candidates, dtype, current_filter.as_deref(), false, time_resolution);
        debug!("Opened filter on '{}' with {} candidates", column, candidates.len());

        Self {
            column,
            dtype,
            time_resolution,
            candidates,
            total_candidates,
            current_filter,
            current_sort,
            search: None,
            tree,
        }
    }

    pub fn column(&self) -> &str {
        &self.column
    }

    pub fn dtype(&self) -> DataType {
        self.dtype
    }

    /// Listed candidates, at most the row limit
    pub fn candidates(&self) -> &[CellValue] {
        &self.candidates
    }

    pub fn is_clipped(&self) -> bool {
        self.total_candidates > FILTER_MAX_ROW_LIMIT
    }

    /// Warning shown when not every distinct value is listed
    pub fn clipping_warning(&self) -> Option<String> {
        self.is_clipped().then(|| clipping_warning(self.total_candidates))
    }

    pub fn current_sort(&self) -> Option<SortDirection> {
        self.current_sort
    }

    /// Whether the column is filtered now, enabling "Clear Filter"
    pub fn has_filter(&self) -> bool {
        self.current_filter.is_some()
    }

    /// Labels for the ascending and descending sort buttons
    pub fn sort_labels(&self) -> (&'static str, &'static str) {
        match self.dtype {
            DataType::Date | DataType::DateTime => ("Sort Oldest to Newest", "Sort Newest to Oldest"),
            DataType::Int | DataType::Float | DataType::Currency => {
                ("Sort Smallest to Largest", "Sort Largest to Smallest")
            }
            _ => ("Sort A to Z", "Sort Z to A"),
        }
    }

    pub fn hide_label(&self) -> String {
        format!("Hide Column \"{}\"", self.column)
    }

    pub fn clear_label(&self) -> String {
        format!("Clear Filter \"{}\"", self.column)
    }

    pub fn tree(&self) -> &FilterOptionTree {
        &self.tree
    }

    pub fn tree_mut(&mut self) -> &mut FilterOptionTree {
        &mut self.tree
    }

    pub fn is_search_active(&self) -> bool {
        self.search.is_some()
    }

    /// Narrow the tree to candidates whose label matches `text`
    ///
    /// Empty text restores the full list. Rebuilding discards unsaved checks.
    pub fn set_search(&mut self, text: &str, mode: SearchMode) {
        if text.is_empty() {
            self.clear_search();
            return;
        }
        let matches = self.matching_candidates(text, mode);
        debug!("Search '{}' on '{}' matched {} values", text, self.column, matches.len());
        self.search = Some((text.to_string(), mode));
        self.tree = FilterOptionTree::build(
            &matches,
            self.dtype,
            self.current_filter.as_deref(),
            true,
            self.time_resolution,
        );
    }

    pub fn clear_search(&mut self) {
        self.search = None;
        self.tree = FilterOptionTree::build(
            &self.candidates,
            self.dtype,
            self.current_filter.as_deref(),
            false,
            self.time_resolution,
        );
    }

    fn matching_candidates(&self, text: &str, mode: SearchMode) -> Vec<CellValue> {
        let label = |v: &CellValue| TypedValueFormatter::search_text(v, self.dtype, self.time_resolution);
        match mode {
            SearchMode::Text => {
                let needle = text.to_uppercase();
                self.candidates.iter().filter(|v| label(v).contains(&needle)).cloned().collect()
            }
            SearchMode::Regex => match RegexBuilder::new(text).case_insensitive(true).build() {
                Ok(pattern) => self.candidates.iter().filter(|v| pattern.is_match(&label(v))).cloned().collect(),
                Err(e) => {
                    debug!("Invalid search pattern '{}': {}", text, e);
                    Vec::new()
                }
            },
        }
    }

    /// Accepted values implied by the tree
    ///
    /// With "add to current" checked the previous filter is kept and the
    /// new selection appended, without duplicating re-selected values.
    pub fn new_filter_values(&self) -> Vec<CellValue> {
        let checked = self.tree.get_checked_values();
        match &self.current_filter {
            Some(current) if self.tree.is_add_to_current_checked() => {
                let reselected: AHashSet<&CellValue> = checked.iter().collect();
                current
                    .iter()
                    .filter(|v| !reselected.contains(v))
                    .cloned()
                    .chain(checked.iter().cloned())
                    .collect()
            }
            _ => checked,
        }
    }

    /// Resolve the OK button
    pub fn accept(&self) -> FilterAction {
        let values = self.new_filter_values();
        if values.is_empty() {
            if self.tree.is_select_all_checked() {
                FilterAction::ClearFilter
            } else {
                FilterAction::NoAction
            }
        } else {
            FilterAction::NewFilter(values)
        }
    }

    pub fn cancel(&self) -> FilterAction {
        FilterAction::NoAction
    }

    pub fn clear_filter(&self) -> FilterAction {
        FilterAction::ClearFilter
    }

    pub fn hide_column(&self) -> FilterAction {
        FilterAction::HideColumn
    }

    /// Pressing the ascending button again turns the sort off
    pub fn sort_ascending(&self) -> FilterAction {
        match self.current_sort {
            Some(SortDirection::Ascending) => FilterAction::ClearSort,
            _ => FilterAction::SortAscending,
        }
    }

    /// Pressing the descending button again turns the sort off
    pub fn sort_descending(&self) -> FilterAction {
        match self.current_sort {
            Some(SortDirection::Descending) => FilterAction::ClearSort,
            _ => FilterAction::SortDescending,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;
    use sg_core::consts::SELECT_ALL_RESULTS_TEXT;

    fn texts(items: &[&str]) -> Vec<CellValue> {
        items.iter().map(|s| CellValue::text(*s)).collect()
    }

    #[test]
    fn test_candidates_distinct_and_ordered() {
        let session = FilterSession::new(
            "Name",
            DataType::Text,
            vec!["b".into(), CellValue::Null, "a".into(), "b".into()],
            None,
            None,
            false,
        );
        assert_eq!(session.candidates(), &["a".into(), "b".into(), CellValue::Null]);

        let day = |d| CellValue::Date(NaiveDate::from_ymd_opt(2024, 1, d).unwrap());
        let dates = FilterSession::new("D", DataType::Date, vec![day(1), day(3), day(2)], None, None, false);
        assert_eq!(dates.candidates(), &[day(3), day(2), day(1)]);
        assert_eq!(dates.sort_labels().0, "Sort Oldest to Newest");
    }

    #[test]
    fn test_clipping_warning() {
        let values = (0..(FILTER_MAX_ROW_LIMIT as i64 + 5)).map(CellValue::Int);
        let session = FilterSession::new("N", DataType::Int, values, None, None, false);
        assert!(session.is_clipped());
        assert_eq!(session.candidates().len(), FILTER_MAX_ROW_LIMIT);
        assert!(session.clipping_warning().unwrap().contains("10005"));
        assert_eq!(session.sort_labels().1, "Sort Largest to Smallest");
    }

    #[test]
    fn test_text_and_regex_search() {
        let mut session = FilterSession::new("Name", DataType::Text, texts(&["Alice", "bob", "Carol"]), None, None, false);

        session.set_search("O", SearchMode::Text);
        assert!(session.is_search_active());
        assert_eq!(session.tree().get_checked_values(), texts(&["Carol", "bob"]));
        let select_all = session.tree().select_all_node().unwrap();
        assert_eq!(session.tree().label(select_all), Some(SELECT_ALL_RESULTS_TEXT));

        session.set_search("^a", SearchMode::Regex);
        assert_eq!(session.tree().get_checked_values(), texts(&["Alice"]));

        session.set_search("(", SearchMode::Regex);
        assert!(session.tree().get_checked_values().is_empty());
        assert_eq!(session.accept(), FilterAction::NoAction);

        session.set_search("", SearchMode::Text);
        assert!(!session.is_search_active());
        assert_eq!(session.tree().get_checked_values().len(), 3);
    }

    #[test]
    fn test_accept_resolution() {
        let mut session = FilterSession::new("Name", DataType::Text, texts(&["a", "b"]), None, None, false);
        assert_eq!(session.accept(), FilterAction::NewFilter(texts(&["a", "b"])));

        let select_all = session.tree().select_all_node().unwrap();
        session.tree_mut().set_checked(select_all, false);
        assert_eq!(session.accept(), FilterAction::NoAction);
    }

    #[test]
    fn test_add_to_current_selection() {
        let mut session = FilterSession::new(
            "Name",
            DataType::Text,
            texts(&["a", "b", "c"]),
            Some(texts(&["a", "b"])),
            None,
            false,
        );
        session.set_search("c", SearchMode::Text);
        let add = session.tree().add_to_current_node().unwrap();
        session.tree_mut().set_checked(add, true);

        assert_eq!(session.new_filter_values(), texts(&["a", "b", "c"]));

        session.set_search("b", SearchMode::Text);
        let add = session.tree().add_to_current_node().unwrap();
        session.tree_mut().set_checked(add, true);
        assert_eq!(session.new_filter_values(), texts(&["a", "b"]));
    }

    #[test]
    fn test_sort_buttons_toggle() {
        let session = FilterSession::new("N", DataType::Text, texts(&["a"]), None, Some(SortDirection::Ascending), false);
        assert_eq!(session.sort_ascending(), FilterAction::ClearSort);
        assert_eq!(session.sort_descending(), FilterAction::SortDescending);
        assert_eq!(session.hide_label(), "Hide Column \"N\"");
        assert!(!session.has_filter());
    }
}
