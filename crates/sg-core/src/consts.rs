//! Shared limits and user-facing labels

/// Distinct values offered by a filter list before clipping
pub const FILTER_MAX_ROW_LIMIT: usize = 10_000;

/// Summary attributes per table, record count included
pub const MAX_SUMMARY_ATTRIBUTES: usize = 3;

/// Longest name accepted for a saved view
pub const MAX_VIEW_NAME_LEN: usize = 15;

pub const SELECT_ALL_TEXT: &str = "(Select All)";
pub const SELECT_ALL_RESULTS_TEXT: &str = "(Select All Search Results)";
pub const BLANKS_TEXT: &str = "(Blanks)";
pub const UNKNOWN_TEXT: &str = "(Unknown)";
pub const INVALID_TEXT: &str = "(Invalid)";
pub const ADD_CURRENT_TEXT: &str = "Add current selection to filter";
pub const NO_MATCHES_TEXT: &str = "No matches";
pub const DEFAULT_VIEW_NAME: &str = "Default";
pub const CUSTOM_VIEW_NAME: &str = "Custom...";
pub const RECORD_COUNT_NAME: &str = "Records";

pub const SELECT_COLUMN_PROMPT: &str = "Select column...";
pub const SELECT_ORDER_PROMPT: &str = "Select sort order...";

/// Background of editable columns, RGBA
pub const EDITABLE_COLUMN_BG: [u8; 4] = [68, 71, 36, 255];

pub const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// Month name for a 1-based month number
pub fn month_name(month: u32) -> Option<&'static str> {
    MONTH_NAMES.get(month.checked_sub(1)? as usize).copied()
}

/// Warning shown when a filter list had to be clipped
pub fn clipping_warning(total: usize) -> String {
    format!(
        "Not all items showing: only the first {} of {} values are listed.",
        FILTER_MAX_ROW_LIMIT, total
    )
}
