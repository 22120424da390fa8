//! Error types shared by the grid crates

use thiserror::Error;

use crate::value::DataType;

/// Configuration errors, raised at construction or mutation time
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GridError {
    #[error("Schema error: {0}")]
    Schema(String),

    #[error("Duplicate column: {0}")]
    DuplicateColumn(String),

    #[error("Unknown column: {0}")]
    UnknownColumn(String),

    #[error("Column '{column}' is declared {expected} but holds a {found} value")]
    TypeMismatch {
        column: String,
        expected: DataType,
        found: &'static str,
    },

    #[error("Invalid view projection: {0}")]
    InvalidProjection(String),

    #[error("Too many summary attributes: {count} requested, at most {max} allowed")]
    TooManySummaries { count: usize, max: usize },

    #[error("Summary column '{0}' is not numeric")]
    NonNumericSummary(String),

    #[error("Editable column '{0}' is not part of the table")]
    UnknownEditableColumn(String),

    #[error("Unknown row key: {0}")]
    UnknownRow(u64),

    #[error("Row {0} is outside the current projection")]
    RowOutOfRange(usize),
}

/// Recoverable user-input errors; `Display` is the message shown to the user
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("You cannot have a blank view name.")]
    BlankViewName,

    #[error("You cannot use a name of an existing view.")]
    DuplicateViewName,

    #[error("View names are limited to 15 characters.")]
    ViewNameTooLong,

    #[error("The current view is already saved.")]
    ViewAlreadySaved,

    #[error("The Default view cannot be changed.")]
    DefaultViewReserved,

    #[error("There is no saved view named '{0}'.")]
    NoSuchView(String),

    #[error("You cannot leave incomplete entries in the table.")]
    IncompleteSortLevels,

    #[error("You must complete the current entries before adding a new one.")]
    IncompleteSortLevelPending,

    #[error("Not a valid entry")]
    InvalidEntry,

    #[error("There is no data available to export")]
    NothingToExport,

    #[error("Column '{0}' cannot be edited")]
    ColumnNotEditable(String),
}
