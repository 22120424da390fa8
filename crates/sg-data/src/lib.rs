//! Data sources and persistence for the smart grid

pub mod config;
pub mod memory;
pub mod source;
pub mod sources;
pub mod store;

use arrow::error::ArrowError;
use sg_core::GridError;
use tokio::task::JoinError;
use thiserror::Error;

// Re-exports
pub use config::{CsvLoadOptions, NullConfig};
pub use memory::MemoryTable;
pub use source::{RowKey, SourceChange, SourceObserver, TabularDataSource};
pub use sources::{from_record_batch, load_csv, load_csv_async, schema_from_arrow};
pub use store::{JsonViewStore, MemoryViewStore, SavedViews, StoreLocation, ViewStore};

/// Errors that can occur in data operations
#[derive(Error, Debug)]
pub enum DataError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Arrow error: {0}")]
    Arrow(ArrowError),

    #[error("CSV parsing error: {0}")]
    Csv(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Cannot read '{value}' as {expected} in column '{column}' (row {row})")]
    Parse {
        column: String,
        row: usize,
        value: String,
        expected: sg_core::DataType,
    },

    #[error(transparent)]
    Config(#[from] GridError),

    #[error("Join error: {0}")]
    Join(#[from] JoinError),

    #[error("Other error: {0}")]
    Other(String),
}

impl From<csv::Error> for DataError {
    fn from(error: csv::Error) -> Self {
        match error.kind() {
            csv::ErrorKind::Io(io_err) => DataError::Io(std::io::Error::new(io_err.kind(), error.to_string())),
            _ => DataError::Csv(error.to_string()),
        }
    }
}

impl From<ArrowError> for DataError {
    fn from(error: ArrowError) -> Self {
        DataError::Arrow(error)
    }
}
