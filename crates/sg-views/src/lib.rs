//! Filter, sort and view projection layer for the smart grid

pub mod adv_sort;
pub mod export;
pub mod filter;
pub mod sort;
pub mod stats;
pub mod tables;

use sg_core::{GridError, ValidationError};
use sg_data::DataError;
use thiserror::Error;

pub use adv_sort::{AdvSortEditor, SortLevel};
pub use export::{CsvSnapshotSink, DataSnapshot, ExportOutcome, ExportScope, SnapshotSink};
pub use filter::{
    CheckState, FilterAction, FilterMap, FilterNode, FilterOptionTree, FilterSession, FilterSet, NodeId, NodeKind,
    RowFilterMask, SearchMode,
};
pub use sort::SortSpec;
pub use stats::{SummaryAggregator, SummaryAttribute, SummaryKey};
pub use tables::{CellEditor, GridConfig, GridProxy, ViewEditor, ViewRegistry};

/// Errors from grid operations that touch several layers
#[derive(Error, Debug)]
pub enum ViewsError {
    #[error(transparent)]
    Grid(#[from] GridError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Data(#[from] DataError),
}
