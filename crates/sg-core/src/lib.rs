//! Core types for the smart grid
//!
//! Values, column types, sentinels, formatting, view projections and the
//! event bus shared by the data and view crates.

pub mod consts;
pub mod error;
pub mod events;
pub mod format;
pub mod ids;
pub mod order;
pub mod schema;
pub mod value;
pub mod view;

// Re-export commonly used types
pub use error::{GridError, ValidationError};
pub use events::EventBus;
pub use format::{title_case, Alignment, FilterBucket, TypedValueFormatter};
pub use ids::TableIdCounter;
pub use order::{compare_keys, SortDirection, SortKey};
pub use schema::{ColumnDef, TableSchema, ValueConstraints};
pub use value::{ActionStatus, CellValue, DataType, Sentinel};
pub use view::{HeaderIcon, ViewProjection};
