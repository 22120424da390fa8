//! The tabular data source boundary

use sg_core::{CellValue, TableSchema};

use crate::DataError;

/// Stable row identity; survives sorting, filtering and removal of other rows
pub type RowKey = u64;

/// Ordered 2-D dataset with named, typed columns
///
/// The grid reads and writes cells only through this trait. Mutators
/// return the change they made so the owner can recompute dependents.
pub trait TabularDataSource: Send + Sync {
    /// Column definitions in declared order
    fn schema(&self) -> &TableSchema;

    /// Number of rows
    fn row_count(&self) -> usize;

    /// Number of columns
    fn column_count(&self) -> usize {
        self.schema().len()
    }

    /// Name of the column at `index`
    fn column_name(&self, index: usize) -> Option<&str> {
        self.schema().columns().get(index).map(|c| c.name.as_str())
    }

    /// Key of the row at `position`
    fn key_at(&self, position: usize) -> Option<RowKey>;

    /// Current position of the row with `key`
    fn position_of(&self, key: RowKey) -> Option<usize>;

    /// Value at a row position and column index
    fn value_at(&self, position: usize, column: usize) -> Option<&CellValue>;

    /// Value of `column` in the row with `key`
    fn get(&self, key: RowKey, column: &str) -> Option<&CellValue> {
        let position = self.position_of(key)?;
        let column = self.schema().index_of(column)?;
        self.value_at(position, column)
    }

    /// Write one cell
    fn set(&mut self, key: RowKey, column: &str, value: CellValue) -> Result<SourceChange, DataError>;

    /// Remove one row
    fn remove_row(&mut self, key: RowKey) -> Result<SourceChange, DataError>;
}

/// A completed change to a data source
#[derive(Debug, Clone, PartialEq)]
pub enum SourceChange {
    Reset,
    CellChanged { key: RowKey, column: String },
    RowsRemoved(Vec<RowKey>),
}

/// Receiver of data source change notifications
pub trait SourceObserver {
    fn on_reset(&mut self);

    fn on_cell_changed(&mut self, key: RowKey, column: &str);

    fn on_rows_removed(&mut self, keys: &[RowKey]);
}

impl SourceChange {
    /// Route this change to the matching observer callback
    pub fn dispatch<O: SourceObserver + ?Sized>(&self, observer: &mut O) {
        match self {
            SourceChange::Reset => observer.on_reset(),
            SourceChange::CellChanged { key, column } => observer.on_cell_changed(*key, column),
            SourceChange::RowsRemoved(keys) => observer.on_rows_removed(keys),
        }
    }
}
