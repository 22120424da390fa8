//! Data snapshots for export and print
//!
//! A snapshot freezes the grid as projected (or the full data) so an
//! outside consumer can render it without touching the live proxy.

use std::io::Write;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use arrow::array::{ArrayRef, BooleanArray, Date32Array, Float64Array, Int64Array, StringArray, TimestampMicrosecondArray};
use arrow::datatypes::{DataType as ArrowType, Field, Schema, TimeUnit};
use arrow::record_batch::RecordBatch;
use async_trait::async_trait;
use chrono::Datelike;
use sg_core::{CellValue, ColumnDef, DataType, Sentinel, ValidationError};
use sg_data::{DataError, TabularDataSource};
use tracing::{debug, info};

use crate::tables::GridProxy;

/// Days from 0001-01-01 to 1970-01-01
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

/// What part of the data an export covers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportScope {
    /// Visible columns and filtered rows, in display order
    #[default]
    CurrentView,
    /// Every column and row in source order
    FullData,
}

/// Frozen rows and columns ready for export
#[derive(Debug, Clone, PartialEq)]
pub struct DataSnapshot {
    table: String,
    columns: Vec<ColumnDef>,
    rows: Vec<Vec<CellValue>>,
    replace_tokens: bool,
}

impl DataSnapshot {
    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn columns(&self) -> &[ColumnDef] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    pub fn rows(&self) -> &[Vec<CellValue>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Whether sentinel dates are written as `UNKNOWN`/`INVALID`
    pub fn replaces_tokens(&self) -> bool {
        self.replace_tokens
    }

    /// Export text of one cell
    pub fn cell_text(&self, row: usize, column: usize) -> String {
        match self.rows.get(row).and_then(|r| r.get(column)) {
            Some(value) => self.text_of(value),
            None => String::new(),
        }
    }

    fn text_of(&self, value: &CellValue) -> String {
        match Sentinel::classify(value) {
            Some(sentinel) if self.replace_tokens => sentinel.token().to_string(),
            _ => value.to_string(),
        }
    }

    /// Convert to an Arrow record batch
    ///
    /// Temporal columns holding a sentinel become text columns when tokens
    /// are replaced.
    pub fn to_record_batch(&self) -> Result<RecordBatch, DataError> {
        let mut fields = Vec::with_capacity(self.columns.len());
        let mut arrays: Vec<ArrayRef> = Vec::with_capacity(self.columns.len());

        for (idx, column) in self.columns.iter().enumerate() {
            let cells = self.rows.iter().map(|row| row.get(idx).unwrap_or(&CellValue::Null));
            let tokenised = self.replace_tokens
                && column.dtype.is_temporal()
                && self.rows.iter().any(|row| row.get(idx).is_some_and(|v| Sentinel::classify(v).is_some()));

            let (arrow_type, array): (ArrowType, ArrayRef) = match column.dtype {
                _ if tokenised => (
                    ArrowType::Utf8,
                    Arc::new(StringArray::from(
                        cells.map(|v| (!v.is_null()).then(|| self.text_of(v))).collect::<Vec<_>>(),
                    )),
                ),
                DataType::Int | DataType::Status => (
                    ArrowType::Int64,
                    Arc::new(Int64Array::from(
                        cells
                            .map(|v| match v {
                                CellValue::Int(i) => Some(*i),
                                _ => None,
                            })
                            .collect::<Vec<_>>(),
                    )),
                ),
                DataType::Float | DataType::Currency => (
                    ArrowType::Float64,
                    Arc::new(Float64Array::from(cells.map(CellValue::as_f64).collect::<Vec<_>>())),
                ),
                DataType::Bool => (
                    ArrowType::Boolean,
                    Arc::new(BooleanArray::from(
                        cells
                            .map(|v| match v {
                                CellValue::Bool(b) => Some(*b),
                                _ => None,
                            })
                            .collect::<Vec<_>>(),
                    )),
                ),
                DataType::Date => (
                    ArrowType::Date32,
                    Arc::new(Date32Array::from(
                        cells
                            .map(|v| match v {
                                CellValue::Date(d) => Some(d.num_days_from_ce() - UNIX_EPOCH_DAYS_FROM_CE),
                                CellValue::DateTime(dt) => Some(dt.date().num_days_from_ce() - UNIX_EPOCH_DAYS_FROM_CE),
                                _ => None,
                            })
                            .collect::<Vec<_>>(),
                    )),
                ),
                DataType::DateTime => (
                    ArrowType::Timestamp(TimeUnit::Microsecond, None),
                    Arc::new(TimestampMicrosecondArray::from(
                        cells
                            .map(|v| match v {
                                CellValue::DateTime(dt) => Some(dt.and_utc().timestamp_micros()),
                                CellValue::Date(d) => d.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc().timestamp_micros()),
                                _ => None,
                            })
                            .collect::<Vec<_>>(),
                    )),
                ),
                DataType::Text | DataType::Object => (
                    ArrowType::Utf8,
                    Arc::new(StringArray::from(
                        cells.map(|v| (!v.is_null()).then(|| self.text_of(v))).collect::<Vec<_>>(),
                    )),
                ),
            };
            fields.push(Field::new(column.name.clone(), arrow_type, true));
            arrays.push(array);
        }

        Ok(RecordBatch::try_new(Arc::new(Schema::new(fields)), arrays)?)
    }

    /// Write CSV with a header row, checking `cancel` between rows
    pub fn write_csv<W: Write>(&self, writer: W, cancel: Option<&AtomicBool>) -> Result<ExportOutcome, DataError> {
        let mut csv_writer = csv::Writer::from_writer(writer);
        csv_writer.write_record(self.columns.iter().map(|c| c.name.as_str()))?;

        for (written, row) in self.rows.iter().enumerate() {
            if cancel.is_some_and(|flag| flag.load(Ordering::Relaxed)) {
                csv_writer.flush()?;
                info!("Export of {} cancelled after {} rows", self.table, written);
                return Ok(ExportOutcome::Cancelled { rows_written: written });
            }
            csv_writer.write_record(row.iter().map(|v| self.text_of(v)))?;
        }
        csv_writer.flush()?;
        Ok(ExportOutcome::Completed { rows: self.rows.len() })
    }

    pub fn to_csv_string(&self) -> Result<String, DataError> {
        let mut buffer = Vec::new();
        self.write_csv(&mut buffer, None)?;
        String::from_utf8(buffer).map_err(|e| DataError::Other(e.to_string()))
    }
}

/// How an export finished
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportOutcome {
    Completed { rows: usize },
    Cancelled { rows_written: usize },
}

/// Destination for an exported snapshot
///
/// Writes run off the caller's thread; `cancel` is checked between rows.
#[async_trait]
pub trait SnapshotSink: Send + Sync {
    async fn write(&self, snapshot: DataSnapshot, cancel: Arc<AtomicBool>) -> anyhow::Result<ExportOutcome>;
}

/// Writes snapshots as CSV files
pub struct CsvSnapshotSink {
    path: PathBuf,
}

impl CsvSnapshotSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

#[async_trait]
impl SnapshotSink for CsvSnapshotSink {
    async fn write(&self, snapshot: DataSnapshot, cancel: Arc<AtomicBool>) -> anyhow::Result<ExportOutcome> {
        let path = self.path.clone();
        let outcome = tokio::task::spawn_blocking(move || -> Result<ExportOutcome, DataError> {
            let file = std::fs::File::create(&path)?;
            snapshot.write_csv(std::io::BufWriter::new(file), Some(&cancel))
        })
        .await??;
        info!("Export to {} finished: {:?}", self.path.display(), outcome);
        Ok(outcome)
    }
}

impl GridProxy {
    /// Whether the user should pick between the current view and the full data
    pub fn needs_scope_choice(&self) -> bool {
        self.filters().is_active() || !self.sort_spec().is_empty() || !self.hidden_columns().is_empty()
    }

    /// Snapshot of the grid exactly as projected, with tokens replaced
    pub fn create_data_view(&self) -> DataSnapshot {
        self.snapshot(ExportScope::CurrentView, true)
    }

    /// Snapshot for export; an empty table has nothing to export
    pub fn export_snapshot(&self, scope: ExportScope, replace_tokens: bool) -> Result<DataSnapshot, ValidationError> {
        if self.source().row_count() == 0 {
            return Err(ValidationError::NothingToExport);
        }
        Ok(self.snapshot(scope, replace_tokens))
    }

    fn snapshot(&self, scope: ExportScope, replace_tokens: bool) -> DataSnapshot {
        let source = self.source();
        let schema = source.schema();
        let (columns, positions): (Vec<ColumnDef>, Vec<usize>) = match scope {
            ExportScope::CurrentView => (
                self.columns().iter().filter_map(|c| schema.column(c).cloned()).collect(),
                (0..self.row_count()).filter_map(|r| self.source_position(r)).collect(),
            ),
            ExportScope::FullData => (schema.columns().to_vec(), (0..source.row_count()).collect()),
        };
        let indices: Vec<usize> = columns.iter().filter_map(|c| schema.index_of(&c.name)).collect();
        let rows = positions
            .into_iter()
            .map(|pos| {
                indices
                    .iter()
                    .map(|col| source.value_at(pos, *col).cloned().unwrap_or_default())
                    .collect()
            })
            .collect();
        debug!("Snapshot of {} ({:?}) with {} columns", self.name(), scope, columns.len());
        DataSnapshot {
            table: self.name().to_string(),
            columns,
            rows,
            replace_tokens,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::Array;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;
    use sg_core::value::UNKNOWN_DATE;
    use sg_core::{SortDirection, TableIdCounter, TableSchema};
    use sg_data::MemoryTable;

    use crate::tables::GridConfig;

    fn proxy(rows: Vec<Vec<CellValue>>) -> GridProxy {
        let schema = TableSchema::new(vec![
            ColumnDef::new("Name", DataType::Text),
            ColumnDef::new("Born", DataType::Date),
            ColumnDef::new("Score", DataType::Int),
        ])
        .unwrap();
        let table = MemoryTable::from_rows(schema, rows).unwrap();
        GridProxy::new(Box::new(table), GridConfig::named("export"), &TableIdCounter::new()).unwrap()
    }

    fn sample() -> GridProxy {
        proxy(vec![
            vec!["Ann".into(), NaiveDate::from_ymd_opt(1990, 1, 2).into(), 3i64.into()],
            vec!["Bob".into(), CellValue::Date(*UNKNOWN_DATE), 1i64.into()],
            vec!["Cid".into(), CellValue::Null, 2i64.into()],
        ])
    }

    #[test]
    fn test_data_view_matches_projection() {
        let mut proxy = sample();
        assert!(!proxy.needs_scope_choice());
        proxy.set_sort("Score", Some(SortDirection::Ascending)).unwrap();
        proxy.hide_column("Born").unwrap();
        assert!(proxy.needs_scope_choice());

        let snapshot = proxy.create_data_view();
        assert_eq!(snapshot.column_names(), vec!["Name".to_string(), "Score".to_string()]);
        assert_eq!(snapshot.cell_text(0, 0), "Bob");
        assert_eq!(snapshot.cell_text(2, 0), "Ann");

        let full = proxy.export_snapshot(ExportScope::FullData, true).unwrap();
        assert_eq!(full.columns().len(), 3);
        assert_eq!(full.cell_text(0, 0), "Ann");
    }

    #[test]
    fn test_tokens_replaced_in_csv() {
        let proxy = sample();
        let csv = proxy.create_data_view().to_csv_string().unwrap();
        assert_eq!(csv, "Name,Born,Score\nAnn,1990-01-02,3\nBob,UNKNOWN,1\nCid,,2\n");

        let raw = proxy.export_snapshot(ExportScope::CurrentView, false).unwrap();
        assert_eq!(raw.cell_text(1, 1), "1677-09-22");
    }

    #[test]
    fn test_record_batch_types() {
        let proxy = sample();
        let batch = proxy.create_data_view().to_record_batch().unwrap();
        assert_eq!(batch.num_rows(), 3);
        assert_eq!(batch.schema().field(1).data_type(), &ArrowType::Utf8);
        assert_eq!(batch.schema().field(2).data_type(), &ArrowType::Int64);

        let raw = proxy.export_snapshot(ExportScope::CurrentView, false).unwrap();
        let batch = raw.to_record_batch().unwrap();
        assert_eq!(batch.schema().field(1).data_type(), &ArrowType::Date32);
        assert_eq!(batch.column(1).null_count(), 1);
    }

    #[test]
    fn test_empty_table_has_nothing_to_export() {
        let proxy = proxy(Vec::new());
        assert_eq!(
            proxy.export_snapshot(ExportScope::FullData, true),
            Err(ValidationError::NothingToExport)
        );
    }

    #[test]
    fn test_cancel_stops_between_rows() {
        let snapshot = sample().create_data_view();
        let cancel = AtomicBool::new(true);
        let mut buffer = Vec::new();
        let outcome = snapshot.write_csv(&mut buffer, Some(&cancel)).unwrap();
        assert_eq!(outcome, ExportOutcome::Cancelled { rows_written: 0 });
        assert_eq!(String::from_utf8(buffer).unwrap(), "Name,Born,Score\n");
    }

    #[tokio::test]
    async fn test_csv_sink_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("people.csv");
        let sink = CsvSnapshotSink::new(&path);

        let outcome = sink
            .write(sample().create_data_view(), Arc::new(AtomicBool::new(false)))
            .await
            .unwrap();
        assert_eq!(outcome, ExportOutcome::Completed { rows: 3 });
        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.starts_with("Name,Born,Score\n"));
        assert_eq!(written.lines().count(), 4);
    }
}
