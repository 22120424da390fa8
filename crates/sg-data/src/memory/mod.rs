//! In-memory table with stable row keys

use ahash::AHashMap;
use sg_core::{CellValue, GridError, TableSchema};

use crate::source::{RowKey, SourceChange, TabularDataSource};
use crate::DataError;

/// Row-major in-memory table
///
/// Row keys are assigned in insertion order and never reused.
#[derive(Debug, Clone)]
pub struct MemoryTable {
    schema: TableSchema,
    rows: Vec<Vec<CellValue>>,
    keys: Vec<RowKey>,
    positions: AHashMap<RowKey, usize>,
    next_key: RowKey,
}

impl MemoryTable {
    /// Create an empty table
    pub fn new(schema: TableSchema) -> Self {
        Self {
            schema,
            rows: Vec::new(),
            keys: Vec::new(),
            positions: AHashMap::new(),
            next_key: 0,
        }
    }

    /// Create a table from rows, validating every row against the schema
    pub fn from_rows(schema: TableSchema, rows: Vec<Vec<CellValue>>) -> Result<Self, DataError> {
        let mut table = Self::new(schema);
        table.rows.reserve(rows.len());
        for row in rows {
            table.push_row(row)?;
        }
        Ok(table)
    }

    /// Append a row and return its key
    pub fn push_row(&mut self, row: Vec<CellValue>) -> Result<RowKey, DataError> {
        self.schema.validate_row(&row)?;
        let key = self.next_key;
        self.next_key += 1;
        self.positions.insert(key, self.rows.len());
        self.keys.push(key);
        self.rows.push(row);
        Ok(key)
    }

    /// All values of one column in row order
    pub fn column_values(&self, column: &str) -> Option<Vec<&CellValue>> {
        let idx = self.schema.index_of(column)?;
        Some(self.rows.iter().map(|row| &row[idx]).collect())
    }

    fn reindex_from(&mut self, start: usize) {
        for (pos, key) in self.keys.iter().enumerate().skip(start) {
            self.positions.insert(*key, pos);
        }
    }
}

impl TabularDataSource for MemoryTable {
    fn schema(&self) -> &TableSchema {
        &self.schema
    }

    fn row_count(&self) -> usize {
        self.rows.len()
    }

    fn key_at(&self, position: usize) -> Option<RowKey> {
        self.keys.get(position).copied()
    }

    fn position_of(&self, key: RowKey) -> Option<usize> {
        self.positions.get(&key).copied()
    }

    fn value_at(&self, position: usize, column: usize) -> Option<&CellValue> {
        self.rows.get(position).and_then(|row| row.get(column))
    }

    fn set(&mut self, key: RowKey, column: &str, value: CellValue) -> Result<SourceChange, DataError> {
        let position = self.position_of(key).ok_or(GridError::UnknownRow(key))?;
        let def = self.schema.require(column)?;
        if !value.fits(def.dtype) {
            return Err(GridError::TypeMismatch {
                column: def.name.clone(),
                expected: def.dtype,
                found: value.kind(),
            }
            .into());
        }
        let idx = self.schema.index_of(column).ok_or_else(|| GridError::UnknownColumn(column.to_string()))?;
        self.rows[position][idx] = value;
        Ok(SourceChange::CellChanged {
            key,
            column: column.to_string(),
        })
    }

    fn remove_row(&mut self, key: RowKey) -> Result<SourceChange, DataError> {
        let position = self.positions.remove(&key).ok_or(GridError::UnknownRow(key))?;
        self.rows.remove(position);
        self.keys.remove(position);
        self.reindex_from(position);
        Ok(SourceChange::RowsRemoved(vec![key]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sg_core::{ColumnDef, DataType};

    fn table() -> MemoryTable {
        let schema = TableSchema::new(vec![
            ColumnDef::new("Name", DataType::Text),
            ColumnDef::new("Qty", DataType::Int),
        ])
        .unwrap();
        MemoryTable::from_rows(
            schema,
            vec![
                vec!["a".into(), 1i64.into()],
                vec!["b".into(), 2i64.into()],
                vec!["c".into(), CellValue::Null],
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_row_keys_survive_removal() {
        let mut table = table();
        let key_c = table.key_at(2).unwrap();

        let change = table.remove_row(table.key_at(0).unwrap()).unwrap();
        assert!(matches!(change, SourceChange::RowsRemoved(ref keys) if keys.len() == 1));
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.position_of(key_c), Some(1));
        assert_eq!(table.get(key_c, "Name"), Some(&CellValue::text("c")));
    }

    #[test]
    fn test_set_validates_type() {
        let mut table = table();
        let key = table.key_at(1).unwrap();

        assert!(table.set(key, "Qty", CellValue::Int(9)).is_ok());
        assert_eq!(table.get(key, "Qty"), Some(&CellValue::Int(9)));
        assert!(table.set(key, "Qty", CellValue::text("nine")).is_err());
        assert!(table.set(key, "Nope", CellValue::Int(1)).is_err());
        assert!(table.set(999, "Qty", CellValue::Int(1)).is_err());
    }

    #[test]
    fn test_schema_mismatch_rejected() {
        let schema = TableSchema::new(vec![ColumnDef::new("Qty", DataType::Int)]).unwrap();
        let result = MemoryTable::from_rows(schema, vec![vec![CellValue::text("x")]]);
        assert!(matches!(result, Err(DataError::Config(GridError::TypeMismatch { .. }))));
    }

    #[test]
    fn test_column_values() {
        let table = table();
        let values = table.column_values("Qty").unwrap();
        assert_eq!(values, vec![&CellValue::Int(1), &CellValue::Int(2), &CellValue::Null]);
        assert!(table.column_values("Missing").is_none());
    }
}
