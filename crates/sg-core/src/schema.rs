//! Column definitions and table schema

use serde::{Deserialize, Serialize};

use crate::error::GridError;
use crate::value::{CellValue, DataType};

/// Optional per-column value constraints
///
/// `max_valid` and `max_expected` are independent: exceeding the first
/// renders `INVALID`, exceeding the second renders blank.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValueConstraints {
    /// Missing temporal values render as `UNKNOWN`
    pub required: bool,

    /// Values below this render as `INVALID`
    pub min_valid: Option<CellValue>,

    /// Values above this render as `INVALID`
    pub max_valid: Option<CellValue>,

    /// Values above this are treated as missing
    pub max_expected: Option<CellValue>,
}

impl ValueConstraints {
    pub fn required() -> Self {
        Self {
            required: true,
            ..Default::default()
        }
    }

    pub fn with_min_valid(mut self, value: impl Into<CellValue>) -> Self {
        self.min_valid = Some(value.into());
        self
    }

    pub fn with_max_valid(mut self, value: impl Into<CellValue>) -> Self {
        self.max_valid = Some(value.into());
        self
    }

    pub fn with_max_expected(mut self, value: impl Into<CellValue>) -> Self {
        self.max_expected = Some(value.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        !self.required
            && self.min_valid.is_none()
            && self.max_valid.is_none()
            && self.max_expected.is_none()
    }
}

/// A named, typed grid column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDef {
    pub name: String,
    pub dtype: DataType,
    #[serde(default)]
    pub constraints: ValueConstraints,
}

impl ColumnDef {
    pub fn new(name: impl Into<String>, dtype: DataType) -> Self {
        Self {
            name: name.into(),
            dtype,
            constraints: ValueConstraints::default(),
        }
    }

    pub fn with_constraints(mut self, constraints: ValueConstraints) -> Self {
        self.constraints = constraints;
        self
    }
}

/// Ordered set of uniquely named columns
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableSchema {
    columns: Vec<ColumnDef>,
}

impl TableSchema {
    /// Build a schema, rejecting duplicate column names
    pub fn new(columns: Vec<ColumnDef>) -> Result<Self, GridError> {
        for (idx, column) in columns.iter().enumerate() {
            if column.name.trim().is_empty() {
                return Err(GridError::Schema("column names cannot be blank".to_string()));
            }
            if columns[..idx].iter().any(|c| c.name == column.name) {
                return Err(GridError::DuplicateColumn(column.name.clone()));
            }
        }
        Ok(Self { columns })
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn columns(&self) -> &[ColumnDef] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&ColumnDef> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index_of(name).is_some()
    }

    pub fn dtype(&self, name: &str) -> Option<DataType> {
        self.column(name).map(|c| c.dtype)
    }

    /// Column names in declared order
    pub fn names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    /// Look up a column or fail with a configuration error
    pub fn require(&self, name: &str) -> Result<&ColumnDef, GridError> {
        self.column(name)
            .ok_or_else(|| GridError::UnknownColumn(name.to_string()))
    }

    /// Check that one row of values matches this schema
    pub fn validate_row(&self, row: &[CellValue]) -> Result<(), GridError> {
        if row.len() != self.columns.len() {
            return Err(GridError::Schema(format!(
                "row has {} values but the table declares {} columns",
                row.len(),
                self.columns.len()
            )));
        }
        for (value, column) in row.iter().zip(&self.columns) {
            if !value.fits(column.dtype) {
                return Err(GridError::TypeMismatch {
                    column: column.name.clone(),
                    expected: column.dtype,
                    found: value.kind(),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema() -> TableSchema {
        TableSchema::new(vec![
            ColumnDef::new("Name", DataType::Text),
            ColumnDef::new("Age", DataType::Int),
        ])
        .unwrap()
    }

    #[test]
    fn test_duplicate_columns_rejected() {
        let result = TableSchema::new(vec![
            ColumnDef::new("A", DataType::Text),
            ColumnDef::new("A", DataType::Int),
        ]);
        assert!(matches!(result, Err(GridError::DuplicateColumn(name)) if name == "A"));
    }

    #[test]
    fn test_row_validation() {
        let schema = schema();
        assert!(schema.validate_row(&[CellValue::text("Bob"), CellValue::Int(4)]).is_ok());
        assert!(schema.validate_row(&[CellValue::text("Bob"), CellValue::Null]).is_ok());
        assert!(schema.validate_row(&[CellValue::text("Bob")]).is_err());
        assert!(matches!(
            schema.validate_row(&[CellValue::text("Bob"), CellValue::text("four")]),
            Err(GridError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_lookup() {
        let schema = schema();
        assert_eq!(schema.index_of("Age"), Some(1));
        assert_eq!(schema.dtype("Name"), Some(DataType::Text));
        assert!(schema.require("Missing").is_err());
        assert_eq!(schema.names(), vec!["Name".to_string(), "Age".to_string()]);
    }
}
