//! Grid configuration

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use sg_core::consts::EDITABLE_COLUMN_BG;
use sg_core::{GridError, TableIdCounter, TableSchema};

use super::editors::CellEditor;

/// Configuration for one grid
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    /// Table identity used for saved views; `None` takes the next `Table_{n}`
    pub table_name: Option<String>,
    /// Numeric columns shown in the summary bar
    pub summary_columns: Vec<String>,
    /// Add a record count before the summary columns
    pub sum_record_count: bool,
    pub editable_columns: IndexMap<String, CellEditor>,
    /// RGBA background for editable columns
    pub editable_bg: [u8; 4],
    /// Group date-time filter trees down to seconds
    pub time_resolution: bool,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            table_name: None,
            summary_columns: Vec::new(),
            sum_record_count: true,
            editable_columns: IndexMap::new(),
            editable_bg: EDITABLE_COLUMN_BG,
            time_resolution: false,
        }
    }
}

impl GridConfig {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            table_name: Some(name.into()),
            ..Default::default()
        }
    }

    pub fn with_summary(mut self, columns: &[&str]) -> Self {
        self.summary_columns = columns.iter().map(|c| c.to_string()).collect();
        self
    }

    pub fn with_editor(mut self, column: impl Into<String>, editor: CellEditor) -> Self {
        self.editable_columns.insert(column.into(), editor);
        self
    }

    /// Configured name, or the next default name from `ids`
    pub fn resolve_name(&self, ids: &TableIdCounter) -> String {
        match &self.table_name {
            Some(name) if !name.trim().is_empty() => name.clone(),
            _ => ids.next_name(),
        }
    }

    /// Check editable columns against the schema
    pub fn validate(&self, schema: &TableSchema) -> Result<(), GridError> {
        for (column, editor) in &self.editable_columns {
            let def = schema
                .column(column)
                .ok_or_else(|| GridError::UnknownEditableColumn(column.clone()))?;
            if !editor.supports(def.dtype) {
                return Err(GridError::Schema(format!(
                    "editor for '{}' cannot write {} values",
                    column, def.dtype
                )));
            }
            if let Some(controlling) = editor.controlling_column() {
                schema.require(controlling)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sg_core::{ColumnDef, DataType};

    #[test]
    fn test_default_name_from_counter() {
        let ids = TableIdCounter::new();
        let config = GridConfig::default();
        assert_eq!(config.resolve_name(&ids), "Table_1");
        assert_eq!(config.resolve_name(&ids), "Table_2");
        assert_eq!(GridConfig::named("People").resolve_name(&ids), "People");
        assert!(config.sum_record_count);
    }

    #[test]
    fn test_validate_editable_columns() {
        let schema = TableSchema::new(vec![
            ColumnDef::new("Name", DataType::Text),
            ColumnDef::new("Count", DataType::Int),
        ])
        .unwrap();

        let ok = GridConfig::default().with_editor("Count", CellEditor::int(0, 5));
        assert!(ok.validate(&schema).is_ok());

        let missing = GridConfig::default().with_editor("Nope", CellEditor::default());
        assert_eq!(
            missing.validate(&schema),
            Err(GridError::UnknownEditableColumn("Nope".to_string()))
        );

        let wrong = GridConfig::default().with_editor("Name", CellEditor::int(0, 5));
        assert!(matches!(wrong.validate(&schema), Err(GridError::Schema(_))));
    }

    #[test]
    fn test_json_round_trip() {
        let config = GridConfig::named("People")
            .with_summary(&["Income"])
            .with_editor("Notes", CellEditor::default());
        let json = serde_json::to_string(&config).unwrap();
        let back: GridConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);

        let sparse: GridConfig = serde_json::from_str(r#"{"summary_columns":["Age"]}"#).unwrap();
        assert!(sparse.sum_record_count);
        assert_eq!(sparse.editable_bg, EDITABLE_COLUMN_BG);
    }
}
