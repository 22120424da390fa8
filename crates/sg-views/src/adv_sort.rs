//! Multi-level sort editor
//!
//! Rows are edited without touching the grid; `accept` hands back the
//! finished levels in precedence order.

use sg_core::consts::{SELECT_COLUMN_PROMPT, SELECT_ORDER_PROMPT};
use sg_core::{DataType, SortDirection, ValidationError};

/// One row of the editor; incomplete until both parts are chosen
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SortLevel {
    pub column: Option<String>,
    pub direction: Option<SortDirection>,
}

impl SortLevel {
    pub fn is_complete(&self) -> bool {
        self.column.is_some() && self.direction.is_some()
    }
}

/// Editing state of the advanced sort dialog
#[derive(Debug, Clone)]
pub struct AdvSortEditor {
    columns: Vec<(String, DataType)>,
    levels: Vec<SortLevel>,
    selected: Option<usize>,
}

impl AdvSortEditor {
    /// Start from the visible columns and the current sort
    ///
    /// Levels on columns that are not offered are left out.
    pub fn new(columns: Vec<(String, DataType)>, current: &[(String, SortDirection)]) -> Self {
        let levels = current
            .iter()
            .filter(|(column, _)| columns.iter().any(|(c, _)| c == column))
            .map(|(column, direction)| SortLevel {
                column: Some(column.clone()),
                direction: Some(*direction),
            })
            .collect();
        Self {
            columns,
            levels,
            selected: None,
        }
    }

    pub fn levels(&self) -> &[SortLevel] {
        &self.levels
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    pub fn select(&mut self, index: Option<usize>) {
        self.selected = index.filter(|i| *i < self.levels.len());
    }

    /// Append an empty level and select it
    pub fn add_level(&mut self) -> Result<usize, ValidationError> {
        if self.levels.iter().any(|l| !l.is_complete()) {
            return Err(ValidationError::IncompleteSortLevelPending);
        }
        self.levels.push(SortLevel::default());
        let index = self.levels.len() - 1;
        self.selected = Some(index);
        Ok(index)
    }

    pub fn remove_level(&mut self, index: usize) -> bool {
        if index >= self.levels.len() {
            return false;
        }
        self.levels.remove(index);
        self.selected = match self.selected {
            _ if self.levels.is_empty() => None,
            Some(sel) if sel >= self.levels.len() => Some(self.levels.len() - 1),
            other => other,
        };
        true
    }

    pub fn move_up(&mut self, index: usize) -> bool {
        if index == 0 || index >= self.levels.len() {
            return false;
        }
        self.levels.swap(index, index - 1);
        self.selected = Some(index - 1);
        true
    }

    pub fn move_down(&mut self, index: usize) -> bool {
        if index + 1 >= self.levels.len() {
            return false;
        }
        self.levels.swap(index, index + 1);
        self.selected = Some(index + 1);
        true
    }

    pub fn can_remove(&self) -> bool {
        self.selected.is_some()
    }

    pub fn can_move_up(&self) -> bool {
        matches!(self.selected, Some(sel) if sel > 0 && self.levels.len() > 1)
    }

    pub fn can_move_down(&self) -> bool {
        matches!(self.selected, Some(sel) if sel + 1 < self.levels.len())
    }

    /// Columns a row may pick: every column not chosen by another row
    pub fn available_columns(&self, index: usize) -> Vec<String> {
        self.columns
            .iter()
            .map(|(name, _)| name)
            .filter(|name| {
                !self
                    .levels
                    .iter()
                    .enumerate()
                    .any(|(i, l)| i != index && l.column.as_deref() == Some(name.as_str()))
            })
            .cloned()
            .collect()
    }

    /// Choose the column of a row; rejected if another row already uses it
    pub fn set_column(&mut self, index: usize, column: &str) -> bool {
        if index >= self.levels.len() || !self.available_columns(index).iter().any(|c| c == column) {
            return false;
        }
        self.levels[index].column = Some(column.to_string());
        true
    }

    pub fn set_direction(&mut self, index: usize, direction: SortDirection) -> bool {
        match self.levels.get_mut(index) {
            Some(level) => {
                level.direction = Some(direction);
                true
            }
            None => false,
        }
    }

    pub fn column_label(&self, index: usize) -> String {
        match self.levels.get(index).and_then(|l| l.column.clone()) {
            Some(column) => column,
            None => SELECT_COLUMN_PROMPT.to_string(),
        }
    }

    /// Direction wording depends on the column type
    pub fn direction_label(&self, index: usize) -> String {
        let Some(level) = self.levels.get(index) else {
            return String::new();
        };
        let Some(direction) = level.direction else {
            return SELECT_ORDER_PROMPT.to_string();
        };
        let dtype = level
            .column
            .as_ref()
            .and_then(|c| self.columns.iter().find(|(name, _)| name == c))
            .map(|(_, dtype)| *dtype);
        let (asc, desc) = match dtype {
            Some(DataType::Date | DataType::DateTime) => ("Oldest to Newest", "Newest to Oldest"),
            Some(DataType::Int | DataType::Float | DataType::Currency) => ("Smallest to Largest", "Largest to Smallest"),
            _ => ("Sort A to Z", "Sort Z to A"),
        };
        match direction {
            SortDirection::Ascending => asc.to_string(),
            SortDirection::Descending => desc.to_string(),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.levels.iter().all(SortLevel::is_complete)
    }

    /// Finished levels in precedence order
    pub fn accept(&self) -> Result<Vec<(String, SortDirection)>, ValidationError> {
        self.levels
            .iter()
            .map(|l| match (&l.column, l.direction) {
                (Some(column), Some(direction)) => Ok((column.clone(), direction)),
                _ => Err(ValidationError::IncompleteSortLevels),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn editor() -> AdvSortEditor {
        AdvSortEditor::new(
            vec![
                ("Name".to_string(), DataType::Text),
                ("Age".to_string(), DataType::Int),
                ("Born".to_string(), DataType::Date),
            ],
            &[("Age".to_string(), SortDirection::Descending), ("Gone".to_string(), SortDirection::Ascending)],
        )
    }

    #[test]
    fn test_starts_from_visible_sort() {
        let editor = editor();
        assert_eq!(editor.len(), 1);
        assert_eq!(editor.direction_label(0), "Largest to Smallest");
        assert!(editor.is_valid());
    }

    #[test]
    fn test_add_requires_complete_rows() {
        let mut editor = editor();
        assert_eq!(editor.add_level(), Ok(1));
        assert_eq!(editor.column_label(1), SELECT_COLUMN_PROMPT);
        assert_eq!(editor.direction_label(1), SELECT_ORDER_PROMPT);
        assert_eq!(editor.add_level(), Err(ValidationError::IncompleteSortLevelPending));

        assert!(editor.set_column(1, "Born"));
        // a column without a direction is still incomplete
        assert_eq!(editor.add_level(), Err(ValidationError::IncompleteSortLevelPending));
        assert_eq!(editor.len(), 2);
        assert_eq!(editor.accept(), Err(ValidationError::IncompleteSortLevels));
        assert!(editor.set_direction(1, SortDirection::Ascending));
        assert_eq!(editor.direction_label(1), "Oldest to Newest");
        assert_eq!(
            editor.accept(),
            Ok(vec![
                ("Age".to_string(), SortDirection::Descending),
                ("Born".to_string(), SortDirection::Ascending),
            ])
        );
    }

    #[test]
    fn test_columns_are_mutually_exclusive() {
        let mut editor = editor();
        editor.add_level().unwrap();
        assert_eq!(editor.available_columns(1), vec!["Name".to_string(), "Born".to_string()]);
        assert_eq!(editor.available_columns(0), vec!["Name".to_string(), "Age".to_string(), "Born".to_string()]);
        assert!(!editor.set_column(1, "Age"));
    }

    #[test]
    fn test_reorder_moves_selection() {
        let mut editor = editor();
        editor.add_level().unwrap();
        editor.set_column(1, "Name");
        editor.set_direction(1, SortDirection::Ascending);

        assert!(editor.can_move_up());
        assert!(!editor.can_move_down());
        assert!(editor.move_up(1));
        assert_eq!(editor.selected(), Some(0));
        assert_eq!(editor.column_label(0), "Name");
        assert_eq!(editor.direction_label(0), "Sort A to Z");

        assert!(editor.remove_level(1));
        assert!(editor.remove_level(0));
        assert_eq!(editor.selected(), None);
        assert!(!editor.can_remove());
    }
}
