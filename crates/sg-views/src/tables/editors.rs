//! In-place cell editors for editable columns

use serde::{Deserialize, Serialize};
use sg_core::{CellValue, DataType, ValidationError};
use tracing::warn;

pub const DEFAULT_INT_MAX: i64 = 99_999;
pub const DEFAULT_FLOAT_MAX: f64 = 99_999.9;

fn default_int_max() -> i64 {
    DEFAULT_INT_MAX
}

fn default_float_max() -> f64 {
    DEFAULT_FLOAT_MAX
}

/// How user input for an editable column is turned into a cell value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CellEditor {
    /// Free text, optionally restricted to a list of entries
    Text {
        #[serde(default)]
        valid_entries: Vec<String>,
        #[serde(default)]
        limit_to_valid_entries: bool,
        #[serde(default)]
        all_caps: bool,
    },
    /// Integer spin box; `controlling_column` supplies the row's maximum
    Int {
        #[serde(default)]
        min: i64,
        #[serde(default = "default_int_max")]
        max: i64,
        #[serde(default)]
        controlling_column: Option<String>,
    },
    /// Decimal spin box; `controlling_column` supplies the row's maximum
    Float {
        #[serde(default)]
        min: f64,
        #[serde(default = "default_float_max")]
        max: f64,
        #[serde(default)]
        controlling_column: Option<String>,
    },
    /// Pick one of a fixed list
    Choice { items: Vec<String> },
}

impl Default for CellEditor {
    fn default() -> Self {
        CellEditor::Text {
            valid_entries: Vec::new(),
            limit_to_valid_entries: false,
            all_caps: false,
        }
    }
}

impl CellEditor {
    pub fn int(min: i64, max: i64) -> Self {
        CellEditor::Int {
            min,
            max,
            controlling_column: None,
        }
    }

    pub fn float(min: f64, max: f64) -> Self {
        CellEditor::Float {
            min,
            max,
            controlling_column: None,
        }
    }

    pub fn restricted_text(entries: &[&str], all_caps: bool) -> Self {
        CellEditor::Text {
            valid_entries: entries.iter().map(|s| s.to_string()).collect(),
            limit_to_valid_entries: true,
            all_caps,
        }
    }

    pub fn controlling_column(&self) -> Option<&str> {
        match self {
            CellEditor::Int { controlling_column, .. } | CellEditor::Float { controlling_column, .. } => {
                controlling_column.as_deref()
            }
            _ => None,
        }
    }

    /// Whether this editor can write into a column of `dtype`
    pub fn supports(&self, dtype: DataType) -> bool {
        match self {
            CellEditor::Text { .. } | CellEditor::Choice { .. } => matches!(dtype, DataType::Text | DataType::Object),
            CellEditor::Int { .. } => matches!(dtype, DataType::Int | DataType::Status),
            CellEditor::Float { .. } => matches!(dtype, DataType::Float | DataType::Currency),
        }
    }

    /// Parse and validate `input`
    ///
    /// `controlling` is the row's value in the controlling column, if any.
    /// Spin values are clamped into range rather than rejected.
    pub fn parse(&self, input: &str, controlling: Option<&CellValue>) -> Result<CellValue, ValidationError> {
        match self {
            CellEditor::Text {
                valid_entries,
                limit_to_valid_entries,
                all_caps,
            } => {
                if *limit_to_valid_entries && !valid_entries.iter().any(|e| e == input) {
                    return Err(ValidationError::InvalidEntry);
                }
                if input.is_empty() {
                    return Ok(CellValue::Null);
                }
                Ok(CellValue::text(if *all_caps { input.to_uppercase() } else { input.to_string() }))
            }
            CellEditor::Int { min, max, .. } => {
                let value: i64 = parse_number(input)?;
                let max = match self.controlling_max(controlling) {
                    Some(limit) => limit.floor() as i64,
                    None => *max,
                };
                Ok(CellValue::Int(value.clamp(*min, max.max(*min))))
            }
            CellEditor::Float { min, max, .. } => {
                let value: f64 = parse_number(input)?;
                if !value.is_finite() {
                    return Err(ValidationError::InvalidEntry);
                }
                let max = self.controlling_max(controlling).unwrap_or(*max);
                Ok(CellValue::float(value.clamp(*min, max.max(*min))))
            }
            CellEditor::Choice { items } => {
                if items.iter().any(|i| i == input) {
                    Ok(CellValue::text(input))
                } else {
                    Err(ValidationError::InvalidEntry)
                }
            }
        }
    }

    fn controlling_max(&self, controlling: Option<&CellValue>) -> Option<f64> {
        let column = self.controlling_column()?;
        match controlling.and_then(CellValue::as_f64) {
            Some(limit) => Some(limit),
            None => {
                warn!("Controlling column '{}' has no numeric value, using the default maximum", column);
                None
            }
        }
    }
}

fn parse_number<T: std::str::FromStr>(input: &str) -> Result<T, ValidationError> {
    let cleaned: String = input.trim().chars().filter(|c| *c != ',').collect();
    cleaned.parse().map_err(|_| ValidationError::InvalidEntry)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_restricted_text() {
        let editor = CellEditor::restricted_text(&["ok", "hold"], true);
        assert_eq!(editor.parse("hold", None), Ok(CellValue::text("HOLD")));
        assert_eq!(editor.parse("nope", None), Err(ValidationError::InvalidEntry));
        assert_eq!(ValidationError::InvalidEntry.to_string(), "Not a valid entry");
        assert_eq!(CellEditor::default().parse("", None), Ok(CellValue::Null));
    }

    #[test]
    fn test_spin_values_clamp() {
        let editor = CellEditor::int(0, 10);
        assert_eq!(editor.parse("1,000", None), Ok(CellValue::Int(10)));
        assert_eq!(editor.parse("-4", None), Ok(CellValue::Int(0)));
        assert_eq!(editor.parse("abc", None), Err(ValidationError::InvalidEntry));

        let editor = CellEditor::float(0.0, 5.0);
        assert_eq!(editor.parse("2.5", None), Ok(CellValue::float(2.5)));
        assert_eq!(editor.parse("9", None), Ok(CellValue::float(5.0)));
    }

    #[test]
    fn test_controlling_column_sets_max() {
        let editor = CellEditor::Int {
            min: 0,
            max: 100,
            controlling_column: Some("Quota".to_string()),
        };
        assert_eq!(editor.controlling_column(), Some("Quota"));
        assert_eq!(editor.parse("50", Some(&CellValue::Int(20))), Ok(CellValue::Int(20)));
        assert_eq!(editor.parse("50", Some(&CellValue::Null)), Ok(CellValue::Int(50)));
    }

    #[test]
    fn test_choice_and_support() {
        let editor = CellEditor::Choice {
            items: vec!["Red".to_string(), "Blue".to_string()],
        };
        assert_eq!(editor.parse("Blue", None), Ok(CellValue::text("Blue")));
        assert!(editor.parse("Green", None).is_err());
        assert!(editor.supports(DataType::Text));
        assert!(!editor.supports(DataType::Int));
        assert!(CellEditor::float(0.0, 1.0).supports(DataType::Currency));
    }

    #[test]
    fn test_serde_shape() {
        let editor: CellEditor = serde_json::from_str(r#"{"kind":"int","controlling_column":"Quota"}"#).unwrap();
        assert_eq!(
            editor,
            CellEditor::Int {
                min: 0,
                max: DEFAULT_INT_MAX,
                controlling_column: Some("Quota".to_string()),
            }
        );
    }
}
