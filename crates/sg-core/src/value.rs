//! Raw cell values, declared column types and temporal sentinels

use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

/// Integer flag that renders as blank even though a value is present
pub const BLANK_INT_FLAG: i64 = -975_312_468;

/// Date used when a required value is missing
pub static UNKNOWN_DATETIME: Lazy<NaiveDateTime> = Lazy::new(|| sentinel(1677, 9, 22));
/// Date used when a value failed validation upstream
pub static INVALID_DATETIME: Lazy<NaiveDateTime> = Lazy::new(|| sentinel(1975, 4, 29));
/// Sort-only alias of the unknown date, pushes unknowns to the end of an ascending sort
pub static SORT_ASC_UNKNOWN_DATETIME: Lazy<NaiveDateTime> = Lazy::new(|| sentinel(2262, 4, 11));

pub static UNKNOWN_DATE: Lazy<NaiveDate> = Lazy::new(|| UNKNOWN_DATETIME.date());
pub static INVALID_DATE: Lazy<NaiveDate> = Lazy::new(|| INVALID_DATETIME.date());
pub static SORT_ASC_UNKNOWN_DATE: Lazy<NaiveDate> = Lazy::new(|| SORT_ASC_UNKNOWN_DATETIME.date());

fn sentinel(year: i32, month: u32, day: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap_or_default()
}

/// Declared type of a grid column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
    Text,
    Int,
    Float,
    Currency,
    Date,
    DateTime,
    Bool,
    Status,
    Object,
}

impl DataType {
    /// Date or date-time
    pub fn is_temporal(&self) -> bool {
        matches!(self, DataType::Date | DataType::DateTime)
    }

    /// Types that can be summed by the summary aggregator
    pub fn is_numeric(&self) -> bool {
        matches!(self, DataType::Int | DataType::Float | DataType::Currency)
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DataType::Text => "Text",
            DataType::Int => "Int",
            DataType::Float => "Float",
            DataType::Currency => "Currency",
            DataType::Date => "Date",
            DataType::DateTime => "DateTime",
            DataType::Bool => "Bool",
            DataType::Status => "Status",
            DataType::Object => "Object",
        };
        f.write_str(name)
    }
}

/// Progress codes stored in `Status` columns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActionStatus {
    Uninit,
    Idle,
    Pending,
    InProgress,
    Complete,
    Error,
    Failed,
}

impl ActionStatus {
    pub fn code(&self) -> i64 {
        match self {
            ActionStatus::Uninit => -999,
            ActionStatus::Idle => 0,
            ActionStatus::Pending => 1,
            ActionStatus::InProgress => 2,
            ActionStatus::Complete => 3,
            ActionStatus::Error => 4,
            ActionStatus::Failed => 5,
        }
    }

    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            -999 => Some(ActionStatus::Uninit),
            0 => Some(ActionStatus::Idle),
            1 => Some(ActionStatus::Pending),
            2 => Some(ActionStatus::InProgress),
            3 => Some(ActionStatus::Complete),
            4 => Some(ActionStatus::Error),
            5 => Some(ActionStatus::Failed),
            _ => None,
        }
    }

    /// Label shown in filter lists
    pub fn label(&self) -> &'static str {
        match self {
            ActionStatus::Uninit => "Uninitialized",
            ActionStatus::Idle => "Idle",
            ActionStatus::Pending => "Pending",
            ActionStatus::InProgress => "In-Progress",
            ActionStatus::Complete => "Complete",
            ActionStatus::Error => "Error",
            ActionStatus::Failed => "Fail",
        }
    }
}

/// A single raw cell value
///
/// `Null` is the missing value for every column type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CellValue {
    Null,
    Text(String),
    Int(i64),
    Float(OrderedFloat<f64>),
    Bool(bool),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
}

impl CellValue {
    pub fn float(value: f64) -> Self {
        CellValue::Float(OrderedFloat(value))
    }

    pub fn text(value: impl Into<String>) -> Self {
        CellValue::Text(value.into())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }

    /// Numeric view used for sums and spin-box limits
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Int(v) => Some(*v as f64),
            CellValue::Float(v) => Some(v.0),
            CellValue::Bool(v) => Some(if *v { 1.0 } else { 0.0 }),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            CellValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Kind name for error messages
    pub fn kind(&self) -> &'static str {
        match self {
            CellValue::Null => "null",
            CellValue::Text(_) => "text",
            CellValue::Int(_) => "int",
            CellValue::Float(_) => "float",
            CellValue::Bool(_) => "bool",
            CellValue::Date(_) => "date",
            CellValue::DateTime(_) => "datetime",
        }
    }

    /// Whether this value may be stored in a column of `dtype`
    pub fn fits(&self, dtype: DataType) -> bool {
        match (self, dtype) {
            (CellValue::Null, _) => true,
            (_, DataType::Object) => true,
            (CellValue::Text(_), DataType::Text) => true,
            (CellValue::Int(_), DataType::Int | DataType::Status) => true,
            (CellValue::Int(_) | CellValue::Float(_), DataType::Float | DataType::Currency) => true,
            (CellValue::Bool(_), DataType::Bool) => true,
            (CellValue::Date(_), DataType::Date) => true,
            (CellValue::Date(_) | CellValue::DateTime(_), DataType::DateTime) => true,
            _ => false,
        }
    }
}

impl Default for CellValue {
    fn default() -> Self {
        CellValue::Null
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Null => Ok(()),
            CellValue::Text(s) => f.write_str(s),
            CellValue::Int(v) => write!(f, "{}", v),
            CellValue::Float(v) => write!(f, "{}", v.0),
            CellValue::Bool(v) => write!(f, "{}", if *v { "True" } else { "False" }),
            CellValue::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            CellValue::DateTime(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S")),
        }
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::Text(value)
    }
}

impl From<i64> for CellValue {
    fn from(value: i64) -> Self {
        CellValue::Int(value)
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::float(value)
    }
}

impl From<bool> for CellValue {
    fn from(value: bool) -> Self {
        CellValue::Bool(value)
    }
}

impl From<NaiveDate> for CellValue {
    fn from(value: NaiveDate) -> Self {
        CellValue::Date(value)
    }
}

impl From<NaiveDateTime> for CellValue {
    fn from(value: NaiveDateTime) -> Self {
        CellValue::DateTime(value)
    }
}

impl From<ActionStatus> for CellValue {
    fn from(value: ActionStatus) -> Self {
        CellValue::Int(value.code())
    }
}

impl<T: Into<CellValue>> From<Option<T>> for CellValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(CellValue::Null)
    }
}

/// Special temporal constants standing in for unknown or invalid data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sentinel {
    Unknown,
    Invalid,
}

impl Sentinel {
    /// Classify a raw value; both the canonical and the sort-biased unknown map to `Unknown`
    pub fn classify(value: &CellValue) -> Option<Sentinel> {
        match value {
            CellValue::Date(d) => {
                if *d == *UNKNOWN_DATE || *d == *SORT_ASC_UNKNOWN_DATE {
                    Some(Sentinel::Unknown)
                } else if *d == *INVALID_DATE {
                    Some(Sentinel::Invalid)
                } else {
                    None
                }
            }
            CellValue::DateTime(dt) => {
                if *dt == *UNKNOWN_DATETIME || *dt == *SORT_ASC_UNKNOWN_DATETIME {
                    Some(Sentinel::Unknown)
                } else if *dt == *INVALID_DATETIME {
                    Some(Sentinel::Invalid)
                } else {
                    None
                }
            }
            _ => None,
        }
    }

    /// Human readable token used in displays and exports
    pub fn token(&self) -> &'static str {
        match self {
            Sentinel::Unknown => "UNKNOWN",
            Sentinel::Invalid => "INVALID",
        }
    }

    /// All raw values this sentinel expands to for a temporal column
    pub fn values(&self, dtype: DataType) -> Vec<CellValue> {
        match (self, dtype) {
            (Sentinel::Unknown, DataType::DateTime) => vec![
                CellValue::DateTime(*UNKNOWN_DATETIME),
                CellValue::DateTime(*SORT_ASC_UNKNOWN_DATETIME),
            ],
            (Sentinel::Unknown, _) => vec![
                CellValue::Date(*UNKNOWN_DATE),
                CellValue::Date(*SORT_ASC_UNKNOWN_DATE),
            ],
            (Sentinel::Invalid, DataType::DateTime) => vec![CellValue::DateTime(*INVALID_DATETIME)],
            (Sentinel::Invalid, _) => vec![CellValue::Date(*INVALID_DATE)],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentinel_classification() {
        assert_eq!(Sentinel::classify(&CellValue::Date(*UNKNOWN_DATE)), Some(Sentinel::Unknown));
        assert_eq!(Sentinel::classify(&CellValue::Date(*SORT_ASC_UNKNOWN_DATE)), Some(Sentinel::Unknown));
        assert_eq!(Sentinel::classify(&CellValue::DateTime(*INVALID_DATETIME)), Some(Sentinel::Invalid));

        let normal = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        assert_eq!(Sentinel::classify(&CellValue::Date(normal)), None);
        assert_eq!(Sentinel::classify(&CellValue::Int(1677)), None);
    }

    #[test]
    fn test_sentinel_expansion() {
        let values = Sentinel::Unknown.values(DataType::Date);
        assert_eq!(values.len(), 2);
        assert!(values.iter().all(|v| Sentinel::classify(v) == Some(Sentinel::Unknown)));

        let values = Sentinel::Invalid.values(DataType::DateTime);
        assert_eq!(values, vec![CellValue::DateTime(*INVALID_DATETIME)]);
    }

    #[test]
    fn test_value_fits_column_type() {
        assert!(CellValue::Null.fits(DataType::Date));
        assert!(CellValue::Int(3).fits(DataType::Float));
        assert!(CellValue::Int(3).fits(DataType::Status));
        assert!(!CellValue::text("x").fits(DataType::Int));
        assert!(!CellValue::float(1.5).fits(DataType::Int));
        assert!(CellValue::text("anything").fits(DataType::Object));
    }

    #[test]
    fn test_action_status_codes() {
        for status in [ActionStatus::Uninit, ActionStatus::Idle, ActionStatus::Failed] {
            assert_eq!(ActionStatus::from_code(status.code()), Some(status));
        }
        assert_eq!(ActionStatus::from_code(42), None);
        assert_eq!(ActionStatus::InProgress.label(), "In-Progress");
    }

    #[test]
    fn test_option_into_cell_value() {
        let missing: Option<i64> = None;
        assert_eq!(CellValue::from(missing), CellValue::Null);
        assert_eq!(CellValue::from(Some(5i64)), CellValue::Int(5));
    }
}
