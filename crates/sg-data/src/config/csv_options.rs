//! Options for loading typed CSV files

use serde::{Serialize, Deserialize};

use super::null_handling::NullConfig;

/// How a CSV file maps onto a typed table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CsvLoadOptions {
    /// Field delimiter
    pub delimiter: u8,

    /// Whether the first record holds column names
    pub has_headers: bool,

    /// `chrono` format for `Date` columns
    pub date_format: String,

    /// `chrono` formats tried in order for `DateTime` columns
    pub datetime_formats: Vec<String>,

    /// Null token handling
    pub null_config: NullConfig,
}

impl Default for CsvLoadOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            has_headers: true,
            date_format: "%Y-%m-%d".to_string(),
            datetime_formats: vec![
                "%Y-%m-%d %H:%M:%S".to_string(),
                "%Y-%m-%dT%H:%M:%S".to_string(),
                "%Y-%m-%d %H:%M".to_string(),
            ],
            null_config: NullConfig::default(),
        }
    }
}

impl CsvLoadOptions {
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn with_date_format(mut self, format: impl Into<String>) -> Self {
        self.date_format = format.into();
        self
    }
}
