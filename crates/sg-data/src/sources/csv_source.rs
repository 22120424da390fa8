use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use chrono::{NaiveDate, NaiveDateTime};
use csv::ReaderBuilder;
use sg_core::value::{INVALID_DATE, INVALID_DATETIME, UNKNOWN_DATE, UNKNOWN_DATETIME};
use sg_core::{CellValue, DataType, GridError, TableSchema};
use tracing::{debug, info};

use crate::config::CsvLoadOptions;
use crate::memory::MemoryTable;
use crate::source::TabularDataSource;
use crate::DataError;

/// Load a CSV file into a typed table
///
/// The header must name exactly the schema's columns, in any order.
pub fn load_csv(path: &Path, schema: &TableSchema, options: &CsvLoadOptions) -> Result<MemoryTable, DataError> {
    let file = File::open(path)?;
    let table = read_csv(BufReader::new(file), schema, options)?;
    info!("Loaded {} rows from {}", table.row_count(), path.display());
    Ok(table)
}

/// Load a CSV file on the blocking pool
pub async fn load_csv_async(
    path: PathBuf,
    schema: TableSchema,
    options: CsvLoadOptions,
) -> Result<MemoryTable, DataError> {
    tokio::task::spawn_blocking(move || load_csv(&path, &schema, &options)).await?
}

/// Read CSV records from any reader
pub fn read_csv<R: Read>(reader: R, schema: &TableSchema, options: &CsvLoadOptions) -> Result<MemoryTable, DataError> {
    let mut csv_reader = ReaderBuilder::new()
        .has_headers(options.has_headers)
        .delimiter(options.delimiter)
        .from_reader(reader);

    // Map each schema column to its field position in the file
    let field_for_column: Vec<usize> = if options.has_headers {
        let headers = csv_reader.headers()?.clone();
        if headers.len() != schema.len() {
            return Err(GridError::Schema(format!(
                "file has {} columns but the table declares {}",
                headers.len(),
                schema.len()
            ))
            .into());
        }
        schema
            .columns()
            .iter()
            .map(|column| {
                headers
                    .iter()
                    .position(|h| h.trim() == column.name)
                    .ok_or_else(|| GridError::Schema(format!("file has no column named '{}'", column.name)))
            })
            .collect::<Result<_, _>>()?
    } else {
        (0..schema.len()).collect()
    };

    let mut table = MemoryTable::new(schema.clone());
    for (row_idx, record) in csv_reader.records().enumerate() {
        let record = record?;
        let mut row = Vec::with_capacity(schema.len());
        for (column, &field_idx) in schema.columns().iter().zip(&field_for_column) {
            let raw = record.get(field_idx).unwrap_or("");
            let value = parse_field(raw, column.dtype, options).ok_or_else(|| DataError::Parse {
                column: column.name.clone(),
                row: row_idx + 1,
                value: raw.to_string(),
                expected: column.dtype,
            })?;
            row.push(value);
        }
        table.push_row(row)?;
    }
    debug!("Parsed {} CSV records", table.row_count());
    Ok(table)
}

/// Parse one text field as a value of `dtype`; `None` when it cannot be read
pub fn parse_field(raw: &str, dtype: DataType, options: &CsvLoadOptions) -> Option<CellValue> {
    if options.null_config.is_null(raw) {
        return Some(CellValue::Null);
    }
    let text = raw.trim();
    match dtype {
        DataType::Text | DataType::Object => Some(CellValue::Text(raw.to_string())),
        DataType::Int | DataType::Status => text.replace(',', "").parse::<i64>().ok().map(CellValue::Int),
        DataType::Float | DataType::Currency => {
            let cleaned: String = text.chars().filter(|c| !matches!(c, '$' | ',' | ' ')).collect();
            cleaned.parse::<f64>().ok().map(CellValue::float)
        }
        DataType::Bool => match text.to_ascii_uppercase().as_str() {
            "TRUE" | "YES" | "ON" | "1" => Some(CellValue::Bool(true)),
            "FALSE" | "NO" | "OFF" | "0" => Some(CellValue::Bool(false)),
            _ => None,
        },
        DataType::Date => match text {
            "UNKNOWN" => Some(CellValue::Date(*UNKNOWN_DATE)),
            "INVALID" => Some(CellValue::Date(*INVALID_DATE)),
            _ => NaiveDate::parse_from_str(text, &options.date_format).ok().map(CellValue::Date),
        },
        DataType::DateTime => match text {
            "UNKNOWN" => Some(CellValue::DateTime(*UNKNOWN_DATETIME)),
            "INVALID" => Some(CellValue::DateTime(*INVALID_DATETIME)),
            _ => options
                .datetime_formats
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
                .or_else(|| {
                    NaiveDate::parse_from_str(text, &options.date_format)
                        .ok()
                        .and_then(|d| d.and_hms_opt(0, 0, 0))
                })
                .map(CellValue::DateTime),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sg_core::ColumnDef;
    use std::io::Write;

    fn schema() -> TableSchema {
        TableSchema::new(vec![
            ColumnDef::new("Name", DataType::Text),
            ColumnDef::new("Income", DataType::Currency),
            ColumnDef::new("Born", DataType::Date),
            ColumnDef::new("Employed", DataType::Bool),
        ])
        .unwrap()
    }

    #[test]
    fn test_read_csv_with_reordered_headers() {
        let data = "Born,Name,Employed,Income\n2001-02-03,Ann,yes,\"$ 1,200.50\"\nUNKNOWN,Bob,no,N/A\n";
        let table = read_csv(data.as_bytes(), &schema(), &CsvLoadOptions::default()).unwrap();

        assert_eq!(table.row_count(), 2);
        assert_eq!(table.value_at(0, 0), Some(&CellValue::text("Ann")));
        assert_eq!(table.value_at(0, 1), Some(&CellValue::float(1200.5)));
        assert_eq!(table.value_at(0, 3), Some(&CellValue::Bool(true)));
        assert_eq!(table.value_at(1, 1), Some(&CellValue::Null));
        assert_eq!(table.value_at(1, 2), Some(&CellValue::Date(*UNKNOWN_DATE)));
    }

    #[test]
    fn test_header_mismatch_is_config_error() {
        let data = "Name,Salary,Born,Employed\nAnn,1,2001-02-03,yes\n";
        let result = read_csv(data.as_bytes(), &schema(), &CsvLoadOptions::default());
        assert!(matches!(result, Err(DataError::Config(_))));
    }

    #[test]
    fn test_bad_field_reports_position() {
        let data = "Name,Income,Born,Employed\nAnn,lots,2001-02-03,yes\n";
        let err = read_csv(data.as_bytes(), &schema(), &CsvLoadOptions::default()).unwrap_err();
        assert!(matches!(err, DataError::Parse { row: 1, ref column, .. } if column == "Income"));
    }

    #[test]
    fn test_parse_datetime_fallbacks() {
        let options = CsvLoadOptions::default();
        let parsed = parse_field("2024-01-02T03:04:05", DataType::DateTime, &options).unwrap();
        assert_eq!(parsed.to_string(), "2024-01-02 03:04:05");
        let date_only = parse_field("2024-01-02", DataType::DateTime, &options).unwrap();
        assert_eq!(date_only.to_string(), "2024-01-02 00:00:00");
        assert_eq!(parse_field("1,234", DataType::Int, &options), Some(CellValue::Int(1234)));
    }

    #[tokio::test]
    async fn test_load_csv_async_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("people.csv");
        let mut file = File::create(&path).unwrap();
        writeln!(file, "Name,Income,Born,Employed").unwrap();
        writeln!(file, "Ann,10,2001-02-03,true").unwrap();
        drop(file);

        let table = load_csv_async(path, schema(), CsvLoadOptions::default()).await.unwrap();
        assert_eq!(table.row_count(), 1);
    }
}
