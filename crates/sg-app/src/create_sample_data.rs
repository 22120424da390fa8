//! Create a sample people table for the demo grid

use chrono::{Duration, NaiveDate, NaiveDateTime};
use rand::seq::SliceRandom;
use rand::Rng;
use sg_core::{CellValue, ColumnDef, DataType, TableSchema};
use sg_data::{DataError, MemoryTable};

const FIRST_NAMES: &[&str] = &["John", "Alice", "Bob", "Emily", "Charlie", "Barry", "Quinn", "Jackie", "James"];

const LAST_NAMES: &[&str] = &[
    "Smith", "Johnson", "Williams", "Jones", "Brown", "Davis", "Miller", "Wilson", "Moore", "Taylor", "Anderson",
    "Thomas", "Jackson", "White", "Harris", "Martin", "Thompson", "Garcia", "Martinez", "Robinson",
];

pub fn sample_schema() -> Result<TableSchema, DataError> {
    Ok(TableSchema::new(vec![
        ColumnDef::new("First Name", DataType::Text),
        ColumnDef::new("Last Name", DataType::Text),
        ColumnDef::new("Age", DataType::Int),
        ColumnDef::new("Height", DataType::Float),
        ColumnDef::new("Income", DataType::Currency),
        ColumnDef::new("Birthdate", DataType::Date),
        ColumnDef::new("Registration_Date", DataType::DateTime),
        ColumnDef::new("Is_Employed", DataType::Bool),
    ])?)
}

/// Build `num_rows` random people with a few blanks in every column
pub fn create_sample_table(num_rows: usize) -> Result<MemoryTable, DataError> {
    let mut rng = rand::thread_rng();
    let schema = sample_schema()?;

    let start = NaiveDate::from_ymd_opt(2023, 1, 1).ok_or_else(|| DataError::Other("bad start date".into()))?;
    let end = NaiveDate::from_ymd_opt(2026, 12, 31).ok_or_else(|| DataError::Other("bad end date".into()))?;
    let span_days = (end - start).num_days();
    let epoch: NaiveDateTime = start.and_hms_opt(0, 0, 0).ok_or_else(|| DataError::Other("bad start time".into()))?;

    let mut rows: Vec<Vec<CellValue>> = (0..num_rows)
        .map(|_| {
            let first = FIRST_NAMES.choose(&mut rng).copied().unwrap_or("John");
            let last = LAST_NAMES.choose(&mut rng).copied().unwrap_or("Smith");
            let height = (rng.gen_range(58.3..71.9_f64) * 10.0).round() / 10.0;
            let income = (rng.gen_range(1000.0..10000.0_f64) * 100.0).round() / 100.0;
            let birthdate = start + Duration::days(rng.gen_range(0..=span_days));
            let registered = epoch + Duration::seconds(rng.gen_range(0..span_days * 86_400));

            vec![
                CellValue::from(first),
                CellValue::from(last),
                CellValue::Int(rng.gen_range(18..=80)),
                CellValue::from(height),
                CellValue::from(income),
                CellValue::Date(birthdate),
                CellValue::DateTime(registered),
                CellValue::Bool(rng.gen_bool(0.5)),
            ]
        })
        .collect();

    if num_rows > 0 {
        let positions: Vec<usize> = (0..num_rows).collect();
        for column in 0..schema.len() {
            let blanks = rng.gen_range(2..=5).min(num_rows);
            for &row in positions.choose_multiple(&mut rng, blanks) {
                rows[row][column] = CellValue::Null;
            }
        }
    }

    println!("Generated {} sample rows", rows.len());
    MemoryTable::from_rows(schema, rows)
}
