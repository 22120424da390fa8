use arrow::array::{
    Array, ArrayRef, BooleanArray, Date32Array, Date64Array, Float32Array, Float64Array, Int32Array,
    Int64Array, LargeStringArray, StringArray, TimestampMicrosecondArray, TimestampMillisecondArray,
    TimestampNanosecondArray, TimestampSecondArray,
};
use arrow::datatypes::{DataType as ArrowType, Schema, TimeUnit};
use arrow::record_batch::RecordBatch;
use sg_core::{CellValue, ColumnDef, DataType, GridError, TableSchema};

use crate::memory::MemoryTable;
use crate::DataError;

/// Derive a grid schema from an Arrow schema
pub fn schema_from_arrow(schema: &Schema) -> Result<TableSchema, DataError> {
    let columns = schema
        .fields()
        .iter()
        .map(|field| {
            let dtype = match field.data_type() {
                ArrowType::Int32 | ArrowType::Int64 => DataType::Int,
                ArrowType::Float32 | ArrowType::Float64 => DataType::Float,
                ArrowType::Boolean => DataType::Bool,
                ArrowType::Date32 | ArrowType::Date64 => DataType::Date,
                ArrowType::Timestamp(_, _) => DataType::DateTime,
                ArrowType::Utf8 | ArrowType::LargeUtf8 => DataType::Text,
                _ => DataType::Object,
            };
            ColumnDef::new(field.name().clone(), dtype)
        })
        .collect();
    Ok(TableSchema::new(columns)?)
}

/// Build a typed table from an Arrow record batch
///
/// Every schema column must exist in the batch; extra batch columns are ignored.
pub fn from_record_batch(batch: &RecordBatch, schema: &TableSchema) -> Result<MemoryTable, DataError> {
    let arrays: Vec<&ArrayRef> = schema
        .columns()
        .iter()
        .map(|column| {
            batch
                .column_by_name(&column.name)
                .ok_or_else(|| GridError::Schema(format!("record batch has no column named '{}'", column.name)))
        })
        .collect::<Result<_, _>>()?;

    let mut rows: Vec<Vec<CellValue>> = (0..batch.num_rows())
        .map(|_| Vec::with_capacity(arrays.len()))
        .collect();

    for (array, column) in arrays.iter().zip(schema.columns()) {
        let values = array_values(array.as_ref(), column.dtype)?;
        for (row, value) in rows.iter_mut().zip(values) {
            row.push(value);
        }
    }

    MemoryTable::from_rows(schema.clone(), rows)
}

fn array_values(array: &dyn Array, dtype: DataType) -> Result<Vec<CellValue>, DataError> {
    macro_rules! collect {
        ($ty:ty, $convert:expr) => {{
            let typed = array
                .as_any()
                .downcast_ref::<$ty>()
                .ok_or_else(|| DataError::Other(format!("unexpected array type {}", array.data_type())))?;
            (0..typed.len())
                .map(|i| {
                    if typed.is_null(i) {
                        CellValue::Null
                    } else {
                        $convert(typed, i)
                    }
                })
                .collect::<Vec<_>>()
        }};
    }

    let values = match array.data_type() {
        ArrowType::Int64 => collect!(Int64Array, |a: &Int64Array, i| CellValue::Int(a.value(i))),
        ArrowType::Int32 => collect!(Int32Array, |a: &Int32Array, i| CellValue::Int(i64::from(a.value(i)))),
        ArrowType::Float64 => collect!(Float64Array, |a: &Float64Array, i| CellValue::float(a.value(i))),
        ArrowType::Float32 => {
            collect!(Float32Array, |a: &Float32Array, i| CellValue::float(f64::from(a.value(i))))
        }
        ArrowType::Boolean => collect!(BooleanArray, |a: &BooleanArray, i| CellValue::Bool(a.value(i))),
        ArrowType::Utf8 => collect!(StringArray, |a: &StringArray, i| CellValue::text(a.value(i))),
        ArrowType::LargeUtf8 => {
            collect!(LargeStringArray, |a: &LargeStringArray, i| CellValue::text(a.value(i)))
        }
        ArrowType::Date32 => collect!(Date32Array, |a: &Date32Array, i| a
            .value_as_date(i)
            .map(CellValue::Date)
            .unwrap_or(CellValue::Null)),
        ArrowType::Date64 => collect!(Date64Array, |a: &Date64Array, i| a
            .value_as_date(i)
            .map(CellValue::Date)
            .unwrap_or(CellValue::Null)),
        ArrowType::Timestamp(TimeUnit::Second, _) => {
            collect!(TimestampSecondArray, |a: &TimestampSecondArray, i| moment(a.value_as_datetime(i)))
        }
        ArrowType::Timestamp(TimeUnit::Millisecond, _) => {
            collect!(TimestampMillisecondArray, |a: &TimestampMillisecondArray, i| moment(a.value_as_datetime(i)))
        }
        ArrowType::Timestamp(TimeUnit::Microsecond, _) => {
            collect!(TimestampMicrosecondArray, |a: &TimestampMicrosecondArray, i| moment(a.value_as_datetime(i)))
        }
        ArrowType::Timestamp(TimeUnit::Nanosecond, _) => {
            collect!(TimestampNanosecondArray, |a: &TimestampNanosecondArray, i| moment(a.value_as_datetime(i)))
        }
        other => {
            return Err(DataError::Other(format!("unsupported Arrow type {} for a {} column", other, dtype)));
        }
    };

    // Date columns store plain dates even when the batch carries timestamps
    if dtype == DataType::Date {
        return Ok(values
            .into_iter()
            .map(|v| match v {
                CellValue::DateTime(dt) => CellValue::Date(dt.date()),
                other => other,
            })
            .collect());
    }
    Ok(values)
}

fn moment(value: Option<chrono::NaiveDateTime>) -> CellValue {
    value.map(CellValue::DateTime).unwrap_or(CellValue::Null)
}
