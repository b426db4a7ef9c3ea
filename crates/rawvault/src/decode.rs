//! Parquet decoding into schema-free rows.
//!
//! Rows keep every column the file declares, in declaration order, mapped
//! onto the small tagged [`Value`] union. Types outside the common set fall
//! back to their display form so unknown columns still carry through.

use crate::error::Result;
use arrow::array::{Array, ArrayRef, RecordBatch};
use arrow::datatypes::{DataType, TimeUnit};
use chrono::{DateTime, Utc};
use rawvault_db::{Row, Value};
use std::fs::File;
use std::path::Path;

const BATCH_SIZE: usize = 8192;

/// Read an entire Parquet file into rows.
pub fn read_parquet_rows(path: &Path) -> Result<Vec<Row>> {
    let file = File::open(path)?;
    let builder = parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder::try_new(file)?;
    let reader = builder.with_batch_size(BATCH_SIZE).build()?;

    let mut rows = Vec::new();
    for batch in reader {
        let batch = batch?;
        rows.extend(rows_from_batch(&batch));
    }
    Ok(rows)
}

/// Convert one record batch into rows, column order preserved.
pub fn rows_from_batch(batch: &RecordBatch) -> Vec<Row> {
    let schema = batch.schema();
    let mut rows = Vec::with_capacity(batch.num_rows());

    for row_idx in 0..batch.num_rows() {
        let mut row = Row::with_capacity(batch.num_columns());
        for (col_idx, field) in schema.fields().iter().enumerate() {
            row.push(field.name().clone(), value_at(batch.column(col_idx), row_idx));
        }
        rows.push(row);
    }
    rows
}

fn value_at(array: &ArrayRef, row: usize) -> Value {
    use arrow::array::*;

    if array.is_null(row) {
        return Value::Null;
    }

    match array.data_type() {
        DataType::Boolean => {
            let arr = array.as_any().downcast_ref::<BooleanArray>().unwrap();
            Value::Bool(arr.value(row))
        }
        DataType::Int8 => {
            let arr = array.as_any().downcast_ref::<Int8Array>().unwrap();
            Value::Int(arr.value(row) as i64)
        }
        DataType::Int16 => {
            let arr = array.as_any().downcast_ref::<Int16Array>().unwrap();
            Value::Int(arr.value(row) as i64)
        }
        DataType::Int32 => {
            let arr = array.as_any().downcast_ref::<Int32Array>().unwrap();
            Value::Int(arr.value(row) as i64)
        }
        DataType::Int64 => {
            let arr = array.as_any().downcast_ref::<Int64Array>().unwrap();
            Value::Int(arr.value(row))
        }
        DataType::UInt8 => {
            let arr = array.as_any().downcast_ref::<UInt8Array>().unwrap();
            Value::Int(arr.value(row) as i64)
        }
        DataType::UInt16 => {
            let arr = array.as_any().downcast_ref::<UInt16Array>().unwrap();
            Value::Int(arr.value(row) as i64)
        }
        DataType::UInt32 => {
            let arr = array.as_any().downcast_ref::<UInt32Array>().unwrap();
            Value::Int(arr.value(row) as i64)
        }
        DataType::UInt64 => {
            let arr = array.as_any().downcast_ref::<UInt64Array>().unwrap();
            Value::Int(arr.value(row) as i64)
        }
        DataType::Float32 => {
            let arr = array.as_any().downcast_ref::<Float32Array>().unwrap();
            Value::Float(arr.value(row) as f64)
        }
        DataType::Float64 => {
            let arr = array.as_any().downcast_ref::<Float64Array>().unwrap();
            Value::Float(arr.value(row))
        }
        DataType::Utf8 => {
            let arr = array.as_any().downcast_ref::<StringArray>().unwrap();
            Value::Str(arr.value(row).to_string())
        }
        DataType::LargeUtf8 => {
            let arr = array.as_any().downcast_ref::<LargeStringArray>().unwrap();
            Value::Str(arr.value(row).to_string())
        }
        DataType::Timestamp(unit, _tz) => timestamp_value(array, row, unit),
        DataType::Date32 => {
            let arr = array.as_any().downcast_ref::<Date32Array>().unwrap();
            let secs = i64::from(arr.value(row)) * 86_400;
            DateTime::<Utc>::from_timestamp(secs, 0)
                .map(Value::Timestamp)
                .unwrap_or(Value::Null)
        }
        DataType::Date64 => {
            let arr = array.as_any().downcast_ref::<Date64Array>().unwrap();
            DateTime::<Utc>::from_timestamp_millis(arr.value(row))
                .map(Value::Timestamp)
                .unwrap_or(Value::Null)
        }
        // Anything exotic keeps its display form so it still carries through.
        _ => arrow::util::display::array_value_to_string(array.as_ref(), row)
            .map(Value::Str)
            .unwrap_or(Value::Null),
    }
}

fn timestamp_value(array: &ArrayRef, row: usize, unit: &TimeUnit) -> Value {
    use arrow::array::*;

    let parsed = match unit {
        TimeUnit::Second => {
            let arr = array.as_any().downcast_ref::<TimestampSecondArray>().unwrap();
            DateTime::<Utc>::from_timestamp(arr.value(row), 0)
        }
        TimeUnit::Millisecond => {
            let arr = array
                .as_any()
                .downcast_ref::<TimestampMillisecondArray>()
                .unwrap();
            DateTime::<Utc>::from_timestamp_millis(arr.value(row))
        }
        TimeUnit::Microsecond => {
            let arr = array
                .as_any()
                .downcast_ref::<TimestampMicrosecondArray>()
                .unwrap();
            DateTime::<Utc>::from_timestamp_micros(arr.value(row))
        }
        TimeUnit::Nanosecond => {
            let arr = array
                .as_any()
                .downcast_ref::<TimestampNanosecondArray>()
                .unwrap();
            Some(DateTime::<Utc>::from_timestamp_nanos(arr.value(row)))
        }
    };

    parsed.map(Value::Timestamp).unwrap_or(Value::Null)
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{Float64Array, Int64Array, StringArray, TimestampMicrosecondArray};
    use arrow::datatypes::{Field, Schema};
    use std::sync::Arc;

    fn readings_batch() -> RecordBatch {
        let schema = Schema::new(vec![
            Field::new("well_id", DataType::Utf8, true),
            Field::new("reading", DataType::Float64, true),
            Field::new("sequence", DataType::Int64, false),
        ]);

        RecordBatch::try_new(
            Arc::new(schema),
            vec![
                Arc::new(StringArray::from(vec![Some("W1"), None, Some("")])),
                Arc::new(Float64Array::from(vec![Some(1.5), Some(2.5), None])),
                Arc::new(Int64Array::from(vec![1, 2, 3])),
            ],
        )
        .unwrap()
    }

    #[test]
    fn batch_decodes_in_column_order() {
        let rows = rows_from_batch(&readings_batch());
        assert_eq!(rows.len(), 3);

        let names: Vec<&str> = rows[0].column_names().collect();
        assert_eq!(names, vec!["well_id", "reading", "sequence"]);

        assert_eq!(rows[0].get("well_id"), Some(&Value::Str("W1".into())));
        assert_eq!(rows[0].get("reading"), Some(&Value::Float(1.5)));
        assert_eq!(rows[1].get("well_id"), Some(&Value::Null));
        assert_eq!(rows[2].get("well_id"), Some(&Value::Str("".into())));
        assert_eq!(rows[2].get("reading"), Some(&Value::Null));
        assert_eq!(rows[2].get("sequence"), Some(&Value::Int(3)));
    }

    #[test]
    fn timestamps_decode_to_utc() {
        let schema = Schema::new(vec![Field::new(
            "measured_at",
            DataType::Timestamp(TimeUnit::Microsecond, None),
            true,
        )]);
        let batch = RecordBatch::try_new(
            Arc::new(schema),
            vec![Arc::new(TimestampMicrosecondArray::from(vec![
                Some(1_700_000_000_000_000),
                None,
            ]))],
        )
        .unwrap();

        let rows = rows_from_batch(&batch);
        match rows[0].get("measured_at") {
            Some(Value::Timestamp(ts)) => assert_eq!(ts.timestamp(), 1_700_000_000),
            other => panic!("expected timestamp, got {other:?}"),
        }
        assert_eq!(rows[1].get("measured_at"), Some(&Value::Null));
    }
}
