//! Export of canonical rows: typed datasets, CSV and JSON.

use std::io::Write;

use crate::canonical::{tidy_schema, wide_schema, TidyRow, WideRow};
use crate::error::EnrollmentResult;
use crate::types::{DataSet, Value};

/// Wide rows as a typed [`DataSet`] (33 columns, identity first).
pub fn wide_dataset(rows: &[WideRow]) -> DataSet {
    DataSet::new(wide_schema(), rows.iter().map(WideRow::to_values).collect())
}

/// Tidy rows as a typed [`DataSet`].
pub fn tidy_dataset(rows: &[TidyRow]) -> DataSet {
    DataSet::new(tidy_schema(), rows.iter().map(TidyRow::to_values).collect())
}

/// Write a dataset as CSV with a header row. Missing values are written as empty cells.
pub fn write_csv<W: Write>(ds: &DataSet, writer: W) -> EnrollmentResult<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(ds.schema.field_names())?;
    for row in &ds.rows {
        wtr.write_record(row.iter().map(cell_text))?;
    }
    wtr.flush()?;
    Ok(())
}

/// Write tidy rows as a JSON array of records.
pub fn write_json<W: Write>(rows: &[TidyRow], writer: W) -> EnrollmentResult<()> {
    serde_json::to_writer(writer, rows)?;
    Ok(())
}

fn cell_text(v: &Value) -> String {
    match v {
        Value::Null => String::new(),
        Value::Int64(n) => n.to_string(),
        Value::Float64(x) => x.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Utf8(s) => s.clone(),
    }
}
