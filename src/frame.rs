//! Conversion of typed [`DataSet`]s into polars [`DataFrame`]s.

use polars::prelude::*;

use crate::error::{EnrollmentError, EnrollmentResult};
use crate::types::{DataSet, DataType, Value};

/// Build a [`DataFrame`] with one column per schema field, nulls preserved.
///
/// ```rust
/// use ky_enrollment::export::wide_dataset;
/// use ky_enrollment::frame::to_dataframe;
///
/// let df = to_dataframe(&wide_dataset(&[]))?;
/// assert_eq!(df.width(), 33);
/// assert_eq!(df.height(), 0);
/// # Ok::<(), ky_enrollment::EnrollmentError>(())
/// ```
pub fn to_dataframe(ds: &DataSet) -> EnrollmentResult<DataFrame> {
    let mut columns: Vec<Column> = Vec::with_capacity(ds.schema.fields.len());
    for (idx, field) in ds.schema.fields.iter().enumerate() {
        let cells = ds.rows.iter().map(|row| row.get(idx).unwrap_or(&Value::Null));
        let name: PlSmallStr = field.name.as_str().into();
        let column = match field.data_type {
            DataType::Int64 => {
                let values = cells
                    .map(|v| match v {
                        Value::Null => Ok(None),
                        Value::Int64(n) => Ok(Some(*n)),
                        other => Err(mismatch(&field.name, other)),
                    })
                    .collect::<EnrollmentResult<Vec<Option<i64>>>>()?;
                Column::new(name, values)
            }
            DataType::Float64 => {
                let values = cells
                    .map(|v| match v {
                        Value::Null => Ok(None),
                        Value::Float64(x) => Ok(Some(*x)),
                        Value::Int64(n) => Ok(Some(*n as f64)),
                        other => Err(mismatch(&field.name, other)),
                    })
                    .collect::<EnrollmentResult<Vec<Option<f64>>>>()?;
                Column::new(name, values)
            }
            DataType::Bool => {
                let values = cells
                    .map(|v| match v {
                        Value::Null => Ok(None),
                        Value::Bool(b) => Ok(Some(*b)),
                        other => Err(mismatch(&field.name, other)),
                    })
                    .collect::<EnrollmentResult<Vec<Option<bool>>>>()?;
                Column::new(name, values)
            }
            DataType::Utf8 => {
                let values = cells
                    .map(|v| match v {
                        Value::Null => Ok(None),
                        Value::Utf8(s) => Ok(Some(s.clone())),
                        other => Err(mismatch(&field.name, other)),
                    })
                    .collect::<EnrollmentResult<Vec<Option<String>>>>()?;
                Column::new(name, values)
            }
        };
        columns.push(column);
    }
    Ok(DataFrame::new(columns)?)
}

fn mismatch(column: &str, value: &Value) -> EnrollmentError {
    EnrollmentError::SchemaMismatch {
        message: format!("column '{column}' holds a value of the wrong type: {value:?}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Field, Schema};

    #[test]
    fn nulls_survive_conversion() {
        let ds = DataSet::new(
            Schema::new(vec![
                Field::new("district_id", DataType::Utf8),
                Field::new("row_total", DataType::Int64),
            ]),
            vec![
                vec![Value::Utf8("001".to_string()), Value::Int64(3068)],
                vec![Value::Null, Value::Null],
            ],
        );
        let df = to_dataframe(&ds).unwrap();
        assert_eq!(df.shape(), (2, 2));
        assert_eq!(df.column("row_total").unwrap().null_count(), 1);
    }

    #[test]
    fn wrong_cell_type_is_a_schema_mismatch() {
        let ds = DataSet::new(
            Schema::new(vec![Field::new("row_total", DataType::Int64)]),
            vec![vec![Value::Utf8("*".to_string())]],
        );
        assert!(matches!(to_dataframe(&ds), Err(EnrollmentError::SchemaMismatch { .. })));
    }
}
