#![cfg(feature = "excel")]

//! Spreadsheet loading (legacy per-district worksheets).

use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader};

use crate::error::{EnrollmentError, EnrollmentResult};
use crate::types::RawTable;

/// Load one worksheet of a workbook (`.xlsx`, `.xls`, `.ods`, etc.) into a [`RawTable`].
///
/// Behavior:
/// - Picks `sheet_name` if provided; otherwise uses the first sheet in the workbook
/// - Detects the first non-empty row as the header row
/// - Renders every cell as text; integral numbers lose their `.0`
pub fn read_raw_excel_from_path(path: impl AsRef<Path>, sheet_name: Option<&str>) -> EnrollmentResult<RawTable> {
    let mut workbook = open_workbook_auto(path)?;

    let sheet = match sheet_name {
        Some(name) => name.to_string(),
        None => workbook
            .sheet_names()
            .first()
            .cloned()
            .ok_or_else(|| EnrollmentError::SchemaMismatch {
                message: "workbook has no sheets".to_string(),
            })?,
    };

    let range = workbook.worksheet_range(&sheet)?;
    read_sheet_range(&range).map_err(|e| wrap_schema_err_with_sheet(&sheet, e))
}

fn read_sheet_range(range: &calamine::Range<Data>) -> EnrollmentResult<RawTable> {
    let mut rows = range
        .rows()
        .skip_while(|row| row.iter().all(|c| matches!(c, Data::Empty)));

    let headers: Vec<String> = rows
        .next()
        .ok_or_else(|| EnrollmentError::SchemaMismatch {
            message: "sheet has no non-empty rows (no header row found)".to_string(),
        })?
        .iter()
        .map(cell_to_string)
        .collect();

    let body = rows
        .filter(|row| row.iter().any(|c| !matches!(c, Data::Empty)))
        .map(|row| row.iter().map(cell_to_string).collect())
        .collect();

    Ok(RawTable::new(headers, body))
}

fn wrap_schema_err_with_sheet(sheet: &str, err: EnrollmentError) -> EnrollmentError {
    match err {
        EnrollmentError::SchemaMismatch { message } => EnrollmentError::SchemaMismatch {
            message: format!("sheet '{sheet}': {message}"),
        },
        other => other,
    }
}

fn cell_to_string(c: &Data) -> String {
    match c {
        Data::String(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) => {
            if f.fract() == 0.0 && f.is_finite() {
                (*f as i64).to_string()
            } else {
                f.to_string()
            }
        }
        Data::Bool(b) => b.to_string(),
        Data::DateTime(f) => f.to_string(),
        Data::DateTimeIso(s) => s.clone(),
        Data::DurationIso(s) => s.clone(),
        Data::Error(e) => format!("{e:?}"),
        Data::Empty => String::new(),
    }
}
