//! CSV loading into a string-faithful [`RawTable`].

use std::path::Path;

use crate::error::{EnrollmentError, EnrollmentResult};
use crate::types::RawTable;

/// Load a CSV file into a [`RawTable`].
///
/// Rules:
///
/// - The first record is the header row.
/// - Rows may have differing lengths; [`RawTable::cell`] treats short rows as blank.
/// - Cells are kept exactly as written (no trimming, no type inference).
pub fn read_raw_csv_from_path(path: impl AsRef<Path>) -> EnrollmentResult<RawTable> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)?;
    read_raw_csv_from_reader(&mut rdr)
}

/// Load CSV data from an existing CSV reader.
pub fn read_raw_csv_from_reader<R: std::io::Read>(rdr: &mut csv::Reader<R>) -> EnrollmentResult<RawTable> {
    let headers: Vec<String> = rdr.headers()?.iter().map(str::to_owned).collect();
    if headers.iter().all(|h| h.trim().is_empty()) {
        return Err(EnrollmentError::SchemaMismatch {
            message: "csv has no header row".to_string(),
        });
    }

    let mut rows: Vec<Vec<String>> = Vec::new();
    for result in rdr.records() {
        let record = result?;
        if record.iter().all(|c| c.trim().is_empty()) {
            continue;
        }
        rows.push(record.iter().map(str::to_owned).collect());
    }

    Ok(RawTable::new(headers, rows))
}
