use thiserror::Error;

use crate::types::EntityType;

/// Convenience result type for loading, processing and export operations.
pub type EnrollmentResult<T> = Result<T, EnrollmentError>;

/// Error type returned across the crate.
///
/// Only three variants are raised by the normalization core itself
/// ([`EnrollmentError::UnrecognizedEra`], [`EnrollmentError::NoUsableData`] and
/// [`EnrollmentError::DuplicateEntity`]). Everything that goes wrong at field level
/// (unparseable counts, unresolved columns) degrades to missing values instead.
#[derive(Debug, Error)]
pub enum EnrollmentError {
    /// The era tag on a raw source has no processing path.
    #[error("unrecognized era '{tag}' (expected legacy-wide, mid-long or current-long)")]
    UnrecognizedEra { tag: String },

    /// Every table supplied for the year was absent or yielded zero usable rows.
    #[error("no usable data for end_year {end_year} in {era} source: {reason}")]
    NoUsableData {
        era: String,
        end_year: i32,
        reason: String,
    },

    /// More than one canonical row (or subgroup row) was produced for the same entity.
    #[error(
        "duplicate entity for end_year {end_year}: type={entity_type} district_id={district_id:?} school_id={school_id:?} ({detail})"
    )]
    DuplicateEntity {
        end_year: i32,
        entity_type: EntityType,
        district_id: Option<String>,
        school_id: Option<String>,
        detail: String,
    },

    /// A requested year falls outside the published range.
    #[error("end_year {end_year} is outside the available range {min_year}..={max_year}")]
    YearOutOfRange {
        end_year: i32,
        min_year: i32,
        max_year: i32,
    },

    /// Underlying I/O error (e.g. file not found, permission denied).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV read/write error.
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[cfg(feature = "excel")]
    /// Spreadsheet loading error (feature-gated behind `excel`).
    #[error("excel error: {0}")]
    Excel(#[from] calamine::Error),

    /// A loaded table does not have the shape the loader needs (no header row, unknown format).
    #[error("schema mismatch: {message}")]
    SchemaMismatch { message: String },

    /// The execution engine could not start its worker pool.
    #[error("thread pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    /// Failed to build a polars frame from canonical rows.
    #[error("frame error: {0}")]
    Frame(#[from] polars::error::PolarsError),

    /// Failed to serialize rows as JSON.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}
