//! `ky-enrollment` normalizes Kentucky (KDE) school enrollment tables from every publication
//! era into one canonical wide schema, adds a synthesized state total, and pivots the result
//! into a tidy long form.
//!
//! The primary entrypoint is [`process`], which turns one year's [`types::RawSource`] (an era
//! tag plus named string tables) into canonical [`canonical::WideRow`]s. [`tidy()`] pivots
//! those rows into [`canonical::TidyRow`]s.
//!
//! ## Publication eras
//!
//! | era tag        | school years   | shape                                                    |
//! |----------------|----------------|----------------------------------------------------------|
//! | `legacy-wide`  | 1997 – 2011    | one spreadsheet row per district, race columns only      |
//! | `mid-long`     | 2012 – 2019    | one CSV row per (entity, demographic), underscore headers |
//! | `current-long` | 2020 – 2024    | one CSV row per (entity, demographic), spaced headers     |
//!
//! Every era resolves to the same 33-column wide row: `end_year`, `type`, `district_id`,
//! `school_id`, `district_name`, `school_name`, then 27 counts (total, 7 race/ethnicity, 2
//! gender, 3 special populations, 14 grades). Counts a source never published, or published
//! suppressed (`*`, `<10`, `n<10`, ...), are missing, never zero.
//!
//! ## Quick example
//!
//! ```rust
//! use ky_enrollment::canonical::{CountField, GradeLevel, Subgroup};
//! use ky_enrollment::types::{EntityType, RawSource, RawTable, TableRole};
//! use ky_enrollment::{process, tidy};
//!
//! # fn main() -> Result<(), ky_enrollment::EnrollmentError> {
//! let table = RawTable::from_str_rows(
//!     &["DIST_NUMBER", "DIST_NAME", "SCH_CD", "SCH_NAME", "DISAGG_LABEL", "TOTAL_ENROLLMENT", "KINDERGARTEN_CNT"],
//!     &[
//!         &["1", "Adair County", "", "District Total", "TST", "100", "10"],
//!         &["1", "Adair County", "", "District Total", "WHT", "60", ""],
//!         &["1", "Adair County", "", "District Total", "LEP", "*", ""],
//!     ],
//! );
//! let source = RawSource::new("mid-long").with_table(TableRole::Primary, table);
//!
//! let wide = process(&source, 2015)?;
//! assert_eq!(wide[0].entity_type, EntityType::State);
//! assert_eq!(wide[1].district_id.as_deref(), Some("001"));
//! assert_eq!(wide[1].count(CountField::Lep), None);
//!
//! let rows = tidy(&wide);
//! let k = rows
//!     .iter()
//!     .find(|r| r.is_district && r.grade_level == GradeLevel::K && r.subgroup == Subgroup::TotalEnrollment)
//!     .unwrap();
//! assert_eq!((k.n_students, k.pct), (Some(10), Some(0.1)));
//! # Ok(())
//! # }
//! ```
//!
//! ## Loading from disk
//!
//! ```no_run
//! use ky_enrollment::ingestion::{load_raw_source, LoadOptions};
//! use ky_enrollment::types::TableRole;
//!
//! # fn main() -> Result<(), ky_enrollment::EnrollmentError> {
//! let source = load_raw_source(
//!     "current-long",
//!     &[(TableRole::Combined, "kyrc24_ovw_student_enrollment.csv")],
//!     &LoadOptions::default(),
//! )?;
//! let tidy_rows = ky_enrollment::process_tidy(&source, 2024)?;
//! println!("rows={}", tidy_rows.len());
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`types`]: raw input tables, eras, entity types, typed datasets
//! - [`canonical`]: canonical columns, subgroups, grade levels, wide and tidy rows
//! - [`processing`]: coercion, column resolution, era processors, aggregation, tidy pivot
//! - [`ingestion`]: CSV (and, with feature `excel`, spreadsheet) loading into raw tables
//! - [`execution`]: parallel multi-year runs with metrics
//! - [`export`] / [`frame`]: datasets, CSV, JSON and polars frames
//! - [`observability`]: observer hooks shared by loading and processing
//! - [`error`]: the crate-wide error type

pub mod canonical;
pub mod error;
pub mod execution;
pub mod export;
pub mod frame;
pub mod ingestion;
pub mod observability;
pub mod processing;
pub mod types;

pub use error::{EnrollmentError, EnrollmentResult};
pub use processing::{process, process_tidy, process_with_options, tidy, ProcessOptions};
pub use types::available_years;
