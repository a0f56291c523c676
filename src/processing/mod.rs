//! Multi-era normalization: [`RawSource`] → canonical wide rows → tidy rows.
//!
//! One year's chain is a pure function of its input:
//!
//! 1. the era processor ([`eras`]) turns the source's tables into sparse entity rows, using
//!    the column resolver ([`resolve`]), numeric coercer ([`coerce`]) and, for long layouts,
//!    the entity reconstructor ([`reconstruct`])
//! 2. the standardizer ([`standardize`]) completes every row to the canonical schema
//! 3. the aggregate synthesizer ([`aggregate`]) prepends one State row summed from districts
//! 4. optionally, [`tidy()`] pivots the wide rows to one row per (entity, grade, subgroup)
//!
//! ## Example
//!
//! ```rust
//! use ky_enrollment::canonical::{CountField, GradeLevel, Subgroup};
//! use ky_enrollment::processing::{process, tidy};
//! use ky_enrollment::types::{EntityType, RawSource, RawTable, TableRole};
//!
//! let table = RawTable::from_str_rows(
//!     &["DISTRICT NUMBER", "DISTRICT NAME", "SCHOOL CODE", "SCHOOL NAME", "DEMOGRAPHIC", "TOTAL STUDENT COUNT"],
//!     &[
//!         &["001", "Adair County", "", "---District Total---", "All Students", "3,068"],
//!         &["001", "Adair County", "", "---District Total---", "White (non-Hispanic)", "2,500"],
//!     ],
//! );
//! let source = RawSource::new("current-long").with_table(TableRole::Combined, table);
//!
//! let wide = process(&source, 2024)?;
//! assert_eq!(wide.len(), 2);
//! assert_eq!(wide[0].entity_type, EntityType::State);
//! assert_eq!(wide[0].count(CountField::RowTotal), Some(3068));
//! assert_eq!(wide[1].count(CountField::Black), None);
//!
//! let rows = tidy(&wide);
//! let white = rows
//!     .iter()
//!     .find(|r| r.is_district && r.grade_level == GradeLevel::Total && r.subgroup == Subgroup::White)
//!     .unwrap();
//! assert_eq!(white.n_students, Some(2500));
//! # Ok::<(), ky_enrollment::EnrollmentError>(())
//! ```

pub mod aggregate;
pub mod coerce;
pub mod eras;
pub mod labels;
pub mod layouts;
pub mod reconstruct;
pub mod resolve;
pub mod standardize;
pub mod tidy;

use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::canonical::{TidyRow, WideRow};
use crate::error::EnrollmentResult;
use crate::observability::{report_failure, PipelineContext, PipelineObserver, PipelineStats, Severity};
use crate::types::RawSource;

pub use aggregate::{add_state_aggregate, check_unique_entities, synthesize_state_row};
pub use coerce::{coerce_count, is_suppressed};
pub use eras::{process_era, EraOutput};
pub use reconstruct::{reconstruct_entities, Reconstruction};
pub use resolve::{resolve_column, ColumnPatterns, FieldNotFound};
pub use standardize::{standardize, PartialRow};
pub use tidy::{aggregation_flags, tidy};

/// Options controlling [`process_with_options`].
#[derive(Clone)]
pub struct ProcessOptions {
    /// Optional observer for logging/alerts.
    pub observer: Option<Arc<dyn PipelineObserver>>,
    /// Severity threshold at which `on_alert` is invoked.
    pub alert_at_or_above: Severity,
}

impl fmt::Debug for ProcessOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcessOptions")
            .field("observer_set", &self.observer.is_some())
            .field("alert_at_or_above", &self.alert_at_or_above)
            .finish()
    }
}

impl Default for ProcessOptions {
    fn default() -> Self {
        Self {
            observer: None,
            alert_at_or_above: Severity::Critical,
        }
    }
}

/// Normalize one year's raw source into canonical wide rows, State row first.
///
/// Fails with [`crate::EnrollmentError::UnrecognizedEra`] for an unknown era tag,
/// [`crate::EnrollmentError::NoUsableData`] when no table yields a usable row and
/// [`crate::EnrollmentError::DuplicateEntity`] when an entity key repeats.
pub fn process(source: &RawSource, end_year: i32) -> EnrollmentResult<Vec<WideRow>> {
    process_with_options(source, end_year, &ProcessOptions::default())
}

/// [`process`] with an observer.
///
/// When an observer is configured, this function reports:
///
/// - `on_field_not_found` once per unresolved canonical column
/// - `on_success` on success, with row count stats
/// - `on_failure` on failure, with a computed severity
/// - `on_alert` on failure when the computed severity is >= `options.alert_at_or_above`
pub fn process_with_options(
    source: &RawSource,
    end_year: i32,
    options: &ProcessOptions,
) -> EnrollmentResult<Vec<WideRow>> {
    let result = run(source, end_year);

    if let Some(obs) = options.observer.as_deref() {
        let ctx = PipelineContext::Process {
            era: source.era.trim().to_owned(),
            end_year,
        };
        match &result {
            Ok((rows, not_found)) => {
                for missing in not_found {
                    obs.on_field_not_found(&ctx, missing);
                }
                obs.on_success(
                    &ctx,
                    PipelineStats {
                        rows: rows.len(),
                        fields_not_found: not_found.len(),
                    },
                );
            }
            Err(e) => report_failure(obs, &ctx, options.alert_at_or_above, e),
        }
    }

    result.map(|(rows, _)| rows)
}

/// [`process`] followed by [`tidy()`].
pub fn process_tidy(source: &RawSource, end_year: i32) -> EnrollmentResult<Vec<TidyRow>> {
    Ok(tidy(&process(source, end_year)?))
}

fn run(source: &RawSource, end_year: i32) -> EnrollmentResult<(Vec<WideRow>, Vec<FieldNotFound>)> {
    let era = source.era()?;
    let EraOutput { rows, not_found } = process_era(era, source, end_year)?;
    debug!(
        %era,
        end_year,
        entities = ?reconstruct::entity_type_counts(&rows),
        fields_not_found = not_found.len(),
        "era processed"
    );

    let rows = standardize(rows, end_year);
    check_unique_entities(&rows)?;
    Ok((add_state_aggregate(rows, end_year), not_found))
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::canonical::CountField;
    use crate::error::EnrollmentError;
    use crate::types::{EntityType, RawTable, TableRole};

    #[derive(Default)]
    struct Recorder {
        events: Mutex<Vec<String>>,
    }

    impl PipelineObserver for Recorder {
        fn on_success(&self, _ctx: &PipelineContext, stats: PipelineStats) {
            self.events.lock().unwrap().push(format!("ok rows={}", stats.rows));
        }
        fn on_failure(&self, _ctx: &PipelineContext, severity: Severity, _e: &EnrollmentError) {
            self.events.lock().unwrap().push(format!("fail {severity:?}"));
        }
        fn on_alert(&self, _ctx: &PipelineContext, severity: Severity, _e: &EnrollmentError) {
            self.events.lock().unwrap().push(format!("alert {severity:?}"));
        }
        fn on_field_not_found(&self, _ctx: &PipelineContext, missing: &FieldNotFound) {
            self.events.lock().unwrap().push(format!("missing {}", missing.field));
        }
    }

    fn mid_long_source() -> RawSource {
        RawSource::new("mid-long").with_table(
            TableRole::Primary,
            RawTable::from_str_rows(
                &["DIST_NUMBER", "DIST_NAME", "SCH_CD", "SCH_NAME", "DISAGG_LABEL", "TOTAL_ENROLLMENT"],
                &[
                    &["1", "Adair County", "", "District Total", "TST", "300"],
                    &["1", "Adair County", "10", "Adair County High", "TST", "200"],
                    &["2", "Allen County", "", "District Total", "TST", "*"],
                ],
            ),
        )
    }

    #[test]
    fn state_row_sums_districts_only() {
        let rows = process(&mid_long_source(), 2015).unwrap();
        assert_eq!(rows.len(), 4);
        assert_eq!(rows[0].entity_type, EntityType::State);
        assert_eq!(rows[0].count(CountField::RowTotal), Some(300));
        assert_eq!(rows[2].school_id.as_deref(), Some("001010"));
        assert_eq!(rows[3].count(CountField::RowTotal), None);
    }

    #[test]
    fn unknown_era_is_rejected_and_reported() {
        let rec = Arc::new(Recorder::default());
        let opts = ProcessOptions {
            observer: Some(rec.clone()),
            alert_at_or_above: Severity::Error,
        };
        let err = process_with_options(&RawSource::new("pdf-scrape"), 2024, &opts).unwrap_err();
        assert!(matches!(err, EnrollmentError::UnrecognizedEra { ref tag } if tag == "pdf-scrape"));
        let events = rec.events.lock().unwrap().clone();
        assert_eq!(events, vec!["fail Error".to_string(), "alert Error".to_string()]);
    }

    #[test]
    fn observer_sees_missing_columns_and_success() {
        let rec = Arc::new(Recorder::default());
        let opts = ProcessOptions {
            observer: Some(rec.clone()),
            ..Default::default()
        };
        process_with_options(&mid_long_source(), 2015, &opts).unwrap();
        let events = rec.events.lock().unwrap().clone();
        assert!(events.contains(&"missing grade_k".to_string()));
        assert_eq!(events.last().map(String::as_str), Some("ok rows=4"));
    }

    #[test]
    fn process_tidy_emits_27_rows_per_entity() {
        let rows = process_tidy(&mid_long_source(), 2015).unwrap();
        assert_eq!(rows.len(), 4 * 27);
    }
}
