//! State aggregate synthesis and the per-year integrity check.

use std::collections::HashSet;

use tracing::warn;

use crate::canonical::{CountField, Counts, WideRow};
use crate::error::{EnrollmentError, EnrollmentResult};
use crate::types::EntityType;

/// Sum every count field over `type = District` rows.
///
/// - School rows never contribute.
/// - Missing district values count as zero here and only here.
/// - With no District rows every State count is `Some(0)`.
/// - A sum past the `i64` range saturates and is logged.
pub fn synthesize_state_row(rows: &[WideRow], end_year: i32) -> WideRow {
    let mut counts = Counts::zeroed();
    for row in rows.iter().filter(|r| r.entity_type == EntityType::District) {
        for field in CountField::ALL {
            let acc = counts.get(field).unwrap_or(0);
            let n = row.count(field).unwrap_or(0);
            let sum = acc.checked_add(n).unwrap_or_else(|| {
                warn!(
                    end_year,
                    field = field.column_name(),
                    district_id = row.district_id.as_deref(),
                    "state aggregate overflowed; saturating"
                );
                acc.saturating_add(n)
            });
            counts.set(field, Some(sum));
        }
    }

    WideRow {
        end_year,
        entity_type: EntityType::State,
        district_id: None,
        school_id: None,
        district_name: None,
        school_name: None,
        counts,
    }
}

/// Prepend the synthesized State row to `rows`.
pub fn add_state_aggregate(mut rows: Vec<WideRow>, end_year: i32) -> Vec<WideRow> {
    let state = synthesize_state_row(&rows, end_year);
    rows.insert(0, state);
    rows
}

/// At most one row per `(type, district_id, school_id)`.
pub fn check_unique_entities(rows: &[WideRow]) -> EnrollmentResult<()> {
    let mut seen: HashSet<(EntityType, Option<&str>, Option<&str>)> = HashSet::with_capacity(rows.len());
    for row in rows {
        let key = (row.entity_type, row.district_id.as_deref(), row.school_id.as_deref());
        if !seen.insert(key) {
            return Err(EnrollmentError::DuplicateEntity {
                end_year: row.end_year,
                entity_type: row.entity_type,
                district_id: row.district_id.clone(),
                school_id: row.school_id.clone(),
                detail: "entity key appears on more than one row".to_string(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(entity_type: EntityType, district: &str, school: Option<&str>) -> WideRow {
        WideRow {
            end_year: 2024,
            entity_type,
            district_id: Some(district.to_string()),
            school_id: school.map(str::to_string),
            district_name: None,
            school_name: None,
            counts: Counts::missing(),
        }
    }

    #[test]
    fn sums_districts_only_with_missing_as_zero() {
        let mut a = row(EntityType::District, "001", None);
        a.counts.set(CountField::RowTotal, Some(100));
        a.counts.set(CountField::White, Some(60));
        let mut b = row(EntityType::District, "002", None);
        b.counts.set(CountField::RowTotal, Some(50));
        let mut s = row(EntityType::School, "001", Some("001010"));
        s.counts.set(CountField::RowTotal, Some(1_000));

        let state = synthesize_state_row(&[a, b, s], 2024);
        assert_eq!(state.entity_type, EntityType::State);
        assert_eq!(state.district_id, None);
        assert_eq!(state.count(CountField::RowTotal), Some(150));
        assert_eq!(state.count(CountField::White), Some(60));
        assert_eq!(state.count(CountField::Grade12), Some(0));
    }

    #[test]
    fn oversized_sums_saturate_instead_of_panicking() {
        let mut a = row(EntityType::District, "001", None);
        a.counts.set(CountField::RowTotal, Some(9_000_000_000_000_000_000));
        a.counts.set(CountField::Black, Some(i64::MIN + 1));
        let mut b = row(EntityType::District, "002", None);
        b.counts.set(CountField::RowTotal, Some(9_000_000_000_000_000_000));
        b.counts.set(CountField::Black, Some(-5));
        b.counts.set(CountField::White, Some(7));

        let state = synthesize_state_row(&[a, b], 2005);
        assert_eq!(state.count(CountField::RowTotal), Some(i64::MAX));
        assert_eq!(state.count(CountField::Black), Some(i64::MIN));
        assert_eq!(state.count(CountField::White), Some(7));
    }

    #[test]
    fn no_districts_yields_zeros_not_missing() {
        let state = synthesize_state_row(&[row(EntityType::School, "001", Some("001010"))], 2005);
        assert!(state.counts.iter().all(|(_, v)| v == Some(0)));
        assert_eq!(state.end_year, 2005);
    }

    #[test]
    fn state_row_is_prepended() {
        let rows = add_state_aggregate(vec![row(EntityType::District, "001", None)], 2024);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].entity_type, EntityType::State);
    }

    #[test]
    fn duplicate_entity_keys_are_rejected() {
        let rows = vec![
            row(EntityType::District, "001", None),
            row(EntityType::School, "001", Some("001010")),
            row(EntityType::District, "001", None),
        ];
        let err = check_unique_entities(&rows).unwrap_err();
        assert!(matches!(
            err,
            EnrollmentError::DuplicateEntity { entity_type: EntityType::District, .. }
        ));
        assert!(check_unique_entities(&rows[..2]).is_ok());
    }
}
