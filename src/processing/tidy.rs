//! Tidy pivot: wide rows → one row per (entity, grade level, subgroup).

use crate::canonical::{CountField, GradeLevel, Subgroup, TidyRow, WideRow};
use crate::types::EntityType;

/// Aggregation-level flags `(is_state, is_district, is_school)`; exactly one is `true`.
pub fn aggregation_flags(entity_type: EntityType) -> (bool, bool, bool) {
    match entity_type {
        EntityType::State => (true, false, false),
        EntityType::District => (false, true, false),
        EntityType::School => (false, false, true),
    }
}

/// `n / total`, missing when either side is missing or `total` is zero. Not clamped.
pub fn share(n: Option<i64>, total: Option<i64>) -> Option<f64> {
    match (n, total) {
        (Some(n), Some(total)) if total != 0 => Some(n as f64 / total as f64),
        _ => None,
    }
}

/// Pivot wide rows into tidy rows.
///
/// Per entity: `TOTAL/total_enrollment`, the other 12 subgroups at `TOTAL`, then
/// `total_enrollment` for each of the 14 grade buckets. No reconciliation is attempted
/// between subgroup sums and totals.
pub fn tidy(rows: &[WideRow]) -> Vec<TidyRow> {
    let mut out = Vec::with_capacity(rows.len() * (Subgroup::ALL.len() + GradeLevel::ALL.len() - 1));
    for row in rows {
        let cells = Subgroup::ALL
            .into_iter()
            .map(|s| (GradeLevel::Total, s))
            .chain(
                GradeLevel::ALL
                    .into_iter()
                    .filter(|g| *g != GradeLevel::Total)
                    .map(|g| (g, Subgroup::TotalEnrollment)),
            );
        for (grade_level, subgroup) in cells {
            out.push(tidy_row(row, grade_level, subgroup));
        }
    }
    out
}

fn tidy_row(row: &WideRow, grade_level: GradeLevel, subgroup: Subgroup) -> TidyRow {
    let field = if subgroup == Subgroup::TotalEnrollment {
        grade_level.count_field()
    } else {
        subgroup.count_field()
    };
    let n_students = row.count(field);
    let (is_state, is_district, is_school) = aggregation_flags(row.entity_type);

    TidyRow {
        end_year: row.end_year,
        entity_type: row.entity_type,
        district_id: row.district_id.clone(),
        school_id: row.school_id.clone(),
        district_name: row.district_name.clone(),
        school_name: row.school_name.clone(),
        grade_level,
        subgroup,
        n_students,
        pct: share(n_students, row.count(CountField::RowTotal)),
        is_state,
        is_district,
        is_school,
    }
}
