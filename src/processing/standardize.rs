//! Column standardization: sparse era rows → complete canonical [`WideRow`]s.

use std::collections::BTreeMap;

use tracing::warn;

use crate::canonical::{CountField, Counts, WideRow};
use crate::types::EntityType;

/// An entity row as an era processor emits it.
///
/// Era processors only populate the count columns their era publishes; columns absent from
/// `counts` are unknown rather than zero. Identifiers are still raw (unpadded) strings.
#[derive(Debug, Clone, PartialEq)]
pub struct PartialRow {
    pub entity_type: EntityType,
    pub district_id: Option<String>,
    pub school_id: Option<String>,
    pub district_name: Option<String>,
    pub school_name: Option<String>,
    pub counts: BTreeMap<CountField, Option<i64>>,
}

impl PartialRow {
    pub fn new(entity_type: EntityType) -> Self {
        Self {
            entity_type,
            district_id: None,
            school_id: None,
            district_name: None,
            school_name: None,
            counts: BTreeMap::new(),
        }
    }
}

/// Bring every row to the full canonical schema.
///
/// - absent count columns become `None`
/// - blank identifiers and names become `None`
/// - district ids are zero-padded to 3 digits, school ids to 6 (a 3-digit school number is
///   prefixed with its district id)
/// - school identity is cleared on non-School rows, district identity on State rows
///
/// A District or School row left without a district name keeps `None` and logs a warning.
pub fn standardize(rows: Vec<PartialRow>, end_year: i32) -> Vec<WideRow> {
    rows.into_iter()
        .map(|row| standardize_row(row, end_year))
        .collect()
}

fn standardize_row(row: PartialRow, end_year: i32) -> WideRow {
    let mut counts = Counts::missing();
    for (field, value) in row.counts {
        counts.set(field, value);
    }

    let is_state = row.entity_type == EntityType::State;
    let is_school = row.entity_type == EntityType::School;

    let district_id = if is_state {
        None
    } else {
        non_blank(row.district_id).map(|id| pad_numeric(&id, 3))
    };
    let school_id = if is_school {
        non_blank(row.school_id).map(|id| normalize_school_id(&id, district_id.as_deref()))
    } else {
        None
    };

    let district_name = if is_state { None } else { non_blank(row.district_name) };
    if !is_state && district_name.is_none() {
        warn!(
            end_year,
            entity_type = %row.entity_type,
            district_id = district_id.as_deref(),
            school_id = school_id.as_deref(),
            "row has no district name"
        );
    }

    WideRow {
        end_year,
        entity_type: row.entity_type,
        district_name,
        school_name: if is_school { non_blank(row.school_name) } else { None },
        district_id,
        school_id,
        counts,
    }
}

fn non_blank(v: Option<String>) -> Option<String> {
    v.map(|s| s.trim().to_owned()).filter(|s| !s.is_empty())
}

/// Left-pad an all-digit identifier with zeros; other identifiers pass through unchanged.
/// A spreadsheet-style trailing `.0` is dropped first.
fn pad_numeric(id: &str, width: usize) -> String {
    let id = id.strip_suffix(".0").unwrap_or(id);
    if !id.is_empty() && id.chars().all(|c| c.is_ascii_digit()) && id.len() < width {
        format!("{id:0>width$}")
    } else {
        id.to_owned()
    }
}

fn normalize_school_id(id: &str, district_id: Option<&str>) -> String {
    let id = id.strip_suffix(".0").unwrap_or(id);
    let all_digits = id.chars().all(|c| c.is_ascii_digit());
    match district_id {
        Some(district) if all_digits && id.len() <= 3 => format!("{district}{}", pad_numeric(id, 3)),
        _ => pad_numeric(id, 6),
    }
}
