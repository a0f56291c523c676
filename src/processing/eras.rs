//! Era processors: one raw source → sparse entity rows.
//!
//! All three share the same output contract ([`EraOutput`]); they differ in path. The legacy
//! worksheet is already one row per district, the two long layouts go through
//! [`reconstruct_entities`].

use tracing::{debug, warn};

use crate::canonical::CountField;
use crate::error::{EnrollmentError, EnrollmentResult};
use crate::types::{EntityType, Era, RawSource, RawTable, TableRole};

use super::coerce::coerce_count;
use super::layouts::{LongLayout, WideLayout, CURRENT_LONG, LEGACY_WIDE, MID_LONG, STATE_TOTAL_CODE};
use super::reconstruct::reconstruct_entities;
use super::resolve::{resolve_column, ColumnPatterns, FieldNotFound};
use super::standardize::PartialRow;

/// Entity rows produced by an era processor, plus the columns it could not resolve.
#[derive(Debug, Clone, Default)]
pub struct EraOutput {
    pub rows: Vec<PartialRow>,
    pub not_found: Vec<FieldNotFound>,
}

/// Run the processor for `era` over `source`.
pub fn process_era(era: Era, source: &RawSource, end_year: i32) -> EnrollmentResult<EraOutput> {
    match era {
        Era::LegacyWide => process_legacy_wide(source, end_year, &LEGACY_WIDE),
        Era::MidLong => process_long(source, end_year, era, &MID_LONG),
        Era::CurrentLong => process_long(source, end_year, era, &CURRENT_LONG),
    }
}

fn no_usable_data(era: Era, end_year: i32, reason: impl Into<String>) -> EnrollmentError {
    EnrollmentError::NoUsableData {
        era: era.as_tag().to_owned(),
        end_year,
        reason: reason.into(),
    }
}

/// Legacy per-district worksheet. Only id, name, total and race columns exist; gender,
/// special-population and grade columns are never populated for this era.
fn process_legacy_wide(
    source: &RawSource,
    end_year: i32,
    layout: &WideLayout,
) -> EnrollmentResult<EraOutput> {
    let role = TableRole::DistrictSheet;
    let table = source
        .table(role)
        .ok_or_else(|| no_usable_data(Era::LegacyWide, end_year, "no district-sheet table"))?;

    let mut out = EraOutput::default();
    let mut find = |patterns: &ColumnPatterns| {
        let idx = resolve_column(table.headers.as_slice(), patterns);
        if idx.is_none() {
            out.not_found.push(FieldNotFound {
                table: role.as_str().to_owned(),
                field: patterns.field(),
            });
        }
        idx
    };
    let id_col = find(&layout.district_id);
    let name_col = find(&layout.district_name);
    let count_cols: Vec<(CountField, Option<usize>)> = layout
        .counts
        .iter()
        .map(|(field, patterns)| (*field, find(patterns)))
        .collect();

    let Some(id_col) = id_col else {
        return Err(no_usable_data(
            Era::LegacyWide,
            end_year,
            "district-sheet has no district identifier column",
        ));
    };

    for row in 0..table.row_count() {
        let district_id = table.cell(row, id_col).trim();
        let district_name = name_col.map(|i| table.cell(row, i).trim()).unwrap_or("");
        if !is_legacy_district(district_id, district_name) {
            debug!(end_year, row, district_id, district_name, "skipping non-district worksheet row");
            continue;
        }

        let mut partial = PartialRow::new(EntityType::District);
        partial.district_id = Some(district_id.to_owned());
        partial.district_name = Some(district_name.to_owned());
        for (field, idx) in &count_cols {
            partial
                .counts
                .insert(*field, idx.and_then(|i| coerce_count(table.cell(row, i))));
        }
        out.rows.push(partial);
    }

    if out.rows.is_empty() {
        return Err(no_usable_data(
            Era::LegacyWide,
            end_year,
            "district-sheet contains no district rows",
        ));
    }
    Ok(out)
}

fn is_legacy_district(district_id: &str, district_name: &str) -> bool {
    if district_id.is_empty() || district_id == STATE_TOTAL_CODE {
        return false;
    }
    let name = district_name.to_ascii_lowercase();
    !(name.contains("state total") || name == "state" || name == "kentucky")
}

/// Long layouts. Reads `combined` when present, otherwise `primary` then `secondary`.
fn process_long(
    source: &RawSource,
    end_year: i32,
    era: Era,
    layout: &LongLayout,
) -> EnrollmentResult<EraOutput> {
    let tables = long_tables(source, era, end_year);
    if tables.is_empty() {
        return Err(no_usable_data(
            era,
            end_year,
            "none of the combined, primary or secondary tables is present",
        ));
    }

    let mut out = EraOutput::default();
    let reconstruction = reconstruct_entities(&tables, layout, end_year, &mut out.not_found)?;

    // The agency's own statewide row is superseded by the synthesized State row.
    let (state_totals, rows): (Vec<PartialRow>, Vec<PartialRow>) = reconstruction
        .rows
        .into_iter()
        .partition(|r| r.district_id.as_deref().map(str::trim) == Some(STATE_TOTAL_CODE));
    if !state_totals.is_empty() {
        debug!(end_year, discarded = state_totals.len(), "discarded source state-total entities");
    }

    if rows.is_empty() {
        return Err(no_usable_data(
            era,
            end_year,
            format!(
                "no entity rows after filtering ({} unmapped, {} without district id)",
                reconstruction.unmapped_rows, reconstruction.unidentified_rows
            ),
        ));
    }
    out.rows = rows;
    Ok(out)
}

fn long_tables<'a>(source: &'a RawSource, era: Era, end_year: i32) -> Vec<(&'static str, &'a RawTable)> {
    if let Some(combined) = source.table(TableRole::Combined) {
        if source.table(TableRole::Primary).is_some() || source.table(TableRole::Secondary).is_some() {
            warn!(
                %era,
                end_year,
                "combined table present alongside split tables; using combined only"
            );
        }
        return vec![(TableRole::Combined.as_str(), combined)];
    }
    [TableRole::Primary, TableRole::Secondary]
        .into_iter()
        .filter_map(|role| source.table(role).map(|t| (role.as_str(), t)))
        .collect()
}
