//! Entity reconstruction for long sources.
//!
//! A long table carries one row per (entity, demographic label). Grade breakdowns are only
//! populated on the "all students" row. Reconstruction groups rows by
//! `(district id, school name)` and folds each group into one [`PartialRow`].

use std::collections::{BTreeMap, HashMap};

use tracing::debug;

use crate::canonical::{CountField, Subgroup};
use crate::error::{EnrollmentError, EnrollmentResult};
use crate::types::{EntityType, RawTable};

use super::coerce::coerce_count;
use super::labels::LabelMatch;
use super::layouts::LongLayout;
use super::resolve::{resolve_column, ColumnPatterns, FieldNotFound};
use super::standardize::PartialRow;

/// Column indexes of one long table, as resolved against a [`LongLayout`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LongColumns {
    pub district_id: Option<usize>,
    pub district_name: Option<usize>,
    pub school_id: Option<usize>,
    pub school_name: Option<usize>,
    pub label: Option<usize>,
    pub total: Option<usize>,
    pub grades: Vec<(CountField, Option<usize>)>,
}

impl LongColumns {
    /// Resolve every column the layout knows, recording misses in `not_found`.
    pub fn resolve(
        table: &RawTable,
        role: &str,
        layout: &LongLayout,
        not_found: &mut Vec<FieldNotFound>,
    ) -> Self {
        let mut find = |patterns: &ColumnPatterns| {
            let idx = resolve_column(table.headers.as_slice(), patterns);
            if idx.is_none() {
                not_found.push(FieldNotFound {
                    table: role.to_owned(),
                    field: patterns.field(),
                });
            }
            idx
        };
        Self {
            district_id: find(&layout.district_id),
            district_name: find(&layout.district_name),
            school_id: find(&layout.school_id),
            school_name: find(&layout.school_name),
            label: find(&layout.label),
            total: find(&layout.total),
            grades: layout
                .grades
                .iter()
                .map(|(field, patterns)| (*field, find(patterns)))
                .collect(),
        }
    }
}

/// One usable raw row after label filtering and classification.
#[derive(Debug, Clone)]
struct LongRecord {
    entity_type: EntityType,
    district_id: String,
    district_name: Option<String>,
    school_id: Option<String>,
    school_name: String,
    label: LabelMatch,
    total: Option<i64>,
    grades: Vec<(CountField, Option<i64>)>,
}

/// Result of reconstructing one year's long tables.
#[derive(Debug, Clone, Default)]
pub struct Reconstruction {
    /// One row per distinct entity, in first-appearance order.
    pub rows: Vec<PartialRow>,
    /// Raw rows discarded because their label has no mapping entry.
    pub unmapped_rows: usize,
    /// Raw rows discarded because they carry no district identifier.
    pub unidentified_rows: usize,
}

/// Reconstruct one [`PartialRow`] per entity from long `tables` (role, table).
///
/// Entities with only partial demographic rows are still emitted; whatever they lack is
/// missing. A second row for the same (entity, subgroup) is a
/// [`EnrollmentError::DuplicateEntity`].
pub fn reconstruct_entities(
    tables: &[(&str, &RawTable)],
    layout: &LongLayout,
    end_year: i32,
    not_found: &mut Vec<FieldNotFound>,
) -> EnrollmentResult<Reconstruction> {
    let mut out = Reconstruction::default();
    let mut records: Vec<LongRecord> = Vec::new();

    for (role, table) in tables {
        let cols = LongColumns::resolve(table, role, layout, not_found);
        for row in 0..table.row_count() {
            match read_record(table, row, &cols, layout) {
                RecordOutcome::Usable(record) => records.push(record),
                RecordOutcome::Unmapped => out.unmapped_rows += 1,
                RecordOutcome::Unidentified => out.unidentified_rows += 1,
            }
        }
    }

    debug!(
        end_year,
        usable = records.len(),
        unmapped = out.unmapped_rows,
        unidentified = out.unidentified_rows,
        "long rows filtered"
    );

    out.rows = group_entities(records, end_year)?;
    Ok(out)
}

enum RecordOutcome {
    Usable(LongRecord),
    Unmapped,
    Unidentified,
}

fn read_record(table: &RawTable, row: usize, cols: &LongColumns, layout: &LongLayout) -> RecordOutcome {
    let cell = |idx: Option<usize>| idx.map(|i| table.cell(row, i).trim()).unwrap_or("");

    let Some(label) = cols.label.and_then(|i| layout.labels.classify(table.cell(row, i))) else {
        return RecordOutcome::Unmapped;
    };
    let district_id = cell(cols.district_id);
    if district_id.is_empty() {
        return RecordOutcome::Unidentified;
    }

    let school_id = cell(cols.school_id);
    let school_name = cell(cols.school_name);
    let is_district = school_id.is_empty()
        || layout.is_district_total_marker(school_name)
        || layout.is_state_total_marker(district_id, school_name);

    let district_name = cell(cols.district_name);
    RecordOutcome::Usable(LongRecord {
        entity_type: if is_district {
            EntityType::District
        } else {
            EntityType::School
        },
        district_id: district_id.to_owned(),
        district_name: (!district_name.is_empty()).then(|| district_name.to_owned()),
        school_id: (!school_id.is_empty()).then(|| school_id.to_owned()),
        school_name: school_name.to_owned(),
        label,
        total: cols.total.and_then(|i| coerce_count(table.cell(row, i))),
        grades: cols
            .grades
            .iter()
            .map(|(field, idx)| (*field, idx.and_then(|i| coerce_count(table.cell(row, i)))))
            .collect(),
    })
}

/// Accumulates the rows of one entity.
#[derive(Debug)]
struct EntityBuilder {
    row: PartialRow,
    seen: Vec<LabelMatch>,
}

impl EntityBuilder {
    fn new(first: &LongRecord) -> Self {
        let mut row = PartialRow::new(first.entity_type);
        row.district_id = Some(first.district_id.clone());
        row.district_name = first.district_name.clone();
        row.school_id = first.school_id.clone();
        row.school_name = Some(first.school_name.clone());
        // Totals and grades come only from the all-students row; until one shows up they
        // are explicitly missing.
        row.counts.insert(CountField::RowTotal, None);
        for grade in CountField::GRADES {
            row.counts.insert(grade, None);
        }
        Self {
            row,
            seen: Vec::new(),
        }
    }

    /// Fold one record in. Among aliases of one subgroup the lowest rank wins regardless of
    /// row order; the same rank twice is a [`EnrollmentError::DuplicateEntity`].
    fn absorb(&mut self, record: LongRecord, end_year: i32) -> EnrollmentResult<()> {
        if self.row.district_name.is_none() {
            self.row.district_name = record.district_name.clone();
        }
        if self.row.school_id.is_none() {
            self.row.school_id = record.school_id.clone();
        }

        let subgroup = record.label.subgroup;
        match self.seen.iter_mut().find(|m| m.subgroup == subgroup) {
            Some(held) if held.rank == record.label.rank => {
                return Err(EnrollmentError::DuplicateEntity {
                    end_year,
                    entity_type: self.row.entity_type,
                    district_id: self.row.district_id.clone(),
                    school_id: self.row.school_id.clone(),
                    detail: format!("subgroup '{}' reported more than once", subgroup.key()),
                });
            }
            Some(held) if held.rank < record.label.rank => {
                debug!(
                    end_year,
                    district_id = record.district_id.as_str(),
                    school_name = record.school_name.as_str(),
                    subgroup = subgroup.key(),
                    "dropping lower-priority label alias"
                );
                return Ok(());
            }
            Some(held) => {
                debug!(
                    end_year,
                    district_id = record.district_id.as_str(),
                    school_name = record.school_name.as_str(),
                    subgroup = subgroup.key(),
                    "higher-priority label alias replaces earlier row"
                );
                held.rank = record.label.rank;
            }
            None => self.seen.push(record.label),
        }

        if subgroup == Subgroup::TotalEnrollment {
            self.row.counts.insert(CountField::RowTotal, record.total);
            for (field, value) in record.grades {
                self.row.counts.insert(field, value);
            }
        } else {
            self.row.counts.insert(subgroup.count_field(), record.total);
        }
        Ok(())
    }

    fn finish(mut self) -> PartialRow {
        // Subgroups the entity never reported are missing, not zero.
        for subgroup in Subgroup::ALL {
            self.row.counts.entry(subgroup.count_field()).or_insert(None);
        }
        self.row
    }
}

fn group_entities(records: Vec<LongRecord>, end_year: i32) -> EnrollmentResult<Vec<PartialRow>> {
    let mut order: Vec<EntityBuilder> = Vec::new();
    let mut index: HashMap<(String, String), usize> = HashMap::new();

    for record in records {
        let key = (record.district_id.clone(), record.school_name.clone());
        let slot = match index.get(&key) {
            Some(&slot) => slot,
            None => {
                order.push(EntityBuilder::new(&record));
                index.insert(key, order.len() - 1);
                order.len() - 1
            }
        };
        order[slot].absorb(record, end_year)?;
    }

    Ok(order.into_iter().map(EntityBuilder::finish).collect())
}

/// Count entities per type, for logging and stats.
pub fn entity_type_counts(rows: &[PartialRow]) -> BTreeMap<EntityType, usize> {
    let mut out = BTreeMap::new();
    for row in rows {
        *out.entry(row.entity_type).or_insert(0) += 1;
    }
    out
}
