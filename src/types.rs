//! Core data model types.
//!
//! Two families live here:
//!
//! - the raw side: [`RawTable`] / [`RawSource`], byte-faithful string tables tagged with an
//!   [`Era`], as handed over by the loading layer;
//! - the typed side: [`Schema`] / [`DataSet`] / [`Value`], the in-memory tabular form the
//!   canonical wide and tidy collections are exported into.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{EnrollmentError, EnrollmentResult};

/// Logical data type for a schema field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataType {
    /// 64-bit signed integer.
    Int64,
    /// 64-bit floating point number.
    Float64,
    /// Boolean.
    Bool,
    /// UTF-8 string.
    Utf8,
}

/// A single named, typed field in a [`Schema`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    /// Field/column name.
    pub name: String,
    /// Field data type.
    pub data_type: DataType,
}

impl Field {
    /// Create a new field.
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
        }
    }
}

/// An ordered list of typed fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    /// Ordered list of fields.
    pub fields: Vec<Field>,
}

impl Schema {
    /// Create a new schema from fields.
    pub fn new(fields: Vec<Field>) -> Self {
        Self { fields }
    }

    /// Iterate field names in order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    /// Returns the index of a field by name, if present.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }
}

/// A single typed value in a [`DataSet`].
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Missing value.
    Null,
    /// 64-bit signed integer.
    Int64(i64),
    /// 64-bit float.
    Float64(f64),
    /// Boolean.
    Bool(bool),
    /// UTF-8 string.
    Utf8(String),
}

impl From<Option<i64>> for Value {
    fn from(v: Option<i64>) -> Self {
        v.map(Value::Int64).unwrap_or(Value::Null)
    }
}

impl From<Option<f64>> for Value {
    fn from(v: Option<f64>) -> Self {
        v.map(Value::Float64).unwrap_or(Value::Null)
    }
}

impl From<Option<&str>> for Value {
    fn from(v: Option<&str>) -> Self {
        v.map(|s| Value::Utf8(s.to_owned())).unwrap_or(Value::Null)
    }
}

/// In-memory tabular dataset.
///
/// Rows are stored as `Vec<Vec<Value>>` in the same order as the [`Schema`] fields.
#[derive(Debug, Clone, PartialEq)]
pub struct DataSet {
    /// Schema describing row shape.
    pub schema: Schema,
    /// Row-major value storage.
    pub rows: Vec<Vec<Value>>,
}

impl DataSet {
    /// Create a dataset from schema and rows.
    pub fn new(schema: Schema, rows: Vec<Vec<Value>>) -> Self {
        Self { schema, rows }
    }

    /// Number of rows in the dataset.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Looks up a single cell by row index and column name.
    pub fn value(&self, row: usize, column: &str) -> Option<&Value> {
        let idx = self.schema.index_of(column)?;
        self.rows.get(row)?.get(idx)
    }
}

/// A raw table of strings exactly as the source published it.
///
/// Cells are never trimmed or coerced here; that is the job of the processing layer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawTable {
    /// Column names, in source order.
    pub headers: Vec<String>,
    /// Row-major cells. Rows may be shorter than `headers`; missing cells read as `""`.
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    /// Create a table from owned headers and rows.
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { headers, rows }
    }

    /// Convenience constructor from string slices (handy for fixtures).
    pub fn from_str_rows(headers: &[&str], rows: &[&[&str]]) -> Self {
        Self {
            headers: headers.iter().map(|h| (*h).to_owned()).collect(),
            rows: rows
                .iter()
                .map(|r| r.iter().map(|c| (*c).to_owned()).collect())
                .collect(),
        }
    }

    /// Number of data rows (header excluded).
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Returns the cell at `(row, col)`, or `""` when the row is short.
    pub fn cell(&self, row: usize, col: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .map(String::as_str)
            .unwrap_or("")
    }
}

/// Named role a table plays inside a [`RawSource`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TableRole {
    /// First half of a split long publication.
    Primary,
    /// Second half of a split long publication.
    Secondary,
    /// A single long publication covering every entity.
    Combined,
    /// The per-district worksheet of the legacy spreadsheets.
    DistrictSheet,
}

impl TableRole {
    /// Key used in [`RawSource::tables`].
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Primary => "primary",
            Self::Secondary => "secondary",
            Self::Combined => "combined",
            Self::DistrictSheet => "district-sheet",
        }
    }
}

impl fmt::Display for TableRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One year's raw input: an era tag plus named string tables.
///
/// The era is kept as the tag string the retrieval layer supplied; it is validated when the
/// source is processed so that an unknown tag surfaces as
/// [`EnrollmentError::UnrecognizedEra`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawSource {
    /// Era tag, e.g. `"current-long"`.
    pub era: String,
    /// Tables keyed by role name (`primary`, `secondary`, `combined`, `district-sheet`).
    pub tables: BTreeMap<String, RawTable>,
}

impl RawSource {
    /// Create an empty source with the given era tag.
    pub fn new(era: impl Into<String>) -> Self {
        Self {
            era: era.into(),
            tables: BTreeMap::new(),
        }
    }

    /// Builder-style table insertion.
    pub fn with_table(mut self, role: TableRole, table: RawTable) -> Self {
        self.tables.insert(role.as_str().to_owned(), table);
        self
    }

    /// Returns the table registered for `role`, if any.
    pub fn table(&self, role: TableRole) -> Option<&RawTable> {
        self.tables.get(role.as_str())
    }

    /// Parses the era tag.
    pub fn era(&self) -> EnrollmentResult<Era> {
        Era::from_tag(&self.era)
    }
}

/// Last school year (end year) published as per-district spreadsheets.
pub const LEGACY_WIDE_LAST_YEAR: i32 = 2011;
/// Last school year published in the first long CSV layout.
pub const MID_LONG_LAST_YEAR: i32 = 2019;

/// Historical publication format of the enrollment tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Era {
    /// One wide row per district, race/ethnicity columns only.
    LegacyWide,
    /// Long school/district CSVs, one row per (entity, demographic).
    MidLong,
    /// Current long CSV layout with renamed columns and vocabulary.
    CurrentLong,
}

impl Era {
    /// Parse an era tag (`legacy-wide`, `mid-long`, `current-long`).
    ///
    /// There is no fallback: anything else is [`EnrollmentError::UnrecognizedEra`].
    pub fn from_tag(tag: &str) -> EnrollmentResult<Self> {
        match tag.trim() {
            "legacy-wide" => Ok(Self::LegacyWide),
            "mid-long" => Ok(Self::MidLong),
            "current-long" => Ok(Self::CurrentLong),
            other => Err(EnrollmentError::UnrecognizedEra {
                tag: other.to_owned(),
            }),
        }
    }

    /// The tag string for this era.
    pub fn as_tag(&self) -> &'static str {
        match self {
            Self::LegacyWide => "legacy-wide",
            Self::MidLong => "mid-long",
            Self::CurrentLong => "current-long",
        }
    }

    /// The era a given school year was published in.
    pub fn for_end_year(end_year: i32) -> EnrollmentResult<Self> {
        let range = available_years();
        if !range.contains(end_year) {
            return Err(EnrollmentError::YearOutOfRange {
                end_year,
                min_year: range.min_year,
                max_year: range.max_year,
            });
        }
        Ok(if end_year <= LEGACY_WIDE_LAST_YEAR {
            Self::LegacyWide
        } else if end_year <= MID_LONG_LAST_YEAR {
            Self::MidLong
        } else {
            Self::CurrentLong
        })
    }
}

impl fmt::Display for Era {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_tag())
    }
}

/// Inclusive range of school years with published enrollment data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct YearRange {
    pub min_year: i32,
    pub max_year: i32,
}

impl YearRange {
    pub fn contains(&self, end_year: i32) -> bool {
        (self.min_year..=self.max_year).contains(&end_year)
    }
}

/// School years (by end year) for which a raw source can exist.
pub fn available_years() -> YearRange {
    YearRange {
        min_year: 1997,
        max_year: 2024,
    }
}

/// Aggregation level of a canonical row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EntityType {
    State,
    District,
    School,
}

impl EntityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::State => "State",
            Self::District => "District",
            Self::School => "School",
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn era_tags_round_trip_and_reject_unknown() {
        for era in [Era::LegacyWide, Era::MidLong, Era::CurrentLong] {
            assert_eq!(Era::from_tag(era.as_tag()).unwrap(), era);
        }
        let err = Era::from_tag("wide-ish").unwrap_err();
        assert!(matches!(err, EnrollmentError::UnrecognizedEra { ref tag } if tag == "wide-ish"));
    }

    #[test]
    fn era_for_end_year_follows_publication_boundaries() {
        assert_eq!(Era::for_end_year(1997).unwrap(), Era::LegacyWide);
        assert_eq!(Era::for_end_year(2011).unwrap(), Era::LegacyWide);
        assert_eq!(Era::for_end_year(2012).unwrap(), Era::MidLong);
        assert_eq!(Era::for_end_year(2019).unwrap(), Era::MidLong);
        assert_eq!(Era::for_end_year(2020).unwrap(), Era::CurrentLong);
        assert!(matches!(
            Era::for_end_year(1990),
            Err(EnrollmentError::YearOutOfRange { end_year: 1990, .. })
        ));
    }

    #[test]
    fn available_years_serialize_as_bounds() {
        let range = available_years();
        assert!(range.contains(1997) && range.contains(2024));
        assert!(!range.contains(2025));
        let json = serde_json::to_value(range).unwrap();
        assert_eq!(json, serde_json::json!({ "min_year": 1997, "max_year": 2024 }));
    }

    #[test]
    fn raw_table_cell_pads_short_rows() {
        let t = RawTable::from_str_rows(&["a", "b"], &[&["1"]]);
        assert_eq!(t.cell(0, 0), "1");
        assert_eq!(t.cell(0, 1), "");
        assert_eq!(t.cell(5, 0), "");
    }

    #[test]
    fn raw_source_tables_are_keyed_by_role_name() {
        let src = RawSource::new("mid-long")
            .with_table(TableRole::Primary, RawTable::default());
        assert!(src.tables.contains_key("primary"));
        assert!(src.table(TableRole::Primary).is_some());
        assert!(src.table(TableRole::Secondary).is_none());
    }

    #[test]
    fn dataset_value_lookup_by_column_name() {
        let ds = DataSet::new(
            Schema::new(vec![
                Field::new("id", DataType::Int64),
                Field::new("name", DataType::Utf8),
            ]),
            vec![vec![Value::Int64(1), Value::Utf8("a".to_string())]],
        );
        assert_eq!(ds.value(0, "name"), Some(&Value::Utf8("a".to_string())));
        assert_eq!(ds.value(0, "missing"), None);
        assert_eq!(ds.value(3, "id"), None);
    }
}
