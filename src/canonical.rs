//! The canonical vocabulary every era is normalized into.
//!
//! - [`CountField`]: the 27 nullable count columns of a wide row, in fixed order
//! - [`Subgroup`]: the 13 canonical demographic / population keys
//! - [`GradeLevel`]: the 15 grade buckets of the tidy form
//! - [`WideRow`] / [`TidyRow`]: the two output row shapes
//!
//! Column order is part of the contract: [`wide_schema`] and [`tidy_schema`] describe the
//! exact field order that [`WideRow::to_values`] and [`TidyRow::to_values`] produce.

use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;

use crate::types::{DataType, EntityType, Field, Schema, Value};

/// Identity columns shared by wide and tidy rows, in order.
pub const IDENTITY_COLUMNS: [&str; 6] = [
    "end_year",
    "type",
    "district_id",
    "school_id",
    "district_name",
    "school_name",
];

/// A nullable count column of the canonical wide schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CountField {
    RowTotal,
    White,
    Black,
    Hispanic,
    Asian,
    NativeAmerican,
    PacificIslander,
    Multiracial,
    Male,
    Female,
    EconDisadv,
    Lep,
    SpecialEd,
    GradePk,
    GradeK,
    Grade01,
    Grade02,
    Grade03,
    Grade04,
    Grade05,
    Grade06,
    Grade07,
    Grade08,
    Grade09,
    Grade10,
    Grade11,
    Grade12,
}

impl CountField {
    /// Number of count columns.
    pub const COUNT: usize = 27;

    /// All count columns in canonical order.
    pub const ALL: [CountField; Self::COUNT] = [
        Self::RowTotal,
        Self::White,
        Self::Black,
        Self::Hispanic,
        Self::Asian,
        Self::NativeAmerican,
        Self::PacificIslander,
        Self::Multiracial,
        Self::Male,
        Self::Female,
        Self::EconDisadv,
        Self::Lep,
        Self::SpecialEd,
        Self::GradePk,
        Self::GradeK,
        Self::Grade01,
        Self::Grade02,
        Self::Grade03,
        Self::Grade04,
        Self::Grade05,
        Self::Grade06,
        Self::Grade07,
        Self::Grade08,
        Self::Grade09,
        Self::Grade10,
        Self::Grade11,
        Self::Grade12,
    ];

    /// The fourteen grade columns, PK first.
    pub const GRADES: [CountField; 14] = [
        Self::GradePk,
        Self::GradeK,
        Self::Grade01,
        Self::Grade02,
        Self::Grade03,
        Self::Grade04,
        Self::Grade05,
        Self::Grade06,
        Self::Grade07,
        Self::Grade08,
        Self::Grade09,
        Self::Grade10,
        Self::Grade11,
        Self::Grade12,
    ];

    /// Position of this column inside [`CountField::ALL`].
    pub fn index(self) -> usize {
        self as usize
    }

    /// Canonical column name.
    pub fn column_name(self) -> &'static str {
        match self {
            Self::RowTotal => "row_total",
            Self::White => "white",
            Self::Black => "black",
            Self::Hispanic => "hispanic",
            Self::Asian => "asian",
            Self::NativeAmerican => "native_american",
            Self::PacificIslander => "pacific_islander",
            Self::Multiracial => "multiracial",
            Self::Male => "male",
            Self::Female => "female",
            Self::EconDisadv => "econ_disadv",
            Self::Lep => "lep",
            Self::SpecialEd => "special_ed",
            Self::GradePk => "grade_pk",
            Self::GradeK => "grade_k",
            Self::Grade01 => "grade_01",
            Self::Grade02 => "grade_02",
            Self::Grade03 => "grade_03",
            Self::Grade04 => "grade_04",
            Self::Grade05 => "grade_05",
            Self::Grade06 => "grade_06",
            Self::Grade07 => "grade_07",
            Self::Grade08 => "grade_08",
            Self::Grade09 => "grade_09",
            Self::Grade10 => "grade_10",
            Self::Grade11 => "grade_11",
            Self::Grade12 => "grade_12",
        }
    }
}

/// A canonical demographic / population subgroup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Subgroup {
    TotalEnrollment,
    White,
    Black,
    Hispanic,
    Asian,
    NativeAmerican,
    PacificIslander,
    Multiracial,
    Male,
    Female,
    EconDisadv,
    Lep,
    SpecialEd,
}

impl Subgroup {
    /// All subgroups in canonical order.
    pub const ALL: [Subgroup; 13] = [
        Self::TotalEnrollment,
        Self::White,
        Self::Black,
        Self::Hispanic,
        Self::Asian,
        Self::NativeAmerican,
        Self::PacificIslander,
        Self::Multiracial,
        Self::Male,
        Self::Female,
        Self::EconDisadv,
        Self::Lep,
        Self::SpecialEd,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Self::TotalEnrollment => "total_enrollment",
            Self::White => "white",
            Self::Black => "black",
            Self::Hispanic => "hispanic",
            Self::Asian => "asian",
            Self::NativeAmerican => "native_american",
            Self::PacificIslander => "pacific_islander",
            Self::Multiracial => "multiracial",
            Self::Male => "male",
            Self::Female => "female",
            Self::EconDisadv => "econ_disadv",
            Self::Lep => "lep",
            Self::SpecialEd => "special_ed",
        }
    }

    /// The wide column holding this subgroup's TOTAL-grade count.
    pub fn count_field(self) -> CountField {
        match self {
            Self::TotalEnrollment => CountField::RowTotal,
            Self::White => CountField::White,
            Self::Black => CountField::Black,
            Self::Hispanic => CountField::Hispanic,
            Self::Asian => CountField::Asian,
            Self::NativeAmerican => CountField::NativeAmerican,
            Self::PacificIslander => CountField::PacificIslander,
            Self::Multiracial => CountField::Multiracial,
            Self::Male => CountField::Male,
            Self::Female => CountField::Female,
            Self::EconDisadv => CountField::EconDisadv,
            Self::Lep => CountField::Lep,
            Self::SpecialEd => CountField::SpecialEd,
        }
    }
}

/// A grade bucket of the tidy form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum GradeLevel {
    #[serde(rename = "TOTAL")]
    Total,
    #[serde(rename = "PK")]
    Pk,
    #[serde(rename = "K")]
    K,
    #[serde(rename = "01")]
    G01,
    #[serde(rename = "02")]
    G02,
    #[serde(rename = "03")]
    G03,
    #[serde(rename = "04")]
    G04,
    #[serde(rename = "05")]
    G05,
    #[serde(rename = "06")]
    G06,
    #[serde(rename = "07")]
    G07,
    #[serde(rename = "08")]
    G08,
    #[serde(rename = "09")]
    G09,
    #[serde(rename = "10")]
    G10,
    #[serde(rename = "11")]
    G11,
    #[serde(rename = "12")]
    G12,
}

impl GradeLevel {
    /// All buckets, TOTAL first.
    pub const ALL: [GradeLevel; 15] = [
        Self::Total,
        Self::Pk,
        Self::K,
        Self::G01,
        Self::G02,
        Self::G03,
        Self::G04,
        Self::G05,
        Self::G06,
        Self::G07,
        Self::G08,
        Self::G09,
        Self::G10,
        Self::G11,
        Self::G12,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::Total => "TOTAL",
            Self::Pk => "PK",
            Self::K => "K",
            Self::G01 => "01",
            Self::G02 => "02",
            Self::G03 => "03",
            Self::G04 => "04",
            Self::G05 => "05",
            Self::G06 => "06",
            Self::G07 => "07",
            Self::G08 => "08",
            Self::G09 => "09",
            Self::G10 => "10",
            Self::G11 => "11",
            Self::G12 => "12",
        }
    }

    /// The wide column holding total enrollment for this bucket.
    pub fn count_field(self) -> CountField {
        match self {
            Self::Total => CountField::RowTotal,
            Self::Pk => CountField::GradePk,
            Self::K => CountField::GradeK,
            Self::G01 => CountField::Grade01,
            Self::G02 => CountField::Grade02,
            Self::G03 => CountField::Grade03,
            Self::G04 => CountField::Grade04,
            Self::G05 => CountField::Grade05,
            Self::G06 => CountField::Grade06,
            Self::G07 => CountField::Grade07,
            Self::G08 => CountField::Grade08,
            Self::G09 => CountField::Grade09,
            Self::G10 => CountField::Grade10,
            Self::G11 => CountField::Grade11,
            Self::G12 => CountField::Grade12,
        }
    }
}

/// Fixed-order storage for the 27 count columns of a wide row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Counts([Option<i64>; CountField::COUNT]);

impl Default for Counts {
    fn default() -> Self {
        Self::missing()
    }
}

impl Counts {
    /// Every column missing.
    pub fn missing() -> Self {
        Self([None; CountField::COUNT])
    }

    /// Every column zero.
    pub fn zeroed() -> Self {
        Self([Some(0); CountField::COUNT])
    }

    pub fn get(&self, field: CountField) -> Option<i64> {
        self.0[field.index()]
    }

    pub fn set(&mut self, field: CountField, value: Option<i64>) {
        self.0[field.index()] = value;
    }

    /// Iterate `(column, value)` pairs in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = (CountField, Option<i64>)> + '_ {
        CountField::ALL.into_iter().map(move |f| (f, self.get(f)))
    }
}

/// One canonical wide row: a single entity in a single school year.
///
/// Invariants (enforced by the standardizer and the state synthesizer):
/// `school_id` is `None` unless `entity_type` is `School`, and `district_id` /
/// `district_name` are `None` exactly when `entity_type` is `State`.
#[derive(Debug, Clone, PartialEq)]
pub struct WideRow {
    pub end_year: i32,
    pub entity_type: EntityType,
    pub district_id: Option<String>,
    pub school_id: Option<String>,
    pub district_name: Option<String>,
    pub school_name: Option<String>,
    pub counts: Counts,
}

impl WideRow {
    pub fn count(&self, field: CountField) -> Option<i64> {
        self.counts.get(field)
    }

    /// Values in [`wide_schema`] order.
    pub fn to_values(&self) -> Vec<Value> {
        let mut out = Vec::with_capacity(IDENTITY_COLUMNS.len() + CountField::COUNT);
        out.push(Value::Int64(i64::from(self.end_year)));
        out.push(Value::Utf8(self.entity_type.as_str().to_owned()));
        out.push(self.district_id.as_deref().into());
        out.push(self.school_id.as_deref().into());
        out.push(self.district_name.as_deref().into());
        out.push(self.school_name.as_deref().into());
        out.extend(self.counts.iter().map(|(_, v)| Value::from(v)));
        out
    }
}

// Flat map keyed by canonical column name, in schema order.
impl Serialize for WideRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(IDENTITY_COLUMNS.len() + CountField::COUNT))?;
        map.serialize_entry("end_year", &self.end_year)?;
        map.serialize_entry("type", &self.entity_type)?;
        map.serialize_entry("district_id", &self.district_id)?;
        map.serialize_entry("school_id", &self.school_id)?;
        map.serialize_entry("district_name", &self.district_name)?;
        map.serialize_entry("school_name", &self.school_name)?;
        for (field, value) in self.counts.iter() {
            map.serialize_entry(field.column_name(), &value)?;
        }
        map.end()
    }
}

/// One tidy observation: (entity, grade bucket, subgroup).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TidyRow {
    pub end_year: i32,
    #[serde(rename = "type")]
    pub entity_type: EntityType,
    pub district_id: Option<String>,
    pub school_id: Option<String>,
    pub district_name: Option<String>,
    pub school_name: Option<String>,
    pub grade_level: GradeLevel,
    pub subgroup: Subgroup,
    pub n_students: Option<i64>,
    pub pct: Option<f64>,
    pub is_state: bool,
    pub is_district: bool,
    pub is_school: bool,
}

impl TidyRow {
    /// Values in [`tidy_schema`] order.
    pub fn to_values(&self) -> Vec<Value> {
        vec![
            Value::Int64(i64::from(self.end_year)),
            Value::Utf8(self.entity_type.as_str().to_owned()),
            self.district_id.as_deref().into(),
            self.school_id.as_deref().into(),
            self.district_name.as_deref().into(),
            self.school_name.as_deref().into(),
            Value::Utf8(self.grade_level.label().to_owned()),
            Value::Utf8(self.subgroup.key().to_owned()),
            self.n_students.into(),
            self.pct.into(),
            Value::Bool(self.is_state),
            Value::Bool(self.is_district),
            Value::Bool(self.is_school),
        ]
    }
}

fn identity_fields() -> Vec<Field> {
    vec![
        Field::new("end_year", DataType::Int64),
        Field::new("type", DataType::Utf8),
        Field::new("district_id", DataType::Utf8),
        Field::new("school_id", DataType::Utf8),
        Field::new("district_name", DataType::Utf8),
        Field::new("school_name", DataType::Utf8),
    ]
}

/// Schema of the canonical wide form: 6 identity columns then the 27 counts.
pub fn wide_schema() -> Schema {
    let mut fields = identity_fields();
    fields.extend(
        CountField::ALL
            .iter()
            .map(|f| Field::new(f.column_name(), DataType::Int64)),
    );
    Schema::new(fields)
}

/// Schema of the tidy form.
pub fn tidy_schema() -> Schema {
    let mut fields = identity_fields();
    fields.extend([
        Field::new("grade_level", DataType::Utf8),
        Field::new("subgroup", DataType::Utf8),
        Field::new("n_students", DataType::Int64),
        Field::new("pct", DataType::Float64),
        Field::new("is_state", DataType::Bool),
        Field::new("is_district", DataType::Bool),
        Field::new("is_school", DataType::Bool),
    ]);
    Schema::new(fields)
}
