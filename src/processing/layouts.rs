//! Versioned column layouts, one per era.
//!
//! Everything era-specific lives here as data: the pattern lists the resolver walks, the
//! district-total / state-total markers the reconstructor classifies by, and the label
//! vocabulary. Supporting a new source layout means adding a table, not new logic.

use once_cell::sync::Lazy;

use crate::canonical::{CountField, Subgroup};

use super::labels::{LabelMap, CURRENT_LONG_LABELS, MID_LONG_LABELS};
use super::resolve::ColumnPatterns;

/// Reserved district code the agency uses for its own statewide total rows.
pub const STATE_TOTAL_CODE: &str = "999";

/// Newest-layout marker: a row with the state code and this school name is a total row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateTotalMarker {
    pub district_code: &'static str,
    pub school_name: &'static str,
}

/// Layout of a long "one row per (entity, demographic)" source.
#[derive(Debug, Clone)]
pub struct LongLayout {
    pub district_id: ColumnPatterns,
    pub district_name: ColumnPatterns,
    pub school_id: ColumnPatterns,
    pub school_name: ColumnPatterns,
    pub label: ColumnPatterns,
    pub total: ColumnPatterns,
    /// Grade columns, aligned with [`CountField::GRADES`].
    pub grades: Vec<(CountField, ColumnPatterns)>,
    /// School-name values marking a district-level row.
    pub district_total_markers: &'static [&'static str],
    pub state_total_marker: Option<StateTotalMarker>,
    pub labels: LabelMap,
}

impl LongLayout {
    pub fn is_district_total_marker(&self, school_name: &str) -> bool {
        let name = school_name.trim();
        self.district_total_markers
            .iter()
            .any(|m| m.eq_ignore_ascii_case(name))
    }

    /// Returns `true` if `(district_id, school_name)` is the newest layout's state-total key.
    pub fn is_state_total_marker(&self, district_id: &str, school_name: &str) -> bool {
        self.state_total_marker.is_some_and(|m| {
            district_id.trim() == m.district_code && school_name.trim().eq_ignore_ascii_case(m.school_name)
        })
    }
}

/// Layout of the legacy per-district worksheet.
#[derive(Debug, Clone)]
pub struct WideLayout {
    pub district_id: ColumnPatterns,
    pub district_name: ColumnPatterns,
    /// Count columns the era publishes; everything else is permanently missing.
    pub counts: Vec<(CountField, ColumnPatterns)>,
}

const MID_LONG_DISTRICT_MARKERS: &[&str] = &["---District Total---", "District Total"];
const CURRENT_LONG_DISTRICT_MARKERS: &[&str] = &["---District Total---", "District Total"];

/// First long CSV layout (underscore-style headers such as `SCH_CD`, `DIST_NUMBER`).
pub static MID_LONG: Lazy<LongLayout> = Lazy::new(|| LongLayout {
    district_id: ColumnPatterns::new(
        "district_id",
        &[r"^dist(rict)?[ _]?(number|num|no)$", r"^dist(rict)?[ _]?(code|cd|id)$"],
    ),
    district_name: ColumnPatterns::new("district_name", &[r"^dist(rict)?[ _]?(name|nm)$"]),
    school_id: ColumnPatterns::new(
        "school_id",
        &[r"^sch(ool)?[ _]?(code|cd)$", r"^sch(ool)?[ _]?(number|num|no|id)$"],
    ),
    school_name: ColumnPatterns::new("school_name", &[r"^sch(ool)?[ _]?(name|nm)$"]),
    label: ColumnPatterns::new(
        "demographic",
        &[
            r"^disagg(regation)?[ _]?label$",
            r"^demographic([ _]?label)?$",
            r"^(student[ _]?)?group$",
        ],
    ),
    total: ColumnPatterns::new(
        "row_total",
        &[
            r"^total[ _]?enrollment$",
            r"^membership$",
            r"^total([ _]?(count|cnt))?$",
        ],
    ),
    grades: grade_patterns(&[r"grade", r"gr"], r"([ _]?(count|cnt))?"),
    district_total_markers: MID_LONG_DISTRICT_MARKERS,
    state_total_marker: None,
    labels: LabelMap::new(MID_LONG_LABELS),
});

/// Current long CSV layout (spaced upper-case headers such as `SCHOOL CODE`).
pub static CURRENT_LONG: Lazy<LongLayout> = Lazy::new(|| LongLayout {
    district_id: ColumnPatterns::new(
        "district_id",
        &[
            r"^district[ _]number$",
            r"^district[ _](code|id)$",
            r"^dist[ _]?(number|num|no|cd)$",
        ],
    ),
    district_name: ColumnPatterns::new("district_name", &[r"^district[ _]name$", r"^dist[ _]?name$"]),
    school_id: ColumnPatterns::new(
        "school_id",
        &[r"^school[ _]code$", r"^sch[ _]?cd$", r"^school[ _]number$"],
    ),
    school_name: ColumnPatterns::new("school_name", &[r"^school[ _]name$", r"^sch[ _]?name$"]),
    label: ColumnPatterns::new(
        "demographic",
        &[
            r"^demographic$",
            r"^student[ _]group$",
            r"^disagg(regation)?[ _]label$",
        ],
    ),
    total: ColumnPatterns::new(
        "row_total",
        &[
            r"^total[ _]student[ _]count$",
            r"^all[ _]grades$",
            r"^total[ _]?(enrollment|count)$",
            r"^total$",
        ],
    ),
    grades: grade_patterns(&[r"grade"], r"([ _]count)?"),
    district_total_markers: CURRENT_LONG_DISTRICT_MARKERS,
    state_total_marker: Some(StateTotalMarker {
        district_code: STATE_TOTAL_CODE,
        school_name: "All Schools",
    }),
    labels: LabelMap::new(CURRENT_LONG_LABELS),
});

/// Legacy per-district worksheet: race/ethnicity only.
pub static LEGACY_WIDE: Lazy<WideLayout> = Lazy::new(|| WideLayout {
    district_id: ColumnPatterns::new(
        "district_id",
        &[
            r"^dist(rict)?[ _]?(number|num|no|#)$",
            r"^dist(rict)?[ _]?(code|cd|id)$",
            r"^dnum$",
        ],
    ),
    district_name: ColumnPatterns::new("district_name", &[r"^dist(rict)?[ _]?name$", r"^district$"]),
    counts: vec![
        (
            CountField::RowTotal,
            ColumnPatterns::new(
                "row_total",
                &[
                    r"^total[ _]?(enrollment|membership)$",
                    r"^(membership|enrollment)$",
                    r"^total$",
                ],
            ),
        ),
        (
            CountField::White,
            ColumnPatterns::new("white", &[r"^white([ _]?\(?non[ -]?hispanic\)?)?$", r"^wht$"]),
        ),
        (
            CountField::Black,
            ColumnPatterns::new(
                "black",
                &[
                    r"^(black|african[ _]american)([ _]?\(?non[ -]?hispanic\)?)?$",
                    r"^blk$",
                ],
            ),
        ),
        (
            CountField::Hispanic,
            ColumnPatterns::new("hispanic", &[r"^hispanic([ _]or[ _]latino)?$", r"^hisp?$"]),
        ),
        (
            CountField::Asian,
            ColumnPatterns::new(
                "asian",
                &[
                    r"^asian$",
                    r"^asian[ _/]?(pacific[ _]islander|american)$",
                    r"^asn$",
                ],
            ),
        ),
        (
            CountField::NativeAmerican,
            ColumnPatterns::new(
                "native_american",
                &[
                    r"^american[ _]indian([ _/]?(or[ _])?alaskan?[ _]native)?$",
                    r"^native[ _]american$",
                    r"^am(er)?[ _]?ind(ian)?$",
                    r"^ami$",
                ],
            ),
        ),
        (
            CountField::PacificIslander,
            ColumnPatterns::new(
                "pacific_islander",
                &[
                    r"^(native[ _])?hawaiian([ _/]?(or[ _])?(other[ _])?pacific[ _]islander)?$",
                    r"^pacific[ _]islander$",
                    r"^pac$",
                ],
            ),
        ),
        (
            CountField::Multiracial,
            ColumnPatterns::new(
                "multiracial",
                &[r"^two[ _]or[ _]more([ _]races)?$", r"^multi[ _-]?racial$", r"^two$"],
            ),
        ),
    ],
});

/// Build PK, K and 01–12 patterns from header stems (`grade`, `gr`) and a count suffix.
fn grade_patterns(stems: &[&str], suffix: &str) -> Vec<(CountField, ColumnPatterns)> {
    let stem = format!("({})", stems.join("|"));
    let mut out = Vec::with_capacity(CountField::GRADES.len());
    for field in CountField::GRADES {
        let sources: Vec<String> = match field {
            CountField::GradePk => vec![
                format!(r"^preschool{suffix}$"),
                format!(r"^({stem}[ _]?)?(pk|pre[ _-]?k|pre[ _-]?school){suffix}$"),
            ],
            CountField::GradeK => vec![
                format!(r"^kindergarten{suffix}$"),
                format!(r"^({stem}[ _]?)?(k|kg){suffix}$"),
            ],
            other => {
                let n = CountField::GRADES
                    .iter()
                    .position(|g| *g == other)
                    .map(|p| p - 1)
                    .unwrap_or_default();
                vec![format!(r"^{stem}[ _]?0?{n}{suffix}$")]
            }
        };
        let refs: Vec<&str> = sources.iter().map(String::as_str).collect();
        out.push((field, ColumnPatterns::new(field.column_name(), &refs)));
    }
    out
}
