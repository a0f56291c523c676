//! Demographic label → canonical subgroup mapping, per long-era vocabulary.
//!
//! Labels without an entry are dropped by the reconstructor; there is no catch-all key.

use std::collections::HashMap;

use crate::canonical::Subgroup;

/// Vocabulary of the first long CSV layout (descriptive labels and three-letter codes).
pub const MID_LONG_LABELS: &[(&str, Subgroup)] = &[
    ("All Students", Subgroup::TotalEnrollment),
    ("TST", Subgroup::TotalEnrollment),
    ("White (Non-Hispanic)", Subgroup::White),
    ("White", Subgroup::White),
    ("WHT", Subgroup::White),
    ("African American", Subgroup::Black),
    ("Black", Subgroup::Black),
    ("BLK", Subgroup::Black),
    ("Hispanic", Subgroup::Hispanic),
    ("HIS", Subgroup::Hispanic),
    ("Asian", Subgroup::Asian),
    ("ASN", Subgroup::Asian),
    ("American Indian or Alaska Native", Subgroup::NativeAmerican),
    ("AMI", Subgroup::NativeAmerican),
    ("Native Hawaiian or Other Pacific Islander", Subgroup::PacificIslander),
    ("PAC", Subgroup::PacificIslander),
    ("Two or More Races", Subgroup::Multiracial),
    ("TMR", Subgroup::Multiracial),
    ("Male", Subgroup::Male),
    ("MAL", Subgroup::Male),
    ("Female", Subgroup::Female),
    ("FEM", Subgroup::Female),
    ("Free/Reduced-Price Meals", Subgroup::EconDisadv),
    ("FRL", Subgroup::EconDisadv),
    ("Limited English Proficiency", Subgroup::Lep),
    ("LEP", Subgroup::Lep),
    ("Disability-With IEP (Total)", Subgroup::SpecialEd),
    ("IEP", Subgroup::SpecialEd),
];

/// Vocabulary of the current long CSV layout.
pub const CURRENT_LONG_LABELS: &[(&str, Subgroup)] = &[
    ("All Students", Subgroup::TotalEnrollment),
    ("White (non-Hispanic)", Subgroup::White),
    ("African American", Subgroup::Black),
    ("Hispanic or Latino", Subgroup::Hispanic),
    ("Asian", Subgroup::Asian),
    ("American Indian or Alaska Native", Subgroup::NativeAmerican),
    ("Native Hawaiian or Pacific Islander", Subgroup::PacificIslander),
    ("Two or More Races", Subgroup::Multiracial),
    ("Male", Subgroup::Male),
    ("Female", Subgroup::Female),
    ("Economically Disadvantaged", Subgroup::EconDisadv),
    ("English Learner including Monitored", Subgroup::Lep),
    ("English Learners", Subgroup::Lep),
    ("Students with Disabilities (IEP)", Subgroup::SpecialEd),
];

/// A mapped label: its subgroup and its position in the vocabulary.
///
/// Several labels may alias one subgroup; a lower `rank` (earlier vocabulary entry) takes
/// priority when an entity reports more than one of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LabelMatch {
    pub subgroup: Subgroup,
    pub rank: usize,
}

/// Case- and whitespace-insensitive lookup table over one vocabulary.
#[derive(Debug, Clone)]
pub struct LabelMap {
    entries: HashMap<String, LabelMatch>,
}

impl LabelMap {
    pub fn new(vocabulary: &[(&str, Subgroup)]) -> Self {
        let mut entries = HashMap::with_capacity(vocabulary.len());
        for (rank, (label, subgroup)) in vocabulary.iter().enumerate() {
            entries.entry(normalize_label(label)).or_insert(LabelMatch {
                subgroup: *subgroup,
                rank,
            });
        }
        Self { entries }
    }

    /// Map a raw source label to its subgroup, if the vocabulary knows it.
    pub fn lookup(&self, raw: &str) -> Option<Subgroup> {
        self.classify(raw).map(|m| m.subgroup)
    }

    /// Like [`Self::lookup`], keeping the alias rank.
    pub fn classify(&self, raw: &str) -> Option<LabelMatch> {
        self.entries.get(&normalize_label(raw)).copied()
    }
}

fn normalize_label(raw: &str) -> String {
    raw.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}
