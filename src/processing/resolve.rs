//! Column resolution: canonical field → concrete source column.
//!
//! Each era layout supplies, per canonical field, an ordered list of case-insensitive
//! anchored patterns. [`resolve_column`] walks the patterns in priority order and, for each,
//! scans every available column; the first hit wins. Nothing is scored or combined.

use regex::{Regex, RegexBuilder};

/// Priority-ordered match patterns for one canonical field.
#[derive(Debug, Clone)]
pub struct ColumnPatterns {
    field: &'static str,
    patterns: Vec<Regex>,
}

impl ColumnPatterns {
    /// Compile `sources` (highest priority first) for `field`.
    ///
    /// # Panics
    ///
    /// Panics if a pattern is not a valid regular expression. Pattern tables are static
    /// data, so this only fires on a programming error.
    pub fn new(field: &'static str, sources: &[&str]) -> Self {
        let patterns = sources
            .iter()
            .map(|src| {
                RegexBuilder::new(src)
                    .case_insensitive(true)
                    .build()
                    .unwrap_or_else(|e| panic!("invalid column pattern for '{field}': {e}"))
            })
            .collect();
        Self { field, patterns }
    }

    /// Canonical name of the field these patterns resolve.
    pub fn field(&self) -> &'static str {
        self.field
    }

    pub fn patterns(&self) -> &[Regex] {
        &self.patterns
    }
}

/// A canonical field the resolver could not locate in a table.
///
/// Not an error: the field is populated as missing and processing continues. Instances are
/// reported to [`crate::observability::PipelineObserver::on_field_not_found`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldNotFound {
    /// Role of the table that was searched (e.g. `combined`).
    pub table: String,
    /// Canonical field name.
    pub field: &'static str,
}

/// Strip whitespace and a leading UTF-8 BOM from a header cell.
pub fn clean_header(header: &str) -> &str {
    header.trim_start_matches('\u{feff}').trim()
}

/// Returns the index of the first column matching `patterns`, honoring pattern priority.
pub fn resolve_column<S: AsRef<str>>(available: &[S], patterns: &ColumnPatterns) -> Option<usize> {
    patterns.patterns().iter().find_map(|re| {
        available
            .iter()
            .position(|name| re.is_match(clean_header(name.as_ref())))
    })
}

/// Same as [`resolve_column`] but returns the matched column name.
pub fn resolve_column_name<'a, S: AsRef<str>>(
    available: &'a [S],
    patterns: &ColumnPatterns,
) -> Option<&'a str> {
    resolve_column(available, patterns).map(|idx| available[idx].as_ref())
}
