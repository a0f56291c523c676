//! Unified loading entrypoint.
//!
//! Most callers should use [`load_raw_table`] for a single file or [`load_raw_source`] to
//! assemble one year's [`RawSource`] from several files.
//!
//! - If [`LoadOptions::format`] is `None`, the format is inferred from the file extension.
//! - If a [`PipelineObserver`] is provided, success/failure/alerts are reported to it.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::{EnrollmentError, EnrollmentResult};
use crate::observability::{report_failure, PipelineContext, PipelineObserver, PipelineStats, Severity};
use crate::types::{RawSource, RawTable, TableRole};

use super::csv;

/// Supported source file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    /// Comma-separated values.
    Csv,
    /// Spreadsheet/workbook formats (feature-gated behind `excel`).
    Excel,
}

impl SourceFormat {
    /// Parse a format from a file extension (case-insensitive).
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "csv" => Some(Self::Csv),
            "xlsx" | "xls" | "xlsm" | "xlsb" | "ods" => Some(Self::Excel),
            _ => None,
        }
    }
}

/// Options controlling loading.
///
/// Use [`Default`] for common cases.
#[derive(Clone)]
pub struct LoadOptions {
    /// If `None`, auto-detect format from file extension.
    pub format: Option<SourceFormat>,
    /// Worksheet to read from a workbook; `None` reads the first sheet.
    pub sheet: Option<String>,
    /// Optional observer for logging/alerts.
    pub observer: Option<Arc<dyn PipelineObserver>>,
    /// Severity threshold at which `on_alert` is invoked.
    pub alert_at_or_above: Severity,
}

impl fmt::Debug for LoadOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadOptions")
            .field("format", &self.format)
            .field("sheet", &self.sheet)
            .field("observer_set", &self.observer.is_some())
            .field("alert_at_or_above", &self.alert_at_or_above)
            .finish()
    }
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            format: None,
            sheet: None,
            observer: None,
            alert_at_or_above: Severity::Critical,
        }
    }
}

/// Load one file into a string-faithful [`RawTable`].
///
/// When an observer is configured, this function reports:
///
/// - `on_success` on success, with row count stats
/// - `on_failure` on failure, with a computed severity
/// - `on_alert` on failure when the computed severity is >= `options.alert_at_or_above`
///
/// # Examples
///
/// ```no_run
/// use ky_enrollment::ingestion::{load_raw_table, LoadOptions};
///
/// # fn main() -> Result<(), ky_enrollment::EnrollmentError> {
/// let table = load_raw_table("enrollment_2024.csv", &LoadOptions::default())?;
/// println!("rows={}", table.row_count());
/// # Ok(())
/// # }
/// ```
pub fn load_raw_table(path: impl AsRef<Path>, options: &LoadOptions) -> EnrollmentResult<RawTable> {
    let path = path.as_ref();
    let fmt = match options.format {
        Some(f) => f,
        None => infer_format_from_path(path)?,
    };

    let result = match fmt {
        SourceFormat::Csv => csv::read_raw_csv_from_path(path),
        SourceFormat::Excel => load_excel_dispatch(path, options.sheet.as_deref()),
    };

    if let Some(obs) = options.observer.as_deref() {
        let ctx = PipelineContext::Load {
            path: path.to_path_buf(),
            format: fmt,
        };
        match &result {
            Ok(t) => obs.on_success(
                &ctx,
                PipelineStats {
                    rows: t.row_count(),
                    fields_not_found: 0,
                },
            ),
            Err(e) => report_failure(obs, &ctx, options.alert_at_or_above, e),
        }
    }

    result
}

/// Load every `(role, path)` pair and assemble one year's [`RawSource`].
///
/// The era tag is validated here so a typo fails before any file is read.
///
/// ```no_run
/// use ky_enrollment::ingestion::{load_raw_source, LoadOptions};
/// use ky_enrollment::types::TableRole;
///
/// # fn main() -> Result<(), ky_enrollment::EnrollmentError> {
/// let source = load_raw_source(
///     "mid-long",
///     &[
///         (TableRole::Primary, "primary_enrollment_2015.csv"),
///         (TableRole::Secondary, "secondary_enrollment_2015.csv"),
///     ],
///     &LoadOptions::default(),
/// )?;
/// let wide = ky_enrollment::process(&source, 2015)?;
/// # Ok(())
/// # }
/// ```
pub fn load_raw_source<P: AsRef<Path>>(
    era: &str,
    tables: &[(TableRole, P)],
    options: &LoadOptions,
) -> EnrollmentResult<RawSource> {
    let era = crate::types::Era::from_tag(era)?;
    let mut source = RawSource::new(era.as_tag());
    for (role, path) in tables {
        source = source.with_table(*role, load_raw_table(path, options)?);
    }
    Ok(source)
}

fn infer_format_from_path(path: &Path) -> EnrollmentResult<SourceFormat> {
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .ok_or_else(|| EnrollmentError::SchemaMismatch {
            message: format!(
                "cannot infer format: path has no extension ({})",
                path.display()
            ),
        })?;

    SourceFormat::from_extension(ext).ok_or_else(|| EnrollmentError::SchemaMismatch {
        message: format!(
            "cannot infer format from extension '{ext}' for path ({})",
            path.display()
        ),
    })
}

fn load_excel_dispatch(path: &Path, sheet: Option<&str>) -> EnrollmentResult<RawTable> {
    // Avoid unused warnings when the feature is off.
    let _ = (path, sheet);

    #[cfg(feature = "excel")]
    {
        super::excel::read_raw_excel_from_path(path, sheet)
    }

    #[cfg(not(feature = "excel"))]
    {
        Err(EnrollmentError::SchemaMismatch {
            message: "excel loading not enabled (enable cargo feature 'excel')".to_string(),
        })
    }
}

/// An owned load request, for callers that queue loading work.
#[derive(Debug, Clone)]
pub struct LoadRequest {
    /// Path to the input file.
    pub path: PathBuf,
    /// Options controlling loading.
    pub options: LoadOptions,
}

impl LoadRequest {
    /// Execute the request by calling [`load_raw_table`].
    pub fn run(&self) -> EnrollmentResult<RawTable> {
        load_raw_table(&self.path, &self.options)
    }
}
