//! Observer hooks for loading and processing outcomes.
//!
//! Callers attach a [`PipelineObserver`] through [`crate::ingestion::LoadOptions`] or
//! [`crate::processing::ProcessOptions`]. Failures are classified by [`severity_for_error`]
//! and forwarded to [`PipelineObserver::on_alert`] when they reach the configured threshold.

use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

use serde_json::{Value as JsonValue, json};
use tracing::{error, info, warn};

use crate::error::EnrollmentError;
use crate::ingestion::SourceFormat;
use crate::processing::FieldNotFound;

/// Severity classification used for observer callbacks and alerting thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    /// Informational event.
    Info,
    /// Warning-level event (non-fatal).
    Warning,
    /// Error-level event (operation failed).
    Error,
    /// Critical error (typically I/O or other infrastructure failures).
    Critical,
}

/// What the pipeline was doing when an event fired.
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineContext {
    /// Loading one raw table from disk.
    Load { path: PathBuf, format: SourceFormat },
    /// Normalizing one year's raw source. `era` is the source's tag as supplied.
    Process { era: String, end_year: i32 },
}

impl fmt::Display for PipelineContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Load { path, format } => {
                write!(f, "load format={format:?} path={}", path.display())
            }
            Self::Process { era, end_year } => write!(f, "process era={era} end_year={end_year}"),
        }
    }
}

/// Stats reported on success.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PipelineStats {
    /// Raw rows loaded, or canonical wide rows emitted (State row included).
    pub rows: usize,
    /// Canonical columns that could not be resolved.
    pub fields_not_found: usize,
}

/// Observer interface for pipeline outcomes.
pub trait PipelineObserver: Send + Sync {
    /// Called when a load or processing step succeeds.
    fn on_success(&self, _ctx: &PipelineContext, _stats: PipelineStats) {}

    /// Called when a step fails.
    fn on_failure(&self, _ctx: &PipelineContext, _severity: Severity, _error: &EnrollmentError) {}

    /// Called when a failure meets an alert threshold.
    ///
    /// Default behavior forwards to [`Self::on_failure`].
    fn on_alert(&self, ctx: &PipelineContext, severity: Severity, error: &EnrollmentError) {
        self.on_failure(ctx, severity, error)
    }

    /// Called once per canonical column a layout could not resolve.
    fn on_field_not_found(&self, _ctx: &PipelineContext, _missing: &FieldNotFound) {}
}

/// Classify an error for alerting.
pub fn severity_for_error(e: &EnrollmentError) -> Severity {
    match e {
        EnrollmentError::Io(_) => Severity::Critical,
        EnrollmentError::Csv(err) => match err.kind() {
            ::csv::ErrorKind::Io(_) => Severity::Critical,
            _ => Severity::Error,
        },
        EnrollmentError::Json(err) if err.is_io() => Severity::Critical,
        _ => Severity::Error,
    }
}

/// Report a failed step: `on_failure`, plus `on_alert` at or above `alert_at_or_above`.
pub(crate) fn report_failure(
    observer: &dyn PipelineObserver,
    ctx: &PipelineContext,
    alert_at_or_above: Severity,
    error: &EnrollmentError,
) {
    let sev = severity_for_error(error);
    observer.on_failure(ctx, sev, error);
    if sev >= alert_at_or_above {
        observer.on_alert(ctx, sev, error);
    }
}

/// An observer that fans out callbacks to a list of observers.
#[derive(Default)]
pub struct CompositeObserver {
    observers: Vec<Arc<dyn PipelineObserver>>,
}

impl CompositeObserver {
    /// Create a new composite observer from a list of observers.
    pub fn new(observers: Vec<Arc<dyn PipelineObserver>>) -> Self {
        Self { observers }
    }
}

impl fmt::Debug for CompositeObserver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositeObserver")
            .field("observers_len", &self.observers.len())
            .finish()
    }
}

impl PipelineObserver for CompositeObserver {
    fn on_success(&self, ctx: &PipelineContext, stats: PipelineStats) {
        for o in &self.observers {
            o.on_success(ctx, stats);
        }
    }

    fn on_failure(&self, ctx: &PipelineContext, severity: Severity, error: &EnrollmentError) {
        for o in &self.observers {
            o.on_failure(ctx, severity, error);
        }
    }

    fn on_alert(&self, ctx: &PipelineContext, severity: Severity, error: &EnrollmentError) {
        for o in &self.observers {
            o.on_alert(ctx, severity, error);
        }
    }

    fn on_field_not_found(&self, ctx: &PipelineContext, missing: &FieldNotFound) {
        for o in &self.observers {
            o.on_field_not_found(ctx, missing);
        }
    }
}

/// Emits every callback as a `tracing` event.
#[derive(Debug, Default)]
pub struct TracingObserver;

impl PipelineObserver for TracingObserver {
    fn on_success(&self, ctx: &PipelineContext, stats: PipelineStats) {
        info!(%ctx, rows = stats.rows, fields_not_found = stats.fields_not_found, "ok");
    }

    fn on_failure(&self, ctx: &PipelineContext, severity: Severity, error: &EnrollmentError) {
        warn!(%ctx, ?severity, %error, "failed");
    }

    fn on_alert(&self, ctx: &PipelineContext, severity: Severity, error: &EnrollmentError) {
        error!(%ctx, ?severity, %error, "ALERT");
    }

    fn on_field_not_found(&self, ctx: &PipelineContext, missing: &FieldNotFound) {
        warn!(%ctx, table = %missing.table, field = missing.field, "column not found");
    }
}

/// Writes pipeline events to a local file as JSON Lines.
///
/// Each line is one object with `ts_ms`, `event` and `context` keys plus the event's own
/// fields. The file is opened on the first event and kept open. I/O errors are dropped.
#[derive(Debug)]
pub struct FileObserver {
    path: PathBuf,
    file: Mutex<Option<File>>,
}

impl FileObserver {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            file: Mutex::new(None),
        }
    }

    fn record(&self, event: &str, ctx: &PipelineContext, fields: JsonValue) {
        let mut entry = json!({
            "ts_ms": epoch_millis(),
            "event": event,
            "context": ctx.to_string(),
        });
        if let (Some(obj), JsonValue::Object(extra)) = (entry.as_object_mut(), fields) {
            obj.extend(extra);
        }

        let Ok(mut slot) = self.file.lock() else { return };
        if slot.is_none() {
            *slot = OpenOptions::new().create(true).append(true).open(&self.path).ok();
        }
        if let Some(f) = slot.as_mut() {
            let mut line = entry.to_string();
            line.push('\n');
            let _ = f.write_all(line.as_bytes());
        }
    }
}

impl PipelineObserver for FileObserver {
    fn on_success(&self, ctx: &PipelineContext, stats: PipelineStats) {
        self.record(
            "success",
            ctx,
            json!({ "rows": stats.rows, "fields_not_found": stats.fields_not_found }),
        );
    }

    fn on_failure(&self, ctx: &PipelineContext, severity: Severity, error: &EnrollmentError) {
        self.record(
            "failure",
            ctx,
            json!({ "severity": format!("{severity:?}"), "error": error.to_string() }),
        );
    }

    fn on_alert(&self, ctx: &PipelineContext, severity: Severity, error: &EnrollmentError) {
        self.record(
            "alert",
            ctx,
            json!({ "severity": format!("{severity:?}"), "error": error.to_string() }),
        );
    }

    fn on_field_not_found(&self, ctx: &PipelineContext, missing: &FieldNotFound) {
        self.record(
            "field_not_found",
            ctx,
            json!({ "table": missing.table.as_str(), "field": missing.field }),
        );
    }
}

fn epoch_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Era;

    #[test]
    fn io_failures_are_critical() {
        let io = EnrollmentError::Io(std::io::Error::new(std::io::ErrorKind::NotFound, "gone"));
        assert_eq!(severity_for_error(&io), Severity::Critical);

        let era = EnrollmentError::UnrecognizedEra { tag: "x".to_string() };
        assert_eq!(severity_for_error(&era), Severity::Error);
        assert!(Severity::Critical > Severity::Error);
    }

    #[test]
    fn context_display_names_the_step() {
        let ctx = PipelineContext::Process {
            era: Era::MidLong.to_string(),
            end_year: 2015,
        };
        assert_eq!(ctx.to_string(), "process era=mid-long end_year=2015");
    }

    #[test]
    fn file_observer_writes_one_json_object_per_event() {
        let path = std::env::temp_dir().join(format!("ky-enrollment-observer-{}.jsonl", epoch_millis()));
        let obs = FileObserver::new(&path);
        let ctx = PipelineContext::Process {
            era: "current-long".to_string(),
            end_year: 2024,
        };
        obs.on_field_not_found(
            &ctx,
            &FieldNotFound {
                table: "combined".to_string(),
                field: "grade_k",
            },
        );
        obs.on_success(&ctx, PipelineStats { rows: 4, fields_not_found: 1 });

        let text = std::fs::read_to_string(&path).unwrap();
        let records: Vec<JsonValue> = text.lines().map(|l| serde_json::from_str(l).unwrap()).collect();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0]["event"], "field_not_found");
        assert_eq!(records[0]["table"], "combined");
        assert_eq!(records[0]["field"], "grade_k");
        assert_eq!(records[1]["event"], "success");
        assert_eq!(records[1]["context"], "process era=current-long end_year=2024");
        assert_eq!(records[1]["rows"], 4);
        assert!(records[1]["ts_ms"].as_u64().is_some());
        let _ = std::fs::remove_file(path);
    }
}
