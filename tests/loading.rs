use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

use ky_enrollment::error::EnrollmentError;
use ky_enrollment::ingestion::csv::{read_raw_csv_from_path, read_raw_csv_from_reader};
use ky_enrollment::ingestion::{load_raw_source, load_raw_table, LoadOptions, LoadRequest, SourceFormat};
use ky_enrollment::observability::{
    CompositeObserver, FileObserver, PipelineContext, PipelineObserver, PipelineStats, Severity, TracingObserver,
};
use ky_enrollment::types::TableRole;

fn tmp_file(ext: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    std::env::temp_dir().join(format!("ky-enrollment-loading-{nanos}.{ext}"))
}

#[derive(Default)]
struct Recorder {
    events: Mutex<Vec<String>>,
}

impl PipelineObserver for Recorder {
    fn on_success(&self, _ctx: &PipelineContext, stats: PipelineStats) {
        self.events.lock().unwrap().push(format!("ok rows={}", stats.rows));
    }

    fn on_failure(&self, _ctx: &PipelineContext, severity: Severity, _error: &EnrollmentError) {
        self.events.lock().unwrap().push(format!("fail {severity:?}"));
    }

    fn on_alert(&self, _ctx: &PipelineContext, severity: Severity, _error: &EnrollmentError) {
        self.events.lock().unwrap().push(format!("alert {severity:?}"));
    }
}

#[test]
fn csv_fixture_loads_verbatim() {
    let t = read_raw_csv_from_path("tests/fixtures/current_long_2024.csv").unwrap();
    assert_eq!(t.headers.len(), 22);
    assert_eq!(t.headers[1], "DISTRICT NUMBER");
    assert_eq!(t.row_count(), 11);
    assert_eq!(t.cell(1, 1), "001");
    assert_eq!(t.cell(1, 7), "2,612");
    assert_eq!(t.cell(4, 7), "*");
}

#[test]
fn legacy_fixture_skips_blank_lines() {
    let t = read_raw_csv_from_path("tests/fixtures/legacy_district_2005.csv").unwrap();
    assert_eq!(t.row_count(), 3);
    assert_eq!(t.cell(2, 1), "State Total");
}

#[test]
fn reader_entrypoint_accepts_ragged_rows() {
    let input = "DIST_NUMBER,DISAGG_LABEL,TOTAL_ENROLLMENT\n12,TST\n";
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(input.as_bytes());
    let t = read_raw_csv_from_reader(&mut rdr).unwrap();
    assert_eq!(t.cell(0, 2), "");
}

#[test]
fn format_override_reads_extensionless_file() {
    let path = tmp_file("data");
    std::fs::write(&path, "DIST_NO,TOTAL\n1,10\n").unwrap();
    let opts = LoadOptions {
        format: Some(SourceFormat::Csv),
        ..Default::default()
    };
    let t = load_raw_table(&path, &opts).unwrap();
    assert_eq!(t.row_count(), 1);
    let _ = std::fs::remove_file(path);
}

#[test]
fn observer_sees_success_and_critical_missing_file() {
    let rec = Arc::new(Recorder::default());
    let opts = LoadOptions {
        observer: Some(rec.clone()),
        alert_at_or_above: Severity::Critical,
        ..Default::default()
    };

    load_raw_table("tests/fixtures/mid_long_primary_2015.csv", &opts).unwrap();
    let err = load_raw_table("tests/fixtures/does_not_exist.csv", &opts).unwrap_err();
    assert!(matches!(err, EnrollmentError::Csv(_) | EnrollmentError::Io(_)));

    let events = rec.events.lock().unwrap().clone();
    assert_eq!(
        events,
        vec!["ok rows=5".to_string(), "fail Critical".to_string(), "alert Critical".to_string()]
    );
}

#[test]
fn file_observer_appends_lines() {
    let log = tmp_file("log");
    let opts = LoadOptions {
        observer: Some(Arc::new(FileObserver::new(&log))),
        ..Default::default()
    };
    load_raw_table("tests/fixtures/mid_long_secondary_2015.csv", &opts).unwrap();
    let _ = load_raw_table("tests/fixtures/missing.csv", &opts);

    let text = std::fs::read_to_string(&log).unwrap();
    let records: Vec<serde_json::Value> = text.lines().map(|l| serde_json::from_str(l).unwrap()).collect();
    assert_eq!(records.len(), 3);
    assert_eq!(records[0]["event"], "success");
    assert!(records[0]["context"].as_str().unwrap().starts_with("load format=Csv"));
    assert_eq!(records[0]["rows"], 3);
    assert_eq!(records[1]["event"], "failure");
    assert_eq!(records[1]["severity"], "Critical");
    assert_eq!(records[2]["event"], "alert");
    assert_eq!(records[2]["severity"], "Critical");
    let _ = std::fs::remove_file(log);
}

#[test]
fn load_raw_source_registers_roles() {
    let source = load_raw_source(
        "mid-long",
        &[
            (TableRole::Primary, "tests/fixtures/mid_long_primary_2015.csv"),
            (TableRole::Secondary, "tests/fixtures/mid_long_secondary_2015.csv"),
        ],
        &LoadOptions::default(),
    )
    .unwrap();
    assert_eq!(source.era, "mid-long");
    assert_eq!(source.table(TableRole::Primary).map(|t| t.row_count()), Some(5));
    assert_eq!(source.table(TableRole::Secondary).map(|t| t.row_count()), Some(3));
    assert!(source.table(TableRole::Combined).is_none());
}

#[test]
fn composite_fans_out_and_alert_threshold_applies() {
    let a = Arc::new(Recorder::default());
    let b = Arc::new(Recorder::default());
    let composite = CompositeObserver::new(vec![a.clone(), b.clone(), Arc::new(TracingObserver)]);
    let request = LoadRequest {
        path: PathBuf::from("tests/fixtures/no_such_year.csv"),
        options: LoadOptions {
            observer: Some(Arc::new(composite)),
            alert_at_or_above: Severity::Error,
            ..Default::default()
        },
    };
    assert!(request.run().is_err());

    for rec in [&a, &b] {
        let events = rec.events.lock().unwrap().clone();
        assert_eq!(events, vec!["fail Critical".to_string(), "alert Critical".to_string()]);
    }
}

#[cfg(not(feature = "excel"))]
#[test]
fn excel_without_feature_is_a_schema_mismatch() {
    let err = load_raw_table("district_2005.xls", &LoadOptions::default()).unwrap_err();
    assert!(err.to_string().contains("excel loading not enabled"));
}
