use std::sync::{Arc, Mutex};

use ky_enrollment::execution::{
    ExecutionEngine, ExecutionEvent, ExecutionObserver, ExecutionOptions, TracingExecutionObserver, YearRequest,
};
use ky_enrollment::ingestion::{load_raw_source, LoadOptions};
use ky_enrollment::types::{EntityType, Era, RawSource, TableRole};
use ky_enrollment::EnrollmentError;

fn requests() -> Vec<YearRequest> {
    let opts = LoadOptions::default();
    let legacy = load_raw_source(
        "legacy-wide",
        &[(TableRole::DistrictSheet, "tests/fixtures/legacy_district_2005.csv")],
        &opts,
    )
    .unwrap();
    let mid = load_raw_source(
        "mid-long",
        &[
            (TableRole::Primary, "tests/fixtures/mid_long_primary_2015.csv"),
            (TableRole::Secondary, "tests/fixtures/mid_long_secondary_2015.csv"),
        ],
        &opts,
    )
    .unwrap();
    let current = load_raw_source(
        "current-long",
        &[(TableRole::Combined, "tests/fixtures/current_long_2024.csv")],
        &opts,
    )
    .unwrap();
    vec![
        YearRequest::new(legacy, 2005),
        YearRequest::new(mid, 2015),
        YearRequest::new(current, 2024),
    ]
}

#[derive(Default)]
struct Events(Mutex<Vec<String>>);

impl ExecutionObserver for Events {
    fn on_event(&self, event: &ExecutionEvent) {
        let tag = match event {
            ExecutionEvent::RunStarted { .. } => "run-started".to_string(),
            ExecutionEvent::YearFinished { end_year, .. } => format!("finished-{end_year}"),
            ExecutionEvent::YearFailed { end_year, .. } => format!("failed-{end_year}"),
            ExecutionEvent::RunFinished { .. } => "run-finished".to_string(),
            _ => return,
        };
        self.0.lock().unwrap().push(tag);
    }
}

#[test]
fn multi_year_run_keeps_request_order() {
    let engine = ExecutionEngine::new(ExecutionOptions {
        num_threads: Some(3),
        max_in_flight_years: 2,
        ..Default::default()
    })
    .unwrap();
    let out = engine.process_years(&requests()).unwrap();

    let years: Vec<(i32, Era, usize)> = out.iter().map(|o| (o.end_year, o.era, o.wide.len())).collect();
    assert_eq!(
        years,
        vec![(2005, Era::LegacyWide, 3), (2015, Era::MidLong, 5), (2024, Era::CurrentLong, 4)]
    );
    for o in &out {
        assert_eq!(o.wide[0].entity_type, EntityType::State);
        assert!(o.wide.iter().all(|r| r.end_year == o.end_year));
    }

    let m = engine.metrics().snapshot();
    assert_eq!(m.years_finished, 3);
    assert_eq!(m.rows_emitted, 12);
    assert!(m.max_active_years <= 2);
}

#[test]
fn parallel_matches_sequential() {
    let reqs = requests();
    let sequential: Vec<_> = reqs
        .iter()
        .map(|r| ky_enrollment::process(&r.source, r.end_year).unwrap())
        .collect();
    let engine = ExecutionEngine::new(ExecutionOptions::default()).unwrap();
    let parallel: Vec<_> = engine
        .process_years(&reqs)
        .unwrap()
        .into_iter()
        .map(|o| o.wide)
        .collect();
    assert_eq!(sequential, parallel);
}

#[test]
fn tidy_years_concatenates_in_order() {
    let engine = ExecutionEngine::new(ExecutionOptions::default())
        .unwrap()
        .with_observer(Arc::new(TracingExecutionObserver));
    let rows = engine.tidy_years(&requests()).unwrap();
    assert_eq!(rows.len(), (3 + 5 + 4) * 27);
    assert_eq!(rows.first().map(|r| r.end_year), Some(2005));
    assert_eq!(rows.last().map(|r| r.end_year), Some(2024));
}

#[test]
fn failing_year_is_reported_and_returned() {
    let mut reqs = requests();
    reqs.insert(1, YearRequest::new(RawSource::new("mid-long"), 2013));
    let events = Arc::new(Events::default());
    let engine = ExecutionEngine::new(ExecutionOptions::default())
        .unwrap()
        .with_observer(events.clone());

    let err = engine.process_years(&reqs).unwrap_err();
    assert!(matches!(err, EnrollmentError::NoUsableData { end_year: 2013, .. }));

    let m = engine.metrics().snapshot();
    assert_eq!((m.years_finished, m.years_failed), (3, 1));

    let mut seen = events.0.lock().unwrap().clone();
    assert_eq!(seen.first().map(String::as_str), Some("run-started"));
    assert_eq!(seen.last().map(String::as_str), Some("run-finished"));
    seen.sort();
    assert!(seen.contains(&"failed-2013".to_string()));
    assert!(seen.contains(&"finished-2024".to_string()));
}
