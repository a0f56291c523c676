#![cfg(feature = "excel_test_writer")]

use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use ky_enrollment::canonical::CountField;
use ky_enrollment::ingestion::excel::read_raw_excel_from_path;
use ky_enrollment::ingestion::{load_raw_source, LoadOptions};
use ky_enrollment::process;
use ky_enrollment::types::{EntityType, TableRole};

fn tmp_file(name: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    std::env::temp_dir().join(format!("ky-enrollment-{name}-{nanos}.xlsx"))
}

fn write_legacy_workbook(path: &PathBuf) {
    use rust_xlsxwriter::Workbook;

    let mut wb = Workbook::new();
    let ws = wb.add_worksheet();
    ws.set_name("Membership").unwrap();

    for (col, h) in ["DIST_NO", "DISTRICT NAME", "TOTAL MEMBERSHIP", "WHITE", "HISPANIC"]
        .iter()
        .enumerate()
    {
        ws.write_string(0, col as u16, *h).unwrap();
    }

    ws.write_number(1, 0, 1).unwrap();
    ws.write_string(1, 1, "Adair County").unwrap();
    ws.write_number(1, 2, 2612).unwrap();
    ws.write_number(1, 3, 2480).unwrap();
    ws.write_string(1, 4, "*").unwrap();

    ws.write_number(2, 0, 5).unwrap();
    ws.write_string(2, 1, "Allen County").unwrap();
    ws.write_number(2, 2, 3011).unwrap();
    ws.write_number(2, 3, 2900).unwrap();
    ws.write_number(2, 4, 51).unwrap();

    ws.write_number(4, 0, 999).unwrap();
    ws.write_string(4, 1, "State Total").unwrap();
    ws.write_number(4, 2, 5623).unwrap();

    wb.save(path).unwrap();
}

#[test]
fn workbook_cells_are_read_as_text() {
    let path = tmp_file("legacy");
    write_legacy_workbook(&path);

    let t = read_raw_excel_from_path(&path, Some("Membership")).unwrap();
    assert_eq!(t.headers[0], "DIST_NO");
    assert_eq!(t.row_count(), 3);
    assert_eq!(t.cell(0, 0), "1");
    assert_eq!(t.cell(0, 2), "2612");
    assert_eq!(t.cell(0, 4), "*");

    let _ = std::fs::remove_file(path);
}

#[test]
fn legacy_workbook_normalizes() {
    let path = tmp_file("legacy-process");
    write_legacy_workbook(&path);

    let source = load_raw_source(
        "legacy-wide",
        &[(TableRole::DistrictSheet, &path)],
        &LoadOptions::default(),
    )
    .unwrap();
    let rows = process(&source, 2005).unwrap();
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0].entity_type, EntityType::State);
    assert_eq!(rows[0].count(CountField::RowTotal), Some(5623));
    assert_eq!(rows[0].count(CountField::Hispanic), Some(51));

    let adair = &rows[1];
    assert_eq!(adair.district_id.as_deref(), Some("001"));
    assert_eq!(adair.count(CountField::White), Some(2480));
    assert_eq!(adair.count(CountField::Hispanic), None);

    let _ = std::fs::remove_file(path);
}

#[test]
fn missing_sheet_is_an_error() {
    let path = tmp_file("legacy-sheet");
    write_legacy_workbook(&path);
    let opts = LoadOptions {
        sheet: Some("Nope".to_string()),
        ..Default::default()
    };
    assert!(ky_enrollment::ingestion::load_raw_table(&path, &opts).is_err());
    let _ = std::fs::remove_file(path);
}
