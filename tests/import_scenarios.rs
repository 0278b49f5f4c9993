use acceltrim::display::{downsample_indexed, ViewWindow};
use acceltrim::edit::{apply, EditPolicy, IndexRange, Selection};
use acceltrim::error::Rejection;
use acceltrim::export::render_export;
use acceltrim::ingest::{import, import_text, ImportedFile, RawLog};
use acceltrim::config::{AppConfig, TrimConfig};
use chrono::{NaiveDate, NaiveDateTime};

const THREE_ROWS: &str = "Sampling rate: 100\r\n\
    Date: 2024-01-01 00:00:00\r\n\
    DATE_FORMAT: yyyy-MM-dd HH:mm:ss\r\n\
    Device: AX 3D\r\n\
    TimeStamp;Ch_Z;Ch_X;Ch_Y\r\n\
    0;0.1;0.2;0.3\r\n\
    1;0.4;0.5;0.6\r\n\
    2;0.7;0.8;0.9\r\n";

fn at_ms(ms: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 1)
        .unwrap()
        .and_hms_milli_opt(0, 0, 0, ms)
        .unwrap()
}

#[test]
fn three_row_log_gets_ten_millisecond_steps() {
    let series = import(THREE_ROWS).unwrap();
    assert_eq!(series.timestamps(), &[at_ms(0), at_ms(10), at_ms(20)]);
    assert_eq!(series.z(), &[0.1, 0.4, 0.7]);
    assert_eq!(series.x().len(), 3);
    assert_eq!(series.y().len(), 3);
}

#[test]
fn cutting_the_middle_row() {
    let mut series = import(THREE_ROWS).unwrap();
    assert_eq!(series.cut_range(1, 1), Some(IndexRange::new(1, 1)));
    assert_eq!(series.len(), 2);
    assert_eq!(series.timestamps(), &[at_ms(0), at_ms(20)]);
    assert_eq!(series.removed_ranges(), &[IndexRange::new(1, 1)]);
}

#[test]
fn rejections_are_distinct() {
    assert_eq!(import("Device: AX 3D\n0;1;2;3").unwrap_err(), Rejection::FormatRejected);
    let no_rate = THREE_ROWS.replace("Sampling rate: 100", "Sampling rate: 0");
    assert!(matches!(import(&no_rate), Err(Rejection::HeaderInvalid { .. })));
}

#[test]
fn large_series_downsamples_to_bound() {
    let mut text = String::from("Device: AX 3D\nDate: 2024-01-01 00:00:00\nSampling rate: 1000\nTimeStamp;Z;X;Y\n");
    for i in 0..10_000 {
        let z = if i == 4321 { 50.0 } else { (i as f64 / 100.0).sin() };
        text.push_str(&format!("{i};{z};0,5;-0,5\n"));
    }
    let imported = import_text(&text).unwrap();
    assert_eq!(imported.report.kept, 10_000);

    let points = downsample_indexed(imported.series.z(), 100);
    assert!(points.len() <= 202);
    assert_eq!(points.first().map(|p| p.0), Some(0.0));
    assert_eq!(points.last().map(|p| p.0), Some(9999.0));
    assert!(points.contains(&(4321.0, 50.0)));

    let view = ViewWindow::full(&imported.series)
        .rebuild(&imported.series, &AppConfig::default().view)
        .unwrap();
    assert!(view.z.contains(&(4321.0, 50.0)));
    assert_eq!(view.x[0], (0.0, 0.5));
}

#[test]
fn keeping_the_middle_row_then_exporting() {
    let raw = RawLog::from_text("run.txt", THREE_ROWS);
    let mut file = ImportedFile::from_raw(raw, &TrimConfig::default()).unwrap();
    let removed = apply(&Selection::Index { min: 1.0, max: 1.0 }, EditPolicy::Keep, &mut file.series);
    assert_eq!(removed, vec![IndexRange::new(2, 2), IndexRange::new(0, 0)]);
    let text = render_export(&file);
    assert!(text.ends_with("TimeStamp;Ch_Z;Ch_X;Ch_Y\r\n2024-01-01 00:00:00;0.4;0.5;0.6\r\n"));
    file.series.reset_cuts();
    assert_eq!(file.series.working(), file.series.original());
}
