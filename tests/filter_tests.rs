mod common;

use common::day;
use rattendance::errors::{AppError, ErrorKind};
use rattendance::export::ExportFormat;
use rattendance::models::{DateRange, Filter};

#[test]
fn test_range_year_month_day() {
    let y = DateRange::parse("2025").unwrap().unwrap();
    assert_eq!((y.start, y.end), (day(2025, 1, 1), day(2025, 12, 31)));

    let m = DateRange::parse("2024-02").unwrap().unwrap();
    assert_eq!((m.start, m.end), (day(2024, 2, 1), day(2024, 2, 29)));

    let d = DateRange::parse("2025-06-18").unwrap().unwrap();
    assert_eq!((d.start, d.end), (day(2025, 6, 18), day(2025, 6, 18)));
}

#[test]
fn test_range_intervals() {
    let r = DateRange::parse("2025-06:2025-08").unwrap().unwrap();
    assert_eq!((r.start, r.end), (day(2025, 6, 1), day(2025, 8, 31)));

    let r = DateRange::parse("2024:2025").unwrap().unwrap();
    assert_eq!((r.start, r.end), (day(2024, 1, 1), day(2025, 12, 31)));

    let r = DateRange::parse("2025-12-01:2025-12-31").unwrap().unwrap();
    assert_eq!(r.end, day(2025, 12, 31));
}

#[test]
fn test_range_all_means_no_range() {
    assert_eq!(DateRange::parse("all").unwrap(), None);
    assert_eq!(DateRange::parse(" ALL ").unwrap(), None);
}

#[test]
fn test_range_rejects_bad_input() {
    for bad in ["", "2025-13", "2025-02-30", "25", "2025-06:2025", "2025-09:2025-01", "abcd"] {
        let err = DateRange::parse(bad).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation, "input {bad:?}");
    }
}

#[test]
fn test_range_new_requires_order() {
    assert!(matches!(
        DateRange::new(day(2025, 9, 2), day(2025, 9, 1)),
        Err(AppError::InvalidDate(_))
    ));
    assert!(DateRange::new(day(2025, 9, 1), day(2025, 9, 1)).is_ok());
}

#[test]
fn test_filter_without_scope_is_invalid() {
    let err = Filter::new("   ").validate().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert!(err.to_string().contains("no scope selected"));

    assert!(Filter::new("B1").validate().is_ok());
}

#[test]
fn test_filter_query_pairs() {
    let range = DateRange::new(day(2025, 9, 1), day(2025, 9, 30)).unwrap();
    let f = Filter::new(" B1 ")
        .with_range(Some(range))
        .with_format(ExportFormat::Pdf);

    assert_eq!(f.scope_id, "B1");
    assert_eq!(f.export_format, Some(ExportFormat::Pdf));
    assert_eq!(
        f.query_pairs(),
        vec![
            ("scope", "B1".to_string()),
            ("start", "2025-09-01".to_string()),
            ("end", "2025-09-30".to_string()),
        ]
    );

    assert_eq!(Filter::new("B1").query_pairs().len(), 1);
}

#[test]
fn test_filters_differ_by_range() {
    let a = Filter::new("B1");
    let b = Filter::new("B1").with_range(DateRange::parse("2025").unwrap());
    assert_ne!(a, b);
    assert_eq!(a, Filter::new("B1"));
}
