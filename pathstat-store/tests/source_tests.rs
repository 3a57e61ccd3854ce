use chrono::{TimeZone, Utc};
use pathstat_core::entry::TimeWindow;
use pathstat_store::{ExportSource, LogQuery, LogSource, StoreError, TextSource};
use std::fs;

// =============================================================================
// Helper Functions
// =============================================================================

/// 2023-01-01 00:00:00Z .. 2023-01-01 01:00:00Z in epoch milliseconds.
const WINDOW_START_MS: i64 = 1_672_531_200_000;
const WINDOW_END_MS: i64 = 1_672_534_800_000;

fn query(keywords: &[&str]) -> LogQuery {
    let window = TimeWindow::new(
        Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap(),
        Utc.with_ymd_and_hms(2023, 1, 1, 1, 0, 0).unwrap(),
    )
    .unwrap();
    LogQuery::new(window, keywords.iter().map(|k| k.to_string()).collect())
}

fn page(events: &[(&str, &str, i64)], next_token: Option<&str>) -> String {
    let events: Vec<_> = events
        .iter()
        .map(|(id, message, ts)| serde_json::json!({"eventId": id, "message": message, "timestamp": ts}))
        .collect();
    serde_json::json!({"events": events, "nextToken": next_token}).to_string()
}

// =============================================================================
// Export Pages
// =============================================================================

#[test]
fn test_export_single_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("events.json");
    fs::write(
        &path,
        page(
            &[
                ("e1", "Started GET \"/\" for 127.0.0.1 at 2023-01-01 09:00:00 +0900 [a]", WINDOW_START_MS),
                ("e2", "Completed 200 OK in 5ms [a]", WINDOW_START_MS + 5),
            ],
            Some("remote-token"),
        ),
    )
    .unwrap();

    let source = ExportSource::open(&path).unwrap();
    assert_eq!(source.page_count(), 1);

    let records = source.fetch_all(&query(&[])).unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].identifier, "e1");
    assert_eq!(records[1].timestamp.timestamp_millis(), WINDOW_START_MS + 5);
}

#[test]
fn test_export_window_is_inclusive() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("events.json");
    fs::write(
        &path,
        page(
            &[
                ("before", "Started x", WINDOW_START_MS - 1),
                ("first", "Started x", WINDOW_START_MS),
                ("last", "Started x", WINDOW_END_MS),
                ("after", "Started x", WINDOW_END_MS + 1),
            ],
            None,
        ),
    )
    .unwrap();

    let records = ExportSource::open(&path).unwrap().fetch_all(&query(&[])).unwrap();
    let ids: Vec<_> = records.iter().map(|r| r.identifier.as_str()).collect();
    assert_eq!(ids, vec!["first", "last"]);
}

#[test]
fn test_export_keyword_filter() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("events.json");
    fs::write(
        &path,
        page(
            &[
                ("1", "Started GET \"/\"", WINDOW_START_MS),
                ("2", "Processing by HomeController#index", WINDOW_START_MS),
                ("3", "Completed 200 OK in 1ms", WINDOW_START_MS),
            ],
            None,
        ),
    )
    .unwrap();

    let records = ExportSource::open(&path)
        .unwrap()
        .fetch_all(&query(&["Started", "Completed"]))
        .unwrap();
    let ids: Vec<_> = records.iter().map(|r| r.identifier.as_str()).collect();
    assert_eq!(ids, vec!["1", "3"]);
}

#[test]
fn test_export_skips_incomplete_events() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("events.json");
    fs::write(
        &path,
        serde_json::json!({
            "events": [
                {"eventId": "ok", "message": "Started", "timestamp": WINDOW_START_MS},
                {"message": "Started", "timestamp": WINDOW_START_MS},
                {"eventId": "no-message", "timestamp": WINDOW_START_MS},
            ]
        })
        .to_string(),
    )
    .unwrap();

    let records = ExportSource::open(&path).unwrap().fetch_all(&query(&[])).unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].identifier, "ok");
}

#[test]
fn test_export_directory_pages_in_name_order() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("page-002.json"), page(&[("b", "Completed", WINDOW_START_MS)], None)).unwrap();
    fs::write(dir.path().join("page-001.json"), page(&[("a", "Started", WINDOW_START_MS)], None)).unwrap();
    fs::write(dir.path().join("notes.txt"), "not a page").unwrap();

    let source = ExportSource::open(dir.path()).unwrap();
    assert_eq!(source.page_count(), 2);

    let first = source.fetch_page(&query(&[]), None).unwrap();
    assert_eq!(first.next_token.as_deref(), Some("page-002.json"));

    let records = source.fetch_all(&query(&[])).unwrap();
    let ids: Vec<_> = records.iter().map(|r| r.identifier.as_str()).collect();
    assert_eq!(ids, vec!["a", "b"]);
}

#[test]
fn test_export_unknown_token() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("events.json");
    fs::write(&path, page(&[], None)).unwrap();

    let err = ExportSource::open(&path)
        .unwrap()
        .fetch_page(&query(&[]), Some("missing.json"))
        .unwrap_err();
    assert!(matches!(err, StoreError::UnknownPageToken(_)));
}

#[test]
fn test_export_empty_directory_is_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = ExportSource::open(dir.path()).err().unwrap();
    assert!(matches!(err, StoreError::EmptyExport(_)));
}

#[test]
fn test_export_missing_path_is_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = ExportSource::open(&dir.path().join("nope.json")).err().unwrap();
    assert!(matches!(err, StoreError::Io { .. }));
}

#[test]
fn test_export_malformed_page_is_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("events.json");
    fs::write(&path, "{ not json").unwrap();

    let err = ExportSource::open(&path).unwrap().fetch_all(&query(&[])).unwrap_err();
    assert!(matches!(err, StoreError::Json { .. }));
}

// =============================================================================
// Plain Text
// =============================================================================

#[test]
fn test_text_lines_become_records() {
    let source = TextSource::from_text(
        "Started GET \"/\" for 127.0.0.1 at 2023-01-01 09:00:00 +0900 [a]\n\n   \nCompleted 200 OK in 5ms [a]\n",
    );
    let q = query(&[]);
    let records = source.fetch_all(&q).unwrap();

    assert_eq!(records.len(), 2);
    assert_eq!(records[0].identifier, "1");
    assert_eq!(records[1].identifier, "4");
    assert!(records.iter().all(|r| r.timestamp == q.window.start));
}

#[test]
fn test_text_keyword_filter() {
    let source = TextSource::from_text("Started a\nRendering b\nCompleted c\n");
    let records = source.fetch_all(&query(&["Started", "Completed"])).unwrap();
    let texts: Vec<_> = records.iter().map(|r| r.text.as_str()).collect();
    assert_eq!(texts, vec!["Started a", "Completed c"]);
}

#[test]
fn test_text_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("production.log");
    fs::write(&path, "Started a\nCompleted b\n").unwrap();

    let source = TextSource::from_path(&path);
    assert_eq!(source.name(), path.display().to_string());
    assert_eq!(source.fetch_all(&query(&[])).unwrap().len(), 2);
}

#[test]
fn test_text_is_single_page() {
    let source = TextSource::from_text("Started a\n");
    let page = source.fetch_page(&query(&[]), None).unwrap();
    assert!(page.next_token.is_none());

    let err = source.fetch_page(&query(&[]), Some("2")).unwrap_err();
    assert!(matches!(err, StoreError::UnknownPageToken(_)));
}

#[test]
fn test_text_missing_file_is_error() {
    let dir = tempfile::tempdir().unwrap();
    let source = TextSource::from_path(&dir.path().join("missing.log"));
    assert!(matches!(source.fetch_all(&query(&[])), Err(StoreError::Io { .. })));
}
