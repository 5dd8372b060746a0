mod helpers;

use helpers::TestJournal;
use journal_mcp::error::JournalError;
use journal_mcp::fields::{query_fields, FieldQuery};
use journal_mcp::journal::types::MetaValue;

fn mood_journal() -> TestJournal {
    let journal = TestJournal::new();
    journal.write("2024/03/03.md", "---\ndate: 2024-03-03\nmood: 4-6\nanxiety: 2\n---\nRange.");
    journal.write("2024/03/01.md", "---\ndate: 2024-03-01\nmood: 7\nanxiety: 3\n---\nGood.");
    journal.write("2024/03/02.md", "---\ndate: 2024-03-02\nmood: '5 # meh'\n---\nOkay.");
    journal.write("2024/03/04.md", "---\ndate: 2024-03-04\nmood: tired\nanxiety: 4\n---\nLong day.");
    journal.write("2024/02/28.md", "---\ndate: 2024-02-28\nmood: 1\n---\nBefore range.");
    journal.write("notes/undated.md", "---\nmood: 9\n---\nNo date.");
    journal.write("notes/free.md", "Plain text, no frontmatter.");
    journal.write("notes/slash.md", "---\ndate: 03/05/2024\nmood: 9\n---\nWrong format.");
    journal
}

fn query(fields: &[&str], start: Option<&str>, end: Option<&str>, stats: bool, format: Option<&str>) -> FieldQuery {
    FieldQuery::parse(
        Some(fields.iter().map(|f| f.to_string()).collect()),
        &[],
        start,
        end,
        stats,
        format,
    )
    .unwrap()
}

#[test]
fn rows_are_dated_filtered_and_sorted() {
    let journal = mood_journal();
    let q = query(&["mood", "anxiety"], Some("2024-03-01"), Some("2024-03-31"), false, None);
    let report = query_fields(&journal.config(), &q).unwrap();

    assert_eq!(report.files_processed, 8);
    assert_eq!(report.records_found, 4);
    let dates: Vec<_> = report.data.iter().map(|r| r.date.as_str()).collect();
    assert_eq!(dates, ["2024-03-01", "2024-03-02", "2024-03-03", "2024-03-04"]);
    assert_eq!(report.data[0].file, "2024/03/01.md");
    assert_eq!(report.data[0].values["mood"], Some(MetaValue::Integer(7)));
    // inline comment dropped
    assert_eq!(report.data[1].values["mood"], Some(MetaValue::Text("5".into())));
    assert_eq!(report.data[1].values["anxiety"], None);

    let range = report.date_range.as_ref().unwrap();
    assert_eq!(range.start.as_deref(), Some("2024-03-01"));
    assert_eq!(range.end.as_deref(), Some("2024-03-31"));
    assert!(report.stats.is_none());
    assert!(report.csv_output.is_none());
}

#[test]
fn unbounded_query_includes_every_dated_entry() {
    let journal = mood_journal();
    let report = query_fields(&journal.config(), &query(&["mood"], None, None, false, None)).unwrap();
    assert_eq!(report.records_found, 5);
    assert_eq!(report.data[0].date, "2024-02-28");
    assert!(report.date_range.is_none());
}

#[test]
fn stats_cover_numeric_readings() {
    let journal = mood_journal();
    let q = query(&["mood", "anxiety", "energy"], Some("2024-03-01"), None, true, None);
    let report = query_fields(&journal.config(), &q).unwrap();
    let stats = report.stats.unwrap();

    let mood = &stats["mood"];
    assert_eq!(mood.count, 3);
    assert_eq!(mood.min, 5.0);
    assert_eq!(mood.max, 7.0);
    assert_eq!(mood.avg, 5.67);
    assert_eq!(mood.skipped_values, vec!["tired".to_string()]);
    assert_eq!(mood.skipped_count, 1);

    let anxiety = &stats["anxiety"];
    assert_eq!(anxiety.count, 3);
    assert_eq!(anxiety.avg, 3.0);

    // no entry has energy
    assert!(!stats.contains_key("energy"));
}

#[test]
fn csv_and_table_renderings() {
    let journal = mood_journal();
    let q = query(&["mood", "anxiety"], Some("2024-03-01"), Some("2024-03-02"), false, Some("CSV"));
    let report = query_fields(&journal.config(), &q).unwrap();
    assert_eq!(
        report.csv_output.as_deref(),
        Some("date,file,mood,anxiety\n2024-03-01,2024/03/01.md,7,3\n2024-03-02,2024/03/02.md,5,\n")
    );
    assert!(report.table_output.is_none());

    let q = query(&["mood", "anxiety"], Some("2024-03-01"), Some("2024-03-02"), false, Some("table"));
    let report = query_fields(&journal.config(), &q).unwrap();
    assert_eq!(
        report.table_output.as_deref(),
        Some("date\tmood\tanxiety\n2024-03-01\t7\t3\n2024-03-02\t5\t-\n")
    );
}

#[test]
fn json_rows_are_flat() {
    let journal = mood_journal();
    let q = query(&["mood"], Some("2024-03-01"), Some("2024-03-01"), false, None);
    let report = query_fields(&journal.config(), &q).unwrap();
    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["data"][0]["date"], "2024-03-01");
    assert_eq!(json["data"][0]["file"], "2024/03/01.md");
    assert_eq!(json["data"][0]["mood"], 7);
    assert_eq!(json["fields_queried"][0], "mood");
    assert!(json.get("csv_output").is_none());
}

#[test]
fn bad_arguments_are_invalid_input() {
    let cases = [
        FieldQuery::parse(Some(vec!["mood".into()]), &[], Some("March 1"), None, false, None),
        FieldQuery::parse(Some(vec!["mood".into()]), &[], Some("2024-03-05"), Some("2024-03-01"), false, None),
        FieldQuery::parse(Some(vec!["date".into(), " ".into()]), &[], None, None, false, None),
        FieldQuery::parse(Some(vec!["mood".into()]), &[], None, None, false, Some("xml")),
    ];
    for case in cases {
        assert!(matches!(case, Err(JournalError::InvalidInput(_))));
    }
}

#[test]
fn missing_root_is_a_journal_error() {
    let journal = TestJournal::new();
    std::fs::remove_dir_all(journal.root()).unwrap();
    let err = query_fields(&journal.config(), &query(&["mood"], None, None, false, None)).unwrap_err();
    assert!(matches!(err, JournalError::Journal(_)));
    assert!(!err.is_client_error());
}
