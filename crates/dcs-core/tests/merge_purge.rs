//! Integration tests for the merge-purge pipeline.

use std::collections::HashSet;
use std::fs;

use dcs_core::{
    AUDIT_COLUMN, CoreError, MergePurgeRequest, MergeSource, SuppressionSource, execute,
    report_path, run,
};
use dcs_ingest::read_table;
use dcs_model::{CellValue, CsvOptions, FieldMap, SortSpec, Table};

fn policies(count: usize) -> Table {
    let rows = (1..=count)
        .map(|id| {
            vec![
                CellValue::Text(id.to_string()),
                CellValue::Text(format!("holder{id}@example.com")),
            ]
        })
        .collect();
    Table::from_rows(vec!["policy_id".into(), "email".into()], rows).expect("policies")
}

fn ids(table: &Table) -> Vec<String> {
    let position = table.column_index("policy_id").expect("policy_id column");
    table
        .column_values(position)
        .map(|cell| cell.display().to_string())
        .collect()
}

fn small_request() -> MergePurgeRequest {
    let primary = Table::from_strings(
        &["policy_id", "email", "updated"],
        &[
            &["1", "a@x", "2024-01-01"],
            &["2", "b@x", "2024-01-02"],
            &["3", "c@x", "2024-01-03"],
        ],
    )
    .expect("primary");
    let april = Table::from_strings(
        &["policy_id", "email", "updated"],
        &[&["1", "a2@x", "2024-04-01"], &["4", "d@x", "2024-04-02"]],
    )
    .expect("april");
    let dnc = Table::from_strings(&["id"], &[&["3"]]).expect("dnc");
    let map: FieldMap = [("id", "policy_id")].into_iter().collect();
    MergePurgeRequest::new("customers.csv", primary)
        .with_merge(MergeSource::new("april.csv", april))
        .with_suppression(SuppressionSource::new("dnc.csv", dnc).with_field_map(map))
        .with_sort(SortSpec::new(vec!["updated".into()], vec![false]))
        .with_dedupe_on(vec!["policy_id".into()])
}

#[test]
fn test_suppression_by_direct_column_match() {
    let primary = policies(1000);
    let suppress_rows = (1..=150)
        .chain(1..=50)
        .map(|id| vec![CellValue::Text(id.to_string())])
        .collect();
    let suppression =
        Table::from_rows(vec!["policy_id".into()], suppress_rows).expect("suppression");
    assert_eq!(suppression.height(), 200);

    let request = MergePurgeRequest::new("policies.csv", primary)
        .with_dedupe_on(vec!["policy_id".into()])
        .with_suppression(SuppressionSource::new("dnc.csv", suppression));
    let outcome = execute(&request).expect("merge-purge");

    assert_eq!(outcome.table.height(), 850);
    assert_eq!(outcome.report.suppressions[0].rows, 150);
    assert_eq!(outcome.report.rows_suppressed(), 150);
    let purged: HashSet<String> = (1..=150).map(|id| id.to_string()).collect();
    assert!(ids(&outcome.table).iter().all(|id| !purged.contains(id)));
    assert!(outcome.report_text().contains("Lost 150 suppressing dnc.csv\n"));
}

#[test]
fn test_suppression_removes_every_matching_row() {
    let primary = Table::from_strings(
        &["policy_id", "tag"],
        &[&["7", "a"], &["7", "b"], &["8", "c"]],
    )
    .expect("primary");
    let suppression = Table::from_strings(&["policy_id"], &[&["7"]]).expect("suppression");
    let request = MergePurgeRequest::new("p.csv", primary)
        .with_dedupe_on(vec!["policy_id".into()])
        .with_suppression(SuppressionSource::new("s.csv", suppression));
    let outcome = execute(&request).expect("merge-purge");
    assert_eq!(ids(&outcome.table), vec!["8"]);
    assert_eq!(outcome.report.suppressions[0].rows, 2);
}

#[test]
fn test_report_text_snapshot() {
    let outcome = execute(&small_request()).expect("merge-purge");
    insta::assert_snapshot!(outcome.report_text().trim_end(), @r"
Merge-purge report
Primary: customers.csv
Original rows: 3
Final rows: 3

[Merge]
Gained 2 merging april.csv

[Purge]
Lost 1 suppressing dnc.csv

[Sort]
Columns: updated
Ascending: false

[Dedupe]
Key: policy_id
Lost 1 deduplicating
");
}

#[test]
fn test_result_rows_follow_the_sort() {
    let outcome = execute(&small_request()).expect("merge-purge");
    assert_eq!(ids(&outcome.table), vec!["4", "1", "2"]);
    let email = outcome.table.value(1, "email").expect("email");
    assert_eq!(email.display(), "a2@x");
}

#[test]
fn test_conservation_holds_for_recorded_deltas() {
    let outcome = execute(&small_request()).expect("merge-purge");
    let report = &outcome.report;
    assert_eq!(report.original_rows, 3);
    assert_eq!(report.rows_gained(), 2);
    assert_eq!(report.expected_final_rows(), report.final_rows);
    assert_eq!(report.final_rows, outcome.table.height());
}

#[test]
fn test_empty_primary_is_not_an_error() {
    let primary = Table::new(vec!["policy_id".into()]).expect("primary");
    let request = MergePurgeRequest::new("p.csv", primary)
        .with_dedupe_on(vec!["policy_id".into()])
        .with_sort(SortSpec::uniform(vec!["policy_id".into()], true));
    let outcome = execute(&request).expect("merge-purge");
    assert!(outcome.table.is_empty());
    assert_eq!(outcome.report.final_rows, 0);
    assert!(outcome.report_text().contains("Lost 0 deduplicating"));
}

#[test]
fn test_missing_result_column_aborts() {
    let primary = policies(3);
    let suppression = Table::from_strings(&["phone"], &[&["555"]]).expect("suppression");
    let map: FieldMap = [("phone", "phone_number")].into_iter().collect();
    let request = MergePurgeRequest::new("p.csv", primary)
        .with_suppression(SuppressionSource::new("calls.csv", suppression).with_field_map(map));
    let err = execute(&request).expect_err("missing key");
    assert!(
        matches!(&err, CoreError::MissingKey { columns, .. } if columns == &["phone_number"])
    );
    assert!(err.to_string().contains("calls.csv"));
}

#[test]
fn test_unknown_sort_column_aborts() {
    let request = MergePurgeRequest::new("p.csv", policies(2))
        .with_sort(SortSpec::uniform(vec!["nope".into()], true));
    assert!(matches!(execute(&request), Err(CoreError::Table(_))));
}

#[test]
fn test_run_exports_table_and_report() {
    let dir = tempfile::tempdir().expect("tempdir");
    let destination = dir.path().join("clean.csv");
    let (outcome, paths) =
        run(&small_request(), &destination, &CsvOptions::default()).expect("run");

    assert_eq!(paths.table, destination);
    assert_eq!(paths.report, report_path(&destination));
    assert_eq!(paths.report, dir.path().join("clean_report.txt"));

    let exported = read_table(&destination, &CsvOptions::default()).expect("read export");
    assert_eq!(exported.height(), 3);
    assert!(!exported.has_column(AUDIT_COLUMN));
    assert_eq!(exported.columns(), outcome.table.columns());

    let report = std::fs::read_to_string(&paths.report).expect("read report");
    assert_eq!(report, outcome.report_text());
    assert!(report.contains(&format!("Destination: {}", destination.display())));
}

#[test]
fn test_failed_run_writes_nothing() {
    let dir = tempfile::tempdir().expect("tempdir");
    let destination = dir.path().join("clean.csv");
    let request = MergePurgeRequest::new("p.csv", policies(2)).with_suppression(
        SuppressionSource::new("s.csv", Table::from_strings(&["x"], &[&["1"]]).expect("s")),
    );
    assert!(run(&request, &destination, &CsvOptions::default()).is_err());
    assert!(!destination.exists());
    assert!(!report_path(&destination).exists());
}

#[test]
fn test_unwritable_report_leaves_no_export() {
    let dir = tempfile::tempdir().expect("tempdir");
    let destination = dir.path().join("clean.csv");
    fs::create_dir(report_path(&destination)).expect("block report path");

    let request = MergePurgeRequest::new("p.csv", policies(3));
    let err = run(&request, &destination, &CsvOptions::default()).expect_err("report blocked");
    assert!(matches!(err, CoreError::Ingest(_)));
    assert!(!destination.exists());
}
