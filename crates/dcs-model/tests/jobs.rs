//! Job file parsing tests.

use dcs_model::{MergePurgeJob, SplitJob};

#[test]
fn parses_full_merge_purge_job() {
    let text = r#"
primary = "customers.csv"
output = "out/clean.csv"
dedupe_on = ["policy_id"]

[sort]
columns = ["updated_at", "name"]
ascending = [false]

[[merge]]
path = "april.csv"

[[merge]]
path = "may.csv"

[[suppress]]
path = "do_not_call.csv"

[[suppress]]
path = "bounced.csv"
[suppress.field_map]
email_addr = "email"

[csv]
delimiter = ";"
"#;
    let job: MergePurgeJob = toml::from_str(text).expect("parse job");
    assert_eq!(job.dedupe_on, vec!["policy_id".to_string()]);
    assert_eq!(job.sort.flags(), vec![false, false]);
    assert_eq!(job.merge.len(), 2);
    assert!(job.suppress[0].field_map.is_none());
    let map = job.suppress[1].field_map.as_ref().expect("field map");
    assert_eq!(map.target_columns(), vec!["email".to_string()]);
    assert_eq!(job.csv.delimiter, Some(';'));
}

#[test]
fn minimal_job_uses_defaults() {
    let job: MergePurgeJob =
        toml::from_str("primary = \"a.csv\"\noutput = \"b.csv\"\n").expect("parse job");
    assert!(job.dedupe_on.is_empty());
    assert!(job.sort.is_empty());
    assert!(job.merge.is_empty());
    assert!(job.csv.delimiter.is_none());
}

#[test]
fn rejects_unknown_keys() {
    let result: Result<MergePurgeJob, _> =
        toml::from_str("primary = \"a.csv\"\noutput = \"b.csv\"\ndedupe = [\"x\"]\n");
    assert!(result.is_err());
}

#[test]
fn parses_split_job() {
    let text = r#"
input = "people.csv"
split_on = ["state"]
fields = ["name", "state"]
dropna = true
chunk_size = 500
"#;
    let job: SplitJob = toml::from_str(text).expect("parse split job");
    assert_eq!(job.spec.split_on, vec!["state".to_string()]);
    assert_eq!(job.spec.chunk_size, Some(500));
    assert!(job.spec.dropna);
    assert!(job.spec.dest_dir.is_none());
}

#[test]
fn report_serializes_to_json() {
    let report = dcs_model::ExecutionReport {
        primary: "a.csv".into(),
        destination: Some("b.csv".into()),
        original_rows: 2,
        final_rows: 2,
        merges: vec![],
        suppressions: vec![],
        sort: dcs_model::SortSpec::default(),
        dedupe_on: vec![],
        dedupe_lost: 0,
    };
    let json = serde_json::to_value(&report).expect("serialize");
    assert_eq!(json["final_rows"], 2);
    assert_eq!(json["destination"], "b.csv");
}
