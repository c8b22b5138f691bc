//! Export of reconciliation results to a directory of CSV / JSON files.
//!
//! Layout:
//!   matched.csv              left fields + `__MATCHED_WITH__` (right row as JSON) + `__VIA__`
//!   unmatched_source1.csv    rows from source 1 with no counterpart
//!   unmatched_source2.csv    rows from source 2 nobody claimed
//!   exceptions.json          fuzzy candidates rejected on amount
//!   groupSummary.csv         per-group sums (empty when no grouping)
//!   summary.json             one-element array with the counts

use std::path::{Path, PathBuf};

use serde::Serialize;

use matchbook_recon::normalize::format_number;
use matchbook_recon::{GroupSummaryRow, Record, ReconError, ReconResult, UnmatchedEntry, Value};

pub const MATCHED_WITH_COLUMN: &str = "__MATCHED_WITH__";
pub const VIA_COLUMN: &str = "__VIA__";

pub const MATCHED_FILE: &str = "matched.csv";
pub const UNMATCHED1_FILE: &str = "unmatched_source1.csv";
pub const UNMATCHED2_FILE: &str = "unmatched_source2.csv";
pub const EXCEPTIONS_FILE: &str = "exceptions.json";
pub const GROUP_SUMMARY_FILE: &str = "groupSummary.csv";
pub const SUMMARY_FILE: &str = "summary.json";

/// Write every result collection into `dir`, creating it if needed.
/// Returns the written paths in layout order.
pub fn export_result(result: &ReconResult, dir: &Path) -> Result<Vec<PathBuf>, ReconError> {
    std::fs::create_dir_all(dir)
        .map_err(|e| ReconError::Io(format!("cannot create {}: {e}", dir.display())))?;

    let mut written = Vec::new();

    let path = dir.join(MATCHED_FILE);
    write_records_csv(&path, &matched_rows(result)?)?;
    written.push(path);

    let path = dir.join(UNMATCHED1_FILE);
    write_records_csv(&path, &entry_rows(&result.unmatched1))?;
    written.push(path);

    let path = dir.join(UNMATCHED2_FILE);
    write_records_csv(&path, &entry_rows(&result.unmatched2))?;
    written.push(path);

    let path = dir.join(EXCEPTIONS_FILE);
    write_json(&path, &result.exceptions)?;
    written.push(path);

    let path = dir.join(GROUP_SUMMARY_FILE);
    write_records_csv(&path, &group_rows(&result.group_summary))?;
    written.push(path);

    let path = dir.join(SUMMARY_FILE);
    write_json(&path, &[&result.summary])?;
    written.push(path);

    log::info!("exported {} files to {}", written.len(), dir.display());
    Ok(written)
}

/// Left row, then the right row as JSON and the match method.
pub fn matched_rows(result: &ReconResult) -> Result<Vec<Record>, ReconError> {
    result
        .matched
        .iter()
        .map(|m| {
            let right = serde_json::to_string(&m.right)
                .map_err(|e| ReconError::Io(format!("JSON serialization error: {e}")))?;
            let mut row = m.left.clone();
            row.insert(MATCHED_WITH_COLUMN, right);
            row.insert(VIA_COLUMN, m.via.to_string());
            Ok(row)
        })
        .collect()
}

fn entry_rows(entries: &[UnmatchedEntry]) -> Vec<Record> {
    entries.iter().map(|u| u.row.clone()).collect()
}

fn group_rows(groups: &[GroupSummaryRow]) -> Vec<Record> {
    groups
        .iter()
        .map(|g| {
            [
                ("groupKey", Value::from(g.group_key.as_str())),
                ("sumSource1", Value::Number(g.sum_source1)),
                ("sumSource2", Value::Number(g.sum_source2)),
                ("difference", Value::Number(g.difference)),
                ("withinTolerance", Value::from(g.within_tolerance.to_string())),
            ]
            .into_iter()
            .collect()
        })
        .collect()
}

/// Union of field names across records, in first-seen order.
pub fn header_union(records: &[Record]) -> Vec<String> {
    let mut headers: Vec<String> = Vec::new();
    for record in records {
        for name in record.field_names() {
            if !headers.iter().any(|h| h == name) {
                headers.push(name.to_string());
            }
        }
    }
    headers
}

fn cell(value: &Value) -> String {
    match value {
        Value::Text(s) => s.clone(),
        Value::Number(n) => format_number(*n),
        Value::Null => String::new(),
    }
}

/// Write records as CSV. An empty collection produces an empty file.
pub fn write_records_csv(path: &Path, records: &[Record]) -> Result<(), ReconError> {
    let io_err = |e: csv::Error| ReconError::Io(format!("cannot write {}: {e}", path.display()));

    let mut writer = csv::Writer::from_path(path).map_err(io_err)?;
    let headers = header_union(records);
    if !headers.is_empty() {
        writer.write_record(&headers).map_err(io_err)?;
        for record in records {
            writer
                .write_record(headers.iter().map(|h| cell(record.get(h))))
                .map_err(io_err)?;
        }
    }
    writer
        .flush()
        .map_err(|e| ReconError::Io(format!("cannot write {}: {e}", path.display())))
}

pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), ReconError> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| ReconError::Io(format!("JSON serialization error: {e}")))?;
    std::fs::write(path, json)
        .map_err(|e| ReconError::Io(format!("cannot write {}: {e}", path.display())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use matchbook_recon::{reconcile, KeySpec, RuleConfig};

    fn sample_result() -> ReconResult {
        let s1: Vec<Record> = vec![
            [("id", "A"), ("amount", "10"), ("region", "east")].into_iter().collect(),
            [("id", "B"), ("amount", "5"), ("region", "west")].into_iter().collect(),
        ];
        let s2: Vec<Record> = vec![
            [("id", "A"), ("amount", "10"), ("region", "east")].into_iter().collect(),
            [("id", "C"), ("memo", "stray"), ("region", "east")].into_iter().collect(),
        ];
        let rules = RuleConfig {
            keys: vec![KeySpec::text("id")],
            group_by: vec!["region".into()],
            ..RuleConfig::default()
        };
        reconcile(&s1, &s2, &rules)
    }

    #[test]
    fn matched_rows_append_partner_and_method() {
        let rows = matched_rows(&sample_result()).unwrap();
        assert_eq!(rows.len(), 1);
        let names: Vec<&str> = rows[0].field_names().collect();
        assert_eq!(names, vec!["id", "amount", "region", MATCHED_WITH_COLUMN, VIA_COLUMN]);
        assert_eq!(
            rows[0].get(MATCHED_WITH_COLUMN),
            &Value::from(r#"{"id":"A","amount":"10","region":"east"}"#)
        );
        assert_eq!(rows[0].get(VIA_COLUMN), &Value::from("key"));
    }

    #[test]
    fn matched_partner_keeps_integral_numbers_whole() {
        let s1: Vec<Record> = vec![[("id", Value::from("A")), ("amount", Value::Number(100.0))]
            .into_iter()
            .collect()];
        let rules = RuleConfig { keys: vec![KeySpec::text("id")], ..RuleConfig::default() };
        let rows = matched_rows(&reconcile(&s1, &s1, &rules)).unwrap();
        assert_eq!(
            rows[0].get(MATCHED_WITH_COLUMN),
            &Value::from(r#"{"id":"A","amount":100}"#)
        );
    }

    #[test]
    fn headers_union_in_first_seen_order() {
        let records: Vec<Record> = vec![
            [("b", "1"), ("a", "2")].into_iter().collect(),
            [("c", "3"), ("a", "4")].into_iter().collect(),
        ];
        assert_eq!(header_union(&records), vec!["b", "a", "c"]);
    }

    #[test]
    fn writes_full_layout() {
        let dir = tempfile::tempdir().unwrap();
        let written = export_result(&sample_result(), dir.path()).unwrap();
        assert_eq!(written.len(), 6);

        let unmatched2 = std::fs::read_to_string(dir.path().join(UNMATCHED2_FILE)).unwrap();
        assert_eq!(unmatched2, "id,memo,region\nC,stray,east\n");

        let groups = std::fs::read_to_string(dir.path().join(GROUP_SUMMARY_FILE)).unwrap();
        let mut lines = groups.lines();
        assert_eq!(
            lines.next(),
            Some("groupKey,sumSource1,sumSource2,difference,withinTolerance")
        );
        assert_eq!(lines.next(), Some("east,10,10,0,true"));
        assert_eq!(lines.next(), Some("west,5,0,5,false"));

        let summary: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(dir.path().join(SUMMARY_FILE)).unwrap())
                .unwrap();
        assert_eq!(summary.as_array().unwrap().len(), 1);
        assert_eq!(summary[0]["matchRate"], 50);
    }

    #[test]
    fn empty_collection_writes_empty_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.csv");
        write_records_csv(&path, &[]).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "");
    }
}
