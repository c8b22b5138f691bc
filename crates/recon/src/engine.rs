use crate::aggregate::summarize_groups;
use crate::config::RuleConfig;
use crate::matcher::match_records;
use crate::model::{Record, ReconResult};
use crate::summary::compute_summary;

/// Reconcile two record sequences under `rules`.
///
/// Pure and deterministic: builds its own candidate index, runs the matching
/// pass over source 1, then the optional group pass. Malformed values never
/// abort the run.
pub fn reconcile(source1: &[Record], source2: &[Record], rules: &RuleConfig) -> ReconResult {
    let output = match_records(source1, source2, rules);

    let group_summary = if rules.has_grouping() {
        summarize_groups(
            source1,
            source2,
            &rules.group_by,
            &rules.amount_field,
            rules.amount_tolerance,
        )
    } else {
        Vec::new()
    };

    let summary = compute_summary(source1.len(), source2.len(), &output);
    log::info!(
        "reconciled {} x {} records: {} matched, {} exceptions, {} + {} unmatched ({}%)",
        summary.total1,
        summary.total2,
        summary.matched,
        summary.exceptions,
        summary.unmatched1,
        summary.unmatched2,
        summary.match_rate,
    );

    ReconResult {
        matched: output.matched,
        unmatched1: output.unmatched1,
        unmatched2: output.unmatched2,
        exceptions: output.exceptions,
        summary,
        group_summary,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::KeySpec;

    fn row(id: &str, amount: &str) -> Record {
        [("id", id), ("amount", amount)].into_iter().collect()
    }

    #[test]
    fn no_grouping_means_no_group_rows() {
        let rules = RuleConfig {
            keys: vec![KeySpec::text("id")],
            ..RuleConfig::default()
        };
        let result = reconcile(&[row("A", "1")], &[row("A", "1")], &rules);
        assert!(result.group_summary.is_empty());
        assert_eq!(result.summary.match_rate, 100);
        assert!(result.is_clean());
    }

    #[test]
    fn empty_inputs() {
        let result = reconcile(&[], &[], &RuleConfig::default());
        assert_eq!(result.summary.total1, 0);
        assert_eq!(result.summary.match_rate, 0);
        assert!(result.matched.is_empty());
        assert!(result.is_clean());
    }

    #[test]
    fn serializes_with_contract_field_names() {
        let rules = RuleConfig {
            keys: vec![KeySpec::text("id")],
            group_by: vec!["id".into()],
            ..RuleConfig::default()
        };
        let result = reconcile(&[row("A", "1"), row("B", "2")], &[row("A", "1")], &rules);
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["matched"][0]["via"], "key");
        assert_eq!(json["unmatched1"][0]["reason"], "No match");
        assert_eq!(json["unmatched1"][0]["idx"], 1);
        assert_eq!(json["summary"]["matchRate"], 50);
        assert_eq!(json["groupSummary"][0]["groupKey"], "a");
        assert_eq!(json["groupSummary"][1]["withinTolerance"], false);
    }
}
