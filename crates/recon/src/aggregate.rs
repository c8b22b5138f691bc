use std::collections::HashMap;

use crate::model::{GroupSummaryRow, Record};
use crate::normalize::{group_key, parse_amount};

/// Group sums for one source, in first-seen key order.
struct GroupSums {
    order: Vec<String>,
    sums: HashMap<String, f64>,
}

impl GroupSums {
    fn collect(records: &[Record], fields: &[String], amount_field: &str) -> Self {
        let mut order = Vec::new();
        let mut sums: HashMap<String, f64> = HashMap::new();

        for record in records {
            let key = group_key(record, fields);
            // unparsable amounts contribute 0
            let amount = parse_amount(record.get(amount_field)).unwrap_or(0.0);
            match sums.get_mut(&key) {
                Some(total) => *total += amount,
                None => {
                    order.push(key.clone());
                    sums.insert(key, amount);
                }
            }
        }

        Self { order, sums }
    }

    fn get(&self, key: &str) -> f64 {
        self.sums.get(key).copied().unwrap_or(0.0)
    }

    fn contains(&self, key: &str) -> bool {
        self.sums.contains_key(key)
    }
}

/// Compare amount sums per group between the two sources.
///
/// Rows come out in first-seen order over source 1, followed by groups that
/// only source 2 has.
pub fn summarize_groups(
    source1: &[Record],
    source2: &[Record],
    group_by: &[String],
    amount_field: &str,
    tolerance: f64,
) -> Vec<GroupSummaryRow> {
    let left = GroupSums::collect(source1, group_by, amount_field);
    let right = GroupSums::collect(source2, group_by, amount_field);

    let right_only = right.order.iter().filter(|k| !left.contains(k));

    left.order
        .iter()
        .chain(right_only)
        .map(|key| {
            let sum_source1 = left.get(key);
            let sum_source2 = right.get(key);
            let difference = (sum_source1 - sum_source2).abs();
            GroupSummaryRow {
                group_key: key.clone(),
                sum_source1,
                sum_source2,
                difference,
                within_tolerance: difference <= tolerance,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(region: &str, amount: &str) -> Record {
        [("region", region), ("amount", amount)].into_iter().collect()
    }

    fn by_region() -> Vec<String> {
        vec!["region".to_string()]
    }

    #[test]
    fn sums_and_difference() {
        let s1 = vec![row("east", "100"), row("East", "200"), row("west", "50")];
        let s2 = vec![row("east", "280"), row("west", "50")];
        let rows = summarize_groups(&s1, &s2, &by_region(), "amount", 15.0);

        assert_eq!(rows.len(), 2);
        assert_eq!(
            rows[0],
            GroupSummaryRow {
                group_key: "east".into(),
                sum_source1: 300.0,
                sum_source2: 280.0,
                difference: 20.0,
                within_tolerance: false,
            }
        );
        assert_eq!(rows[1].group_key, "west");
        assert_eq!(rows[1].difference, 0.0);
        assert!(rows[1].within_tolerance);
    }

    #[test]
    fn order_is_source1_first_seen_then_source2_only() {
        let s1 = vec![row("b", "1"), row("a", "1"), row("b", "1")];
        let s2 = vec![row("c", "1"), row("a", "1"), row("d", "1")];
        let rows = summarize_groups(&s1, &s2, &by_region(), "amount", 0.0);
        let keys: Vec<&str> = rows.iter().map(|r| r.group_key.as_str()).collect();
        assert_eq!(keys, vec!["b", "a", "c", "d"]);
        assert_eq!(rows[0].sum_source2, 0.0);
        assert_eq!(rows[2].sum_source1, 0.0);
    }

    #[test]
    fn unparsable_amounts_count_as_zero() {
        let s1 = vec![row("x", "10"), row("x", "oops")];
        let s2 = vec![[("region", "x")].into_iter().collect::<Record>()];
        let rows = summarize_groups(&s1, &s2, &by_region(), "amount", 10.0);
        assert_eq!(rows[0].sum_source1, 10.0);
        assert_eq!(rows[0].sum_source2, 0.0);
        // boundary is inclusive
        assert!(rows[0].within_tolerance);
    }

    #[test]
    fn multi_field_groups() {
        let s1: Vec<Record> = vec![
            [("region", "east"), ("desk", "fx"), ("amount", "5")].into_iter().collect(),
            [("region", "east"), ("desk", "rates"), ("amount", "7")].into_iter().collect(),
        ];
        let rows = summarize_groups(
            &s1,
            &[],
            &["region".to_string(), "desk".to_string()],
            "amount",
            0.0,
        );
        let keys: Vec<&str> = rows.iter().map(|r| r.group_key.as_str()).collect();
        assert_eq!(keys, vec!["east|fx", "east|rates"]);
        assert!(!rows[0].within_tolerance);
    }
}
