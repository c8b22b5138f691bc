use std::collections::HashMap;

use crate::config::{KeySpec, RuleConfig};
use crate::model::{
    Exception, MatchMethod, MatchedPair, PairMatchOutput, Record, UnmatchedEntry, Value,
};
use crate::normalize::{build_key, format_number, parse_amount};
use crate::similarity::similarity;

pub const REASON_NO_MATCH: &str = "No match";
pub const REASON_NO_COUNTERPART: &str = "No counterpart from Source 1";

pub fn fuzzy_amount_mismatch_reason(tolerance: f64) -> String {
    format!("Fuzzy match but amount mismatch (> {})", format_number(tolerance))
}

// ---------------------------------------------------------------------------
// Candidate arena + exact-key index
// ---------------------------------------------------------------------------

/// A source-2 record slot. Claimed candidates are no longer eligible.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Candidate {
    /// Position in the source-2 slice.
    pub idx: usize,
    pub claimed: bool,
}

/// Source-2 candidates bucketed by composite key.
///
/// Built once per call. Buckets keep the order in which their key first
/// appeared; each bucket keeps source-2 order. The arena is indexed by
/// source-2 position.
#[derive(Debug)]
pub struct CandidateIndex {
    candidates: Vec<Candidate>,
    buckets: Vec<Vec<usize>>,
    bucket_of_key: HashMap<String, usize>,
}

impl CandidateIndex {
    pub fn build(records: &[Record], keys: &[KeySpec]) -> Self {
        let mut buckets: Vec<Vec<usize>> = Vec::new();
        let mut bucket_of_key: HashMap<String, usize> = HashMap::new();

        for (idx, record) in records.iter().enumerate() {
            let key = build_key(record, keys);
            let slot = *bucket_of_key.entry(key).or_insert_with(|| {
                buckets.push(Vec::new());
                buckets.len() - 1
            });
            buckets[slot].push(idx);
        }

        let candidates = (0..records.len())
            .map(|idx| Candidate { idx, claimed: false })
            .collect();

        Self {
            candidates,
            buckets,
            bucket_of_key,
        }
    }

    /// Candidate positions sharing `key`, in source-2 order.
    pub fn bucket(&self, key: &str) -> &[usize] {
        self.bucket_of_key
            .get(key)
            .map(|&slot| self.buckets[slot].as_slice())
            .unwrap_or(&[])
    }

    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_claimed(&self, idx: usize) -> bool {
        self.candidates[idx].claimed
    }

    pub fn claim(&mut self, idx: usize) {
        debug_assert!(!self.candidates[idx].claimed, "candidate {idx} claimed twice");
        self.candidates[idx].claimed = true;
    }

    /// Every candidate position: bucket creation order, then in-bucket order.
    pub fn scan_order(&self) -> impl Iterator<Item = usize> + '_ {
        self.buckets.iter().flatten().copied()
    }

    /// Unclaimed candidates in source-2 order.
    pub fn unclaimed(&self) -> impl Iterator<Item = Candidate> + '_ {
        self.candidates.iter().copied().filter(|c| !c.claimed)
    }
}

// ---------------------------------------------------------------------------
// Selection
// ---------------------------------------------------------------------------

/// Missing or unparsable amounts on either side always pass.
pub fn within_tolerance(left: Option<f64>, right: Option<f64>, tolerance: f64) -> bool {
    match (left, right) {
        (Some(a), Some(b)) => (a - b).abs() <= tolerance,
        _ => true,
    }
}

/// First unclaimed candidate in the key's bucket whose amount is in tolerance.
pub fn find_key_candidate(
    index: &CandidateIndex,
    key: &str,
    amount: Option<f64>,
    source2: &[Record],
    rules: &RuleConfig,
) -> Option<usize> {
    index.bucket(key).iter().copied().find(|&idx| {
        !index.is_claimed(idx)
            && within_tolerance(
                amount,
                parse_amount(source2[idx].get(&rules.amount_field)),
                rules.amount_tolerance,
            )
    })
}

/// Highest-scoring unclaimed candidate across all buckets, at or above
/// `threshold`. The first candidate reaching the best score wins.
pub fn find_fuzzy_candidate(
    index: &CandidateIndex,
    target: &Value,
    source2: &[Record],
    field: &str,
    threshold: f64,
) -> Option<(usize, f64)> {
    let mut best: Option<(usize, f64)> = None;
    let mut best_score = 0.0;

    for idx in index.scan_order() {
        if index.is_claimed(idx) {
            continue;
        }
        let score = similarity(target, source2[idx].get(field));
        if score >= threshold && score > best_score {
            best = Some((idx, score));
            best_score = score;
        }
    }

    best
}

// ---------------------------------------------------------------------------
// Matching pass
// ---------------------------------------------------------------------------

/// Greedy one-to-one matching of source 1 against source 2.
///
/// Source 1 is walked in order. Each record takes the first eligible exact-key
/// candidate, else the best fuzzy candidate. A fuzzy candidate that fails the
/// amount check yields an exception and stays unclaimed.
pub fn match_records(source1: &[Record], source2: &[Record], rules: &RuleConfig) -> PairMatchOutput {
    let mut index = CandidateIndex::build(source2, &rules.keys);
    log::debug!(
        "indexed {} source-2 records into {} key buckets",
        source2.len(),
        index.bucket_count()
    );

    let fuzzy_field = rules.fuzzy_field();
    let mut out = PairMatchOutput::default();

    for (left_idx, left) in source1.iter().enumerate() {
        let key = build_key(left, &rules.keys);
        let amount = parse_amount(left.get(&rules.amount_field));

        if let Some(right_idx) = find_key_candidate(&index, &key, amount, source2, rules) {
            index.claim(right_idx);
            out.matched.push(MatchedPair {
                left: left.clone(),
                right: source2[right_idx].clone(),
                via: MatchMethod::Key,
                left_idx,
                right_idx,
            });
            continue;
        }

        let fuzzy = fuzzy_field.and_then(|field| {
            find_fuzzy_candidate(&index, left.get(field), source2, field, rules.fuzzy_threshold)
        });

        match fuzzy {
            Some((right_idx, score)) => {
                let right = &source2[right_idx];
                let right_amount = parse_amount(right.get(&rules.amount_field));
                if within_tolerance(amount, right_amount, rules.amount_tolerance) {
                    log::debug!("source-1 row {left_idx} fuzzy-matched row {right_idx} (score {score:.3})");
                    index.claim(right_idx);
                    out.matched.push(MatchedPair {
                        left: left.clone(),
                        right: right.clone(),
                        via: MatchMethod::Fuzzy,
                        left_idx,
                        right_idx,
                    });
                } else {
                    log::debug!(
                        "source-1 row {left_idx} fuzzy candidate {right_idx} rejected on amount"
                    );
                    out.exceptions.push(Exception {
                        left: left.clone(),
                        rights: vec![right.clone()],
                        reason: fuzzy_amount_mismatch_reason(rules.amount_tolerance),
                        left_idx,
                        right_idxs: vec![right_idx],
                    });
                }
            }
            None => out.unmatched1.push(UnmatchedEntry {
                row: left.clone(),
                idx: left_idx,
                reason: REASON_NO_MATCH.to_string(),
            }),
        }
    }

    out.unmatched2 = index
        .unclaimed()
        .map(|c| UnmatchedEntry {
            row: source2[c.idx].clone(),
            idx: c.idx,
            reason: REASON_NO_COUNTERPART.to_string(),
        })
        .collect();

    out
}
