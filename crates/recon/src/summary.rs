use crate::model::{PairMatchOutput, ReconSummary};

/// Integer percentage of `matched` over `total`; 0 when `total` is 0.
pub fn match_rate(matched: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    (matched as f64 / total as f64 * 100.0).round() as u32
}

/// Compute summary statistics from the matching pass output.
pub fn compute_summary(total1: usize, total2: usize, output: &PairMatchOutput) -> ReconSummary {
    ReconSummary {
        total1,
        total2,
        matched: output.matched.len(),
        unmatched1: output.unmatched1.len(),
        unmatched2: output.unmatched2.len(),
        exceptions: output.exceptions.len(),
        match_rate: match_rate(output.matched.len(), total1),
    }
}
