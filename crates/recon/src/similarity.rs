use crate::model::Value;
use crate::normalize::normalize_text;

/// Unit-cost insert/delete/substitute edit distance, counted in chars.
pub fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}

/// Similarity in [0, 1] between two text-normalized values.
/// 1.0 means identical; two empty values are identical.
pub fn similarity(a: &Value, b: &Value) -> f64 {
    let a = normalize_text(a);
    let b = normalize_text(b);
    let longest = a.chars().count().max(b.chars().count()).max(1);
    1.0 - levenshtein(&a, &b) as f64 / longest as f64
}
