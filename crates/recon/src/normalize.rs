//! Canonical comparison tokens for raw field values.
//!
//! Parsing here never fails loudly. An unparsable amount becomes `None` (and
//! the empty token in keys); an unparsable date falls back to its text form.
//! Matching relies on malformed values collapsing to shared tokens.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

use crate::config::{KeySpec, KeyType};
use crate::model::{Record, Value};

/// Separator between composite key parts.
pub const KEY_SEPARATOR: &str = "|";

const DATETIME_LAYOUTS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

const DATE_LAYOUTS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%b %d, %Y",
    "%B %d, %Y",
    "%d %b %Y",
    "%d %B %Y",
];

/// Null → `""`, numbers → shortest decimal form, text → trimmed lower-case.
pub fn normalize_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Number(n) => format_number(*n),
        Value::Text(s) => s.trim().to_lowercase(),
    }
}

/// Shortest decimal rendering: `100`, `1.5`, `-0.25`.
pub fn format_number(n: f64) -> String {
    if n == 0.0 {
        // covers -0.0
        return "0".to_string();
    }
    if n.is_nan() {
        return "NaN".to_string();
    }
    if n.is_infinite() {
        return if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    n.to_string()
}

/// Parse an amount, ignoring commas and whitespace.
///
/// Only an empty cell is missing. A cell made entirely of separators
/// (`"   "`, `","`) reads as 0.
pub fn parse_amount(value: &Value) -> Option<f64> {
    match value {
        Value::Null => None,
        Value::Number(n) => Some(*n).filter(|n| n.is_finite()),
        Value::Text(s) if s.is_empty() => None,
        Value::Text(s) => {
            let cleaned: String = s
                .chars()
                .filter(|c| *c != ',' && !c.is_whitespace())
                .collect();
            if cleaned.is_empty() {
                return Some(0.0);
            }
            cleaned.parse::<f64>().ok().filter(|n| n.is_finite())
        }
    }
}

/// Amount token: two fixed decimals, or `""` when unparsable.
pub fn amount_key(value: &Value) -> String {
    parse_amount(value)
        .map(|n| format!("{n:.2}"))
        .unwrap_or_default()
}

/// Parse a calendar date from the accepted layouts.
///
/// Offset-bearing timestamps are converted to UTC before the time of day is
/// dropped.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc).date_naive());
    }
    for layout in DATETIME_LAYOUTS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, layout) {
            return Some(dt.date());
        }
    }
    DATE_LAYOUTS
        .iter()
        .find_map(|layout| NaiveDate::parse_from_str(s, layout).ok())
}

/// Date token: `YYYY-MM-DD`, falling back to the text token.
///
/// Numbers are read as milliseconds since the Unix epoch.
pub fn date_key(value: &Value) -> String {
    let date = match value {
        Value::Null => return String::new(),
        Value::Text(s) if s.is_empty() => return String::new(),
        Value::Number(n) if *n == 0.0 || n.is_nan() => return String::new(),
        Value::Text(s) => parse_date(s),
        Value::Number(n) => DateTime::<Utc>::from_timestamp_millis(*n as i64).map(|dt| dt.date_naive()),
    };
    match date {
        Some(d) => d.format("%Y-%m-%d").to_string(),
        None => normalize_text(value),
    }
}

impl KeyType {
    pub fn canonicalize(&self, value: &Value) -> String {
        match self {
            Self::Text => normalize_text(value),
            Self::Date => date_key(value),
            Self::Amount => amount_key(value),
        }
    }
}

/// Composite key over the configured key specs, in order.
pub fn build_key(record: &Record, keys: &[KeySpec]) -> String {
    keys.iter()
        .map(|k| k.kind.canonicalize(record.get(&k.field)))
        .collect::<Vec<_>>()
        .join(KEY_SEPARATOR)
}

/// Group key: always text-normalized, independent of key types.
pub fn group_key(record: &Record, fields: &[String]) -> String {
    fields
        .iter()
        .map(|f| normalize_text(record.get(f)))
        .collect::<Vec<_>>()
        .join(KEY_SEPARATOR)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> Value {
        Value::from(s)
    }

    #[test]
    fn text_normalization() {
        assert_eq!(normalize_text(&Value::Null), "");
        assert_eq!(normalize_text(&text("  Acme CORP ")), "acme corp");
        assert_eq!(normalize_text(&Value::Number(100.0)), "100");
        assert_eq!(normalize_text(&Value::Number(1.5)), "1.5");
        assert_eq!(normalize_text(&Value::Number(-0.0)), "0");
    }

    #[test]
    fn amount_parsing() {
        assert_eq!(parse_amount(&text("1,234.50")), Some(1234.5));
        assert_eq!(parse_amount(&text(" 1 000 ")), Some(1000.0));
        assert_eq!(parse_amount(&text("-42")), Some(-42.0));
        assert_eq!(parse_amount(&Value::Number(7.25)), Some(7.25));
        assert_eq!(parse_amount(&text("")), None);
        assert_eq!(parse_amount(&text("   ")), Some(0.0));
        assert_eq!(parse_amount(&text(",")), Some(0.0));
        assert_eq!(parse_amount(&text("0x10")), None);
        assert_eq!(parse_amount(&text("Infinity")), None);
        assert_eq!(parse_amount(&text("abc")), None);
        assert_eq!(parse_amount(&text("$10")), None);
        assert_eq!(parse_amount(&text("NaN")), None);
        assert_eq!(parse_amount(&Value::Null), None);
    }

    #[test]
    fn amount_key_two_decimals() {
        assert_eq!(amount_key(&text("100")), "100.00");
        assert_eq!(amount_key(&text("1,000.5")), "1000.50");
        assert_eq!(amount_key(&text("bogus")), "");
        assert_eq!(amount_key(&text("")), "");
        assert_eq!(amount_key(&text(" , ")), "0.00");
        // differences beyond two decimals collapse in keys
        assert_eq!(amount_key(&text("10.001")), amount_key(&text("10.004")));
    }

    #[test]
    fn date_key_canonicalizes() {
        assert_eq!(date_key(&text("2024-01-15")), "2024-01-15");
        assert_eq!(date_key(&text("2024/01/15")), "2024-01-15");
        assert_eq!(date_key(&text("01/15/2024")), "2024-01-15");
        assert_eq!(date_key(&text("Jan 15, 2024")), "2024-01-15");
        assert_eq!(date_key(&text("15 January 2024")), "2024-01-15");
        assert_eq!(date_key(&text("2024-01-15T13:45:00")), "2024-01-15");
        assert_eq!(date_key(&text("2024-01-15 08:00")), "2024-01-15");
        assert_eq!(date_key(&text("2024-01-15T13:45:00Z")), "2024-01-15");
    }

    #[test]
    fn date_key_converts_offsets_to_utc() {
        assert_eq!(date_key(&text("2024-01-15T23:30:00-05:00")), "2024-01-16");
    }

    #[test]
    fn date_key_epoch_millis() {
        // 2024-01-15T00:00:00Z
        assert_eq!(date_key(&Value::Number(1_705_276_800_000.0)), "2024-01-15");
        assert_eq!(date_key(&Value::Number(0.0)), "");
    }

    #[test]
    fn date_key_falls_back_to_text() {
        assert_eq!(date_key(&text("Not A Date")), "not a date");
        assert_eq!(date_key(&text("2024-13-45")), "2024-13-45");
        assert_eq!(date_key(&text("")), "");
        assert_eq!(date_key(&Value::Null), "");
    }

    #[test]
    fn composite_key_joins_in_order() {
        let r: Record = [
            ("id", Value::from(" INV-1 ")),
            ("date", Value::from("2024-01-15T10:00:00")),
            ("amount", Value::from("1,200")),
        ]
        .into_iter()
        .collect();
        let keys = vec![
            KeySpec::text("id"),
            KeySpec::new("date", KeyType::Date),
            KeySpec::new("amount", KeyType::Amount),
        ];
        assert_eq!(build_key(&r, &keys), "inv-1|2024-01-15|1200.00");
    }

    #[test]
    fn empty_key_list_is_universal() {
        let a: Record = [("id", "A")].into_iter().collect();
        let b: Record = [("other", "B")].into_iter().collect();
        assert_eq!(build_key(&a, &[]), "");
        assert_eq!(build_key(&a, &[]), build_key(&b, &[]));
    }

    #[test]
    fn malformed_values_share_empty_token() {
        let a: Record = [("amt", "n/a")].into_iter().collect();
        let b: Record = [("amt", "--")].into_iter().collect();
        let keys = vec![KeySpec::new("amt", KeyType::Amount)];
        assert_eq!(build_key(&a, &keys), "");
        assert_eq!(build_key(&a, &keys), build_key(&b, &keys));
    }

    #[test]
    fn group_key_ignores_key_types() {
        let r: Record = [("region", Value::from("East ")), ("desk", Value::Number(4.0))]
            .into_iter()
            .collect();
        assert_eq!(group_key(&r, &["region".to_string(), "desk".to_string()]), "east|4");
    }
}
