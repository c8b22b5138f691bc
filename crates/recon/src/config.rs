use serde::{Deserialize, Serialize};

use crate::error::ReconError;

// ---------------------------------------------------------------------------
// Key spec
// ---------------------------------------------------------------------------

/// How a key field is canonicalized before comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "Option<String>")]
pub enum KeyType {
    #[default]
    Text,
    Date,
    Amount,
}

/// Unknown or missing type tags read as text.
impl From<Option<String>> for KeyType {
    fn from(tag: Option<String>) -> Self {
        match tag.as_deref().map(str::trim) {
            Some("date") => Self::Date,
            Some("amount") => Self::Amount,
            _ => Self::Text,
        }
    }
}

impl std::fmt::Display for KeyType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text => write!(f, "text"),
            Self::Date => write!(f, "date"),
            Self::Amount => write!(f, "amount"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeySpec {
    pub field: String,
    #[serde(rename = "type", default)]
    pub kind: KeyType,
}

impl KeySpec {
    pub fn new(field: impl Into<String>, kind: KeyType) -> Self {
        Self { field: field.into(), kind }
    }

    pub fn text(field: impl Into<String>) -> Self {
        Self::new(field, KeyType::Text)
    }
}

// ---------------------------------------------------------------------------
// Rule configuration
// ---------------------------------------------------------------------------

/// Matching rules. Every field is optional when deserialized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RuleConfig {
    /// Ordered composite key. Empty means every record shares one key.
    pub keys: Vec<KeySpec>,
    pub amount_tolerance: f64,
    pub amount_field: String,
    /// `None` or an empty name disables fuzzy fallback.
    pub fuzzy_field: Option<String>,
    pub fuzzy_threshold: f64,
    pub group_by: Vec<String>,
}

pub const DEFAULT_AMOUNT_FIELD: &str = "amount";
pub const DEFAULT_FUZZY_THRESHOLD: f64 = 0.9;

impl Default for RuleConfig {
    fn default() -> Self {
        Self {
            keys: Vec::new(),
            amount_tolerance: 0.0,
            amount_field: DEFAULT_AMOUNT_FIELD.to_string(),
            fuzzy_field: None,
            fuzzy_threshold: DEFAULT_FUZZY_THRESHOLD,
            group_by: Vec::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl RuleConfig {
    pub fn from_toml(input: &str) -> Result<Self, ReconError> {
        let config: RuleConfig =
            toml::from_str(input).map_err(|e| ReconError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json(input: &str) -> Result<Self, ReconError> {
        let config: RuleConfig =
            serde_json::from_str(input).map_err(|e| ReconError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ReconError> {
        if !self.amount_tolerance.is_finite() || self.amount_tolerance < 0.0 {
            return Err(ReconError::ConfigValidation(format!(
                "amountTolerance must be a non-negative number, got {}",
                self.amount_tolerance
            )));
        }

        if !(0.0..=1.0).contains(&self.fuzzy_threshold) {
            return Err(ReconError::ConfigValidation(format!(
                "fuzzyThreshold must be between 0 and 1, got {}",
                self.fuzzy_threshold
            )));
        }

        if self.amount_field.trim().is_empty() {
            return Err(ReconError::ConfigValidation(
                "amountField must not be empty".into(),
            ));
        }

        for (i, key) in self.keys.iter().enumerate() {
            if key.field.is_empty() {
                log::warn!("key #{i} has an empty field name; it will read as null for every record");
            }
        }

        Ok(())
    }

    /// The configured fuzzy field, if fuzzy fallback is enabled.
    pub fn fuzzy_field(&self) -> Option<&str> {
        self.fuzzy_field.as_deref().filter(|f| !f.is_empty())
    }

    pub fn has_grouping(&self) -> bool {
        !self.group_by.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
