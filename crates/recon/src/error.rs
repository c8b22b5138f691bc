use std::fmt;

/// Errors raised at the engine's boundaries.
///
/// `reconcile` itself never fails: malformed field values degrade to empty
/// tokens instead. These variants cover rules files and request bodies.
#[derive(Debug, Clone, PartialEq)]
pub enum ReconError {
    /// TOML / JSON parse or deserialization error in a rules file.
    ConfigParse(String),
    /// Rules parsed but carry out-of-range values.
    ConfigValidation(String),
    /// Request body is not the expected shape (non-list source, nested value).
    InvalidInput(String),
    /// IO error (file read, CSV decode, etc.).
    Io(String),
}

impl fmt::Display for ReconError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConfigParse(msg) => write!(f, "config parse error: {msg}"),
            Self::ConfigValidation(msg) => write!(f, "config validation error: {msg}"),
            Self::InvalidInput(msg) => write!(f, "invalid input: {msg}"),
            Self::Io(msg) => write!(f, "IO error: {msg}"),
        }
    }
}

impl std::error::Error for ReconError {}
