//! JSON request/response contract for callers that wrap the engine
//! (`{source1, source2, rules}` in, result or error body out).

use serde::{Deserialize, Serialize};

use crate::config::RuleConfig;
use crate::engine::reconcile;
use crate::error::ReconError;
use crate::model::{Record, ReconResult};

pub const FAILURE_MESSAGE: &str = "Reconciliation failed";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReconRequest {
    #[serde(default)]
    pub source1: Vec<Record>,
    #[serde(default)]
    pub source2: Vec<Record>,
    /// `null` or absent rules fall back to the defaults.
    #[serde(default)]
    pub rules: Option<RuleConfig>,
}

impl ReconRequest {
    pub fn from_json(body: &str) -> Result<Self, ReconError> {
        serde_json::from_str(body).map_err(|e| ReconError::InvalidInput(e.to_string()))
    }

    pub fn run(&self) -> Result<ReconResult, ReconError> {
        let default_rules = RuleConfig::default();
        let rules = self.rules.as_ref().unwrap_or(&default_rules);
        rules.validate()?;
        Ok(reconcile(&self.source1, &self.source2, rules))
    }
}

/// Body returned in place of a result when a request cannot be served.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub details: String,
}

impl From<ReconError> for ErrorResponse {
    fn from(err: ReconError) -> Self {
        Self {
            error: FAILURE_MESSAGE.to_string(),
            details: err.to_string(),
        }
    }
}

/// Parse and run one request. Any failure becomes an `ErrorResponse`;
/// no partial result is ever returned.
pub fn handle_request(body: &str) -> Result<ReconResult, ErrorResponse> {
    let request = ReconRequest::from_json(body).map_err(|e| {
        log::warn!("rejected reconciliation request: {e}");
        ErrorResponse::from(e)
    })?;
    request.run().map_err(|e| {
        log::warn!("reconciliation request failed: {e}");
        ErrorResponse::from(e)
    })
}
