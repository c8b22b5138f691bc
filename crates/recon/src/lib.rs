//! `matchbook-recon`: two-source record reconciliation engine.
//!
//! Pure engine crate: receives pre-loaded records and a rule set, returns
//! matched pairs, unmatched rows, exceptions and group summaries.
//! No CLI or IO dependencies.

pub mod aggregate;
pub mod config;
pub mod engine;
pub mod error;
pub mod matcher;
pub mod model;
pub mod normalize;
pub mod request;
pub mod similarity;
pub mod summary;

pub use config::{KeySpec, KeyType, RuleConfig};
pub use engine::reconcile;
pub use error::ReconError;
pub use model::{
    Exception, GroupSummaryRow, MatchMethod, MatchedPair, Record, ReconResult, ReconSummary,
    UnmatchedEntry, Value,
};
pub use request::{handle_request, ErrorResponse, ReconRequest};
