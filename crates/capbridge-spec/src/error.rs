//! Error types for the parsing pipeline.

use capbridge_core::cache::CacheError;
use capbridge_core::fetch::FetchError;
use thiserror::Error;

/// Errors surfaced by the specification parser.
///
/// Per-node problems never appear here: a malformed service or property is
/// skipped with a warning and its siblings continue. This enum covers the
/// failures that make a whole identifier unparseable.
#[derive(Error, Debug)]
pub enum SpecError {
    #[error("capability document for {identifier} is malformed: {reason}")]
    MalformedDocument { identifier: String, reason: String },

    #[error("specification for {0} is unavailable: network failed and no cached copy exists")]
    Unavailable(String),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl SpecError {
    pub(crate) fn malformed(identifier: &str, reason: impl Into<String>) -> Self {
        Self::MalformedDocument {
            identifier: identifier.to_string(),
            reason: reason.into(),
        }
    }
}
