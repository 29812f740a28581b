//! Error kinds surfaced by the listing pipeline.

use thiserror::Error;

/// Classified failure modes of the fetch/optimize pipeline.
///
/// Validation failures are rejected before any network or database access.
/// Upstream and generation failures carry a distinguishable kind so callers
/// can decide whether a retry makes sense; the core never retries on its own.
#[derive(Debug, Error)]
pub enum ListingError {
    /// The token does not have the shape of a catalog identifier.
    #[error("invalid ASIN {0:?}: expected exactly 10 characters from A-Z0-9")]
    InvalidAsin(String),

    /// A malformed request that never reaches the network or the store.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The identifier is unknown, either upstream or in the local store.
    #[error("not found: {0}")]
    NotFound(String),

    /// Network-level failure reaching the listing page.
    #[error("upstream unreachable: {0}")]
    Unreachable(#[source] reqwest::Error),

    /// The listing page did not answer within the request timeout.
    #[error("upstream timed out: {0}")]
    Timeout(#[source] reqwest::Error),

    /// The document was fetched but no usable listing could be extracted.
    #[error("extraction failed: {0}")]
    Extraction(String),

    /// The generative service reported an error or exhausted its quota.
    #[error("generation failed: {0}")]
    Generation(String),

    /// A feedback payload that fails validation.
    #[error("invalid feedback: {0}")]
    InvalidFeedback(String),

    /// A persistence-layer failure. Always surfaced, never swallowed.
    #[error("storage failure: {0}")]
    Store(#[from] anyhow::Error),
}

impl ListingError {
    /// Stable machine-readable kind, used in per-item batch error reports.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidAsin(_) => "INVALID_ASIN",
            Self::InvalidRequest(_) => "INVALID_REQUEST",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Unreachable(_) => "UPSTREAM_UNREACHABLE",
            Self::Timeout(_) => "UPSTREAM_TIMEOUT",
            Self::Extraction(_) => "EXTRACTION_FAILED",
            Self::Generation(_) => "GENERATION_FAILED",
            Self::InvalidFeedback(_) => "INVALID_FEEDBACK",
            Self::Store(_) => "STORE_FAILURE",
        }
    }
}
