//! Public API types re-used by external crates (e.g., the HTTP API layer).

use std::time::Duration;

use serde::Serialize;

use crate::cfg::{DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_SCORE_MIN, DEFAULT_TOP_K};

/// Retrieval knobs applied to every question.
///
/// # Example
/// ```
/// use contextor::RetrievalOptions;
/// let opts = RetrievalOptions { top_k: 3, ..RetrievalOptions::default() };
/// assert_eq!(opts.score_min, 0.2);
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RetrievalOptions {
    /// Nearest neighbours fetched from the index.
    pub top_k: usize,
    /// Minimum inner-product score a hit needs to be kept.
    pub score_min: f32,
    /// Bound on the query embedding + search step.
    pub request_timeout: Duration,
}

impl Default for RetrievalOptions {
    fn default() -> Self {
        Self {
            top_k: DEFAULT_TOP_K,
            score_min: DEFAULT_SCORE_MIN,
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        }
    }
}

/// Final answer for one question.
///
/// `tag` is the category of the best retrieved record, or empty when nothing
/// passed the threshold.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Answer {
    pub reply: String,
    pub tag: String,
}

/// Shape of the loaded knowledge base.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct PipelineStats {
    pub entries: usize,
    pub dim: usize,
}
