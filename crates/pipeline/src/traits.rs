//! Core traits for the filtering pipeline.

use crate::types::Candidate;
use anyhow::Result;

/// Core trait for filtering candidates.
///
/// Filters take ownership of the candidate list and return what survives.
/// They must keep the relative order of the candidates they retain: the
/// model's ranking is the final ranking.
pub trait Filter: Send + Sync {
    /// Returns the name of this filter (for logging/debugging)
    fn name(&self) -> &str;

    /// Apply this filter to a set of candidates.
    fn apply(&self, candidates: Vec<Candidate>) -> Result<Vec<Candidate>>;
}
