//! Filter to keep only items that appear in the interaction data.
//!
//! The model can score every trained item, including ones nobody has
//! interacted with in the current matrix. Those are dropped here and the
//! list is not backfilled, so fewer than N items may remain.

use crate::traits::Filter;
use crate::types::Candidate;
use anyhow::Result;
use data_loader::Dataset;
use std::sync::Arc;

/// Removes candidates outside the active-item set.
///
/// ## Algorithm
/// Uses the HashSet in `ActiveSets` for O(1) lookups.
pub struct ActiveItemFilter {
    dataset: Arc<Dataset>,
}

impl ActiveItemFilter {
    pub fn new(dataset: Arc<Dataset>) -> Self {
        Self { dataset }
    }
}

impl Filter for ActiveItemFilter {
    fn name(&self) -> &str {
        "ActiveItemFilter"
    }

    fn apply(&self, candidates: Vec<Candidate>) -> Result<Vec<Candidate>> {
        let active = self.dataset.active();
        let filtered: Vec<Candidate> = candidates
            .into_iter()
            .filter(|candidate| active.contains_item(candidate.item_idx))
            .collect();
        Ok(filtered)
    }
}
