//! Candidate items flowing through the filter pipeline.

use als_model::ScoredItem;

/// An item proposed by the model, identified by its matrix column index
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    pub item_idx: usize,
    /// Model score, higher is better
    pub score: f32,
}

impl Candidate {
    pub fn new(item_idx: usize, score: f32) -> Self {
        Self { item_idx, score }
    }
}

impl From<ScoredItem> for Candidate {
    fn from(item: ScoredItem) -> Self {
        Self::new(item.index, item.score)
    }
}
