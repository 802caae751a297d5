//! Active user and item sets.
//!
//! An index is "active" when it has at least one nonzero entry in the
//! interaction matrix. Explicitly stored zeros do not count.

use crate::types::{IdMapping, InteractionMatrix, RawId};
use rayon::prelude::*;
use std::collections::{BTreeSet, HashSet};

/// Row and column indices that carry at least one interaction
#[derive(Debug, Clone, Default)]
pub struct ActiveSets {
    users: BTreeSet<usize>,
    items: HashSet<usize>,
}

impl ActiveSets {
    /// Derive both sets from the matrix in O(nnz)
    pub fn from_matrix(matrix: &InteractionMatrix) -> Self {
        let (rows, _) = matrix.shape();

        let per_row: Vec<(usize, Vec<usize>)> = (0..rows)
            .into_par_iter()
            .filter_map(|user_idx| {
                let row = matrix.row(user_idx)?;
                let cols: Vec<usize> = row
                    .iter()
                    .filter(|&(_, value)| value != 0.0)
                    .map(|(col, _)| col)
                    .collect();
                (!cols.is_empty()).then_some((user_idx, cols))
            })
            .collect();

        let mut active = ActiveSets::default();
        for (user_idx, cols) in per_row {
            active.users.insert(user_idx);
            active.items.extend(cols);
        }
        active
    }

    pub fn contains_user(&self, user_idx: usize) -> bool {
        self.users.contains(&user_idx)
    }

    pub fn contains_item(&self, item_idx: usize) -> bool {
        self.items.contains(&item_idx)
    }

    /// Active user indices, ascending
    pub fn user_indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.users.iter().copied()
    }

    /// Active item indices, ascending
    pub fn item_indices(&self) -> Vec<usize> {
        let mut items: Vec<usize> = self.items.iter().copied().collect();
        items.sort_unstable();
        items
    }

    /// Raw ids of the active users, sorted ascending by raw id
    pub fn active_user_ids(&self, users: &IdMapping) -> Vec<RawId> {
        let mut ids: Vec<RawId> = self
            .users
            .iter()
            .filter_map(|&idx| users.raw_of(idx).cloned())
            .collect();
        ids.sort();
        ids
    }

    /// (active users, active items)
    pub fn counts(&self) -> (usize, usize) {
        (self.users.len(), self.items.len())
    }
}
