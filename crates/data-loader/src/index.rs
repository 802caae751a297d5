//! Dataset loading and validation.
//!
//! Builds a `Dataset` from the three data artifacts:
//! - parse the interaction matrix and both mappings in parallel
//! - check that mapping sizes match the matrix shape
//! - derive the active user/item sets once

use crate::active::ActiveSets;
use crate::error::{LoadError, Result};
use crate::parser;
use crate::paths::ArtifactPaths;
use crate::types::{IdMapping, InteractionMatrix, RawId, SparseRow};
use std::time::Instant;
use tracing::info;

/// Everything the recommender reads besides the model.
///
/// Immutable after construction; share it behind an `Arc`.
#[derive(Debug)]
pub struct Dataset {
    matrix: InteractionMatrix,
    users: IdMapping,
    items: IdMapping,
    active: ActiveSets,
}

impl Dataset {
    /// Assemble a dataset, validating dimensions and computing active sets
    pub fn new(matrix: InteractionMatrix, users: IdMapping, items: IdMapping) -> Result<Self> {
        let (rows, cols) = matrix.shape();
        if users.len() != rows {
            return Err(LoadError::DimensionMismatch {
                what: format!("{} mapping vs matrix rows", users.kind()),
                expected: rows,
                found: users.len(),
            });
        }
        if items.len() != cols {
            return Err(LoadError::DimensionMismatch {
                what: format!("{} mapping vs matrix columns", items.kind()),
                expected: cols,
                found: items.len(),
            });
        }

        let active = ActiveSets::from_matrix(&matrix);
        Ok(Self {
            matrix,
            users,
            items,
            active,
        })
    }

    /// Load the interaction matrix and both mappings from disk
    pub fn load(paths: &ArtifactPaths) -> Result<Self> {
        let start = Instant::now();
        info!("Loading interaction data from {}", paths.interactions.display());

        // Three independent files: parse them in parallel
        let ((matrix, users), items) = rayon::join(
            || {
                rayon::join(
                    || parser::parse_interactions(&paths.interactions),
                    || parser::parse_mapping(&paths.user_mappings, "user"),
                )
            },
            || parser::parse_mapping(&paths.item_mappings, "item"),
        );

        let dataset = Self::new(matrix?, users?, items?)?;

        let (rows, cols) = dataset.matrix.shape();
        let (active_users, active_items) = dataset.active.counts();
        info!(
            "Loaded {} users x {} items ({} interactions, {} active users, {} active items) in {:?}",
            rows,
            cols,
            dataset.matrix.nnz(),
            active_users,
            active_items,
            start.elapsed()
        );
        Ok(dataset)
    }

    pub fn matrix(&self) -> &InteractionMatrix {
        &self.matrix
    }

    pub fn users(&self) -> &IdMapping {
        &self.users
    }

    pub fn items(&self) -> &IdMapping {
        &self.items
    }

    pub fn active(&self) -> &ActiveSets {
        &self.active
    }

    /// Row of a user, or an empty row for an index the matrix does not have
    pub fn user_row(&self, user_idx: usize) -> SparseRow<'_> {
        self.matrix.row(user_idx).unwrap_or_else(SparseRow::empty)
    }

    /// Raw ids of active users, ascending
    pub fn active_user_ids(&self) -> Vec<RawId> {
        self.active.active_user_ids(&self.users)
    }

    /// (users, items, interactions)
    pub fn counts(&self) -> (usize, usize, usize) {
        (self.users.len(), self.items.len(), self.matrix.nnz())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn ids(raw: &[&str]) -> Vec<RawId> {
        raw.iter().map(|&s| RawId::from(s)).collect()
    }

    #[test]
    fn test_new_rejects_user_count_mismatch() {
        let matrix = InteractionMatrix::from_triplets(3, 2, &[(0, 0, 1.0)]).unwrap();
        let users = IdMapping::from_ordered("user", ids(&["a", "b"])).unwrap();
        let items = IdMapping::from_ordered("item", ids(&["x", "y"])).unwrap();

        let err = Dataset::new(matrix, users, items).unwrap_err();
        assert!(matches!(err, LoadError::DimensionMismatch { expected: 3, found: 2, .. }));
    }

    #[test]
    fn test_new_rejects_item_count_mismatch() {
        let matrix = InteractionMatrix::from_triplets(1, 2, &[(0, 0, 1.0)]).unwrap();
        let users = IdMapping::from_ordered("user", ids(&["a"])).unwrap();
        let items = IdMapping::from_ordered("item", ids(&["x", "y", "z"])).unwrap();

        match Dataset::new(matrix, users, items).unwrap_err() {
            LoadError::DimensionMismatch { what, .. } => {
                assert_eq!(what, "item mapping vs matrix columns")
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_load_from_files() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("UI_csr.json"),
            r#"{"shape": [3, 3], "indptr": [0, 1, 1, 2], "indices": [1, 2], "data": [1.0, 1.0]}"#,
        )
        .unwrap();
        fs::write(
            dir.path().join("user_mappings.json"),
            r#"[{"u0": 0, "u1": 1, "u2": 2}, {"0": "u0", "1": "u1", "2": "u2"}]"#,
        )
        .unwrap();
        fs::write(
            dir.path().join("item_mappings.json"),
            r#"[{"i0": 0, "i1": 1, "i2": 2}, {"0": "i0", "1": "i1", "2": "i2"}]"#,
        )
        .unwrap();

        let dataset = Dataset::load(&ArtifactPaths::in_dir(dir.path())).unwrap();
        assert_eq!(dataset.counts(), (3, 3, 2));
        assert_eq!(dataset.active_user_ids(), ids(&["u0", "u2"]));
        assert!(dataset.active().contains_item(1));
        assert_eq!(dataset.user_row(1).nnz(), 0);
    }

    #[test]
    fn test_load_fails_when_a_file_is_missing() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("UI_csr.json"),
            r#"{"shape": [0, 0], "indptr": [0], "indices": [], "data": []}"#,
        )
        .unwrap();

        let err = Dataset::load(&ArtifactPaths::in_dir(dir.path())).unwrap_err();
        assert!(matches!(err, LoadError::FileNotFound { .. }));
    }
}
