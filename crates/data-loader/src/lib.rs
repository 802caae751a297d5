//! # Data Loader Crate
//!
//! Loads the artifacts produced by the training pipeline: the sparse
//! user x item interaction matrix and the user/item id mappings.
//!
//! ## Main Components
//!
//! - **types**: `RawId`, `IdMapping`, `InteractionMatrix`, `SparseRow`
//! - **parser**: decode the JSON artifacts
//! - **active**: active user/item sets derived from the matrix
//! - **index**: `Dataset`, the validated bundle of matrix + mappings
//! - **paths**: where the artifacts live
//! - **error**: `LoadError`
//!
//! ## Example Usage
//!
//! ```ignore
//! use data_loader::{ArtifactPaths, Dataset, RawId};
//!
//! let dataset = Dataset::load(&ArtifactPaths::in_dir("."))?;
//! let users = dataset.active_user_ids();
//! let idx = dataset.users().index_of(&RawId::from("42"));
//! ```

pub mod active;
pub mod error;
pub mod index;
pub mod parser;
pub mod paths;
pub mod types;

pub use active::ActiveSets;
pub use error::{LoadError, Result};
pub use index::Dataset;
pub use paths::ArtifactPaths;
pub use types::{IdMapping, InteractionMatrix, RawId, SparseRow};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_id_natural_order() {
        let mut ids: Vec<RawId> = ["b", "10", "2", "a", "007", "7"]
            .iter()
            .map(|&s| RawId::from(s))
            .collect();
        ids.sort();

        let sorted: Vec<&str> = ids.iter().map(|id| id.as_str()).collect();
        assert_eq!(sorted, vec!["2", "007", "7", "10", "a", "b"]);
    }

    #[test]
    fn test_raw_id_from_json_number_or_string() {
        let ids: Vec<RawId> = serde_json::from_str(r#"[5, "5", "abc"]"#).unwrap();
        assert_eq!(ids[0], ids[1]);
        assert_eq!(ids[2].as_str(), "abc");
    }

    #[test]
    fn test_mapping_roundtrip_lookup() {
        let mapping =
            IdMapping::from_ordered("item", vec!["x".into(), "y".into(), "z".into()]).unwrap();

        for idx in 0..mapping.len() {
            let raw = mapping.raw_of(idx).unwrap();
            assert_eq!(mapping.index_of(raw), Some(idx));
        }
        assert!(mapping.raw_of(3).is_none());
        assert!(!mapping.contains(&RawId::from("w")));
    }

    #[test]
    fn test_mapping_rejects_duplicate_raw_ids() {
        let err = IdMapping::from_ordered("user", vec!["a".into(), "a".into()]).unwrap_err();
        assert!(matches!(err, LoadError::InvalidMapping { .. }));
    }

    #[test]
    fn test_triplets_sum_duplicates() {
        let matrix =
            InteractionMatrix::from_triplets(2, 2, &[(1, 1, 1.0), (0, 0, 2.0), (1, 1, 3.0)])
                .unwrap();
        assert_eq!(matrix.nnz(), 2);
        let row: Vec<(usize, f32)> = matrix.row(1).unwrap().iter().collect();
        assert_eq!(row, vec![(1, 4.0)]);
    }

    #[test]
    fn test_csr_validation() {
        // indptr too short
        assert!(InteractionMatrix::from_csr(2, 2, vec![0, 1], vec![0], vec![1.0]).is_err());
        // column out of range
        assert!(InteractionMatrix::from_csr(1, 2, vec![0, 1], vec![5], vec![1.0]).is_err());
        // non-finite value
        assert!(InteractionMatrix::from_csr(1, 1, vec![0, 1], vec![0], vec![f32::NAN]).is_err());
        // indptr decreasing
        assert!(
            InteractionMatrix::from_csr(2, 2, vec![0, 2, 1], vec![0, 1], vec![1.0, 1.0]).is_err()
        );
    }
}
