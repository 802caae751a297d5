//! Alternating-least-squares factorization model (read-only).
//!
//! Scores are inner products between a user factor and every item factor.
//! With `recalculate_user` the user factor is re-derived from the user's
//! current interaction row instead of the one stored at training time:
//!
//! ```text
//! (YᵀY + λI + Σ (c_i - 1) y_i y_iᵀ) x = Σ_{c_i > 0} c_i y_i
//! ```
//!
//! where the sums run over the items `i` in the row with confidence `c_i`.
//! Negative confidences enter the left-hand side with their magnitude and
//! contribute nothing to the right-hand side.

use crate::error::{ModelError, Result};
use crate::linalg;
use data_loader::{LoadError, SparseRow, parser};
use rayon::prelude::*;
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info, instrument};

/// One ranked item as produced by the model
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoredItem {
    pub index: usize,
    pub score: f32,
}

/// Knobs of a single `recommend` call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecommendOptions {
    /// Derive the user factor from the supplied row
    pub recalculate_user: bool,
    /// Drop items already present in the supplied row
    pub filter_already_liked_items: bool,
}

impl Default for RecommendOptions {
    fn default() -> Self {
        Self {
            recalculate_user: false,
            filter_already_liked_items: true,
        }
    }
}

impl RecommendOptions {
    pub fn recalculating() -> Self {
        Self {
            recalculate_user: true,
            ..Self::default()
        }
    }
}

/// Anything that can rank items for a user.
///
/// `Send + Sync` so one instance can be shared by every request handler.
pub trait Recommender: Send + Sync {
    /// Top `n` items for `user_idx`, best first
    fn recommend(
        &self,
        user_idx: usize,
        user_row: SparseRow<'_>,
        n: usize,
        options: RecommendOptions,
    ) -> Result<Vec<ScoredItem>>;

    /// Number of items the model can score
    fn item_count(&self) -> usize;
}

/// Serialized model layout
#[derive(Debug, Deserialize)]
struct ModelFile {
    factors: usize,
    #[serde(default)]
    regularization: f32,
    #[serde(default = "default_alpha")]
    alpha: f32,
    user_factors: Vec<Vec<f32>>,
    item_factors: Vec<Vec<f32>>,
}

fn default_alpha() -> f32 {
    1.0
}

/// Trained ALS model: user factors X (users x k), item factors Y (items x k)
#[derive(Debug, Clone)]
pub struct AlsModel {
    factors: usize,
    regularization: f32,
    /// Confidence scale applied to interaction values
    alpha: f32,
    user_factors: Vec<f32>,
    item_factors: Vec<f32>,
    /// YᵀY, precomputed once
    yty: Vec<f32>,
}

impl AlsModel {
    /// Build a model from factor tables, one inner `Vec` per user / item
    pub fn new(
        factors: usize,
        regularization: f32,
        user_factors: Vec<Vec<f32>>,
        item_factors: Vec<Vec<f32>>,
    ) -> data_loader::Result<Self> {
        if factors == 0 {
            return Err(LoadError::InvalidModel("factor size must be positive".to_string()));
        }
        if !regularization.is_finite() || regularization < 0.0 {
            return Err(LoadError::InvalidModel(format!(
                "regularization must be a non-negative number, got {}",
                regularization
            )));
        }

        if item_factors.is_empty() {
            return Err(LoadError::InvalidModel("model has no item factors".to_string()));
        }
        if factors.checked_mul(factors).is_none() {
            return Err(LoadError::InvalidModel(format!(
                "factor size {} is too large",
                factors
            )));
        }

        let user_factors = flatten("user", factors, user_factors)?;
        let item_factors = flatten("item", factors, item_factors)?;
        let yty = linalg::gram(&item_factors, factors);

        Ok(Self {
            factors,
            regularization,
            alpha: default_alpha(),
            user_factors,
            item_factors,
            yty,
        })
    }

    /// Scale interaction values by `alpha` when recalculating user factors
    pub fn with_alpha(mut self, alpha: f32) -> data_loader::Result<Self> {
        if !alpha.is_finite() || alpha <= 0.0 {
            return Err(LoadError::InvalidModel(format!(
                "alpha must be a positive number, got {}",
                alpha
            )));
        }
        self.alpha = alpha;
        Ok(self)
    }

    /// Load a model artifact from disk
    pub fn load(path: &Path) -> data_loader::Result<Self> {
        let start = Instant::now();
        info!("Loading factorization model from {}", path.display());

        let file: ModelFile = parser::read_json(path)?;
        let model = Self::new(
            file.factors,
            file.regularization,
            file.user_factors,
            file.item_factors,
        )?
        .with_alpha(file.alpha)?;

        info!(
            "Loaded model: {} factors, {} users, {} items in {:?}",
            model.factors,
            model.user_count(),
            model.item_count(),
            start.elapsed()
        );
        Ok(model)
    }

    pub fn factors(&self) -> usize {
        self.factors
    }

    pub fn regularization(&self) -> f32 {
        self.regularization
    }

    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    pub fn user_count(&self) -> usize {
        self.user_factors.len() / self.factors
    }

    fn item(&self, idx: usize) -> &[f32] {
        &self.item_factors[idx * self.factors..(idx + 1) * self.factors]
    }

    /// Latent factor of a user, trained or recomputed from `user_row`
    pub fn user_factor(
        &self,
        user_idx: usize,
        user_row: SparseRow<'_>,
        recalculate: bool,
    ) -> Result<Vec<f32>> {
        self.check_row(&user_row)?;
        if recalculate {
            return self.recalculate_user_factor(user_row);
        }
        let users = self.user_count();
        if user_idx >= users {
            return Err(ModelError::UserIndexOutOfRange {
                index: user_idx,
                users,
            });
        }
        let k = self.factors;
        Ok(self.user_factors[user_idx * k..(user_idx + 1) * k].to_vec())
    }

    fn recalculate_user_factor(&self, user_row: SparseRow<'_>) -> Result<Vec<f32>> {
        let k = self.factors;
        if user_row.nnz() == 0 {
            return Ok(vec![0.0; k]);
        }

        let mut a = self.yty.clone();
        for d in 0..k {
            a[d * k + d] += self.regularization;
        }
        let mut b = vec![0.0f32; k];

        for (item_idx, value) in user_row.iter() {
            let confidence = self.alpha * value;
            let y = self.item(item_idx);
            let weight = if confidence > 0.0 {
                for (bi, yi) in b.iter_mut().zip(y) {
                    *bi += confidence * yi;
                }
                confidence
            } else {
                -confidence
            };
            linalg::add_outer(&mut a, y, weight - 1.0);
        }

        linalg::cholesky_solve(&a, &b).ok_or(ModelError::Singular)
    }

    fn check_row(&self, user_row: &SparseRow<'_>) -> Result<()> {
        if user_row.indices.len() != user_row.data.len() {
            return Err(ModelError::MalformedRow {
                indices: user_row.indices.len(),
                values: user_row.data.len(),
            });
        }
        let items = self.item_count();
        if let Some(&index) = user_row.indices.iter().find(|&&i| i >= items) {
            return Err(ModelError::ItemIndexOutOfRange { index, items });
        }
        Ok(())
    }
}

impl Recommender for AlsModel {
    #[instrument(skip(self, user_row), fields(row_nnz = user_row.nnz()))]
    fn recommend(
        &self,
        user_idx: usize,
        user_row: SparseRow<'_>,
        n: usize,
        options: RecommendOptions,
    ) -> Result<Vec<ScoredItem>> {
        let user = self.user_factor(user_idx, user_row, options.recalculate_user)?;

        let liked: HashSet<usize> = if options.filter_already_liked_items {
            user_row.indices.iter().copied().collect()
        } else {
            HashSet::new()
        };

        let mut ranked: Vec<ScoredItem> = (0..self.item_count())
            .into_par_iter()
            .filter(|idx| !liked.contains(idx))
            .map(|index| ScoredItem {
                index,
                score: linalg::dot(self.item(index), &user),
            })
            .collect();

        let by_score = |a: &ScoredItem, b: &ScoredItem| {
            b.score.total_cmp(&a.score).then(a.index.cmp(&b.index))
        };
        if n < ranked.len() {
            ranked.select_nth_unstable_by(n, by_score);
            ranked.truncate(n);
        }
        ranked.sort_unstable_by(by_score);

        debug!("Ranked {} items for user index {}", ranked.len(), user_idx);
        Ok(ranked)
    }

    fn item_count(&self) -> usize {
        self.item_factors.len() / self.factors
    }
}

fn flatten(kind: &str, k: usize, rows: Vec<Vec<f32>>) -> data_loader::Result<Vec<f32>> {
    for (idx, row) in rows.iter().enumerate() {
        if row.len() != k {
            return Err(LoadError::InvalidModel(format!(
                "{} factor {} has {} entries, expected {}",
                kind,
                idx,
                row.len(),
                k
            )));
        }
        if row.iter().any(|v| !v.is_finite()) {
            return Err(LoadError::InvalidModel(format!(
                "{} factor {} contains a non-finite value",
                kind, idx
            )));
        }
    }
    Ok(rows.into_iter().flatten().collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Two factors, four items pointing in distinct directions
    fn build_test_model() -> AlsModel {
        AlsModel::new(
            2,
            0.1,
            vec![vec![1.0, 0.0], vec![0.0, 1.0]],
            vec![
                vec![1.0, 0.0],
                vec![0.9, 0.1],
                vec![0.0, 1.0],
                vec![0.5, 0.5],
            ],
        )
        .unwrap()
    }

    fn row<'a>(indices: &'a [usize], data: &'a [f32]) -> SparseRow<'a> {
        SparseRow { indices, data }
    }

    #[test]
    fn test_trained_factor_ranking() {
        let model = build_test_model();
        let options = RecommendOptions {
            recalculate_user: false,
            filter_already_liked_items: false,
        };

        let recs = model.recommend(0, SparseRow::empty(), 4, options).unwrap();
        let order: Vec<usize> = recs.iter().map(|r| r.index).collect();
        assert_eq!(order, vec![0, 1, 3, 2]);
        assert!(recs.windows(2).all(|w| w[0].score >= w[1].score));
    }

    #[test]
    fn test_truncates_to_n() {
        let model = build_test_model();
        let recs = model
            .recommend(1, SparseRow::empty(), 2, RecommendOptions::default())
            .unwrap();
        assert_eq!(recs.len(), 2);
        assert_eq!(recs[0].index, 2);
    }

    #[test]
    fn test_zero_n_is_empty() {
        let model = build_test_model();
        let recs = model
            .recommend(0, SparseRow::empty(), 0, RecommendOptions::default())
            .unwrap();
        assert!(recs.is_empty());
    }

    #[test]
    fn test_recalculated_user_follows_row() {
        let model = build_test_model();
        // Interacted with item 2 only: the recomputed factor points along axis 2
        let recs = model
            .recommend(0, row(&[2], &[5.0]), 3, RecommendOptions::recalculating())
            .unwrap();

        let order: Vec<usize> = recs.iter().map(|r| r.index).collect();
        assert_eq!(order, vec![3, 1, 0]);
    }

    #[test]
    fn test_already_liked_items_are_filtered() {
        let model = build_test_model();
        let recs = model
            .recommend(0, row(&[0, 1], &[1.0, 1.0]), 4, RecommendOptions::recalculating())
            .unwrap();

        assert_eq!(recs.len(), 2);
        assert!(recs.iter().all(|r| r.index != 0 && r.index != 1));
    }

    #[test]
    fn test_empty_row_recalculates_to_zero_scores() {
        let model = build_test_model();
        let recs = model
            .recommend(7, SparseRow::empty(), 4, RecommendOptions::recalculating())
            .unwrap();

        assert_eq!(recs.len(), 4);
        assert!(recs.iter().all(|r| r.score == 0.0));
        // ties fall back to index order
        let order: Vec<usize> = recs.iter().map(|r| r.index).collect();
        assert_eq!(order, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_user_out_of_range_without_recalculation() {
        let model = build_test_model();
        let err = model
            .recommend(5, SparseRow::empty(), 3, RecommendOptions::default())
            .unwrap_err();
        assert_eq!(err, ModelError::UserIndexOutOfRange { index: 5, users: 2 });
    }

    #[test]
    fn test_item_out_of_range_in_row() {
        let model = build_test_model();
        let err = model
            .recommend(0, row(&[9], &[1.0]), 3, RecommendOptions::recalculating())
            .unwrap_err();
        assert_eq!(err, ModelError::ItemIndexOutOfRange { index: 9, items: 4 });
    }

    #[test]
    fn test_malformed_row() {
        let model = build_test_model();
        let err = model
            .recommend(0, row(&[0, 1], &[1.0]), 3, RecommendOptions::recalculating())
            .unwrap_err();
        assert!(matches!(err, ModelError::MalformedRow { .. }));
    }

    #[test]
    fn test_new_rejects_ragged_factors() {
        let err = AlsModel::new(2, 0.1, vec![vec![1.0]], vec![]).unwrap_err();
        assert!(matches!(err, LoadError::InvalidModel(_)));
    }

    #[test]
    fn test_new_rejects_zero_factors() {
        assert!(AlsModel::new(0, 0.1, vec![], vec![]).is_err());
    }

    #[test]
    fn test_new_rejects_missing_item_factors() {
        let err = AlsModel::new(5_000_000_000, 0.1, vec![], vec![]).unwrap_err();
        assert!(matches!(err, LoadError::InvalidModel(_)));
    }

    #[test]
    fn test_new_rejects_factor_size_past_row_length() {
        let err = AlsModel::new(usize::MAX, 0.1, vec![], vec![vec![1.0]]).unwrap_err();
        assert!(matches!(err, LoadError::InvalidModel(_)));

        let err = AlsModel::new(100_000, 0.1, vec![], vec![vec![1.0, 2.0]]).unwrap_err();
        assert!(matches!(err, LoadError::InvalidModel(_)));
    }

    #[test]
    fn test_alpha_scales_confidence() {
        // k = 1, both items y = 1, λ = 1: A = 2 + 1 + (c − 1), b = c, so x = c / (c + 2)
        let base = AlsModel::new(1, 1.0, vec![], vec![vec![1.0], vec![1.0]]).unwrap();
        let scaled = base.clone().with_alpha(4.0).unwrap();
        assert_eq!(base.alpha(), 1.0);

        let liked = row(&[0], &[1.0]);
        let options = RecommendOptions::recalculating();
        let plain = base.recommend(0, liked, 1, options).unwrap();
        let boosted = scaled.recommend(0, liked, 1, options).unwrap();

        assert_eq!(plain[0].index, 1);
        assert!((plain[0].score - 1.0 / 3.0).abs() < 1e-5);
        assert!((boosted[0].score - 4.0 / 6.0).abs() < 1e-5);
    }

    #[test]
    fn test_with_alpha_rejects_non_positive() {
        let model = build_test_model();
        assert!(model.clone().with_alpha(0.0).is_err());
        assert!(model.with_alpha(f32::NAN).is_err());
    }
}
