//! # Recommendation Service
//!
//! Turns a raw user id and a count into an ordered list of raw item ids:
//! 1. Resolve the user through the user mapping
//! 2. Ask the model for the top N items, recomputing the user's factor
//!    from their current interaction row
//! 3. Drop items outside the active-item set (no backfill)
//! 4. Map item indices back to raw ids
//!
//! Unknown users and model lookup failures are recoverable: they come back
//! as `RecommendError` for the caller to show, never as a panic.

use std::sync::Arc;
use std::time::Instant;

use als_model::{ModelError, RecommendOptions, Recommender};
use data_loader::{Dataset, RawId};
use pipeline::filters::ActiveItemFilter;
use pipeline::{Candidate, FilterPipeline};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, instrument, warn};

/// One entry of a recommendation list
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecommendedItem {
    /// 1-based position in the list
    pub rank: usize,
    pub item: RawId,
    pub score: f32,
}

/// Recoverable failures of a recommendation request
#[derive(Error, Debug)]
pub enum RecommendError {
    #[error("User {0} not found in mappings.")]
    UserNotFound(RawId),

    #[error("No recommendations found (model lookup failed: {source}).")]
    ModelLookup {
        user: RawId,
        #[source]
        source: ModelError,
    },

    #[error("Candidate filtering failed: {0}")]
    Filter(anyhow::Error),
}

/// Stateless request handler over the shared, immutable artifacts
#[derive(Clone)]
pub struct RecommendationService {
    dataset: Arc<Dataset>,
    model: Arc<dyn Recommender>,
    filter_pipeline: Arc<FilterPipeline>,
}

impl RecommendationService {
    /// Wire the dataset and model together with the active-item filter
    pub fn new(dataset: Arc<Dataset>, model: Arc<dyn Recommender>) -> Self {
        let mapped_items = dataset.items().len();
        if model.item_count() != mapped_items {
            warn!(
                "Model scores {} items but the item mapping has {}",
                model.item_count(),
                mapped_items
            );
        }

        let filter_pipeline =
            Arc::new(FilterPipeline::new().add_filter(ActiveItemFilter::new(dataset.clone())));

        Self {
            dataset,
            model,
            filter_pipeline,
        }
    }

    pub fn dataset(&self) -> &Arc<Dataset> {
        &self.dataset
    }

    /// Users offered for selection: active users, ascending by raw id
    pub fn active_users(&self) -> Vec<RawId> {
        self.dataset.active_user_ids()
    }

    /// Top `n` active items for `raw_user_id`, best first.
    ///
    /// The list can be shorter than `n` when the model ranks inactive items.
    #[instrument(skip(self), fields(user = %raw_user_id))]
    pub fn recommend(
        &self,
        raw_user_id: &RawId,
        n: usize,
    ) -> Result<Vec<RecommendedItem>, RecommendError> {
        let start_time = Instant::now();

        let user_idx = self
            .dataset
            .users()
            .index_of(raw_user_id)
            .ok_or_else(|| RecommendError::UserNotFound(raw_user_id.clone()))?;

        let scored = self
            .model
            .recommend(
                user_idx,
                self.dataset.user_row(user_idx),
                n,
                RecommendOptions::recalculating(),
            )
            .map_err(|source| {
                warn!("Model lookup failed for user {}: {}", raw_user_id, source);
                RecommendError::ModelLookup {
                    user: raw_user_id.clone(),
                    source,
                }
            })?;
        debug!("Model returned {} candidates", scored.len());

        let mut candidates: Vec<Candidate> = scored.into_iter().map(Candidate::from).collect();
        candidates.truncate(n);

        let filtered = self
            .filter_pipeline
            .apply(candidates)
            .map_err(RecommendError::Filter)?;

        let recommendations = self.to_recommended(filtered);
        debug!(
            "Returning {} recommendations in {:.2?}",
            recommendations.len(),
            start_time.elapsed()
        );
        Ok(recommendations)
    }

    /// Map surviving candidates to raw item ids, numbering from 1
    fn to_recommended(&self, candidates: Vec<Candidate>) -> Vec<RecommendedItem> {
        candidates
            .into_iter()
            .filter_map(|candidate| {
                let item = self.dataset.items().raw_of(candidate.item_idx)?;
                Some((item.clone(), candidate.score))
            })
            .enumerate()
            .map(|(i, (item, score))| RecommendedItem {
                rank: i + 1,
                item,
                score,
            })
            .collect()
    }
}
