//! Memoized artifact loading.
//!
//! `ArtifactStore` reads each artifact at most once for its lifetime and then
//! hands out the same `Arc` on every call. Concurrent first callers block
//! until the single load finishes. A failed load caches nothing.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use als_model::AlsModel;
use data_loader::{ArtifactPaths, Dataset, LoadError};
use once_cell::sync::OnceCell;
use tracing::info;

use crate::service::RecommendationService;

/// Process-wide holder of the loaded artifacts
#[derive(Debug)]
pub struct ArtifactStore {
    paths: ArtifactPaths,
    data: OnceCell<Arc<Dataset>>,
    model: OnceCell<Arc<AlsModel>>,
    /// Artifact reads started, successful or not
    loads: AtomicUsize,
}

impl ArtifactStore {
    pub fn new(paths: ArtifactPaths) -> Self {
        Self {
            paths,
            data: OnceCell::new(),
            model: OnceCell::new(),
            loads: AtomicUsize::new(0),
        }
    }

    /// Interaction matrix and id mappings, loaded on first call
    pub fn load_data(&self) -> Result<Arc<Dataset>, LoadError> {
        self.data
            .get_or_try_init(|| {
                self.loads.fetch_add(1, Ordering::SeqCst);
                Dataset::load(&self.paths).map(Arc::new)
            })
            .cloned()
    }

    /// Factorization model, loaded on first call
    pub fn load_model(&self) -> Result<Arc<AlsModel>, LoadError> {
        self.model
            .get_or_try_init(|| {
                self.loads.fetch_add(1, Ordering::SeqCst);
                AlsModel::load(&self.paths.model).map(Arc::new)
            })
            .cloned()
    }

    /// How many times the data or model files were actually read
    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }

    pub fn is_loaded(&self) -> bool {
        self.data.get().is_some() && self.model.get().is_some()
    }

    /// Load everything and wire up the recommendation service
    pub fn recommendation_service(&self) -> Result<RecommendationService, LoadError> {
        let dataset = self.load_data()?;
        let model = self.load_model()?;
        info!(
            "Model, data, and mappings loaded successfully ({} artifact reads)",
            self.load_count()
        );
        Ok(RecommendationService::new(dataset, model))
    }
}
