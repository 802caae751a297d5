//! Shared test fixtures: a tiny dataset, a real ALS model over it, and a
//! mock model with scripted output.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use als_model::{AlsModel, ModelError, RecommendOptions, Recommender, ScoredItem};
use data_loader::{Dataset, IdMapping, InteractionMatrix, RawId, SparseRow};

/// Users u0, u1, u2 and items i0..i5.
///
/// Only u0 and u2 have interactions; only i1, i2 and i4 are active.
pub(crate) fn build_test_dataset() -> Arc<Dataset> {
    let matrix = InteractionMatrix::from_triplets(
        3,
        6,
        &[(0, 1, 1.0), (0, 2, 1.0), (2, 2, 2.0), (2, 4, 1.0)],
    )
    .expect("valid fixture matrix");

    let users = IdMapping::from_ordered(
        "user",
        (0..3).map(|i| RawId::new(format!("u{i}"))).collect(),
    )
    .expect("valid user mapping");
    let items = IdMapping::from_ordered(
        "item",
        (0..6).map(|i| RawId::new(format!("i{i}"))).collect(),
    )
    .expect("valid item mapping");

    Arc::new(Dataset::new(matrix, users, items).expect("valid fixture dataset"))
}

/// Two-factor ALS model matching `build_test_dataset`
pub(crate) fn build_test_model() -> Arc<AlsModel> {
    let model = AlsModel::new(
        2,
        0.1,
        vec![vec![1.0, 0.2], vec![0.4, 0.4], vec![0.1, 1.0]],
        vec![
            vec![0.9, 0.1],
            vec![0.8, 0.3],
            vec![0.2, 0.9],
            vec![0.5, 0.5],
            vec![0.1, 1.0],
            vec![0.7, 0.7],
        ],
    )
    .expect("valid fixture model");
    Arc::new(model)
}

/// Model stand-in that records calls and returns a scripted result
pub(crate) struct MockModel {
    result: Result<Vec<ScoredItem>, ModelError>,
    calls: AtomicUsize,
    last_user: Mutex<Option<usize>>,
}

impl MockModel {
    pub(crate) fn returning(items: Vec<ScoredItem>) -> Self {
        Self {
            result: Ok(items),
            calls: AtomicUsize::new(0),
            last_user: Mutex::new(None),
        }
    }

    pub(crate) fn failing(err: ModelError) -> Self {
        Self {
            result: Err(err),
            calls: AtomicUsize::new(0),
            last_user: Mutex::new(None),
        }
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub(crate) fn last_user(&self) -> Option<usize> {
        *self.last_user.lock().unwrap()
    }
}

impl Recommender for MockModel {
    fn recommend(
        &self,
        user_idx: usize,
        _user_row: SparseRow<'_>,
        _n: usize,
        options: RecommendOptions,
    ) -> als_model::error::Result<Vec<ScoredItem>> {
        assert!(options.recalculate_user, "service must ask for recalculation");
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_user.lock().unwrap() = Some(user_idx);
        self.result.clone()
    }

    fn item_count(&self) -> usize {
        6
    }
}
