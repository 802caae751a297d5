//! Read-only alternating-least-squares model for implicit-feedback data.
//!
//! The model is trained elsewhere; this crate loads its factor tables and
//! ranks items for a user:
//! - `AlsModel::load` reads the serialized factors
//! - `Recommender::recommend` returns the top-N item indices with scores,
//!   optionally recomputing the user's factor from their current row
//!
//! ```ignore
//! use als_model::{AlsModel, RecommendOptions, Recommender};
//!
//! let model = AlsModel::load(Path::new("als_model.json"))?;
//! let recs = model.recommend(user_idx, dataset.user_row(user_idx), 10, RecommendOptions::recalculating())?;
//! ```

pub mod error;
pub mod linalg;
pub mod model;

pub use error::ModelError;
pub use model::{AlsModel, RecommendOptions, Recommender, ScoredItem};
