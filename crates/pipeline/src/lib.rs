//! Post-processing of model output.
//!
//! This crate provides:
//! - `Candidate`, an item index with its model score
//! - the `Filter` trait and `FilterPipeline` for composing filters
//! - `ActiveItemFilter`, which drops items without interactions
//!
//! ## Example Usage
//! ```ignore
//! use pipeline::{Candidate, FilterPipeline};
//! use pipeline::filters::ActiveItemFilter;
//!
//! let pipeline = FilterPipeline::new()
//!     .add_filter(ActiveItemFilter::new(dataset.clone()));
//!
//! let candidates: Vec<Candidate> = scored.into_iter().map(Candidate::from).collect();
//! let filtered = pipeline.apply(candidates)?;
//! ```

pub mod filter_pipeline;
pub mod filters;
pub mod traits;
pub mod types;

// Re-export main types
pub use filter_pipeline::FilterPipeline;
pub use traits::Filter;
pub use types::Candidate;
