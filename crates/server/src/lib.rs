//! Recommendation front end: the service that answers requests, the
//! memoized artifact store behind it, and the web UI on top.

pub mod service;
pub mod store;
pub mod web;

#[cfg(test)]
mod fixtures;

pub use service::{RecommendError, RecommendationService, RecommendedItem};
pub use store::ArtifactStore;
pub use web::{AppState, ServerConfig, router, serve};
