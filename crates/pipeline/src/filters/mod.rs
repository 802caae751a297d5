//! Filter implementations for the candidate pipeline.

pub mod active_items;

pub use active_items::ActiveItemFilter;
