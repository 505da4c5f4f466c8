//! Issue aggregation across labels.
//!
//! This module merges the per-label searches into one deduplicated list
//! and provides the post-processing applied before rendering.

pub mod aggregator;

pub use aggregator::*;
