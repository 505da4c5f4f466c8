//! GitHub API access.
//!
//! This module holds the HTTP plumbing, the per-label search worker and
//! the cached repository language lookup.

pub mod client;
pub mod languages;
pub mod search;

pub use client::{ClientConfig, GitHubClient};
pub use languages::{LanguageFetcher, DEFAULT_MAX_LANGUAGES};
pub use search::{SearchScope, SearchWorker, MAX_PAGE_SIZE};
