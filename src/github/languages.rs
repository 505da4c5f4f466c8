//! Repository language lookup with a run-scoped cache.
//!
//! One [`LanguageFetcher`] is shared by every search worker of a run, so a
//! repository that shows up under several labels is only fetched once.

use crate::error::FetchError;
use crate::github::client::GitHubClient;
use crate::models::{LanguageStat, LanguagesResponse};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, OnceCell};
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Number of languages kept per repository by default.
pub const DEFAULT_MAX_LANGUAGES: usize = 3;

/// Ranked language lists keyed by repository API URL.
///
/// A key is present once its cell is initialized, so a repository with no
/// detected languages is cached like any other. Callers racing on the same
/// key share one upstream request; a failed request leaves the cell empty.
#[derive(Debug, Default)]
pub struct LanguageCache {
    entries: Mutex<HashMap<String, Arc<OnceCell<Vec<String>>>>>,
}

impl LanguageCache {
    pub fn new() -> Self {
        Self::default()
    }

    async fn slot(&self, repo_url: &str) -> Arc<OnceCell<Vec<String>>> {
        let mut entries = self.entries.lock().await;
        entries.entry(repo_url.to_string()).or_default().clone()
    }

    /// Cached languages for `repo_url`, if already resolved.
    pub async fn get(&self, repo_url: &str) -> Option<Vec<String>> {
        let entries = self.entries.lock().await;
        entries.get(repo_url).and_then(|cell| cell.get().cloned())
    }

    /// Number of resolved repositories.
    pub async fn resolved(&self) -> usize {
        let entries = self.entries.lock().await;
        entries.values().filter(|cell| cell.initialized()).count()
    }
}

/// Resolves the top languages of a repository.
#[derive(Debug)]
pub struct LanguageFetcher {
    client: Arc<GitHubClient>,
    cache: LanguageCache,
    limit: usize,
    fetches: AtomicUsize,
}

impl LanguageFetcher {
    pub fn new(client: Arc<GitHubClient>, limit: usize) -> Self {
        Self {
            client,
            cache: LanguageCache::new(),
            limit,
            fetches: AtomicUsize::new(0),
        }
    }

    /// Most used languages of the repository at `repo_url`, most used first.
    pub async fn languages(
        &self,
        repo_url: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<String>, FetchError> {
        if let Some(cached) = self.cache.get(repo_url).await {
            debug!(repo_url, "Language cache hit");
            return Ok(cached);
        }

        let slot = self.cache.slot(repo_url).await;
        let languages = slot
            .get_or_try_init(|| self.fetch(repo_url, cancel))
            .await?;

        Ok(languages.clone())
    }

    /// Number of upstream language requests issued so far.
    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::Relaxed)
    }

    /// The cache backing this fetcher.
    pub fn cache(&self) -> &LanguageCache {
        &self.cache
    }

    async fn fetch(
        &self,
        repo_url: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<String>, FetchError> {
        self.fetches.fetch_add(1, Ordering::Relaxed);

        let stage = format!("languages {}", repo_url);
        let url = format!("{}/languages", repo_url);
        let response: LanguagesResponse = self
            .client
            .get_json(&stage, &url, &[] as &[(&str, &str)], cancel)
            .await?;

        let ranked = rank_languages(response.into_stats(), self.limit);
        debug!(repo_url, languages = ?ranked, "Resolved repository languages");
        Ok(ranked)
    }
}

/// Names of the `limit` heaviest languages, heaviest first.
///
/// Equal weights are ordered by name so the result never depends on map
/// iteration order.
pub fn rank_languages(mut stats: Vec<LanguageStat>, limit: usize) -> Vec<String> {
    stats.sort_by(|a, b| b.bytes.cmp(&a.bytes).then_with(|| a.name.cmp(&b.name)));
    stats.truncate(limit);
    stats.into_iter().map(|stat| stat.name).collect()
}
