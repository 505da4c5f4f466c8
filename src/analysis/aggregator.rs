//! Fan-out over labels and fan-in of their issues.
//!
//! [`IssueFinder::fetch_all`] runs one search worker per label, collects
//! whatever they send, and either returns the deduplicated issues or the
//! first error any worker hit. It never returns both.

use crate::cli::SortOrder;
use crate::error::FetchError;
use crate::github::{GitHubClient, LanguageFetcher, SearchScope, SearchWorker};
use crate::models::Issue;
use futures::future::join_all;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Searches several labels at once and merges the results.
#[derive(Debug, Clone)]
pub struct IssueFinder {
    client: GitHubClient,
    labels: Vec<String>,
    scope: Arc<SearchScope>,
    max_languages: usize,
}

impl IssueFinder {
    pub fn new(
        client: GitHubClient,
        labels: Vec<String>,
        scope: SearchScope,
        max_languages: usize,
    ) -> Self {
        Self {
            client,
            labels,
            scope: Arc::new(scope),
            max_languages,
        }
    }

    /// Labels searched by each run.
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Fetch the open issues under every label, authenticated with `token`.
    ///
    /// The first worker failure cancels the others and is returned as is.
    /// If `cancel` fires first the run ends with [`FetchError::Cancelled`].
    pub async fn fetch_all(
        &self,
        token: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<Issue>, FetchError> {
        let issues = self.collect(token, cancel).await?;

        let received = issues.len();
        let unique = dedupe(issues);
        info!(
            labels = self.labels.len(),
            received,
            unique = unique.len(),
            "Fetched issues"
        );

        Ok(unique)
    }

    /// Every issue sent by every worker, duplicates included, in arrival order.
    async fn collect(
        &self,
        token: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<Issue>, FetchError> {
        if self.labels.is_empty() {
            return Ok(Vec::new());
        }

        let client = Arc::new(self.client.with_token(token));
        // One cache for the whole run, shared by every worker
        let languages = Arc::new(LanguageFetcher::new(client.clone(), self.max_languages));
        let worker = SearchWorker::new(client, languages.clone(), self.scope.clone());

        // Cancelled on any early return, and when the caller cancels
        let run = cancel.child_token();
        let _stop_workers = run.clone().drop_guard();

        let (tx, mut rx) = mpsc::channel::<Issue>(1);
        // Room for one error per worker so reporting never blocks
        let (err_tx, mut err_rx) = mpsc::channel::<FetchError>(self.labels.len());

        let mut handles = Vec::with_capacity(self.labels.len());
        for label in &self.labels {
            let worker = worker.clone();
            let label = label.clone();
            let tx = tx.clone();
            let err_tx = err_tx.clone();
            let run = run.clone();

            let handle = tokio::spawn(async move {
                if let Err(err) = worker.search(&label, &tx, &run).await {
                    debug!(label = %label, error = %err, "Search worker failed");
                    let _ = err_tx.try_send(err);
                }
            });
            handles.push(handle);
        }

        // Close the result channel only after every worker is done sending
        let labels = self.labels.clone();
        tokio::spawn(async move {
            let results = join_all(handles).await;
            for (label, result) in labels.into_iter().zip(results) {
                if let Err(join_err) = result {
                    error!(label = %label, error = %join_err, "Search worker died");
                    let _ = err_tx.try_send(FetchError::WorkerPanicked { label });
                }
            }
            drop(tx);
        });

        let mut issues = Vec::new();
        loop {
            tokio::select! {
                biased;

                Some(err) = err_rx.recv() => {
                    run.cancel();
                    warn!(error = %err, "Cancelling remaining searches");
                    return Err(err);
                }

                _ = cancel.cancelled() => return Err(FetchError::Cancelled),

                received = rx.recv() => match received {
                    Some(issue) => issues.push(issue),
                    None => break,
                },
            }
        }

        // Errors are buffered before the result channel closes, so one may
        // still be waiting after the loop saw the close
        if let Ok(err) = err_rx.try_recv() {
            warn!(error = %err, "Search failed after its last issue");
            return Err(err);
        }

        // Workers stop quietly on cancellation, so a closed channel alone
        // does not mean every search completed
        if cancel.is_cancelled() {
            return Err(FetchError::Cancelled);
        }

        debug!(
            repos = languages.cache().resolved().await,
            language_lookups = languages.fetches(),
            "Language lookups done"
        );

        Ok(issues)
    }
}

/// Drop issues whose URL was already seen, keeping first-seen order.
pub fn dedupe(issues: Vec<Issue>) -> Vec<Issue> {
    let mut seen = HashSet::new();
    issues
        .into_iter()
        .filter(|issue| seen.insert(issue.url.clone()))
        .collect()
}

/// Order issues after fan-in.
pub fn sort_issues(issues: &mut [Issue], order: SortOrder) {
    match order {
        SortOrder::Received => {}
        SortOrder::Oldest => issues.sort_by_key(|i| i.date),
        SortOrder::Newest => issues.sort_by_key(|i| std::cmp::Reverse(i.date)),
    }
}

/// Count issues per repository language.
pub fn language_distribution(issues: &[Issue]) -> HashMap<String, usize> {
    let mut dist: HashMap<String, usize> = HashMap::new();

    for issue in issues {
        for language in &issue.languages {
            *dist.entry(language.clone()).or_default() += 1;
        }
    }

    dist
}
