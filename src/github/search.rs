//! Per-label issue search.
//!
//! GitHub search cannot express `label:A OR label:B`, so each label gets its
//! own [`SearchWorker::search`] call and the results are merged afterwards.

use crate::error::FetchError;
use crate::github::client::GitHubClient;
use crate::github::languages::LanguageFetcher;
use crate::models::{Issue, Repo, SearchResponse};
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Largest page the search API serves.
pub const MAX_PAGE_SIZE: usize = 100;

/// Organizations and repositories every search is restricted to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchScope {
    /// Tracked organizations, added as `org:<name>`.
    pub orgs: BTreeSet<String>,
    /// Tracked repositories, added as `repo:<owner>/<name>`.
    pub projects: BTreeSet<String>,
    /// Results requested per label. Only the first page is read.
    pub page_size: usize,
}

impl Default for SearchScope {
    fn default() -> Self {
        Self {
            orgs: BTreeSet::new(),
            projects: BTreeSet::new(),
            page_size: MAX_PAGE_SIZE,
        }
    }
}

/// Build the search query for one label.
pub fn build_query(label: &str, scope: &SearchScope) -> String {
    let mut q = format!("is:open type:issue label:\"{}\"", label);
    for org in &scope.orgs {
        q.push_str(" org:");
        q.push_str(org);
    }
    for project in &scope.projects {
        q.push_str(" repo:");
        q.push_str(project);
    }
    q
}

/// Searches one label and streams enriched issues to a channel.
#[derive(Debug, Clone)]
pub struct SearchWorker {
    client: Arc<GitHubClient>,
    languages: Arc<LanguageFetcher>,
    scope: Arc<SearchScope>,
}

impl SearchWorker {
    pub fn new(
        client: Arc<GitHubClient>,
        languages: Arc<LanguageFetcher>,
        scope: Arc<SearchScope>,
    ) -> Self {
        Self {
            client,
            languages,
            scope,
        }
    }

    /// Search `label` and send each issue found on `tx`.
    ///
    /// Stops early, without error, once `cancel` fires or the receiver is
    /// gone. Any other failure ends the search and is returned.
    pub async fn search(
        &self,
        label: &str,
        tx: &mpsc::Sender<Issue>,
        cancel: &CancellationToken,
    ) -> Result<(), FetchError> {
        match self.run(label, tx, cancel).await {
            Err(FetchError::Cancelled) => {
                debug!(label, "Search cancelled");
                Ok(())
            }
            other => other,
        }
    }

    async fn run(
        &self,
        label: &str,
        tx: &mpsc::Sender<Issue>,
        cancel: &CancellationToken,
    ) -> Result<(), FetchError> {
        let stage = format!("search {:?}", label);
        let params = [
            ("q", build_query(label, &self.scope)),
            ("sort", "updated".to_string()),
            ("order", "asc".to_string()),
            ("per_page", self.scope.page_size.to_string()),
        ];

        let response: SearchResponse = self
            .client
            .get_json(&stage, &self.client.search_url(), &params[..], cancel)
            .await?;

        info!(label, items = response.items.len(), "Search returned issues");
        if response.total_count > response.items.len() as u64 {
            warn!(
                label,
                total = response.total_count,
                kept = response.items.len(),
                "Search has more matches than one page; the rest are skipped"
            );
        }

        for item in response.items {
            let repo = Repo::from_api_url(&item.repository_url).map_err(|reason| {
                FetchError::Parse {
                    stage: stage.clone(),
                    url: item.repository_url.clone(),
                    reason,
                }
            })?;

            if item.url.is_empty() {
                return Err(FetchError::Parse {
                    stage: stage.clone(),
                    url: item.repository_url,
                    reason: format!("issue {:?} has no url", item.title),
                });
            }

            let languages = self.languages.languages(&item.repository_url, cancel).await?;

            let issue = Issue {
                title: item.title,
                date: item.created_at,
                url: item.url,
                html_url: item.html_url,
                repo,
                languages,
            };

            tokio::select! {
                biased;

                // Another worker failed or the caller gave up
                _ = cancel.cancelled() => return Ok(()),

                sent = tx.send(issue) => {
                    if sent.is_err() {
                        debug!(label, "Receiver dropped, stopping search");
                        return Ok(());
                    }
                }
            }
        }

        Ok(())
    }
}
