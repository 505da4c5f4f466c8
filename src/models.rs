//! Data models for the issue finder.
//!
//! This module contains the records handed back to callers and the
//! explicit schemas for the two GitHub endpoints the core talks to.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// A GitHub repository, identified by owner and name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Repo {
    /// Account or organization that owns the repository.
    pub owner: String,
    /// Repository name.
    pub name: String,
}

impl Repo {
    /// Derive a repository from its API URL.
    ///
    /// Accepts `https://api.github.com/repos/<owner>/<name>` as well as
    /// enterprise-style prefixes such as `/api/v3/repos/<owner>/<name>`.
    /// Returns a human-readable reason when the URL has another shape.
    pub fn from_api_url(api_url: &str) -> Result<Self, String> {
        let parsed = reqwest::Url::parse(api_url).map_err(|e| e.to_string())?;

        let segments: Vec<&str> = parsed
            .path_segments()
            .map(|s| s.filter(|seg| !seg.is_empty()).collect())
            .unwrap_or_default();

        match segments.as_slice() {
            [.., "repos", owner, name] => Ok(Self {
                owner: (*owner).to_string(),
                name: (*name).to_string(),
            }),
            _ => Err("expected a path ending in /repos/<owner>/<name>".to_string()),
        }
    }

    /// Browser URL of the repository on github.com.
    pub fn html_url(&self) -> String {
        format!("https://github.com/{}/{}", self.owner, self.name)
    }
}

impl fmt::Display for Repo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// An open issue found under one of the configured labels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    /// Issue title.
    pub title: String,
    /// When the issue was opened.
    pub date: DateTime<Utc>,
    /// API URL of the issue. Used as its identity.
    pub url: String,
    /// Browser URL of the issue, when GitHub provided one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub html_url: Option<String>,
    /// Repository the issue belongs to.
    pub repo: Repo,
    /// Most used languages of the repository, most used first.
    pub languages: Vec<String>,
}

impl Issue {
    /// Link to show to a human: the browser URL if known, the API URL otherwise.
    pub fn link(&self) -> &str {
        self.html_url.as_deref().unwrap_or(&self.url)
    }
}

/// Body of `GET /search/issues`.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchResponse {
    /// Total number of matches upstream, across all pages.
    #[serde(default)]
    pub total_count: u64,
    /// The items on the requested page.
    pub items: Vec<SearchItem>,
}

/// One search hit.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchItem {
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub url: String,
    #[serde(default)]
    pub html_url: Option<String>,
    pub repository_url: String,
}

/// Byte count of one language in a repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageStat {
    pub name: String,
    pub bytes: u64,
}

/// Body of `GET /repos/<owner>/<name>/languages`: language name to bytes.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct LanguagesResponse(pub HashMap<String, u64>);

impl LanguagesResponse {
    /// Flatten the upstream object into typed stats (unordered).
    pub fn into_stats(self) -> Vec<LanguageStat> {
        self.0
            .into_iter()
            .map(|(name, bytes)| LanguageStat { name, bytes })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repo_from_api_url() {
        let repo = Repo::from_api_url("https://api.github.com/repos/rust-lang/rust").unwrap();
        assert_eq!(repo.owner, "rust-lang");
        assert_eq!(repo.name, "rust");
        assert_eq!(repo.to_string(), "rust-lang/rust");
        assert_eq!(repo.html_url(), "https://github.com/rust-lang/rust");
    }

    #[test]
    fn test_repo_from_enterprise_url() {
        let repo = Repo::from_api_url("https://ghe.example.com/api/v3/repos/acme/widgets/").unwrap();
        assert_eq!(repo.owner, "acme");
        assert_eq!(repo.name, "widgets");
    }

    #[test]
    fn test_repo_from_malformed_url() {
        assert!(Repo::from_api_url("not a url").is_err());
        assert!(Repo::from_api_url("https://api.github.com/users/octocat").is_err());
        assert!(Repo::from_api_url("https://api.github.com/repos/only-owner").is_err());
    }

    #[test]
    fn test_search_response_decoding() {
        let body = r#"{
            "total_count": 1,
            "items": [{
                "title": "Add docs",
                "created_at": "2024-10-01T12:00:00Z",
                "url": "https://api.github.com/repos/a/b/issues/1",
                "html_url": "https://github.com/a/b/issues/1",
                "repository_url": "https://api.github.com/repos/a/b",
                "state": "open"
            }]
        }"#;

        let response: SearchResponse = serde_json::from_str(body).unwrap();
        assert_eq!(response.total_count, 1);
        assert_eq!(response.items[0].title, "Add docs");
        assert_eq!(
            response.items[0].html_url.as_deref(),
            Some("https://github.com/a/b/issues/1")
        );
    }

    #[test]
    fn test_languages_response_into_stats() {
        let response: LanguagesResponse =
            serde_json::from_str(r#"{"Rust": 1200, "Shell": 40}"#).unwrap();
        let mut stats = response.into_stats();
        stats.sort_by(|a, b| a.name.cmp(&b.name));

        assert_eq!(
            stats,
            vec![
                LanguageStat { name: "Rust".to_string(), bytes: 1200 },
                LanguageStat { name: "Shell".to_string(), bytes: 40 },
            ]
        );
    }

    #[test]
    fn test_issue_link_prefers_html_url() {
        let mut issue = Issue {
            title: "t".to_string(),
            date: Utc::now(),
            url: "https://api.github.com/repos/a/b/issues/1".to_string(),
            html_url: Some("https://github.com/a/b/issues/1".to_string()),
            repo: Repo { owner: "a".to_string(), name: "b".to_string() },
            languages: vec![],
        };
        assert_eq!(issue.link(), "https://github.com/a/b/issues/1");

        issue.html_url = None;
        assert_eq!(issue.link(), "https://api.github.com/repos/a/b/issues/1");
    }
}
