//! Thin GitHub REST client shared by every request of a run.
//!
//! All outbound calls go through [`GitHubClient::get_json`], which maps each
//! way a call can fail onto one [`FetchError`] variant and races the call
//! against the run's cancellation token.

use crate::error::FetchError;
use reqwest::header::{ACCEPT, AUTHORIZATION};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Longest error body kept in a [`FetchError::Status`].
const MAX_ERROR_BODY: usize = 512;

/// Connection settings for the GitHub API.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub api_url: String,
    pub user_agent: String,
    pub timeout_seconds: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.github.com".to_string(),
            user_agent: concat!("issuefinder/", env!("CARGO_PKG_VERSION")).to_string(),
            timeout_seconds: 30,
        }
    }
}

/// GitHub API client bound to one access token.
#[derive(Debug, Clone)]
pub struct GitHubClient {
    http_client: reqwest::Client,
    api_url: String,
    token: String,
}

impl GitHubClient {
    /// Create an unauthenticated client.
    pub fn new(config: &ClientConfig) -> Result<Self, FetchError> {
        let http_client = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|source| FetchError::RequestBuild {
                stage: "http client".to_string(),
                source,
            })?;

        Ok(Self {
            http_client,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            token: String::new(),
        })
    }

    /// Copy of this client that authenticates with `token`.
    ///
    /// An empty token means unauthenticated requests, which GitHub allows
    /// under a much lower rate limit. The connection pool is shared.
    pub fn with_token(&self, token: &str) -> Self {
        Self {
            http_client: self.http_client.clone(),
            api_url: self.api_url.clone(),
            token: token.to_string(),
        }
    }

    /// URL of the issue search endpoint.
    pub fn search_url(&self) -> String {
        format!("{}/search/issues", self.api_url)
    }

    /// GET `url` and decode a 200 response body as `T`.
    ///
    /// Returns [`FetchError::Cancelled`] without touching the network if
    /// `cancel` already fired, and aborts the call if it fires in flight.
    pub async fn get_json<T, Q>(
        &self,
        stage: &str,
        url: &str,
        query: &Q,
        cancel: &CancellationToken,
    ) -> Result<T, FetchError>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
    {
        if cancel.is_cancelled() {
            return Err(FetchError::Cancelled);
        }

        let mut builder = self
            .http_client
            .get(url)
            .query(query)
            .header(ACCEPT, "application/vnd.github+json");

        // Counts against the caller's own rate limit
        if !self.token.is_empty() {
            builder = builder.header(AUTHORIZATION, format!("token {}", self.token));
        }

        let request = builder.build().map_err(|source| FetchError::RequestBuild {
            stage: stage.to_string(),
            source,
        })?;

        debug!(stage, url = %request.url(), "Sending GitHub request");

        let response = tokio::select! {
            _ = cancel.cancelled() => return Err(FetchError::Cancelled),
            result = self.http_client.execute(request) => {
                result.map_err(|source| FetchError::Transport {
                    stage: stage.to_string(),
                    source,
                })?
            }
        };

        let status = response.status();
        if status != StatusCode::OK {
            let mut body = tokio::select! {
                _ = cancel.cancelled() => return Err(FetchError::Cancelled),
                text = response.text() => text.unwrap_or_default(),
            };
            if body.len() > MAX_ERROR_BODY {
                let mut cut = MAX_ERROR_BODY;
                while !body.is_char_boundary(cut) {
                    cut -= 1;
                }
                body.truncate(cut);
            }
            return Err(FetchError::Status {
                stage: stage.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        let bytes = tokio::select! {
            _ = cancel.cancelled() => return Err(FetchError::Cancelled),
            result = response.bytes() => {
                result.map_err(|source| FetchError::Transport {
                    stage: stage.to_string(),
                    source,
                })?
            }
        };

        serde_json::from_slice(&bytes).map_err(|source| FetchError::Decode {
            stage: stage.to_string(),
            source,
        })
    }
}
