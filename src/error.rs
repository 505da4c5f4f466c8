//! Errors raised while fetching issues.
//!
//! Every variant carries the stage it happened in (which label search or
//! which repository lookup) so the log line alone is enough to diagnose it.

use thiserror::Error;

/// Failure of one run of the issue fetch.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("{stage}: could not build request: {source}")]
    RequestBuild {
        stage: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{stage}: could not execute request: {source}")]
    Transport {
        stage: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{stage}: status was {status}, not 200: {body}")]
    Status {
        stage: String,
        status: u16,
        body: String,
    },

    #[error("{stage}: could not decode json: {source}")]
    Decode {
        stage: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("{stage}: could not identify repo from {url}: {reason}")]
    Parse {
        stage: String,
        url: String,
        reason: String,
    },

    #[error("search worker for label {label:?} panicked")]
    WorkerPanicked { label: String },

    #[error("fetch was cancelled")]
    Cancelled,
}

impl FetchError {
    /// Whether this error only reports that the run was cancelled.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, FetchError::Cancelled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_error_message_names_stage() {
        let err = FetchError::Status {
            stage: "search \"help wanted\"".to_string(),
            status: 403,
            body: "rate limited".to_string(),
        };

        let message = err.to_string();
        assert!(message.contains("search \"help wanted\""));
        assert!(message.contains("403"));
        assert!(message.contains("rate limited"));
    }

    #[test]
    fn test_parse_error_message() {
        let err = FetchError::Parse {
            stage: "search \"hacktoberfest\"".to_string(),
            url: "https://example.com/nope".to_string(),
            reason: "bad shape".to_string(),
        };
        assert!(err.to_string().contains("could not identify repo from https://example.com/nope"));
        assert!(!err.is_cancelled());
        assert!(FetchError::Cancelled.is_cancelled());
    }
}
