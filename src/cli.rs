//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// IssueFinder - open GitHub issues across several labels at once
///
/// GitHub search only ANDs labels together, so IssueFinder runs one search
/// per label in parallel, merges and deduplicates the results, and tags each
/// issue with the top languages of its repository.
///
/// Examples:
///   issuefinder
///   issuefinder --label "good first issue" --label "help wanted" --org rust-lang
///   issuefinder --project tokio-rs/tokio --format json --output issues.json
///   issuefinder --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// GitHub access token
    ///
    /// Optional. Unauthenticated searches work but hit a much lower rate limit.
    #[arg(
        long,
        env = "GITHUB_TOKEN",
        default_value = "",
        hide_env_values = true,
        hide_default_value = true
    )]
    pub token: String,

    /// Label to search for (repeatable)
    ///
    /// Overrides the labels from the config file.
    #[arg(short, long = "label", value_name = "LABEL")]
    pub labels: Vec<String>,

    /// Organization to restrict the search to (repeatable)
    #[arg(long = "org", value_name = "ORG")]
    pub orgs: Vec<String>,

    /// Repository to restrict the search to, as owner/name (repeatable)
    #[arg(long = "project", value_name = "OWNER/NAME")]
    pub projects: Vec<String>,

    /// GitHub API base URL
    #[arg(long, env = "GITHUB_API_URL", value_name = "URL")]
    pub api_url: Option<String>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .issuefinder.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Output file path (stdout if omitted)
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Output format (markdown, json)
    #[arg(long, value_name = "FORMAT")]
    pub format: Option<OutputFormat>,

    /// Order of the issues in the output
    #[arg(long, value_name = "ORDER")]
    pub sort: Option<SortOrder>,

    /// Give up after this many seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Generate a default .issuefinder.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Output format for the results.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON format
    Json,
}

/// Order applied to the merged issues.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    /// Order in which the searches delivered them
    Received,
    /// Oldest issue first
    Oldest,
    /// Newest issue first (default)
    #[default]
    Newest,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if self.labels.iter().any(|l| l.trim().is_empty()) {
            return Err("Labels cannot be empty".to_string());
        }

        // Labels are quoted in the search query
        if let Some(label) = self.labels.iter().find(|l| l.contains('"')) {
            return Err(format!("Labels cannot contain double quotes: {}", label));
        }

        if let Some(project) = self.projects.iter().find(|p| !is_owner_name(p)) {
            return Err(format!("Project must look like owner/name: {}", project));
        }

        if let Some(ref api_url) = self.api_url {
            if !api_url.starts_with("http://") && !api_url.starts_with("https://") {
                return Err("API URL must start with 'http://' or 'https://'".to_string());
            }
        }

        if let Some(timeout) = self.timeout {
            if timeout == 0 {
                return Err("Timeout must be at least 1 second".to_string());
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}

fn is_owner_name(project: &str) -> bool {
    matches!(project.split_once('/'), Some((owner, name))
        if !owner.is_empty() && !name.is_empty() && !name.contains('/'))
}
