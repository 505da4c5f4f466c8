//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.issuefinder.toml` files. The loaded [`Config`] is an immutable
//! snapshot by the time it reaches the fetch pipeline.

use crate::cli::{OutputFormat, SortOrder};
use crate::github::{ClientConfig, SearchScope, DEFAULT_MAX_LANGUAGES, MAX_PAGE_SIZE};
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// Name of the configuration file looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = ".issuefinder.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// GitHub connection settings.
    #[serde(default)]
    pub github: GitHubConfig,

    /// What to search for.
    #[serde(default)]
    pub search: SearchConfig,
}

/// General application settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Output file path. Results go to stdout when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<PathBuf>,

    /// Output format.
    #[serde(default)]
    pub format: OutputFormat,

    /// Order of the issues in the output.
    #[serde(default)]
    pub sort: SortOrder,
}

/// GitHub API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubConfig {
    /// API base URL.
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Timeout of a single HTTP request in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// User-Agent sent with every request (GitHub rejects requests without one).
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            timeout_seconds: default_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

fn default_api_url() -> String {
    ClientConfig::default().api_url
}

fn default_timeout() -> u64 {
    ClientConfig::default().timeout_seconds
}

fn default_user_agent() -> String {
    ClientConfig::default().user_agent
}

/// Search settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Labels searched independently; an issue matching any of them is kept.
    #[serde(default = "default_labels")]
    pub labels: Vec<String>,

    /// Tracked organizations.
    #[serde(default)]
    pub orgs: BTreeSet<String>,

    /// Tracked repositories, as owner/name.
    #[serde(default)]
    pub projects: BTreeSet<String>,

    /// Issues requested per label (one page only).
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    /// Languages kept per repository.
    #[serde(default = "default_max_languages")]
    pub max_languages: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            labels: default_labels(),
            orgs: BTreeSet::new(),
            projects: BTreeSet::new(),
            page_size: default_page_size(),
            max_languages: default_max_languages(),
        }
    }
}

fn default_labels() -> Vec<String> {
    vec!["hacktoberfest".to_string(), "help wanted".to_string()]
}

fn default_page_size() -> usize {
    MAX_PAGE_SIZE
}

fn default_max_languages() -> usize {
    DEFAULT_MAX_LANGUAGES
}

impl From<&GitHubConfig> for ClientConfig {
    fn from(config: &GitHubConfig) -> Self {
        Self {
            api_url: config.api_url.clone(),
            user_agent: config.user_agent.clone(),
            timeout_seconds: config.timeout_seconds,
        }
    }
}

impl From<&SearchConfig> for SearchScope {
    fn from(config: &SearchConfig) -> Self {
        Self {
            orgs: config.orgs.clone(),
            projects: config.projects.clone(),
            page_size: config.page_size,
        }
    }
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        Self::load_from_dir(Path::new("."))
    }

    /// Try to load `.issuefinder.toml` from a directory.
    pub fn load_from_dir(dir: &Path) -> Result<Option<Self>> {
        let config_path = dir.join(CONFIG_FILE_NAME);

        if config_path.exists() {
            Ok(Some(Self::load(&config_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings.
    /// This method only overrides config when CLI provides explicit values.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if !args.labels.is_empty() {
            self.search.labels = args.labels.clone();
        }
        if !args.orgs.is_empty() {
            self.search.orgs = args.orgs.iter().cloned().collect();
        }
        if !args.projects.is_empty() {
            self.search.projects = args.projects.iter().cloned().collect();
        }

        if let Some(ref api_url) = args.api_url {
            self.github.api_url = api_url.clone();
        }

        if let Some(ref output) = args.output {
            self.general.output = Some(output.clone());
        }
        if let Some(format) = args.format {
            self.general.format = format;
        }
        if let Some(sort) = args.sort {
            self.general.sort = sort;
        }
    }

    /// Check the merged configuration before a run.
    pub fn validate(&self) -> Result<()> {
        if self.search.labels.is_empty() {
            bail!("At least one label is required");
        }
        if self.search.labels.iter().any(|l| l.trim().is_empty()) {
            bail!("Labels cannot be empty");
        }
        if let Some(label) = self.search.labels.iter().find(|l| l.contains('"')) {
            bail!("Labels cannot contain double quotes: {}", label);
        }
        if !(1..=MAX_PAGE_SIZE).contains(&self.search.page_size) {
            bail!("page_size must be between 1 and {}", MAX_PAGE_SIZE);
        }
        if self.search.max_languages == 0 {
            bail!("max_languages must be at least 1");
        }
        if !self.github.api_url.starts_with("http://")
            && !self.github.api_url.starts_with("https://")
        {
            bail!("api_url must start with 'http://' or 'https://'");
        }
        if self.github.timeout_seconds == 0 {
            bail!("timeout_seconds must be at least 1");
        }
        Ok(())
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> Result<String> {
        toml::to_string_pretty(&Config::default()).context("Failed to serialize default config")
    }
}
