//! Markdown and JSON rendering of fetched issues.

use crate::analysis::language_distribution;
use crate::models::Issue;
use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Context printed alongside the issues.
#[derive(Debug, Clone, Serialize)]
pub struct ReportMetadata {
    /// Labels that were searched.
    pub labels: Vec<String>,
    /// Organizations the search was restricted to.
    pub orgs: Vec<String>,
    /// Repositories the search was restricted to.
    pub projects: Vec<String>,
    /// When the fetch finished.
    pub generated_at: DateTime<Utc>,
    /// Number of unique issues.
    pub total_issues: usize,
    /// Duration of the fetch in seconds.
    pub duration_seconds: f64,
}

/// Generate a complete Markdown report.
pub fn generate_markdown_report(issues: &[Issue], metadata: &ReportMetadata) -> String {
    let mut output = String::new();

    output.push_str("# Open Issues\n\n");
    output.push_str(&generate_metadata_section(metadata));
    output.push_str(&generate_language_section(issues));
    output.push_str(&generate_issues_section(issues));
    output.push_str(&generate_footer());

    output
}

/// Generate the metadata section.
fn generate_metadata_section(metadata: &ReportMetadata) -> String {
    let mut section = String::new();

    section.push_str("## Search\n\n");
    section.push_str(&format!(
        "- **Labels:** {}\n",
        quoted_list(&metadata.labels)
    ));
    if !metadata.orgs.is_empty() {
        section.push_str(&format!(
            "- **Organizations:** {}\n",
            metadata.orgs.join(", ")
        ));
    }
    if !metadata.projects.is_empty() {
        section.push_str(&format!(
            "- **Repositories:** {}\n",
            metadata.projects.join(", ")
        ));
    }
    section.push_str(&format!(
        "- **Generated:** {}\n",
        metadata.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push_str(&format!("- **Issues Found:** {}\n", metadata.total_issues));
    section.push_str(&format!(
        "- **Fetch Duration:** {:.1}s\n",
        metadata.duration_seconds
    ));
    section.push('\n');

    section
}

fn quoted_list(items: &[String]) -> String {
    items
        .iter()
        .map(|item| format!("`{}`", item))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Generate the per-language summary table.
fn generate_language_section(issues: &[Issue]) -> String {
    let dist = language_distribution(issues);
    if dist.is_empty() {
        return String::new();
    }

    let mut section = String::new();
    section.push_str("## Issues by Language\n\n");
    section.push_str("| Language | Issues |\n");
    section.push_str("|:---|:---:|\n");

    let mut langs: Vec<_> = dist.into_iter().collect();
    langs.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

    for (lang, count) in langs {
        section.push_str(&format!("| {} | {} |\n", lang, count));
    }
    section.push('\n');

    section
}

/// Generate the issues table.
fn generate_issues_section(issues: &[Issue]) -> String {
    let mut section = String::new();

    section.push_str("## Issues\n\n");

    if issues.is_empty() {
        section.push_str("No open issues matched the configured labels.\n\n");
        return section;
    }

    section.push_str("| Issue | Repository | Languages | Opened |\n");
    section.push_str("|:---|:---|:---|:---:|\n");

    for issue in issues {
        section.push_str(&generate_issue_row(issue));
    }
    section.push('\n');

    section
}

/// Generate one table row.
fn generate_issue_row(issue: &Issue) -> String {
    let languages = if issue.languages.is_empty() {
        "-".to_string()
    } else {
        issue.languages.join(", ")
    };

    format!(
        "| [{}]({}) | [{}]({}) | {} | {} |\n",
        escape_cell(&issue.title),
        issue.link(),
        issue.repo,
        issue.repo.html_url(),
        escape_cell(&languages),
        issue.date.format("%Y-%m-%d")
    )
}

/// Keep user text from breaking the table or the link syntax.
fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|")
        .replace('[', "\\[")
        .replace(']', "\\]")
        .replace('\n', " ")
}

fn generate_footer() -> String {
    let mut footer = String::new();

    footer.push_str("---\n\n");
    footer.push_str("*Generated by IssueFinder*\n");

    footer
}

/// Generate a JSON report: the list of issues.
pub fn generate_json_report(issues: &[Issue]) -> Result<String> {
    serde_json::to_string_pretty(issues).map_err(Into::into)
}
