//! IssueFinder - open GitHub issues across several labels at once
//!
//! A CLI tool that searches GitHub once per label in parallel, merges and
//! deduplicates the results, and enriches every issue with the top
//! languages of its repository.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Any failure (configuration, network, GitHub error, cancellation)

mod analysis;
mod cli;
mod config;
mod error;
mod github;
mod models;
mod report;

#[cfg(test)]
mod testing;

use analysis::IssueFinder;
use anyhow::{bail, Context, Result};
use chrono::Utc;
use cli::{Args, OutputFormat};
use config::Config;
use github::{ClientConfig, GitHubClient, SearchScope};
use indicatif::{ProgressBar, ProgressStyle};
use report::ReportMetadata;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    init_logging(&args);

    info!("IssueFinder v{}", env!("CARGO_PKG_VERSION"));

    if let Err(e) = run(args).await {
        // Full cause chain for the operator, a short line for the user
        error!("Fetch failed: {:#}", e);
        eprintln!("\n❌ Error: could not fetch issues (run with --verbose for details)");
        std::process::exit(1);
    }

    Ok(())
}

/// Handle --init-config: generate a default .issuefinder.toml.
fn handle_init_config() -> Result<()> {
    let path = std::path::Path::new(config::CONFIG_FILE_NAME);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            config::CONFIG_FILE_NAME
        );
        std::process::exit(1);
    }

    let content = Config::default_toml()?;
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", config::CONFIG_FILE_NAME))?;

    println!("✅ Created {} with default settings.", config::CONFIG_FILE_NAME);
    println!("   Edit it to choose labels, organizations and repositories.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
///
/// `RUST_LOG` takes precedence over `-v`/`-q` when set.
fn init_logging(args: &Args) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::default().add_directive(LevelFilter::from_level(args.log_level()).into())
    });

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

/// Fetch, sort and render the issues.
async fn run(args: Args) -> Result<()> {
    let mut config = load_config(&args)?;
    config.merge_with_args(&args);
    config.validate()?;
    debug!(?config, "Effective configuration");

    let client = GitHubClient::new(&ClientConfig::from(&config.github))
        .context("Failed to create GitHub client")?;
    let finder = IssueFinder::new(
        client,
        config.search.labels.clone(),
        SearchScope::from(&config.search),
        config.search.max_languages,
    );

    if args.token.is_empty() {
        warn!("No GitHub token given; searching unauthenticated with a low rate limit");
    }

    let cancel = CancellationToken::new();
    spawn_cancel_triggers(&cancel, args.timeout);

    let spinner = (!args.quiet).then(|| {
        start_spinner(&format!(
            "Searching {} label(s) on GitHub...",
            finder.labels().len()
        ))
    });

    let start_time = Instant::now();
    let result = finder.fetch_all(&args.token, &cancel).await;
    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }
    let mut issues = match result {
        Ok(issues) => issues,
        Err(e) if e.is_cancelled() => bail!("Cancelled before all searches finished"),
        Err(e) => return Err(e).context("Failed to fetch issues"),
    };
    let duration = start_time.elapsed().as_secs_f64();

    analysis::sort_issues(&mut issues, config.general.sort);

    let metadata = ReportMetadata {
        labels: config.search.labels.clone(),
        orgs: config.search.orgs.iter().cloned().collect(),
        projects: config.search.projects.iter().cloned().collect(),
        generated_at: Utc::now(),
        total_issues: issues.len(),
        duration_seconds: duration,
    };

    let output = match config.general.format {
        OutputFormat::Json => report::generate_json_report(&issues)?,
        OutputFormat::Markdown => report::generate_markdown_report(&issues, &metadata),
    };

    match config.general.output {
        Some(ref path) => {
            std::fs::write(path, &output)
                .with_context(|| format!("Failed to write results to {}", path.display()))?;
            if !args.quiet {
                eprintln!(
                    "✅ Found {} issue(s) in {:.1}s. Saved to: {}",
                    issues.len(),
                    duration,
                    path.display()
                );
            }
        }
        None => println!("{}", output),
    }

    Ok(())
}

/// Cancel the run on Ctrl-C, and after `timeout_secs` if given.
fn spawn_cancel_triggers(cancel: &CancellationToken, timeout_secs: Option<u64>) {
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling searches");
            on_interrupt.cancel();
        }
    });

    if let Some(secs) = timeout_secs {
        let on_deadline = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(secs)).await;
            warn!("Deadline of {}s reached, cancelling searches", secs);
            on_deadline.cancel();
        });
    }
}

fn start_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => {
            info!("Loaded default config from {}", config::CONFIG_FILE_NAME);
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => {
            warn!("Failed to load config: {}", e);
            Ok(Config::default())
        }
    }
}
