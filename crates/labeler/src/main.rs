//! CLI for the pull request labeler
//!
//! Run `pr-labeler --help` for usage information.

// CLI binaries legitimately need println! for user output
#![allow(clippy::disallowed_macros)]

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, ValueEnum};
use labeler::{ApplySummary, LabelerConfig};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "pr-labeler")]
#[command(about = "Add path-based labels to open GitHub pull requests")]
#[command(version)]
struct Cli {
    /// Repository in owner/repo format
    #[arg(short, long, env = "GITHUB_REPOSITORY")]
    repo: String,

    /// YAML file mapping labels to path patterns
    #[arg(short = 'c', long, env = "LABELER_RULES", default_value = ".github/labels.yaml")]
    rules: PathBuf,

    /// GitHub token (required unless --dry-run)
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// GitHub API base URL
    #[arg(long, env = "GITHUB_API_URL", default_value = labeler::github::DEFAULT_API_URL)]
    api_url: String,

    /// Dry run - report missing labels without adding them
    #[arg(short, long, env = "LABELER_DRY_RUN")]
    dry_run: bool,

    /// Output format for the run summary
    #[arg(short, long, default_value = "text")]
    output: OutputFormat,

    /// Log format
    #[arg(long, default_value = "text")]
    log_format: OutputFormat,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Clone, Copy, Default, ValueEnum)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

fn init_tracing(verbose: bool, format: OutputFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("labeler=debug,pr_labeler=debug")
        } else {
            EnvFilter::new("labeler=info,pr_labeler=info")
        }
    });

    let registry = tracing_subscriber::registry().with(filter);
    match format {
        OutputFormat::Text => registry.with(fmt::layer().with_target(false)).init(),
        OutputFormat::Json => registry.with(fmt::layer().json()).init(),
    }
}

fn print_summary(summary: &ApplySummary, format: OutputFormat, dry_run: bool) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(summary)?),
        OutputFormat::Text => {
            println!(
                "Checked {} open pull requests ({} without a number)",
                summary.visited, summary.skipped_without_number
            );
            println!("  up to date: {}", summary.up_to_date);
            println!("  missing labels: {}", summary.proposed);
            if dry_run {
                println!("  labeled: 0 (dry run)");
            } else {
                println!("  labeled: {}", summary.applied);
            }
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.log_format);

    let mut config = LabelerConfig::new(&cli.repo, cli.rules)?;
    config.token = cli.token;
    config.api_url = cli.api_url;
    config.dry_run = cli.dry_run;

    let summary = labeler::run(&config).await?;
    print_summary(&summary, cli.output, config.dry_run)
}
