//! Path-based labeling for open GitHub pull requests.
//!
//! Each pass lists the open pull requests of one repository, maps the files
//! each one modifies to label names through a set of regex rules, and adds
//! the labels a pull request is missing. Labels are only ever added.
//!
//! # Usage
//!
//! ```no_run
//! use labeler::LabelerConfig;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let mut config = LabelerConfig::new("octo/service", ".github/labels.yaml")?;
//! config.dry_run = true;
//!
//! let summary = labeler::run(&config).await?;
//! println!("{} pull requests need labels", summary.proposed);
//! # Ok(())
//! # }
//! ```
//!
//! # Architecture
//!
//! - [`Labeler`] runs the pass over a [`Repository`] and a [`Mappings`]
//! - [`GitHubRepository`] implements [`Repository`] over the REST API
//! - [`RuleSet`] implements [`Mappings`] from a YAML rules file

#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod github;
pub mod labeling;
pub mod model;
pub mod rules;

pub use config::{ConfigError, LabelerConfig};
pub use error::LabelerError;
pub use github::{GitHubError, GitHubRepository};
pub use labeling::{
    should_apply_labels, ApplySummary, LabelProposal, Labeler, Mappings, Reporter, Repository,
    TracingReporter,
};
pub use model::{CommitFile, Label, PullRequest};
pub use rules::{Rule, RuleError, RuleSet};

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

/// Load rules, connect to GitHub and run one labeling pass.
pub async fn run(config: &LabelerConfig) -> Result<ApplySummary> {
    config.validate()?;

    let rules = config
        .rules()
        .with_context(|| format!("loading rules from {}", config.rules_path.display()))?;
    let repository = config.repository().context("creating GitHub client")?;
    info!(
        "Labeling {}/{} with {} rules (dry run: {})",
        config.owner,
        config.repo,
        rules.len(),
        config.dry_run
    );

    let labeler =
        Labeler::new(Arc::new(repository), Arc::new(rules)).with_dry_run(config.dry_run);
    Ok(labeler.apply_labels().await?)
}
