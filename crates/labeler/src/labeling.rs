//! # Path-Based Label Reconciliation
//!
//! Brings the labels on open pull requests up to the set implied by the files
//! each pull request touches. The pass is additive only: labels that no longer
//! match any rule are left in place.
//!
//! ## Flow
//!
//! For every open pull request, in the order the repository returns them:
//!
//! 1. skip it if it has no number
//! 2. resolve the expected labels (modified files fed through the [`Mappings`])
//! 3. compare against the attached labels with [`should_apply_labels`]
//! 4. report the proposal, then submit the full expected set unless dry-running
//!
//! Any collaborator failure ends the pass immediately.

use std::collections::HashSet;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::error::LabelerError;
use crate::model::{CommitFile, Label, PullRequest};

/// Hosting-side operations the labeling pass needs.
#[async_trait]
pub trait Repository: Send + Sync {
    /// List every open pull request.
    async fn open_pull_requests(&self) -> Result<Vec<PullRequest>>;

    /// List the files modified by one pull request.
    async fn pull_request_modified_files(&self, number: u64) -> Result<Vec<CommitFile>>;

    /// Add labels to one pull request. Labels already present must be accepted
    /// and left unchanged.
    async fn add_labels_to_pull_request(&self, number: u64, labels: &[String]) -> Result<()>;

    /// Account that owns the repository.
    fn owner(&self) -> &str;

    /// Repository name without the owner.
    fn name(&self) -> &str;
}

/// Rule engine mapping modified files to label names.
pub trait Mappings: Send + Sync {
    fn matched_labels(&self, files: &[CommitFile]) -> Vec<String>;
}

/// A pull request whose labels fall short of the expected set.
#[derive(Debug, Clone, Copy)]
pub struct LabelProposal<'a> {
    pub owner: &'a str,
    pub repo: &'a str,
    pub number: u64,
    pub labels: &'a [String],
    pub title: &'a str,
}

/// Sink for label proposals. Called whether or not the pass is a dry run.
pub trait Reporter: Send + Sync {
    fn report(&self, proposal: &LabelProposal<'_>);
}

/// Reports proposals as `tracing` events.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingReporter;

impl Reporter for TracingReporter {
    fn report(&self, proposal: &LabelProposal<'_>) {
        info!(
            owner = %proposal.owner,
            repo = %proposal.repo,
            number = proposal.number,
            labels = ?proposal.labels,
            title = %proposal.title,
            "PR {}/{}#{} should have following labels: {:?} ({})",
            proposal.owner,
            proposal.repo,
            proposal.number,
            proposal.labels,
            proposal.title
        );
    }
}

/// Counters for a completed pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ApplySummary {
    /// Pull requests returned by the repository.
    pub visited: usize,
    /// Entries skipped because they carried no number.
    pub skipped_without_number: usize,
    /// Pull requests that already had every expected label, or matched no rule.
    pub up_to_date: usize,
    /// Pull requests reported as missing labels.
    pub proposed: usize,
    /// Pull requests that had labels submitted. Always zero on a dry run.
    pub applied: usize,
}

/// Reconciles pull request labels against the configured mappings.
pub struct Labeler {
    dry_run: bool,
    repository: Arc<dyn Repository>,
    mappings: Arc<dyn Mappings>,
    reporter: Arc<dyn Reporter>,
}

impl Labeler {
    /// Create a labeler that submits labels and reports through `tracing`.
    #[must_use]
    pub fn new(repository: Arc<dyn Repository>, mappings: Arc<dyn Mappings>) -> Self {
        Self {
            dry_run: false,
            repository,
            mappings,
            reporter: Arc::new(TracingReporter),
        }
    }

    /// Compute and report proposals without submitting them.
    #[must_use]
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    #[must_use]
    pub fn with_reporter(mut self, reporter: Arc<dyn Reporter>) -> Self {
        self.reporter = reporter;
        self
    }

    pub const fn dry_run(&self) -> bool {
        self.dry_run
    }

    /// Run one pass over every open pull request.
    #[instrument(
        skip(self),
        fields(owner = %self.repository.owner(), repo = %self.repository.name(), dry_run = self.dry_run)
    )]
    pub async fn apply_labels(&self) -> Result<ApplySummary, LabelerError> {
        let pulls = self
            .repository
            .open_pull_requests()
            .await
            .map_err(LabelerError::ListPullRequests)?;
        debug!("Found {} open pull requests", pulls.len());

        self.apply_labels_to(&pulls).await
    }

    /// Run a pass over an already fetched list of pull requests.
    pub async fn apply_labels_to(
        &self,
        pulls: &[PullRequest],
    ) -> Result<ApplySummary, LabelerError> {
        let mut summary = ApplySummary::default();

        for pull in pulls {
            summary.visited += 1;
            let Some(number) = pull.number else {
                summary.skipped_without_number += 1;
                continue;
            };

            let expected = self.expected_labels(number).await?;
            if !should_apply_labels(&expected, &pull.labels) {
                debug!("PR #{} is up to date", number);
                summary.up_to_date += 1;
                continue;
            }

            self.reporter.report(&LabelProposal {
                owner: self.repository.owner(),
                repo: self.repository.name(),
                number,
                labels: &expected,
                title: pull.title_or_empty(),
            });
            summary.proposed += 1;

            if self.dry_run {
                continue;
            }

            // Submit the whole expected set; the add operation is a set union.
            self.repository
                .add_labels_to_pull_request(number, &expected)
                .await
                .map_err(|source| LabelerError::AddLabels { number, source })?;
            summary.applied += 1;
        }

        info!(
            "Labeling complete: {} visited, {} proposed, {} applied",
            summary.visited, summary.proposed, summary.applied
        );
        Ok(summary)
    }

    /// Labels the mappings assign to the files modified by PR `number`.
    pub async fn expected_labels(&self, number: u64) -> Result<Vec<String>, LabelerError> {
        let files = self
            .repository
            .pull_request_modified_files(number)
            .await
            .map_err(|source| LabelerError::ModifiedFiles { number, source })?;
        Ok(self.mappings.matched_labels(&files))
    }
}

/// Whether `existing` lacks at least one of the `expected` labels.
///
/// An empty expectation never triggers an update. Labels present in
/// `existing` but not in `expected` are ignored.
pub fn should_apply_labels(expected: &[String], existing: &[Label]) -> bool {
    if expected.is_empty() {
        return false;
    }
    if expected.len() > existing.len() {
        return true;
    }
    !difference(expected, existing).is_empty()
}

/// Expected labels not attached yet, in `expected` order.
pub fn difference<'a>(expected: &'a [String], existing: &[Label]) -> Vec<&'a str> {
    let existing: HashSet<&str> = existing.iter().map(Label::name_or_empty).collect();
    expected
        .iter()
        .map(String::as_str)
        .filter(|name| !existing.contains(name))
        .collect()
}
