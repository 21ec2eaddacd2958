//! Errors that abort a labeling pass.

use thiserror::Error;

/// Failure of one of the collaborator calls made during a pass.
///
/// A pass never recovers locally: the first failure is returned with the
/// collaborator's error as its source, and pull requests not yet visited
/// stay untouched. Labels already added earlier in the pass are kept.
#[derive(Debug, Error)]
pub enum LabelerError {
    /// Listing open pull requests failed.
    #[error("failed to list open pull requests")]
    ListPullRequests(#[source] anyhow::Error),

    /// Fetching the modified files of one pull request failed.
    #[error("failed to fetch modified files for PR #{number}")]
    ModifiedFiles {
        number: u64,
        #[source]
        source: anyhow::Error,
    },

    /// Submitting labels to one pull request failed.
    #[error("failed to add labels to PR #{number}")]
    AddLabels {
        number: u64,
        #[source]
        source: anyhow::Error,
    },
}

impl LabelerError {
    /// Pull request the failure is attributed to, if any.
    #[must_use]
    pub const fn pull_request(&self) -> Option<u64> {
        match self {
            Self::ListPullRequests(_) => None,
            Self::ModifiedFiles { number, .. } | Self::AddLabels { number, .. } => Some(*number),
        }
    }
}
