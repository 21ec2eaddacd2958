//! Pull request data as returned by the GitHub REST API.
//!
//! Fields GitHub may omit or send as `null` decode to empty values; the
//! labeling pass decides what to do with incomplete records.

use serde::{Deserialize, Deserializer, Serialize};

/// An open pull request and the labels currently attached to it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequest {
    /// Pull request number. Entries without one are never processed.
    #[serde(default)]
    pub number: Option<u64>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub labels: Vec<Label>,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl PullRequest {
    /// Title for log output, empty when GitHub omitted it.
    #[must_use]
    pub fn title_or_empty(&self) -> &str {
        self.title.as_deref().unwrap_or_default()
    }
}

/// A label attached to a pull request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Label {
    #[serde(default)]
    pub name: Option<String>,
}

impl Label {
    /// Create a label with the given name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
        }
    }

    /// Label name, with an unset name treated as the empty string.
    #[must_use]
    pub fn name_or_empty(&self) -> &str {
        self.name.as_deref().unwrap_or_default()
    }
}

/// A file touched by a pull request's diff.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitFile {
    pub filename: String,
    /// `added`, `modified`, `removed`, `renamed`, ...
    #[serde(default)]
    pub status: Option<String>,
}

impl CommitFile {
    #[must_use]
    pub fn new(filename: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            status: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_pull_request_with_missing_fields() {
        let pr: PullRequest =
            serde_json::from_str(r#"{"labels":[{"name":"area/backend"},{}]}"#).unwrap();
        assert_eq!(pr.number, None);
        assert_eq!(pr.title_or_empty(), "");
        assert_eq!(pr.labels[0].name_or_empty(), "area/backend");
        assert_eq!(pr.labels[1].name_or_empty(), "");
    }

    #[test]
    fn test_decode_pull_request_with_null_labels() {
        let pr: PullRequest =
            serde_json::from_str(r#"{"number":1,"title":null,"labels":null}"#).unwrap();
        assert_eq!(pr.number, Some(1));
        assert_eq!(pr.title_or_empty(), "");
        assert!(pr.labels.is_empty());
    }

    #[test]
    fn test_decode_pull_request_ignores_unknown_fields() {
        let pr: PullRequest = serde_json::from_str(
            r#"{"number":7,"title":"Fix docs","state":"open","labels":[]}"#,
        )
        .unwrap();
        assert_eq!(pr.number, Some(7));
        assert_eq!(pr.title_or_empty(), "Fix docs");
        assert!(pr.labels.is_empty());
    }

    #[test]
    fn test_decode_commit_file() {
        let file: CommitFile =
            serde_json::from_str(r#"{"filename":"src/lib.rs","status":"modified","additions":3}"#)
                .unwrap();
        assert_eq!(file.filename, "src/lib.rs");
        assert_eq!(file.status.as_deref(), Some("modified"));
    }
}
