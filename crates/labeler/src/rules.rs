//! Regex rules mapping modified file paths to labels.
//!
//! Rules are read from YAML, one entry per label:
//!
//! ```yaml
//! area/backend:
//!   - ^src/server/
//!   - \.sql$
//! area/docs:
//!   - ^docs/
//!   - \.md$
//! ```
//!
//! A label matches when any of its patterns matches any modified path.
//! Matched labels keep the order they are declared in the file.

use std::path::Path;

use regex::Regex;
use thiserror::Error;
use tracing::debug;

use crate::labeling::Mappings;
use crate::model::CommitFile;

#[derive(Debug, Error)]
pub enum RuleError {
    #[error("failed to read rules file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse rules: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("invalid pattern {pattern:?} for label {label:?}: {source}")]
    InvalidPattern {
        label: String,
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

/// Patterns for a single label.
#[derive(Debug, Clone)]
pub struct Rule {
    label: String,
    patterns: Vec<Regex>,
}

impl Rule {
    pub fn new(label: impl Into<String>, patterns: &[&str]) -> Result<Self, RuleError> {
        let label = label.into();
        let patterns = patterns
            .iter()
            .map(|p| compile(&label, p))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { label, patterns })
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    fn matches(&self, path: &str) -> bool {
        self.patterns.iter().any(|p| p.is_match(path))
    }
}

fn compile(label: &str, pattern: &str) -> Result<Regex, RuleError> {
    Regex::new(pattern).map_err(|source| RuleError::InvalidPattern {
        label: label.to_string(),
        pattern: pattern.to_string(),
        source,
    })
}

/// Ordered collection of label rules.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: Vec<Rule>,
}

impl RuleSet {
    #[must_use]
    pub fn new(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    /// Parse rules from YAML text.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, RuleError> {
        let document: serde_yaml::Value = serde_yaml::from_str(yaml)?;
        let mapping: serde_yaml::Mapping = match document {
            serde_yaml::Value::Null => return Ok(Self::default()),
            other => serde_yaml::from_value(other)?,
        };

        let mut rules = Vec::with_capacity(mapping.len());
        for (label, patterns) in mapping {
            let label: String = serde_yaml::from_value(label)?;
            let patterns: Vec<String> = match patterns {
                serde_yaml::Value::Null => Vec::new(),
                serde_yaml::Value::String(single) => vec![single],
                other => serde_yaml::from_value(other)?,
            };
            let patterns = patterns
                .iter()
                .map(|p| compile(&label, p))
                .collect::<Result<Vec<_>, _>>()?;
            rules.push(Rule { label, patterns });
        }

        debug!("Loaded {} label rules", rules.len());
        Ok(Self { rules })
    }

    /// Read and parse a YAML rules file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, RuleError> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path).map_err(|source| RuleError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml_str(&yaml)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.rules.iter().map(Rule::label)
    }
}

impl Mappings for RuleSet {
    fn matched_labels(&self, files: &[CommitFile]) -> Vec<String> {
        let mut matched: Vec<String> = Vec::new();
        for rule in &self.rules {
            if matched.iter().any(|l| l == &rule.label) {
                continue;
            }
            if files.iter().any(|f| rule.matches(&f.filename)) {
                matched.push(rule.label.clone());
            }
        }
        matched
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const RULES: &str = r"
area/backend:
  - ^src/server/
  - \.sql$
area/docs:
  - ^docs/
  - \.md$
area/ci: ^\.github/
";

    fn files(paths: &[&str]) -> Vec<CommitFile> {
        paths.iter().map(|p| CommitFile::new(*p)).collect()
    }

    #[test]
    fn test_parse_rules_in_declaration_order() {
        let rules = RuleSet::from_yaml_str(RULES).unwrap();
        assert_eq!(rules.len(), 3);
        assert_eq!(
            rules.labels().collect::<Vec<_>>(),
            vec!["area/backend", "area/docs", "area/ci"]
        );
    }

    #[test]
    fn test_matched_labels_follow_rule_order() {
        let rules = RuleSet::from_yaml_str(RULES).unwrap();
        let matched = rules.matched_labels(&files(&["docs/intro.md", "db/001_init.sql"]));
        assert_eq!(matched, vec!["area/backend", "area/docs"]);
    }

    #[test]
    fn test_label_matched_once_for_many_files() {
        let rules = RuleSet::from_yaml_str(RULES).unwrap();
        let matched = rules.matched_labels(&files(&["README.md", "docs/a.md", "CHANGES.md"]));
        assert_eq!(matched, vec!["area/docs"]);
    }

    #[test]
    fn test_no_files_or_no_match_is_empty() {
        let rules = RuleSet::from_yaml_str(RULES).unwrap();
        assert!(rules.matched_labels(&[]).is_empty());
        assert!(rules.matched_labels(&files(&["Cargo.lock"])).is_empty());
    }

    #[test]
    fn test_single_string_pattern() {
        let rules = RuleSet::from_yaml_str(RULES).unwrap();
        let matched = rules.matched_labels(&files(&[".github/workflows/ci.yml"]));
        assert_eq!(matched, vec!["area/ci"]);
    }

    #[test]
    fn test_empty_document_has_no_rules() {
        assert!(RuleSet::from_yaml_str("").unwrap().is_empty());
        assert!(RuleSet::from_yaml_str("# nothing\n").unwrap().is_empty());
    }

    #[test]
    fn test_label_without_patterns_never_matches() {
        let rules = RuleSet::from_yaml_str("area/unused:\n").unwrap();
        assert_eq!(rules.len(), 1);
        assert!(rules.matched_labels(&files(&["anything"])).is_empty());
    }

    #[test]
    fn test_invalid_pattern_names_label() {
        let err = RuleSet::from_yaml_str("area/broken:\n  - \"src/(\"\n").unwrap_err();
        match err {
            RuleError::InvalidPattern { label, pattern, .. } => {
                assert_eq!(label, "area/broken");
                assert_eq!(pattern, "src/(");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_non_mapping_document_is_rejected() {
        assert!(matches!(
            RuleSet::from_yaml_str("- just\n- a list\n"),
            Err(RuleError::Parse(_))
        ));
    }

    #[test]
    fn test_rules_built_in_code() {
        let rules = RuleSet::new(vec![
            Rule::new("lang/rust", &[r"\.rs$"]).unwrap(),
            Rule::new("lang/go", &[r"\.go$"]).unwrap(),
        ]);
        let matched = rules.matched_labels(&files(&["cmd/main.go", "src/lib.rs"]));
        assert_eq!(matched, vec!["lang/rust", "lang/go"]);
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(RULES.as_bytes()).unwrap();

        let rules = RuleSet::from_file(file.path()).unwrap();
        assert_eq!(rules.len(), 3);
    }

    #[test]
    fn test_from_missing_file() {
        let err = RuleSet::from_file("/nonexistent/labels.yaml").unwrap_err();
        assert!(matches!(err, RuleError::Read { .. }));
    }
}
