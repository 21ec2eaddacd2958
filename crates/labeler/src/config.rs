//! Runtime configuration for a labeling pass.

use std::path::PathBuf;

use thiserror::Error;

use crate::github::{GitHubError, GitHubRepository, DEFAULT_API_URL};
use crate::rules::{RuleError, RuleSet};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid repository {0:?}, expected owner/repo")]
    InvalidRepository(String),

    #[error("a GitHub token is required unless running in dry-run mode")]
    MissingToken,
}

/// Everything needed to run one pass against one repository.
#[derive(Debug, Clone)]
pub struct LabelerConfig {
    pub owner: String,
    pub repo: String,
    pub token: Option<String>,
    pub rules_path: PathBuf,
    /// Report proposals without adding labels.
    pub dry_run: bool,
    pub api_url: String,
}

impl LabelerConfig {
    /// Build a config for an `owner/repo` slug with default API URL and no token.
    pub fn new(repository: &str, rules_path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let (owner, repo) = parse_repository(repository)?;
        Ok(Self {
            owner,
            repo,
            token: None,
            rules_path: rules_path.into(),
            dry_run: false,
            api_url: DEFAULT_API_URL.to_string(),
        })
    }

    /// Check that the settings are usable together.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.dry_run && self.token().is_none() {
            return Err(ConfigError::MissingToken);
        }
        Ok(())
    }

    /// Configured token, with a blank value treated as no token.
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref().map(str::trim).filter(|t| !t.is_empty())
    }

    pub fn repository(&self) -> Result<GitHubRepository, GitHubError> {
        let token = self.token().map(str::to_string);
        Ok(GitHubRepository::new(token, &self.owner, &self.repo)?.with_base_url(&self.api_url))
    }

    pub fn rules(&self) -> Result<RuleSet, RuleError> {
        RuleSet::from_file(&self.rules_path)
    }
}

/// Split an `owner/repo` slug.
pub fn parse_repository(slug: &str) -> Result<(String, String), ConfigError> {
    let invalid = || ConfigError::InvalidRepository(slug.to_string());
    let (owner, repo) = slug.trim().split_once('/').ok_or_else(invalid)?;
    if owner.is_empty() || repo.is_empty() || repo.contains('/') {
        return Err(invalid());
    }
    Ok((owner.to_string(), repo.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_repository() {
        assert_eq!(
            parse_repository("octo/service").unwrap(),
            ("octo".to_string(), "service".to_string())
        );
        assert_eq!(
            parse_repository(" octo/service\n").unwrap(),
            ("octo".to_string(), "service".to_string())
        );
    }

    #[test]
    fn test_parse_repository_rejects_malformed() {
        for slug in ["", "octo", "/service", "octo/", "octo/service/extra"] {
            assert!(
                matches!(
                    parse_repository(slug),
                    Err(ConfigError::InvalidRepository(_))
                ),
                "{slug:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_new_config_defaults() {
        let config = LabelerConfig::new("octo/service", "labels.yaml").unwrap();
        assert_eq!(config.owner, "octo");
        assert_eq!(config.repo, "service");
        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert!(config.token.is_none());
        assert!(!config.dry_run);
    }

    #[test]
    fn test_token_required_outside_dry_run() {
        let mut config = LabelerConfig::new("octo/service", "labels.yaml").unwrap();
        assert!(matches!(config.validate(), Err(ConfigError::MissingToken)));

        config.token = Some("   ".to_string());
        assert!(matches!(config.validate(), Err(ConfigError::MissingToken)));

        config.dry_run = true;
        assert!(config.validate().is_ok());

        config.dry_run = false;
        config.token = Some("ghp_example".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_blank_token_is_treated_as_missing() {
        let mut config = LabelerConfig::new("octo/service", "labels.yaml").unwrap();
        config.token = Some(" \n".to_string());
        assert_eq!(config.token(), None);

        config.token = Some(" ghp_example ".to_string());
        assert_eq!(config.token(), Some("ghp_example"));
    }

    #[tokio::test]
    async fn test_repository_built_without_blank_token() {
        let mut config = LabelerConfig::new("octo/service", "labels.yaml").unwrap();
        config.token = Some("   ".to_string());
        config.dry_run = true;

        let err = config
            .repository()
            .unwrap()
            .add_labels(1, &["area/docs".to_string()])
            .await
            .unwrap_err();
        assert!(matches!(err, GitHubError::MissingToken(_)));
    }

    #[test]
    fn test_repository_uses_configured_identity() {
        use crate::labeling::Repository;

        let config = LabelerConfig::new("octo/service", "labels.yaml").unwrap();
        let repository = config.repository().unwrap();
        assert_eq!(repository.owner(), "octo");
        assert_eq!(repository.name(), "service");
    }
}
