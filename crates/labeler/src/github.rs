//! # GitHub REST Repository
//!
//! [`Repository`] implementation backed by the GitHub REST API. Listing calls
//! follow `page` pagination until a short page comes back. Errors are returned
//! as-is; nothing here retries.

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use reqwest::{header, Client as HttpClient, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info, instrument};

use crate::labeling::Repository;
use crate::model::{CommitFile, PullRequest};

/// Public GitHub API endpoint.
pub const DEFAULT_API_URL: &str = "https://api.github.com";

const PER_PAGE: usize = 100;
const USER_AGENT: &str = concat!("pr-labeler/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Error)]
pub enum GitHubError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("GitHub API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("Rate limit exceeded (resets at {reset_at:?})")]
    RateLimited { reset_at: Option<i64> },

    #[error("Authentication required for {0}")]
    MissingToken(&'static str),
}

#[derive(Debug, Deserialize)]
struct GitHubErrorBody {
    message: String,
}

/// GitHub repository client.
#[derive(Debug, Clone)]
pub struct GitHubRepository {
    http_client: HttpClient,
    base_url: String,
    token: Option<String>,
    owner: String,
    repo: String,
}

impl GitHubRepository {
    /// Create a client for `owner/repo`. Without a token only public data can
    /// be read and label submission fails.
    pub fn new(
        token: Option<String>,
        owner: impl Into<String>,
        repo: impl Into<String>,
    ) -> Result<Self, GitHubError> {
        let http_client = HttpClient::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            http_client,
            base_url: DEFAULT_API_URL.to_string(),
            token,
            owner: owner.into(),
            repo: repo.into(),
        })
    }

    /// Point the client at another API root, e.g. GitHub Enterprise.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn repo_url(&self, path: &str) -> String {
        format!("{}/repos/{}/{}/{}", self.base_url, self.owner, self.repo, path)
    }

    /// List all open pull requests.
    #[instrument(skip(self), fields(owner = %self.owner, repo = %self.repo))]
    pub async fn list_open_pull_requests(&self) -> Result<Vec<PullRequest>, GitHubError> {
        let pulls: Vec<PullRequest> = self
            .get_paginated(&self.repo_url("pulls"), &[("state", "open")])
            .await?;
        debug!("Retrieved {} open pull requests", pulls.len());
        Ok(pulls)
    }

    /// List the files changed by a pull request.
    #[instrument(skip(self), fields(pr_number = %number))]
    pub async fn list_files(&self, number: u64) -> Result<Vec<CommitFile>, GitHubError> {
        let files: Vec<CommitFile> = self
            .get_paginated(&self.repo_url(&format!("pulls/{number}/files")), &[])
            .await?;
        debug!("Retrieved {} modified files for PR #{}", files.len(), number);
        Ok(files)
    }

    /// Add labels to a pull request. GitHub merges them with the labels
    /// already present.
    #[instrument(skip(self), fields(pr_number = %number, labels = ?labels))]
    pub async fn add_labels(&self, number: u64, labels: &[String]) -> Result<(), GitHubError> {
        if labels.is_empty() {
            return Ok(());
        }
        if self.token.is_none() {
            return Err(GitHubError::MissingToken("adding labels"));
        }

        let url = self.repo_url(&format!("issues/{number}/labels"));
        let body = serde_json::json!({ "labels": labels });
        self.send(self.http_client.post(&url).json(&body)).await?;

        info!("Added {} labels to PR #{}", labels.len(), number);
        Ok(())
    }

    async fn get_paginated<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, &str)],
    ) -> Result<Vec<T>, GitHubError> {
        let per_page = PER_PAGE.to_string();
        let mut items = Vec::new();

        for page in 1.. {
            let page = page.to_string();
            let request = self
                .http_client
                .get(url)
                .query(query)
                .query(&[("per_page", per_page.as_str()), ("page", page.as_str())]);
            let batch: Vec<T> = self.send(request).await?.json().await?;
            let done = batch.len() < PER_PAGE;
            items.extend(batch);
            if done {
                break;
            }
        }

        Ok(items)
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, GitHubError> {
        let mut request = request
            .header(header::ACCEPT, "application/vnd.github+json")
            .header("X-GitHub-Api-Version", "2022-11-28");
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        if matches!(status, StatusCode::FORBIDDEN | StatusCode::TOO_MANY_REQUESTS)
            && header_value(&response, "x-ratelimit-remaining") == Some(0)
        {
            return Err(GitHubError::RateLimited {
                reset_at: header_value(&response, "x-ratelimit-reset"),
            });
        }

        let text = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<GitHubErrorBody>(&text)
            .map(|body| body.message)
            .unwrap_or(text);
        Err(GitHubError::Api {
            status: status.as_u16(),
            message,
        })
    }
}

fn header_value(response: &Response, name: &str) -> Option<i64> {
    response
        .headers()
        .get(name)
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.parse().ok())
}

#[async_trait]
impl Repository for GitHubRepository {
    async fn open_pull_requests(&self) -> Result<Vec<PullRequest>> {
        Ok(self.list_open_pull_requests().await?)
    }

    async fn pull_request_modified_files(&self, number: u64) -> Result<Vec<CommitFile>> {
        Ok(self.list_files(number).await?)
    }

    async fn add_labels_to_pull_request(&self, number: u64, labels: &[String]) -> Result<()> {
        Ok(self.add_labels(number, labels).await?)
    }

    fn owner(&self) -> &str {
        &self.owner
    }

    fn name(&self) -> &str {
        &self.repo
    }
}
