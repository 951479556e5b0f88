//! GitHub REST API as a record source.

use insight_engine::types::*;
use insight_engine::{EngineError, RecordSource};
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use serde::de::DeserializeOwned;
use std::time::Duration;

use crate::error::ReportError;

const LOG_TARGET: &str = "github";

pub const DEFAULT_API_URL: &str = "https://api.github.com";
const API_VERSION: &str = "2022-11-28";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// One repository on a GitHub (or GitHub Enterprise) host.
#[derive(Debug, Clone)]
pub struct GithubSource {
  client: Client,
  api_url: String,
  owner: String,
  repo: String,
}

impl GithubSource {
  pub fn new(owner: &str, repo: &str, token: Option<&str>, api_url: &str) -> Result<Self, ReportError> {
    let mut headers = HeaderMap::new();
    let _ = headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github+json"));
    let _ = headers.insert("x-github-api-version", HeaderValue::from_static(API_VERSION));

    if let Some(t) = token.map(str::trim).filter(|t| !t.is_empty()) {
      let mut auth_val = HeaderValue::from_str(&format!("Bearer {}", t))
        .map_err(|e| ReportError::config("github_token", e.to_string()))?;
      auth_val.set_sensitive(true);
      let _ = headers.insert(AUTHORIZATION, auth_val);
    } else {
      log::warn!(target: LOG_TARGET, "No GitHub token configured; unauthenticated requests are heavily rate limited");
    }

    let client = Client::builder()
      .user_agent("dev-report")
      .default_headers(headers)
      .timeout(REQUEST_TIMEOUT)
      .build()?;

    Ok(Self {
      client,
      api_url: api_url.trim_end_matches('/').to_string(),
      owner: owner.to_string(),
      repo: repo.to_string(),
    })
  }

  pub fn repo_url(&self, path: &str) -> String {
    format!("{}/repos/{}/{}{}", self.api_url, self.owner, self.repo, path)
  }

  fn get<T: DeserializeOwned>(&self, operation: &str, path: &str, query: &[(&str, String)]) -> Result<T, EngineError> {
    let url = self.repo_url(path);
    log::debug!(target: LOG_TARGET, "GET {}", url);
    self
      .client
      .get(&url)
      .query(query)
      .send()
      .and_then(|res| res.error_for_status())
      .and_then(|res| res.json::<T>())
      .map_err(|e| EngineError::record_source(operation, e))
  }
}

impl RecordSource for GithubSource {
  fn label(&self) -> String {
    format!("{}/{}", self.owner, self.repo)
  }

  fn commits(&self) -> Result<Vec<RawCommitSummary>, EngineError> {
    self.get("commits", "/commits", &[])
  }

  fn commit_detail(&self, sha: &str) -> Result<RawCommitDetail, EngineError> {
    self.get("commit_detail", &format!("/commits/{}", sha), &[])
  }

  fn pull_requests(&self, state: PullRequestState, per_page: u32) -> Result<Vec<RawPullRequest>, EngineError> {
    self.get(
      "pull_requests",
      "/pulls",
      &[("state", state.as_str().to_string()), ("per_page", per_page.to_string())],
    )
  }

  fn reviews(&self, number: u64) -> Result<Vec<RawReview>, EngineError> {
    self.get("reviews", &format!("/pulls/{}/reviews", number), &[])
  }
}
