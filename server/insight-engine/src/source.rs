//! Where raw commits, pull requests and reviews come from.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::EngineError;
use crate::types::*;

/// A version-control host, seen through the four listings the harvest needs.
///
/// Implementations may block; the pipeline calls them sequentially.
pub trait RecordSource {
  /// Human-readable name of what is being harvested, e.g. `owner/repo`.
  fn label(&self) -> String {
    "records".to_string()
  }

  /// Commit summaries, newest first.
  fn commits(&self) -> Result<Vec<RawCommitSummary>, EngineError>;

  fn commit_detail(&self, sha: &str) -> Result<RawCommitDetail, EngineError>;

  fn pull_requests(&self, state: PullRequestState, per_page: u32) -> Result<Vec<RawPullRequest>, EngineError>;

  fn reviews(&self, number: u64) -> Result<Vec<RawReview>, EngineError>;
}

/// In-memory source, e.g. loaded from a recorded JSON fixture.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct StaticSource {
  /// Commit details in listing order.
  #[serde(default)]
  pub commits: Vec<RawCommitDetail>,
  #[serde(default)]
  pub pull_requests: Vec<RawPullRequest>,
  /// Reviews keyed by pull request number.
  #[serde(default)]
  pub reviews: BTreeMap<u64, Vec<RawReview>>,
}

impl StaticSource {
  pub fn from_json(json: &str) -> Result<Self, EngineError> {
    Ok(serde_json::from_str(json)?)
  }
}

impl RecordSource for StaticSource {
  fn label(&self) -> String {
    "fixture".to_string()
  }

  fn commits(&self) -> Result<Vec<RawCommitSummary>, EngineError> {
    Ok(
      self
        .commits
        .iter()
        .map(|c| RawCommitSummary { sha: c.sha.clone() })
        .collect(),
    )
  }

  fn commit_detail(&self, sha: &str) -> Result<RawCommitDetail, EngineError> {
    self
      .commits
      .iter()
      .find(|c| c.sha.as_deref() == Some(sha))
      .cloned()
      .ok_or_else(|| EngineError::record_source("commit_detail", format!("no commit {}", sha)))
  }

  fn pull_requests(&self, state: PullRequestState, per_page: u32) -> Result<Vec<RawPullRequest>, EngineError> {
    Ok(
      self
        .pull_requests
        .iter()
        .filter(|pr| pr.state.as_deref().and_then(PullRequestState::from_str_loose) == Some(state))
        .take(per_page as usize)
        .cloned()
        .collect(),
    )
  }

  fn reviews(&self, number: u64) -> Result<Vec<RawReview>, EngineError> {
    Ok(self.reviews.get(&number).cloned().unwrap_or_default())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  const FIXTURE: &str = r#"{
    "commits": [
      {"sha": "aaa", "author": {"login": "alice"}, "files": [{"filename": "a.rs", "additions": 3, "deletions": 1}]},
      {"sha": "bbb", "author": null, "files": []}
    ],
    "pull_requests": [
      {"number": 1, "state": "closed", "merged_at": "2024-01-02T00:00:00Z"},
      {"number": 2, "state": "open"},
      {"number": 3, "state": "closed"}
    ],
    "reviews": {"1": [{"submitted_at": "2024-01-01T12:00:00Z"}]}
  }"#;

  #[test]
  fn static_source_serves_fixture() {
    let source = StaticSource::from_json(FIXTURE).unwrap();
    let shas: Vec<_> = source.commits().unwrap().into_iter().map(|c| c.sha).collect();
    assert_eq!(shas, vec![Some("aaa".to_string()), Some("bbb".to_string())]);
    assert_eq!(source.commit_detail("aaa").unwrap().files.len(), 1);
    assert_eq!(source.reviews(1).unwrap().len(), 1);
    assert!(source.reviews(2).unwrap().is_empty());
  }

  #[test]
  fn static_source_filters_by_state_and_page() {
    let source = StaticSource::from_json(FIXTURE).unwrap();
    let closed = source.pull_requests(PullRequestState::Closed, 10).unwrap();
    assert_eq!(closed.iter().map(|p| p.number).collect::<Vec<_>>(), vec![1, 3]);
    assert_eq!(source.pull_requests(PullRequestState::Closed, 1).unwrap().len(), 1);
    assert_eq!(source.pull_requests(PullRequestState::Open, 10).unwrap()[0].number, 2);
  }

  #[test]
  fn unknown_commit_is_an_error() {
    let source = StaticSource::from_json(FIXTURE).unwrap();
    let err = source.commit_detail("zzz").unwrap_err();
    assert!(err.to_string().contains("zzz"));
  }
}
