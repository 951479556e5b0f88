//! Shape harvested raw records into the engine's input records.

use crate::error::EngineError;
use crate::metrics::UNKNOWN_AUTHOR;
use crate::timestamp;
use crate::types::*;

/// Sha of a listed commit; a listing entry without one cannot be fetched.
pub fn commit_sha(summary: &RawCommitSummary) -> Result<&str, EngineError> {
  match summary.sha.as_deref().map(str::trim) {
    Some(sha) if !sha.is_empty() => Ok(sha),
    _ => Err(EngineError::validation("sha", "must not be empty")),
  }
}

/// Collapse a commit detail into a line-level diff summary.
pub fn commit_diff(sha: &str, detail: &RawCommitDetail) -> CommitDiff {
  let author = detail
    .author
    .as_ref()
    .and_then(|u| u.login.clone())
    .unwrap_or_else(|| UNKNOWN_AUTHOR.to_string());
  let date = detail
    .commit
    .as_ref()
    .and_then(|c| c.author.as_ref())
    .and_then(|a| a.date.clone());

  CommitDiff {
    sha: sha.to_string(),
    author: Some(author),
    date,
    additions: detail.files.iter().map(|f| f.additions).sum(),
    deletions: detail.files.iter().map(|f| f.deletions).sum(),
    files: detail.files.len() as u64,
  }
}

/// Earliest review submission. Parseable times win over unparseable ones,
/// which are compared as text.
pub fn first_review_at(reviews: &[RawReview]) -> Option<String> {
  reviews
    .iter()
    .filter_map(|r| r.submitted_at.as_deref())
    .map(|s| (timestamp::parse(s), s))
    .min_by(|(ta, sa), (tb, sb)| match (ta, tb) {
      (Some(a), Some(b)) => a.cmp(b).then_with(|| sa.cmp(sb)),
      (Some(_), None) => std::cmp::Ordering::Less,
      (None, Some(_)) => std::cmp::Ordering::Greater,
      (None, None) => sa.cmp(sb),
    })
    .map(|(_, s)| s.to_string())
}

/// Combine a listed pull request with its reviews.
pub fn pull_request(raw: &RawPullRequest, reviews: &[RawReview]) -> PullRequestRecord {
  let state = raw
    .state
    .as_deref()
    .and_then(PullRequestState::from_str_loose)
    .unwrap_or(if raw.closed_at.is_some() {
      PullRequestState::Closed
    } else {
      PullRequestState::Open
    });
  let author = raw
    .user
    .as_ref()
    .and_then(|u| u.login.clone())
    .unwrap_or_else(|| UNKNOWN_AUTHOR.to_string());

  PullRequestRecord {
    number: raw.number,
    title: raw.title.clone().unwrap_or_default(),
    state,
    created_at: raw.created_at.clone(),
    closed_at: raw.closed_at.clone(),
    merged_at: raw.merged_at.clone(),
    author: Some(author),
    additions: raw.additions.unwrap_or(0),
    deletions: raw.deletions.unwrap_or(0),
    changed_files: raw.changed_files.unwrap_or(0),
    first_review_at: first_review_at(reviews),
  }
}
