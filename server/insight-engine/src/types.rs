//! Core types for the insight engine (JSON contracts + internal models).

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ---------------------------------------------------------------------------
// Raw harvested types (GitHub REST shape, as a RecordSource hands them over)
// ---------------------------------------------------------------------------

/// One entry of the commit listing. Only the sha is used.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawCommitSummary {
  #[serde(default)]
  pub sha: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawUser {
  #[serde(default)]
  pub login: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawSignature {
  #[serde(default)]
  pub date: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawCommitMeta {
  #[serde(default)]
  pub author: Option<RawSignature>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawFile {
  #[serde(default)]
  pub filename: Option<String>,
  #[serde(default)]
  pub additions: u64,
  #[serde(default)]
  pub deletions: u64,
}

/// Full commit record (`GET /repos/{owner}/{repo}/commits/{sha}`).
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawCommitDetail {
  #[serde(default)]
  pub sha: Option<String>,
  /// Linked account; null when the commit email matches no user.
  #[serde(default)]
  pub author: Option<RawUser>,
  #[serde(default)]
  pub commit: Option<RawCommitMeta>,
  #[serde(default)]
  pub files: Vec<RawFile>,
}

/// One entry of the pull request listing.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawPullRequest {
  pub number: u64,
  #[serde(default)]
  pub title: Option<String>,
  #[serde(default)]
  pub state: Option<String>,
  #[serde(default)]
  pub created_at: Option<String>,
  #[serde(default)]
  pub closed_at: Option<String>,
  #[serde(default)]
  pub merged_at: Option<String>,
  #[serde(default)]
  pub user: Option<RawUser>,
  /// Listing responses omit the size fields; only single-PR responses carry them.
  #[serde(default)]
  pub additions: Option<u64>,
  #[serde(default)]
  pub deletions: Option<u64>,
  #[serde(default)]
  pub changed_files: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawReview {
  #[serde(default)]
  pub submitted_at: Option<String>,
}

// ---------------------------------------------------------------------------
// Normalized records (engine input)
// ---------------------------------------------------------------------------

/// Line-level diff summary for one commit. Identity is `sha`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitDiff {
  pub sha: String,
  #[serde(default)]
  pub author: Option<String>,
  #[serde(default)]
  pub date: Option<String>,
  #[serde(default)]
  pub additions: u64,
  #[serde(default)]
  pub deletions: u64,
  #[serde(default)]
  pub files: u64,
}

impl CommitDiff {
  pub fn churn(&self) -> u64 {
    self.additions.saturating_add(self.deletions)
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PullRequestState {
  Open,
  Closed,
}

impl PullRequestState {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Open => "open",
      Self::Closed => "closed",
    }
  }

  pub fn from_str_loose(s: &str) -> Option<Self> {
    match s.trim().to_ascii_lowercase().as_str() {
      "open" => Some(Self::Open),
      "closed" | "merged" => Some(Self::Closed),
      _ => None,
    }
  }
}

/// Pull request with the timestamps the engine needs. Timestamps stay raw
/// ISO-8601 strings; the engine parses them per record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequestRecord {
  pub number: u64,
  #[serde(default)]
  pub title: String,
  pub state: PullRequestState,
  #[serde(default)]
  pub created_at: Option<String>,
  #[serde(default)]
  pub closed_at: Option<String>,
  #[serde(default)]
  pub merged_at: Option<String>,
  #[serde(default)]
  pub author: Option<String>,
  #[serde(default)]
  pub additions: u64,
  #[serde(default)]
  pub deletions: u64,
  #[serde(default)]
  pub changed_files: u64,
  #[serde(default)]
  pub first_review_at: Option<String>,
}

/// Engine input as read by the `insight-engine` binary. Missing keys are empty.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct EngineInput {
  #[serde(default)]
  pub commit_diffs: Vec<CommitDiff>,
  #[serde(default)]
  pub pull_requests: Vec<PullRequestRecord>,
}

// ---------------------------------------------------------------------------
// Aggregates + output (JSON contract)
// ---------------------------------------------------------------------------

/// Per-author running totals over commit diffs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorAggregate {
  pub additions: u64,
  pub deletions: u64,
  pub files_changed: u64,
  pub commits: u64,
}

impl AuthorAggregate {
  pub fn record(&mut self, commit: &CommitDiff) {
    self.additions = self.additions.saturating_add(commit.additions);
    self.deletions = self.deletions.saturating_add(commit.deletions);
    self.files_changed = self.files_changed.saturating_add(commit.files);
    self.commits = self.commits.saturating_add(1);
  }

  pub fn churn(&self) -> u64 {
    self.additions.saturating_add(self.deletions)
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RiskFlag {
  Low,
  Medium,
  High,
}

impl RiskFlag {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Low => "Low",
      Self::Medium => "Medium",
      Self::High => "High",
    }
  }
}

/// The engine's single output. Every key is always present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsReport {
  pub spikes: Vec<CommitDiff>,
  pub total_additions: u64,
  pub total_deletions: u64,
  pub churn_score: u64,
  pub per_author_diffs: BTreeMap<String, AuthorAggregate>,
  pub pr_throughput_count: u64,
  pub avg_review_latency_hours: f64,
  pub avg_cycle_time_hours: f64,
  pub simulated_ci_failures: u64,
  pub change_failure_rate_percent: f64,
  pub defect_risk_flag: RiskFlag,
  pub dora_lead_time_for_changes_hours: f64,
  pub dora_deployment_frequency: u64,
  pub dora_change_failure_rate_percent: f64,
  pub dora_mttr_hours: f64,
}
