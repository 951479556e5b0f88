//! Pipeline configuration with sane defaults.

use crate::types::PullRequestState;

/// Tunables for one pipeline run.
///
/// Metric thresholds (spike size, churn gates) are fixed constants in
/// [`crate::risk`] and deliberately absent here.
#[derive(Debug, Clone)]
pub struct Config {
  /// Max commits taken from the head of the commit listing.
  pub commit_limit: usize,
  /// Page size requested when listing pull requests.
  pub pull_request_page_size: u32,
  /// Which pull requests to list (closed ones carry merge data).
  pub pull_request_state: PullRequestState,
  /// Share of commits counted as simulated CI failures (0..1).
  pub failure_ratio: f64,
  /// Signature line of the narrative report.
  pub report_author_name: String,
  pub report_author_position: String,
}

impl Default for Config {
  fn default() -> Self {
    Self {
      commit_limit: 10,
      pull_request_page_size: 10,
      pull_request_state: PullRequestState::Closed,
      failure_ratio: 0.10,
      report_author_name: "Engineering Team".into(),
      report_author_position: "Engineering Analyst".into(),
    }
  }
}
