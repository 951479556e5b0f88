//! Metrics engine: commit diffs + pull requests -> MetricsReport.
//!
//! Pure and deterministic. Inputs are borrowed and never modified; empty
//! inputs produce a fully populated, zeroed report.

use std::collections::BTreeMap;

use crate::config::Config;
use crate::risk::{self, FailurePolicy, SimulatedFailureRate};
use crate::stats::{round2, RunningMean};
use crate::timestamp;
use crate::types::*;

const LOG_TARGET: &str = "metrics";

/// Author bucket for commits without a resolvable author.
pub const UNKNOWN_AUTHOR: &str = "unknown";

/// MTTR needs incident data we do not have.
const MTTR_PLACEHOLDER_HOURS: f64 = 0.0;

/// Computes reports. Holds only the (pluggable) CI failure policy.
pub struct MetricsEngine {
  failure_policy: Box<dyn FailurePolicy>,
}

impl MetricsEngine {
  pub fn new(config: &Config) -> Self {
    Self {
      failure_policy: Box::new(SimulatedFailureRate {
        ratio: config.failure_ratio,
      }),
    }
  }

  pub fn with_defaults() -> Self {
    Self::new(&Config::default())
  }

  /// Replace the simulated failure count with another source.
  pub fn with_failure_policy(mut self, policy: impl FailurePolicy + 'static) -> Self {
    self.failure_policy = Box::new(policy);
    self
  }

  pub fn compute(&self, commits: &[CommitDiff], pull_requests: &[PullRequestRecord]) -> MetricsReport {
    let churn = churn_and_spikes(commits);
    let per_author_diffs = per_author(commits);
    let timings = pull_request_timings(pull_requests);

    let avg_cycle_time_hours = round2(timings.cycle_time.mean_hours());
    let avg_review_latency_hours = round2(timings.review_latency.mean_hours());

    let total_commits = commits.len() as u64;
    let simulated_ci_failures = self.failure_policy.failures(total_commits);
    let change_failure_rate_percent =
      round2(risk::failure_rate_percent(simulated_ci_failures, total_commits));

    let defect_risk_flag = risk::defect_risk(churn.churn_score, churn.spikes.len());

    log::debug!(
      target: LOG_TARGET,
      "{} commits, {} pull requests: churn={} spikes={} merged={} cycle_samples={} review_samples={} risk={}",
      commits.len(),
      pull_requests.len(),
      churn.churn_score,
      churn.spikes.len(),
      timings.throughput,
      timings.cycle_time.count(),
      timings.review_latency.count(),
      defect_risk_flag.as_str()
    );

    MetricsReport {
      spikes: churn.spikes,
      total_additions: churn.total_additions,
      total_deletions: churn.total_deletions,
      churn_score: churn.churn_score,
      per_author_diffs,
      pr_throughput_count: timings.throughput,
      avg_review_latency_hours,
      avg_cycle_time_hours,
      simulated_ci_failures,
      change_failure_rate_percent,
      defect_risk_flag,
      dora_lead_time_for_changes_hours: avg_cycle_time_hours,
      dora_deployment_frequency: timings.throughput,
      dora_change_failure_rate_percent: change_failure_rate_percent,
      dora_mttr_hours: MTTR_PLACEHOLDER_HOURS,
    }
  }
}

/// Compute a report with the default failure policy.
pub fn compute(commits: &[CommitDiff], pull_requests: &[PullRequestRecord]) -> MetricsReport {
  MetricsEngine::with_defaults().compute(commits, pull_requests)
}

struct Churn {
  total_additions: u64,
  total_deletions: u64,
  churn_score: u64,
  spikes: Vec<CommitDiff>,
}

fn churn_and_spikes(commits: &[CommitDiff]) -> Churn {
  let total_additions = commits.iter().fold(0u64, |acc, c| acc.saturating_add(c.additions));
  let total_deletions = commits.iter().fold(0u64, |acc, c| acc.saturating_add(c.deletions));
  let spikes = commits
    .iter()
    .filter(|c| risk::is_spike(c.additions, c.deletions))
    .cloned()
    .collect();
  Churn {
    total_additions,
    total_deletions,
    churn_score: total_additions.saturating_add(total_deletions),
    spikes,
  }
}

/// Upsert each commit into its author's aggregate. Sorted by author.
fn per_author(commits: &[CommitDiff]) -> BTreeMap<String, AuthorAggregate> {
  let mut out: BTreeMap<String, AuthorAggregate> = BTreeMap::new();
  for commit in commits {
    let author = commit.author.as_deref().unwrap_or(UNKNOWN_AUTHOR);
    out.entry(author.to_string()).or_default().record(commit);
  }
  out
}

#[derive(Default)]
struct PullRequestTimings {
  throughput: u64,
  cycle_time: RunningMean,
  review_latency: RunningMean,
}

fn pull_request_timings(pull_requests: &[PullRequestRecord]) -> PullRequestTimings {
  let mut out = PullRequestTimings::default();

  for pr in pull_requests {
    let created = timestamp::parse_opt(pr.created_at.as_deref());

    // Throughput counts every merge, parseable or not.
    if let Some(merged_raw) = pr.merged_at.as_deref() {
      out.throughput += 1;
      match (created, timestamp::parse(merged_raw)) {
        (Some(created), Some(merged)) => out.cycle_time.push(timestamp::seconds_between(created, merged)),
        _ => log::debug!(target: LOG_TARGET, "PR #{}: unparseable created/merged time, skipped for cycle time", pr.number),
      }
    }

    let reviewed = timestamp::parse_opt(pr.first_review_at.as_deref());
    if let (Some(created), Some(reviewed)) = (created, reviewed) {
      let latency = timestamp::seconds_between(created, reviewed);
      // A review cannot precede creation.
      if latency >= 0.0 {
        out.review_latency.push(latency);
      }
    }
  }

  out
}

#[cfg(test)]
mod tests {
  use super::*;

  fn commit(sha: &str, author: Option<&str>, additions: u64, deletions: u64, files: u64) -> CommitDiff {
    CommitDiff {
      sha: sha.into(),
      author: author.map(Into::into),
      date: Some("2024-01-01T00:00:00Z".into()),
      additions,
      deletions,
      files,
    }
  }

  fn pr(number: u64, created: Option<&str>, merged: Option<&str>, review: Option<&str>) -> PullRequestRecord {
    PullRequestRecord {
      number,
      title: format!("PR {}", number),
      state: PullRequestState::Closed,
      created_at: created.map(Into::into),
      closed_at: merged.map(Into::into),
      merged_at: merged.map(Into::into),
      author: Some("alice".into()),
      additions: 0,
      deletions: 0,
      changed_files: 0,
      first_review_at: review.map(Into::into),
    }
  }

  #[test]
  fn churn_spikes_and_authors() {
    let commits = vec![
      commit("c1", Some("a"), 600, 0, 3),
      commit("c2", Some("b"), 10, 5, 1),
      commit("c3", Some("a"), 0, 0, 2),
    ];
    let report = compute(&commits, &[]);
    assert_eq!(report.total_additions, 610);
    assert_eq!(report.total_deletions, 5);
    assert_eq!(report.churn_score, 615);
    assert_eq!(report.spikes, vec![commits[0].clone()]);

    let a = report.per_author_diffs["a"];
    assert_eq!(
      a,
      AuthorAggregate {
        additions: 600,
        deletions: 0,
        files_changed: 5,
        commits: 2
      }
    );
    assert_eq!(report.per_author_diffs["b"].commits, 1);
    assert_eq!(report.defect_risk_flag, RiskFlag::Low);
  }

  #[test]
  fn huge_counts_saturate() {
    let commits = vec![
      commit("c1", Some("a"), u64::MAX, 1, u64::MAX),
      commit("c2", Some("a"), 7, u64::MAX, 1),
    ];
    let report = compute(&commits, &[]);
    assert_eq!(report.total_additions, u64::MAX);
    assert_eq!(report.total_deletions, u64::MAX);
    assert_eq!(report.churn_score, u64::MAX);
    assert_eq!(report.spikes.len(), 2);
    assert_eq!(report.defect_risk_flag, RiskFlag::High);

    let a = report.per_author_diffs["a"];
    assert_eq!(a.additions, u64::MAX);
    assert_eq!(a.files_changed, u64::MAX);
    assert_eq!(a.churn(), u64::MAX);
    assert_eq!(a.commits, 2);
    assert_eq!(commits[0].churn(), u64::MAX);
  }

  #[test]
  fn missing_author_is_unknown() {
    let commits = vec![commit("c1", None, 1, 1, 1), commit("c2", None, 2, 0, 1)];
    let report = compute(&commits, &[]);
    assert_eq!(report.per_author_diffs.len(), 1);
    assert_eq!(report.per_author_diffs[UNKNOWN_AUTHOR].commits, 2);
  }

  #[test]
  fn per_author_sums_match_totals() {
    let commits = vec![
      commit("c1", Some("x"), 12, 7, 1),
      commit("c2", Some("y"), 900, 40, 9),
      commit("c3", None, 3, 3, 1),
      commit("c4", Some("x"), 0, 88, 2),
    ];
    let report = compute(&commits, &[]);
    let adds: u64 = report.per_author_diffs.values().map(|a| a.additions).sum();
    let dels: u64 = report.per_author_diffs.values().map(|a| a.deletions).sum();
    assert_eq!(adds, report.total_additions);
    assert_eq!(dels, report.total_deletions);
  }

  #[test]
  fn spikes_keep_input_order() {
    let commits = vec![
      commit("c1", Some("a"), 0, 501, 1),
      commit("c2", Some("a"), 500, 0, 1),
      commit("c3", Some("a"), 300, 300, 1),
    ];
    let report = compute(&commits, &[]);
    let shas: Vec<&str> = report.spikes.iter().map(|c| c.sha.as_str()).collect();
    assert_eq!(shas, vec!["c1", "c3"]);
  }

  #[test]
  fn cycle_time_and_review_latency() {
    let prs = vec![pr(
      1,
      Some("2024-01-01T00:00:00Z"),
      Some("2024-01-02T00:00:00Z"),
      Some("2024-01-01T12:00:00Z"),
    )];
    let report = compute(&[], &prs);
    assert_eq!(report.pr_throughput_count, 1);
    assert_eq!(report.avg_cycle_time_hours, 24.0);
    assert_eq!(report.avg_review_latency_hours, 12.0);
    assert_eq!(report.dora_lead_time_for_changes_hours, 24.0);
    assert_eq!(report.dora_deployment_frequency, 1);
  }

  #[test]
  fn malformed_dates_still_count_toward_throughput() {
    let prs = vec![
      pr(1, Some("garbage"), Some("2024-01-02T00:00:00Z"), None),
      pr(2, None, Some("also garbage"), None),
      pr(3, Some("2024-01-01T00:00:00Z"), None, None),
    ];
    let report = compute(&[], &prs);
    assert_eq!(report.pr_throughput_count, 2);
    assert_eq!(report.avg_cycle_time_hours, 0.0);
  }

  #[test]
  fn review_before_creation_is_discarded() {
    let prs = vec![
      pr(1, Some("2024-01-01T10:00:00Z"), None, Some("2024-01-01T09:00:00Z")),
      pr(2, Some("2024-01-01T00:00:00Z"), None, Some("2024-01-01T06:00:00Z")),
    ];
    let report = compute(&[], &prs);
    assert_eq!(report.avg_review_latency_hours, 6.0);
    assert_eq!(report.pr_throughput_count, 0);
  }

  #[test]
  fn review_latency_on_a_rounding_tie() {
    // 450 s is exactly 0.125 h.
    let prs = vec![pr(1, Some("2024-01-01T00:00:00Z"), None, Some("2024-01-01T00:07:30Z"))];
    assert_eq!(compute(&[], &prs).avg_review_latency_hours, 0.12);

    let prs = vec![pr(1, Some("2024-01-01T00:00:00Z"), None, Some("2024-01-01T00:37:30Z"))];
    assert_eq!(compute(&[], &prs).avg_review_latency_hours, 0.62);
  }

  #[test]
  fn review_latency_ignores_merge_status() {
    let prs = vec![pr(7, Some("2024-01-01T00:00:00Z"), None, Some("2024-01-01T03:00:00Z"))];
    let report = compute(&[], &prs);
    assert_eq!(report.avg_review_latency_hours, 3.0);
  }

  #[test]
  fn empty_inputs_are_zeroed() {
    let report = compute(&[], &[]);
    assert!(report.spikes.is_empty());
    assert!(report.per_author_diffs.is_empty());
    assert_eq!(report.total_additions, 0);
    assert_eq!(report.total_deletions, 0);
    assert_eq!(report.churn_score, 0);
    assert_eq!(report.pr_throughput_count, 0);
    assert_eq!(report.avg_review_latency_hours, 0.0);
    assert_eq!(report.avg_cycle_time_hours, 0.0);
    assert_eq!(report.simulated_ci_failures, 0);
    assert_eq!(report.change_failure_rate_percent, 0.0);
    assert_eq!(report.defect_risk_flag, RiskFlag::Low);
    assert_eq!(report.dora_mttr_hours, 0.0);
  }

  #[test]
  fn simulated_failure_rate() {
    let commits: Vec<CommitDiff> = (0..15).map(|i| commit(&format!("c{}", i), Some("a"), 1, 1, 1)).collect();
    let report = compute(&commits, &[]);
    assert_eq!(report.simulated_ci_failures, 1);
    assert_eq!(report.change_failure_rate_percent, 6.67);
    assert_eq!(report.dora_change_failure_rate_percent, 6.67);
  }

  struct FixedFailures(u64);

  impl FailurePolicy for FixedFailures {
    fn failures(&self, total_commits: u64) -> u64 {
      self.0.min(total_commits)
    }
  }

  #[test]
  fn failure_policy_is_pluggable() {
    let engine = MetricsEngine::with_defaults().with_failure_policy(FixedFailures(2));
    let commits: Vec<CommitDiff> = (0..4).map(|i| commit(&format!("c{}", i), Some("a"), 1, 1, 1)).collect();
    let report = engine.compute(&commits, &[]);
    assert_eq!(report.simulated_ci_failures, 2);
    assert_eq!(report.change_failure_rate_percent, 50.0);
  }

  #[test]
  fn high_risk_needs_two_spikes() {
    let one_spike = vec![commit("c1", Some("a"), 2500, 0, 1)];
    assert_eq!(compute(&one_spike, &[]).defect_risk_flag, RiskFlag::Medium);

    let two_spikes = vec![commit("c1", Some("a"), 1200, 0, 1), commit("c2", Some("b"), 0, 900, 1)];
    assert_eq!(compute(&two_spikes, &[]).defect_risk_flag, RiskFlag::High);
  }

  #[test]
  fn inputs_are_untouched_and_output_is_stable() {
    let commits = vec![commit("c1", Some("a"), 700, 20, 4), commit("c2", Some("b"), 5, 5, 1)];
    let prs = vec![pr(1, Some("2024-01-01T00:00:00Z"), Some("2024-01-01T05:30:00Z"), None)];
    let before = (commits.clone(), prs.clone());

    let r1 = serde_json::to_vec(&compute(&commits, &prs)).unwrap();
    let r2 = serde_json::to_vec(&compute(&commits, &prs)).unwrap();
    assert_eq!(r1, r2);
    assert_eq!(before, (commits, prs));
  }
}
