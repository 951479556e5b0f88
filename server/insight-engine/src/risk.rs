//! Spike threshold, defect-risk heuristic, and the simulated CI failure policy.

use crate::types::RiskFlag;

/// A commit whose additions + deletions exceed this is a spike.
pub const SPIKE_THRESHOLD: u64 = 500;

pub const MEDIUM_RISK_CHURN: u64 = 1000;
pub const MEDIUM_RISK_SPIKES: usize = 1;
pub const HIGH_RISK_CHURN: u64 = 2000;
pub const HIGH_RISK_SPIKES: usize = 2;

pub fn is_spike(additions: u64, deletions: u64) -> bool {
  additions.saturating_add(deletions) > SPIKE_THRESHOLD
}

/// Churn magnitude + spike count -> ordinal risk. Later gates override earlier ones.
pub fn defect_risk(churn_score: u64, spike_count: usize) -> RiskFlag {
  let mut flag = RiskFlag::Low;
  if churn_score > MEDIUM_RISK_CHURN && spike_count >= MEDIUM_RISK_SPIKES {
    flag = RiskFlag::Medium;
  }
  if churn_score > HIGH_RISK_CHURN && spike_count >= HIGH_RISK_SPIKES {
    flag = RiskFlag::High;
  }
  flag
}

/// Source of the CI failure count. Stands in for a real CI signal.
pub trait FailurePolicy: Send + Sync {
  /// Failed changes among `total_commits`. Must be 0 when there are no commits.
  fn failures(&self, total_commits: u64) -> u64;
}

/// Treats a fixed share of commits as failed: `floor(ratio * total)`.
#[derive(Debug, Clone, Copy)]
pub struct SimulatedFailureRate {
  pub ratio: f64,
}

impl Default for SimulatedFailureRate {
  fn default() -> Self {
    Self { ratio: 0.10 }
  }
}

impl FailurePolicy for SimulatedFailureRate {
  fn failures(&self, total_commits: u64) -> u64 {
    if total_commits == 0 {
      return 0;
    }
    (total_commits as f64 * self.ratio.clamp(0.0, 1.0)).floor() as u64
  }
}

/// `failures / total * 100`, or 0 with no commits.
pub fn failure_rate_percent(failures: u64, total_commits: u64) -> f64 {
  if total_commits == 0 {
    return 0.0;
  }
  failures as f64 / total_commits as f64 * 100.0
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn spike_is_strictly_above_threshold() {
    assert!(!is_spike(500, 0));
    assert!(!is_spike(250, 250));
    assert!(is_spike(501, 0));
    assert!(is_spike(0, 501));
    assert!(is_spike(u64::MAX, u64::MAX));
  }

  #[test]
  fn risk_gates() {
    assert_eq!(defect_risk(0, 0), RiskFlag::Low);
    assert_eq!(defect_risk(5000, 0), RiskFlag::Low);
    assert_eq!(defect_risk(1000, 1), RiskFlag::Low);
    assert_eq!(defect_risk(1001, 1), RiskFlag::Medium);
    assert_eq!(defect_risk(2500, 1), RiskFlag::Medium);
    assert_eq!(defect_risk(2000, 2), RiskFlag::Medium);
    assert_eq!(defect_risk(2001, 2), RiskFlag::High);
  }

  #[test]
  fn risk_is_monotonic() {
    let churns = [0, 500, 1000, 1001, 1500, 2000, 2001, 10_000];
    for spikes in 0..4usize {
      for pair in churns.windows(2) {
        assert!(defect_risk(pair[0], spikes) <= defect_risk(pair[1], spikes));
      }
    }
    for &churn in &churns {
      for spikes in 0..3usize {
        assert!(defect_risk(churn, spikes) <= defect_risk(churn, spikes + 1));
      }
    }
  }

  #[test]
  fn simulated_failures_floor() {
    let policy = SimulatedFailureRate::default();
    assert_eq!(policy.failures(0), 0);
    assert_eq!(policy.failures(3), 0);
    assert_eq!(policy.failures(10), 1);
    assert_eq!(policy.failures(29), 2);
    assert_eq!(policy.failures(30), 3);
  }

  #[test]
  fn failure_rate_handles_zero_commits() {
    assert_eq!(failure_rate_percent(0, 0), 0.0);
    assert_eq!(failure_rate_percent(1, 10), 10.0);
  }
}
