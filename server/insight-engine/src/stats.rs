//! Running averages over elapsed-time samples.

const SECONDS_PER_HOUR: f64 = 3600.0;

/// Sum + count of elapsed-time samples, in seconds.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RunningMean {
  sum_seconds: f64,
  count: u64,
}

impl RunningMean {
  pub fn push(&mut self, seconds: f64) {
    self.sum_seconds += seconds;
    self.count += 1;
  }

  pub fn count(&self) -> u64 {
    self.count
  }

  /// Mean of the samples in hours, or 0 when there are none.
  pub fn mean_hours(&self) -> f64 {
    if self.count == 0 {
      return 0.0;
    }
    self.sum_seconds / self.count as f64 / SECONDS_PER_HOUR
  }
}

/// Round to 2 decimal places, ties to even.
pub fn round2(x: f64) -> f64 {
  (x * 100.0).round_ties_even() / 100.0
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn empty_mean_is_zero() {
    let mean = RunningMean::default();
    assert_eq!(mean.count(), 0);
    assert_eq!(mean.mean_hours(), 0.0);
  }

  #[test]
  fn mean_in_hours() {
    let mut mean = RunningMean::default();
    mean.push(3600.0);
    mean.push(10_800.0);
    assert_eq!(mean.count(), 2);
    assert_eq!(mean.mean_hours(), 2.0);
  }

  #[test]
  fn round2_basics() {
    assert_eq!(round2(13.333333333333334), 13.33);
    assert_eq!(round2(2.0 / 3.0), 0.67);
    assert_eq!(round2(0.0), 0.0);
    assert_eq!(round2(-1.234), -1.23);
  }

  #[test]
  fn round2_ties_go_to_even() {
    assert_eq!(round2(0.125), 0.12);
    assert_eq!(round2(0.625), 0.62);
    assert_eq!(round2(0.375), 0.38);
  }
}
