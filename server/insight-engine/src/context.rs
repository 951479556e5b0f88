//! Analysis context threaded through the pipeline, and the deltas stages return.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::types::{CommitDiff, MetricsReport, PullRequestRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StageName {
  Harvest,
  Analyze,
  Narrate,
}

impl StageName {
  pub const ENTRY: StageName = StageName::Harvest;

  /// The only edge out of each stage; `None` at the terminal stage.
  pub fn next(self) -> Option<StageName> {
    match self {
      Self::Harvest => Some(Self::Analyze),
      Self::Analyze => Some(Self::Narrate),
      Self::Narrate => None,
    }
  }

  pub fn as_str(self) -> &'static str {
    match self {
      Self::Harvest => "harvest",
      Self::Analyze => "analyze",
      Self::Narrate => "narrate",
    }
  }
}

impl fmt::Display for StageName {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// State shared by the stages of one run. Absent keys read as empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisContext {
  #[serde(default)]
  pub commit_diff_data: Vec<CommitDiff>,
  #[serde(default)]
  pub pull_request_details: Vec<PullRequestRecord>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub analysis: Option<MetricsReport>,
  #[serde(default)]
  pub pr_data_for_chart: Vec<CommitDiff>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub summary: Option<String>,
  /// Keys contributed by stages beyond the canonical ones.
  #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
  pub extra: BTreeMap<String, serde_json::Value>,
}

impl AnalysisContext {
  /// New context with `delta` applied; keys the delta leaves unset are carried over.
  pub fn merge(&self, delta: ContextDelta) -> AnalysisContext {
    let mut next = self.clone();
    if let Some(v) = delta.commit_diff_data {
      next.commit_diff_data = v;
    }
    if let Some(v) = delta.pull_request_details {
      next.pull_request_details = v;
    }
    if let Some(v) = delta.analysis {
      next.analysis = Some(v);
    }
    if let Some(v) = delta.pr_data_for_chart {
      next.pr_data_for_chart = v;
    }
    if let Some(v) = delta.summary {
      next.summary = Some(v);
    }
    next.extra.extend(delta.extra);
    next
  }

  pub fn summary_or_default(&self) -> &str {
    self.summary.as_deref().unwrap_or("No summary generated.")
  }
}

/// What one stage contributes. `None` fields leave the context untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContextDelta {
  pub commit_diff_data: Option<Vec<CommitDiff>>,
  pub pull_request_details: Option<Vec<PullRequestRecord>>,
  pub analysis: Option<MetricsReport>,
  pub pr_data_for_chart: Option<Vec<CommitDiff>>,
  pub summary: Option<String>,
  pub extra: BTreeMap<String, serde_json::Value>,
}

impl ContextDelta {
  pub fn with_extra(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
    self.extra.insert(key.into(), value);
    self
  }
}
