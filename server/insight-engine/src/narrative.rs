//! Narrative boundary: what a narrator is given, and what happens when it fails.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::error::EngineError;
use crate::types::{AuthorAggregate, MetricsReport};

/// Label used when the report has no authors.
pub const NO_AUTHOR_LABEL: &str = "our team";

/// Everything a narrator needs to write the report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NarrativeRequest {
  pub report: MetricsReport,
  /// Pretty-printed `report`.
  pub metrics_json: String,
  pub most_churn_author: String,
  pub report_author_name: String,
  pub report_author_position: String,
}

impl NarrativeRequest {
  pub fn new(
    report: &MetricsReport,
    report_author_name: &str,
    report_author_position: &str,
  ) -> Result<Self, EngineError> {
    Ok(Self {
      report: report.clone(),
      metrics_json: serde_json::to_string_pretty(report)?,
      most_churn_author: most_churn_author(&report.per_author_diffs),
      report_author_name: report_author_name.to_string(),
      report_author_position: report_author_position.to_string(),
    })
  }

  pub fn system_prompt(&self) -> String {
    format!(
      "You are an expert engineering productivity analyst. Analyze the development metrics \
       below and write a concise, actionable report for engineering leadership. Focus on DORA \
       metrics, code churn and identified risks. Be clear and professional and highlight the key \
       takeaways.\n\nMetrics (JSON): {}",
      self.metrics_json
    )
  }

  pub fn user_prompt(&self) -> String {
    format!(
      "Write the weekly engineering productivity report for these metrics. Highlight the DORA \
       metrics, significant churn and any defect risk. Keep it under 200 words.\n\n\
       End the report with this closing paragraph:\n\
       \"In conclusion, there is room for improvement in deployment frequency and lead time. \
       Managing code churn, especially by {}, should be a priority to keep the code maintainable \
       and readable.\n\
       Best Regards,\n{}\n{}\"",
      self.most_churn_author, self.report_author_name, self.report_author_position
    )
  }
}

/// Produces the summary text. May call out to a language model.
pub trait Narrator {
  fn generate(&self, request: &NarrativeRequest) -> Result<String, EngineError>;
}

/// Author with the largest additions + deletions.
///
/// Ties go to the first maximum in map order, i.e. the alphabetically smallest name.
pub fn most_churn_author(per_author: &BTreeMap<String, AuthorAggregate>) -> String {
  let mut best: Option<(&str, u64)> = None;
  for (author, agg) in per_author {
    let churn = agg.churn();
    if best.map_or(true, |(_, top)| churn > top) {
      best = Some((author.as_str(), churn));
    }
  }
  best
    .map(|(author, _)| author.to_string())
    .unwrap_or_else(|| NO_AUTHOR_LABEL.to_string())
}

/// Degraded summary used when the narrator fails.
pub fn fallback_summary(metrics_json: &str, error: &EngineError) -> String {
  format!(
    "Error generating AI insights: {}. Raw analysis: {}",
    error, metrics_json
  )
}

/// Offline narrator: fixed wording filled in from the report.
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateNarrator;

impl TemplateNarrator {
  pub fn render(request: &NarrativeRequest) -> String {
    let report = &request.report;
    let mut lines = vec![
      "Weekly engineering productivity report".to_string(),
      String::new(),
      format!(
        "DORA: lead time {:.2}h, deployment frequency {}, change failure rate {:.2}%, MTTR {:.2}h.",
        report.dora_lead_time_for_changes_hours,
        report.dora_deployment_frequency,
        report.dora_change_failure_rate_percent,
        report.dora_mttr_hours
      ),
      format!(
        "Reviews: first review after {:.2}h on average; merged PRs took {:.2}h from open to merge.",
        report.avg_review_latency_hours, report.avg_cycle_time_hours
      ),
      format!(
        "Churn: +{} / -{} lines (score {}) across {} authors, {} spike commit(s). Defect risk: {}.",
        report.total_additions,
        report.total_deletions,
        report.churn_score,
        report.per_author_diffs.len(),
        report.spikes.len(),
        report.defect_risk_flag.as_str()
      ),
    ];
    lines.extend(report.spikes.iter().map(|spike| {
      let short: String = spike.sha.chars().take(7).collect();
      format!("  - {} changed {} lines", short, spike.churn())
    }));
    lines.push(String::new());
    lines.push(format!(
      "In conclusion, there is room for improvement in deployment frequency and lead time. \
       Managing code churn, especially by {}, should be a priority to keep the code maintainable \
       and readable.",
      request.most_churn_author
    ));
    lines.push("Best Regards,".to_string());
    lines.push(request.report_author_name.clone());
    lines.push(request.report_author_position.clone());
    lines.join("\n")
  }
}

impl Narrator for TemplateNarrator {
  fn generate(&self, request: &NarrativeRequest) -> Result<String, EngineError> {
    Ok(Self::render(request))
  }
}
