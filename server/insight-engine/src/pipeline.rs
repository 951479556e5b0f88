//! Linear harvest -> analyze -> narrate pipeline.
//!
//! Each stage reads the context produced so far and returns a delta; the
//! orchestrator merges it into a fresh context. Stage errors are tagged with
//! the stage name and returned as-is: no retry, no recovery.

use std::time::Instant;

use crate::audit;
use crate::config::Config;
use crate::context::{AnalysisContext, ContextDelta, StageName};
use crate::error::EngineError;
use crate::metrics::{self, MetricsEngine};
use crate::narrative::{self, NarrativeRequest, Narrator};
use crate::normalize;
use crate::source::RecordSource;
use crate::types::MetricsReport;

const LOG_TARGET: &str = "pipeline";

/// One step of the pipeline.
pub trait Stage {
  fn run(&self, ctx: &AnalysisContext) -> Result<ContextDelta, EngineError>;
}

// ---------------------------------------------------------------------------
// Harvest
// ---------------------------------------------------------------------------

/// Pulls raw records from a source and seeds `commit_diff_data` and
/// `pull_request_details`.
pub struct HarvestStage<S> {
  source: S,
  config: Config,
}

impl<S: RecordSource> HarvestStage<S> {
  pub fn new(source: S, config: Config) -> Self {
    Self { source, config }
  }
}

impl<S: RecordSource> Stage for HarvestStage<S> {
  fn run(&self, _ctx: &AnalysisContext) -> Result<ContextDelta, EngineError> {
    let repository = self.source.label();

    let summaries = self.source.commits()?;
    let mut commit_diffs = Vec::new();
    for summary in summaries.iter().take(self.config.commit_limit) {
      let sha = normalize::commit_sha(summary)?;
      let detail = self.source.commit_detail(sha)?;
      commit_diffs.push(normalize::commit_diff(sha, &detail));
    }
    audit::log_event(StageName::Harvest.as_str(), "harvest_commits", &repository, &commit_diffs);

    let listed = self
      .source
      .pull_requests(self.config.pull_request_state, self.config.pull_request_page_size)?;
    let mut pull_requests = Vec::with_capacity(listed.len());
    for raw in &listed {
      let reviews = self.source.reviews(raw.number)?;
      pull_requests.push(normalize::pull_request(raw, &reviews));
    }
    audit::log_event(StageName::Harvest.as_str(), "harvest_prs", &repository, &pull_requests);

    log::info!(
      target: LOG_TARGET,
      "Harvested {} commits and {} pull requests from {}",
      commit_diffs.len(),
      pull_requests.len(),
      repository
    );

    Ok(
      ContextDelta {
        commit_diff_data: Some(commit_diffs),
        pull_request_details: Some(pull_requests),
        ..ContextDelta::default()
      }
      .with_extra("repository", repository.into()),
    )
  }
}

// ---------------------------------------------------------------------------
// Analyze
// ---------------------------------------------------------------------------

/// Runs the metrics engine over whatever the harvest produced.
pub struct AnalyzeStage {
  engine: MetricsEngine,
}

impl AnalyzeStage {
  pub fn new(engine: MetricsEngine) -> Self {
    Self { engine }
  }
}

impl Stage for AnalyzeStage {
  fn run(&self, ctx: &AnalysisContext) -> Result<ContextDelta, EngineError> {
    let report = self
      .engine
      .compute(&ctx.commit_diff_data, &ctx.pull_request_details);
    audit::log_event(StageName::Analyze.as_str(), "analyze_metrics", ctx, &report);

    log::info!(
      target: LOG_TARGET,
      "Analysis: churn {}, {} spikes, {} merged PRs, defect risk {}",
      report.churn_score,
      report.spikes.len(),
      report.pr_throughput_count,
      report.defect_risk_flag.as_str()
    );

    Ok(ContextDelta {
      analysis: Some(report),
      pr_data_for_chart: Some(ctx.commit_diff_data.clone()),
      ..ContextDelta::default()
    })
  }
}

// ---------------------------------------------------------------------------
// Narrate
// ---------------------------------------------------------------------------

/// Turns the report into text. Narrator failures never fail the stage.
pub struct NarrateStage<N> {
  narrator: N,
  report_author_name: String,
  report_author_position: String,
}

impl<N: Narrator> NarrateStage<N> {
  pub fn new(narrator: N, config: &Config) -> Self {
    Self {
      narrator,
      report_author_name: config.report_author_name.clone(),
      report_author_position: config.report_author_position.clone(),
    }
  }
}

impl<N: Narrator> Stage for NarrateStage<N> {
  fn run(&self, ctx: &AnalysisContext) -> Result<ContextDelta, EngineError> {
    let report = match &ctx.analysis {
      Some(report) => report.clone(),
      None => metrics::compute(&[], &[]),
    };
    let request = NarrativeRequest::new(&report, &self.report_author_name, &self.report_author_position)?;

    let generated = self.narrator.generate(&request).and_then(|text| {
      if text.trim().is_empty() {
        Err(EngineError::narrator("empty response"))
      } else {
        Ok(text)
      }
    });
    let summary = match generated {
      Ok(text) => text,
      Err(e) => {
        log::warn!(target: LOG_TARGET, "Narrative generation failed, using raw metrics: {}", e);
        audit::log_event(StageName::Narrate.as_str(), "narrative_error", &request.metrics_json, &e.to_string());
        narrative::fallback_summary(&request.metrics_json, &e)
      }
    };

    audit::log_event(StageName::Narrate.as_str(), "generate_report", &report, &summary);
    Ok(ContextDelta {
      summary: Some(summary),
      ..ContextDelta::default()
    })
  }
}

// ---------------------------------------------------------------------------
// Orchestrator
// ---------------------------------------------------------------------------

/// Final state of a completed run.
#[derive(Debug, Clone)]
pub struct PipelineOutcome {
  pub context: AnalysisContext,
  /// Stages in the order they ran.
  pub stages: Vec<StageName>,
  /// Stable identifier of the report; equal reports share it.
  pub report_digest: Option<String>,
}

impl PipelineOutcome {
  pub fn summary(&self) -> &str {
    self.context.summary_or_default()
  }
}

pub struct Pipeline {
  harvest: Box<dyn Stage>,
  analyze: Box<dyn Stage>,
  narrate: Box<dyn Stage>,
}

impl Pipeline {
  pub fn new(harvest: impl Stage + 'static, analyze: impl Stage + 'static, narrate: impl Stage + 'static) -> Self {
    Self {
      harvest: Box::new(harvest),
      analyze: Box::new(analyze),
      narrate: Box::new(narrate),
    }
  }

  /// Standard wiring: harvest from `source`, default metrics engine, narrate with `narrator`.
  pub fn build<S, N>(source: S, narrator: N, config: &Config) -> Self
  where
    S: RecordSource + 'static,
    N: Narrator + 'static,
  {
    Self::new(
      HarvestStage::new(source, config.clone()),
      AnalyzeStage::new(MetricsEngine::new(config)),
      NarrateStage::new(narrator, config),
    )
  }

  fn stage(&self, name: StageName) -> &dyn Stage {
    match name {
      StageName::Harvest => self.harvest.as_ref(),
      StageName::Analyze => self.analyze.as_ref(),
      StageName::Narrate => self.narrate.as_ref(),
    }
  }

  /// Run every stage in order, starting from `initial`, which is left untouched.
  pub fn run(&self, initial: &AnalysisContext) -> Result<PipelineOutcome, EngineError> {
    let mut ctx = initial.clone();
    let mut stages = Vec::new();
    let mut current = Some(StageName::ENTRY);

    while let Some(name) = current {
      let start = Instant::now();
      log::debug!(target: LOG_TARGET, "Starting stage {}", name);
      let delta = self.stage(name).run(&ctx).map_err(|e| e.in_stage(name))?;
      ctx = ctx.merge(delta);
      stages.push(name);
      log::debug!(target: LOG_TARGET, "Finished stage {} in {:.3}s", name, start.elapsed().as_secs_f64());
      current = name.next();
    }

    let report_digest = ctx.analysis.as_ref().map(report_digest).transpose()?;
    Ok(PipelineOutcome {
      context: ctx,
      stages,
      report_digest,
    })
  }
}

/// Stable report id: blake3 over the serialized report.
pub fn report_digest(report: &MetricsReport) -> Result<String, EngineError> {
  let bytes = serde_json::to_vec(report)?;
  let hex = blake3::hash(&bytes).to_hex();
  Ok(format!("rpt-{}", &hex[..16]))
}
