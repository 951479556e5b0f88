//! HTTP handlers for the report service.

use axum::{extract::State, Form, Json};
use insight_engine::{AnalysisContext, ContextDelta};
use reqwest::blocking::Client;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use crate::config::ReportArgs;
use crate::error::ReportError;
use crate::state::AppState;
use crate::types::{SlashCommand, SlashResponse};

const LOG_TARGET: &str = "dev-report";
const DELIVERY_TIMEOUT: Duration = Duration::from_secs(30);

pub async fn health() -> &'static str {
  "ok"
}

/// `/dev-report`: generate a report for the requested repository.
///
/// With a `response_url` the command is acknowledged at once and the report is
/// posted there when ready; without one the report is the response.
pub async fn dev_report(State(state): State<Arc<AppState>>, Form(cmd): Form<SlashCommand>) -> Json<SlashResponse> {
  let request_id = Uuid::new_v4();

  let args = match cmd.repository() {
    Ok(Some((owner, repo))) => state.args.for_repository(owner, repo),
    Ok(None) => state.args.clone(),
    Err(e) => {
      log::info!(target: LOG_TARGET, "[{}] rejected command text: {}", request_id, e);
      return Json(SlashResponse::failure(e));
    }
  };
  log::info!(
    target: LOG_TARGET,
    "[{}] report for {}/{} requested by {} in {}",
    request_id,
    args.owner,
    args.repo,
    cmd.user_name,
    cmd.channel_id
  );

  let initial = AnalysisContext::default().merge(
    ContextDelta::default()
      .with_extra("request_id", request_id.to_string().into())
      .with_extra("requested_by", cmd.user_name.clone().into())
      .with_extra("channel_id", cmd.channel_id.clone().into()),
  );

  let response_url = cmd.response_url.trim().to_string();
  if response_url.is_empty() {
    // The pipeline blocks on HTTP; keep it off the async workers.
    let response = tokio::task::spawn_blocking(move || generate(request_id, &args, &initial))
      .await
      .unwrap_or_else(|e| SlashResponse::failure(ReportError::Task(e.to_string())));
    return Json(response);
  }

  let _ = tokio::task::spawn_blocking(move || {
    let response = generate(request_id, &args, &initial);
    if let Err(e) = post_response(&response_url, &response) {
      log::error!(target: LOG_TARGET, "[{}] could not deliver report: {}", request_id, e);
    }
  });
  Json(SlashResponse::acknowledgement())
}

/// Run the pipeline and turn the outcome into a reply. Blocking.
fn generate(request_id: Uuid, args: &ReportArgs, initial: &AnalysisContext) -> SlashResponse {
  let result = args
    .build_pipeline()
    .and_then(|pipeline| pipeline.run(initial).map_err(ReportError::from));
  match result {
    Ok(outcome) => {
      log::info!(
        target: LOG_TARGET,
        "[{}] report {} ready",
        request_id,
        outcome.report_digest.as_deref().unwrap_or("-")
      );
      SlashResponse::in_channel(outcome.summary())
    }
    Err(e) => {
      log::error!(target: LOG_TARGET, "[{}] report failed: {}", request_id, e);
      SlashResponse::failure(e)
    }
  }
}

/// Deliver a reply to the command's `response_url`. Blocking.
pub fn post_response(response_url: &str, response: &SlashResponse) -> Result<(), ReportError> {
  Client::builder()
    .timeout(DELIVERY_TIMEOUT)
    .build()?
    .post(response_url)
    .json(response)
    .send()?
    .error_for_status()?;
  Ok(())
}
