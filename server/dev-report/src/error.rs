//! Errors for the report service and CLI.

use insight_engine::EngineError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReportError {
  #[error(transparent)]
  Engine(#[from] EngineError),

  #[error("http: {0}")]
  Http(#[from] reqwest::Error),

  #[error("io: {0}")]
  Io(#[from] std::io::Error),

  #[error("json: {0}")]
  Json(#[from] serde_json::Error),

  #[error("config: {field}: {reason}")]
  Config { field: String, reason: String },

  #[error("task: {0}")]
  Task(String),
}

impl ReportError {
  pub fn config(field: &str, reason: impl Into<String>) -> Self {
    Self::Config {
      field: field.to_string(),
      reason: reason.into(),
    }
  }
}
