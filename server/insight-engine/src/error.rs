//! Structured error types for the insight engine.

use thiserror::Error;

use crate::context::StageName;

#[derive(Debug, Error)]
pub enum EngineError {
  #[error("validation: {field}: {reason}")]
  Validation { field: String, reason: String },

  #[error("json: {0}")]
  Json(#[from] serde_json::Error),

  #[error("record source: {operation}: {message}")]
  Source { operation: String, message: String },

  #[error("narrator: {0}")]
  Narrator(String),

  /// A pipeline stage failed; the orchestrator never recovers from this.
  #[error("stage {stage}: {source}")]
  Stage {
    stage: StageName,
    #[source]
    source: Box<EngineError>,
  },
}

impl EngineError {
  pub fn validation(field: &str, reason: &str) -> Self {
    Self::Validation {
      field: field.to_string(),
      reason: reason.to_string(),
    }
  }

  pub fn record_source(operation: impl Into<String>, message: impl std::fmt::Display) -> Self {
    Self::Source {
      operation: operation.into(),
      message: message.to_string(),
    }
  }

  pub fn narrator(msg: impl std::fmt::Display) -> Self {
    Self::Narrator(msg.to_string())
  }

  pub fn in_stage(self, stage: StageName) -> Self {
    Self::Stage {
      stage,
      source: Box::new(self),
    }
  }

  /// Stage that failed, if this error came out of the pipeline.
  pub fn stage(&self) -> Option<StageName> {
    match self {
      Self::Stage { stage, .. } => Some(*stage),
      _ => None,
    }
  }
}
