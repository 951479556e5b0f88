//! Slash-command request/response types.

use serde::{Deserialize, Serialize};

use crate::error::ReportError;

/// Form payload of a slash command. Unknown fields are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SlashCommand {
  #[serde(default)]
  pub command: String,
  /// Free text after the command; `owner/repo` selects the repository.
  #[serde(default)]
  pub text: String,
  #[serde(default)]
  pub user_id: String,
  #[serde(default)]
  pub user_name: String,
  #[serde(default)]
  pub channel_id: String,
  /// Where the finished report is posted. Empty means answer in the response itself.
  #[serde(default)]
  pub response_url: String,
}

impl SlashCommand {
  /// Repository requested in `text`, if any.
  pub fn repository(&self) -> Result<Option<(String, String)>, ReportError> {
    let text = self.text.trim();
    if text.is_empty() {
      return Ok(None);
    }
    let valid = |s: &str| {
      !s.is_empty()
        && s
          .chars()
          .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
    };
    match text.split_once('/') {
      Some((owner, repo)) if valid(owner) && valid(repo) => Ok(Some((owner.to_string(), repo.to_string()))),
      _ => Err(ReportError::config("text", format!("expected owner/repo, got '{}'", text))),
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseType {
  InChannel,
  Ephemeral,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlashResponse {
  pub response_type: ResponseType,
  pub text: String,
}

impl SlashResponse {
  pub fn in_channel(text: impl Into<String>) -> Self {
    Self {
      response_type: ResponseType::InChannel,
      text: text.into(),
    }
  }

  /// Immediate reply while the report is generated in the background.
  pub fn acknowledgement() -> Self {
    Self {
      response_type: ResponseType::Ephemeral,
      text: "Generating your dev report...".to_string(),
    }
  }

  pub fn failure(error: impl std::fmt::Display) -> Self {
    Self {
      response_type: ResponseType::Ephemeral,
      text: format!("Sorry, I couldn't generate the report: {}", error),
    }
  }
}
