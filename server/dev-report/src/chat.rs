//! OpenAI-compatible chat-completions endpoint as a narrator.

use insight_engine::{EngineError, NarrativeRequest, Narrator};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::ReportError;

const LOG_TARGET: &str = "chat";

pub const DEFAULT_API_BASE: &str = "https://openrouter.ai/api/v1";
pub const DEFAULT_MODEL: &str = "openai/gpt-4o-mini";
const TEMPERATURE: f32 = 0.7;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
  model: &'a str,
  temperature: f32,
  messages: Vec<ChatMessage>,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
  role: &'static str,
  content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
  #[serde(default)]
  choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
  message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
  #[serde(default)]
  content: Option<String>,
}

impl ChatResponse {
  fn into_content(self) -> Result<String, EngineError> {
    self
      .choices
      .into_iter()
      .next()
      .and_then(|c| c.message.content)
      .ok_or_else(|| EngineError::narrator("response has no message content"))
  }
}

#[derive(Debug, Clone)]
pub struct ChatNarrator {
  client: Client,
  api_base: String,
  api_key: String,
  model: String,
}

impl ChatNarrator {
  pub fn new(api_base: &str, api_key: &str, model: &str) -> Result<Self, ReportError> {
    if api_key.trim().is_empty() {
      return Err(ReportError::config("llm_api_key", "must not be empty"));
    }
    let client = Client::builder()
      .user_agent("dev-report")
      .timeout(REQUEST_TIMEOUT)
      .build()?;
    Ok(Self {
      client,
      api_base: api_base.trim_end_matches('/').to_string(),
      api_key: api_key.trim().to_string(),
      model: model.to_string(),
    })
  }

  fn body<'a>(&'a self, request: &NarrativeRequest) -> ChatRequest<'a> {
    ChatRequest {
      model: &self.model,
      temperature: TEMPERATURE,
      messages: vec![
        ChatMessage {
          role: "system",
          content: request.system_prompt(),
        },
        ChatMessage {
          role: "user",
          content: request.user_prompt(),
        },
      ],
    }
  }
}

impl Narrator for ChatNarrator {
  fn generate(&self, request: &NarrativeRequest) -> Result<String, EngineError> {
    let url = format!("{}/chat/completions", self.api_base);
    log::debug!(target: LOG_TARGET, "POST {} (model {})", url, self.model);
    let response: ChatResponse = self
      .client
      .post(&url)
      .bearer_auth(&self.api_key)
      .json(&self.body(request))
      .send()
      .and_then(|res| res.error_for_status())
      .and_then(|res| res.json())
      .map_err(EngineError::narrator)?;
    response.into_content()
  }
}
