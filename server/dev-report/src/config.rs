//! Run configuration: command-line flags with environment fallbacks.

use clap::Args;
use insight_engine::{Config, Pipeline, TemplateNarrator};

use crate::chat::{self, ChatNarrator};
use crate::error::ReportError;
use crate::github::{self, GithubSource};

const LOG_TARGET: &str = "config";

/// Which repository to report on, and how to reach GitHub and the language model.
#[derive(Debug, Clone, Args)]
pub struct ReportArgs {
  /// Repository owner (user or organization).
  #[arg(long, global = true, env = "GITHUB_OWNER", default_value = "octocat")]
  pub owner: String,

  #[arg(long, global = true, env = "GITHUB_REPO", default_value = "Hello-World")]
  pub repo: String,

  #[arg(long, global = true, env = "GITHUB_TOKEN", hide_env_values = true)]
  pub github_token: Option<String>,

  #[arg(long, global = true, env = "GITHUB_API_URL", default_value = github::DEFAULT_API_URL)]
  pub github_api_url: String,

  /// Chat-completions key. Without one the offline template narrator is used.
  #[arg(long, global = true, env = "OPENROUTER_API_KEY", hide_env_values = true)]
  pub llm_api_key: Option<String>,

  #[arg(long, global = true, env = "OPENROUTER_API_BASE", default_value = chat::DEFAULT_API_BASE)]
  pub llm_api_base: String,

  #[arg(long, global = true, env = "OPENROUTER_MODEL_NAME", default_value = chat::DEFAULT_MODEL)]
  pub llm_model: String,

  /// Chat-platform signing secret; slash-command requests must carry a valid signature.
  #[arg(long, global = true, env = "SLACK_SIGNING_SECRET", hide_env_values = true)]
  pub signing_secret: Option<String>,

  /// Name signing the report; defaults to the repository owner.
  #[arg(long, global = true, env = "REPORT_AUTHOR_NAME")]
  pub author_name: Option<String>,

  #[arg(long, global = true, env = "REPORT_AUTHOR_POSITION", default_value = "Engineering Analyst")]
  pub author_position: String,

  /// Most recent commits to analyze.
  #[arg(long, global = true, default_value_t = 10)]
  pub commit_limit: usize,

  /// Closed pull requests to analyze.
  #[arg(long, global = true, default_value_t = 10)]
  pub pr_page_size: u32,
}

impl ReportArgs {
  /// Same settings, different repository.
  pub fn for_repository(&self, owner: String, repo: String) -> Self {
    Self {
      owner,
      repo,
      ..self.clone()
    }
  }

  pub fn engine_config(&self) -> Config {
    Config {
      commit_limit: self.commit_limit,
      pull_request_page_size: self.pr_page_size,
      report_author_name: self
        .author_name
        .clone()
        .filter(|n| !n.trim().is_empty())
        .unwrap_or_else(|| self.owner.clone()),
      report_author_position: self.author_position.clone(),
      ..Config::default()
    }
  }

  /// GitHub-backed pipeline with the chat narrator, or the template narrator without a key.
  pub fn build_pipeline(&self) -> Result<Pipeline, ReportError> {
    let config = self.engine_config();
    let source = GithubSource::new(
      &self.owner,
      &self.repo,
      self.github_token.as_deref(),
      &self.github_api_url,
    )?;

    match self.llm_api_key.as_deref().map(str::trim).filter(|k| !k.is_empty()) {
      Some(key) => {
        let narrator = ChatNarrator::new(&self.llm_api_base, key, &self.llm_model)?;
        Ok(Pipeline::build(source, narrator, &config))
      }
      None => {
        log::warn!(target: LOG_TARGET, "No language model key configured; using the template narrator");
        Ok(Pipeline::build(source, TemplateNarrator, &config))
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use clap::Parser;

  #[derive(Debug, Parser)]
  struct TestCli {
    #[command(flatten)]
    args: ReportArgs,
  }

  fn parse(argv: &[&str]) -> ReportArgs {
    let mut full = vec!["dev-report"];
    full.extend_from_slice(argv);
    TestCli::try_parse_from(full).unwrap().args
  }

  #[test]
  fn flags_override_defaults() {
    let args = parse(&["--owner", "rust-lang", "--repo", "cargo", "--commit-limit", "25", "--pr-page-size", "5"]);
    assert_eq!(args.owner, "rust-lang");
    assert_eq!(args.repo, "cargo");
    let config = args.engine_config();
    assert_eq!(config.commit_limit, 25);
    assert_eq!(config.pull_request_page_size, 5);
    assert_eq!(config.report_author_name, "rust-lang");
    assert_eq!(config.failure_ratio, Config::default().failure_ratio);
  }

  #[test]
  fn explicit_author_name_wins() {
    let args = parse(&["--owner", "o", "--author-name", "Jo Doe", "--author-position", "CTO"]);
    let config = args.engine_config();
    assert_eq!(config.report_author_name, "Jo Doe");
    assert_eq!(config.report_author_position, "CTO");
  }

  #[test]
  fn signing_secret_is_optional() {
    assert!(parse(&[]).signing_secret.is_none());
    let args = parse(&["--signing-secret", "s3cret"]);
    assert_eq!(args.signing_secret.as_deref(), Some("s3cret"));
  }

  #[test]
  fn for_repository_keeps_other_settings() {
    let args = parse(&["--owner", "o", "--repo", "r", "--commit-limit", "3"]);
    let other = args.for_repository("x".into(), "y".into());
    assert_eq!((other.owner.as_str(), other.repo.as_str()), ("x", "y"));
    assert_eq!(other.commit_limit, 3);
  }

  #[test]
  fn pipeline_builds_with_and_without_key() {
    let args = parse(&["--owner", "o", "--repo", "r", "--github-token", "t"]);
    assert!(args.build_pipeline().is_ok());
    let args = parse(&["--owner", "o", "--repo", "r", "--llm-api-key", "sk-test"]);
    assert!(args.build_pipeline().is_ok());
  }
}
