//! Binary entrypoint: read one JSON object from stdin, write one to stdout.
//!
//! Input: `{"commit_diffs": [...], "pull_requests": [...]}` (either key may be absent).
//! Output: the MetricsReport.

use insight_engine::{EngineInput, MetricsEngine};
use std::io::{self, Read, Write};

fn main() {
  env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

  if let Err(e) = run_binary() {
    let _ = writeln!(io::stderr(), "insight-engine error: {}", e);
    std::process::exit(1);
  }
}

fn run_binary() -> Result<(), Box<dyn std::error::Error>> {
  let mut raw = String::new();
  io::stdin().lock().read_to_string(&mut raw)?;
  let input: EngineInput = if raw.trim().is_empty() {
    EngineInput::default()
  } else {
    serde_json::from_str(&raw)?
  };

  let report = MetricsEngine::with_defaults().compute(&input.commit_diffs, &input.pull_requests);
  let json = serde_json::to_vec(&report)?;
  let mut out = io::stdout().lock();
  out.write_all(&json)?;
  writeln!(out)?;
  Ok(())
}
