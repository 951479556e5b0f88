//! Audit trail of what each agent saw and produced.
//!
//! Events go to the `audit` log target at debug level, as one JSON line each.
//! Serialization is skipped unless that target is enabled.

use serde::Serialize;

pub const AUDIT_TARGET: &str = "audit";

#[derive(Serialize)]
struct AuditEvent<'a, I: Serialize, O: Serialize> {
  agent: &'a str,
  action: &'a str,
  input: &'a I,
  output: &'a O,
}

/// Record one agent action. Never fails; a serialization error is logged instead.
pub fn log_event<I: Serialize, O: Serialize>(agent: &str, action: &str, input: &I, output: &O) {
  if !log::log_enabled!(target: AUDIT_TARGET, log::Level::Debug) {
    return;
  }
  let event = AuditEvent {
    agent,
    action,
    input,
    output,
  };
  match serde_json::to_string(&event) {
    Ok(line) => log::debug!(target: AUDIT_TARGET, "{}", line),
    Err(e) => log::warn!(target: AUDIT_TARGET, "failed to log event {}/{}: {}", agent, action, e),
  }
}
