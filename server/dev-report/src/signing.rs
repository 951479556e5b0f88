//! Request signing for slash-command payloads.
//!
//! The chat platform signs `v0:{timestamp}:{body}` with HMAC-SHA256 under the
//! app's signing secret and sends `v0=<hex>` in `X-Slack-Signature`.

use axum::body::{to_bytes, Body};
use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::sync::Arc;
use thiserror::Error;

use crate::state::AppState;

const LOG_TARGET: &str = "signing";

pub const SIGNATURE_HEADER: &str = "x-slack-signature";
pub const TIMESTAMP_HEADER: &str = "x-slack-request-timestamp";
const VERSION: &str = "v0";

/// Requests older (or newer) than this are rejected as replays.
pub const MAX_SKEW_SECS: i64 = 5 * 60;
const MAX_BODY_BYTES: usize = 64 * 1024;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SignatureError {
  #[error("missing header {0}")]
  MissingHeader(&'static str),

  #[error("malformed request timestamp")]
  BadTimestamp,

  #[error("request timestamp outside the allowed window")]
  StaleTimestamp,

  #[error("signature mismatch")]
  Mismatch,

  #[error("unusable signing secret")]
  Key,
}

fn mac(secret: &str, timestamp: i64, body: &[u8]) -> Result<HmacSha256, SignatureError> {
  let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).map_err(|_| SignatureError::Key)?;
  mac.update(format!("{}:{}:", VERSION, timestamp).as_bytes());
  mac.update(body);
  Ok(mac)
}

/// `v0=<hex>` signature of `body` sent at `timestamp`.
pub fn sign(secret: &str, timestamp: i64, body: &[u8]) -> Result<String, SignatureError> {
  let tag = mac(secret, timestamp, body)?.finalize().into_bytes();
  Ok(format!("{}={}", VERSION, hex::encode(tag)))
}

/// Check header values against `body`. `now` is unix seconds.
pub fn verify(
  secret: &str,
  timestamp: Option<&str>,
  signature: Option<&str>,
  body: &[u8],
  now: i64,
) -> Result<(), SignatureError> {
  let timestamp: i64 = timestamp
    .ok_or(SignatureError::MissingHeader(TIMESTAMP_HEADER))?
    .trim()
    .parse()
    .map_err(|_| SignatureError::BadTimestamp)?;
  if (now - timestamp).abs() > MAX_SKEW_SECS {
    return Err(SignatureError::StaleTimestamp);
  }

  let signature = signature.ok_or(SignatureError::MissingHeader(SIGNATURE_HEADER))?;
  let tag = signature
    .trim()
    .strip_prefix("v0=")
    .and_then(|hex_tag| hex::decode(hex_tag).ok())
    .ok_or(SignatureError::Mismatch)?;
  mac(secret, timestamp, body)?
    .verify_slice(&tag)
    .map_err(|_| SignatureError::Mismatch)
}

/// Middleware: reject unsigned or badly signed requests when a secret is configured.
pub async fn require_signature(State(state): State<Arc<AppState>>, request: Request, next: Next) -> Response {
  let Some(secret) = state.args.signing_secret.as_deref().filter(|s| !s.is_empty()) else {
    return next.run(request).await;
  };

  let (parts, body) = request.into_parts();
  let bytes = match to_bytes(body, MAX_BODY_BYTES).await {
    Ok(bytes) => bytes,
    Err(e) => {
      log::warn!(target: LOG_TARGET, "unreadable request body: {}", e);
      return StatusCode::BAD_REQUEST.into_response();
    }
  };

  let header = |name: &str| parts.headers.get(name).and_then(|v| v.to_str().ok());
  let checked = verify(
    secret,
    header(TIMESTAMP_HEADER),
    header(SIGNATURE_HEADER),
    &bytes,
    chrono::Utc::now().timestamp(),
  );
  if let Err(e) = checked {
    log::warn!(target: LOG_TARGET, "rejected {} {}: {}", parts.method, parts.uri, e);
    return (StatusCode::UNAUTHORIZED, e.to_string()).into_response();
  }

  next.run(Request::from_parts(parts, Body::from(bytes))).await
}
