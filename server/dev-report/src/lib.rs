//! Dev report service
//!
//! Wires the insight engine to GitHub and an OpenAI-compatible chat endpoint,
//! and serves the `/dev-report` slash command over HTTP.
//! Bind to 127.0.0.1 by default (put a proxy in front for the chat platform).

pub mod chat;
pub mod config;
pub mod error;
pub mod github;
pub mod handlers;
pub mod signing;
pub mod state;
pub mod types;

use axum::{middleware, routing::get, routing::post, Router};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

pub use config::ReportArgs;
pub use error::ReportError;
pub use handlers::{dev_report, health};
pub use state::AppState;

pub fn router(state: Arc<AppState>) -> Router {
  Router::new()
    .route("/health", get(health))
    .route(
      "/dev-report",
      post(dev_report).route_layer(middleware::from_fn_with_state(Arc::clone(&state), signing::require_signature)),
    )
    .layer(CorsLayer::permissive())
    .with_state(state)
}
