//! Engineering insights engine: deterministic metrics over version-control activity.
//!
//! Harvests commits, pull requests and reviews from a [`RecordSource`],
//! computes churn, spikes, per-author stats, PR throughput, cycle time,
//! review latency, a simulated change-failure rate, a defect-risk flag and a
//! DORA-style view, then hands the report to a [`Narrator`].
//!
//! No DB, no network; HTTP-backed sources and narrators live in `dev-report`.

pub mod audit;
pub mod config;
pub mod context;
pub mod error;
pub mod metrics;
pub mod narrative;
pub mod normalize;
pub mod pipeline;
pub mod risk;
pub mod source;
pub mod stats;
pub mod timestamp;
pub mod types;

pub use config::Config;
pub use context::{AnalysisContext, ContextDelta, StageName};
pub use error::EngineError;
pub use metrics::MetricsEngine;
pub use narrative::{NarrativeRequest, Narrator, TemplateNarrator};
pub use pipeline::{Pipeline, PipelineOutcome, Stage};
pub use source::{RecordSource, StaticSource};
pub use types::{CommitDiff, EngineInput, MetricsReport, PullRequestRecord};
