// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod config;
pub mod dedup;
pub mod error;
pub mod ingest;
pub mod metrics;
pub mod pipeline;
pub mod profile;
pub mod quality;
pub mod relevance;
pub mod render;
pub mod select;
pub mod sources;

// ---- Re-exports for stable public API ----
pub use crate::config::CuratorConfig;
pub use crate::dedup::{CanonicalItem, DedupStrategy, Deduplicator};
pub use crate::error::CurateError;
pub use crate::ingest::collect_documents;
pub use crate::ingest::health::{FeedHealth, FeedStatus, HealthReport};
pub use crate::ingest::types::{FeedDocument, FeedFetcher, FetchResult, RawEntry, RawItem};
pub use crate::pipeline::{CurateStats, Curated, Pipeline, RunOutcome, Summarizer};
pub use crate::profile::{Profile, RunMode, Template};
pub use crate::quality::{QualityGate, QualityRules, ValidationReport, Violation};
pub use crate::relevance::{RelevanceScorer, ScoredItem, ScoringConfig};
pub use crate::render::{assemble_issue, render_issue, RenderedIssue, SlackRenderer};
pub use crate::select::{DiversitySelector, HandoffRecord, Selection, SelectionConfig};
pub use crate::sources::{Category, FeedSource, SourceRegistry};
