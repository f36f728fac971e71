// src/pipeline.rs
//! End-to-end run: normalize → dedup → score → select, then hand the
//! selection to a summarizer and gate the returned draft.
//!
//! Everything is compiled and validated in [`Pipeline::new`]; nothing below
//! it can fail on configuration.

use async_trait::async_trait;
use serde::Serialize;

use crate::config::CuratorConfig;
use crate::dedup::Deduplicator;
use crate::error::CurateError;
use crate::ingest::normalize_documents;
use crate::ingest::types::{FetchResult, RawItem};
use crate::metrics::ensure_metrics_described;
use crate::profile::Profile;
use crate::quality::{QualityGate, ValidationReport};
use crate::relevance::RelevanceScorer;
use crate::select::{DiversitySelector, HandoffRecord, Selection};

/// External draft writer (an LLM in production, a stub in tests).
#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(&self, profile: &Profile, items: &[HandoffRecord]) -> anyhow::Result<String>;
    fn name(&self) -> &'static str;
}

/// What happened to the input on its way to the selection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CurateStats {
    pub documents: usize,
    pub feeds_failed: usize,
    pub entries_seen: usize,
    pub entries_skipped: usize,
    pub items: usize,
    pub unique: usize,
    pub candidates: usize,
    pub selected: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Curated {
    pub selection: Selection,
    pub stats: CurateStats,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunOutcome {
    pub selection: Selection,
    pub draft: String,
    pub report: ValidationReport,
    pub stats: CurateStats,
}

impl RunOutcome {
    /// A failing report becomes `CurateError::QualityGate`.
    pub fn into_result(self) -> Result<Self, CurateError> {
        if self.report.passed {
            Ok(self)
        } else {
            Err(CurateError::QualityGate(self.report))
        }
    }
}

#[derive(Debug)]
pub struct Pipeline {
    profile: Profile,
    dedup: Deduplicator,
    scorer: RelevanceScorer,
    selector: DiversitySelector,
    gate: QualityGate,
}

impl Pipeline {
    pub fn new(config: CuratorConfig, profile: Profile) -> Result<Self, CurateError> {
        ensure_metrics_described();

        let mut selection = config.selection;
        if let Some(n) = profile.target_size {
            selection.target_size = n;
        }
        let pipeline = Self {
            dedup: Deduplicator::new(config.dedup)?,
            scorer: RelevanceScorer::new(config.scoring)?,
            selector: DiversitySelector::new(selection)?,
            gate: QualityGate::new(profile.rules.clone())?,
            profile,
        };
        tracing::info!(
            target: "pipeline",
            mode = %pipeline.profile.mode,
            scoring_version = pipeline.scorer.version(),
            target_size = selection.target_size,
            per_source_cap = selection.per_source_cap,
            "pipeline ready"
        );
        Ok(pipeline)
    }

    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    /// Feed documents (or failure markers) → selection.
    pub fn curate(&self, documents: Vec<FetchResult>) -> Result<Curated, CurateError> {
        let total_docs = documents.len();
        let normalized = normalize_documents(documents);
        let stats = CurateStats {
            documents: total_docs,
            feeds_failed: normalized.feeds_failed,
            entries_seen: normalized.entries_seen,
            entries_skipped: normalized.skipped,
            ..CurateStats::default()
        };
        self.finish(normalized.items, stats)
    }

    /// Already-normalized items → selection.
    pub fn curate_items(&self, items: Vec<RawItem>) -> Result<Curated, CurateError> {
        let stats = CurateStats {
            entries_seen: items.len(),
            ..CurateStats::default()
        };
        self.finish(items, stats)
    }

    fn finish(&self, items: Vec<RawItem>, mut stats: CurateStats) -> Result<Curated, CurateError> {
        stats.items = items.len();

        let unique = self.dedup.dedup(items);
        stats.unique = unique.len();

        let scored = self.scorer.score_all(unique);
        stats.candidates = scored.iter().filter(|s| s.score() > 0.0).count();

        let selection = self.selector.select(scored);
        stats.selected = selection.len();

        if selection.is_empty() {
            tracing::warn!(
                target: "pipeline",
                entries = stats.entries_seen,
                unique = stats.unique,
                "nothing to select"
            );
            return Err(CurateError::EmptyResult {
                entries: stats.entries_seen,
                unique: stats.unique,
            });
        }

        tracing::info!(target: "pipeline", stats = ?stats, "curated");
        Ok(Curated { selection, stats })
    }

    pub fn validate(&self, draft: &str) -> ValidationReport {
        self.gate.evaluate(draft)
    }

    /// Curate, summarize, gate. The returned outcome may carry a failing report;
    /// use [`RunOutcome::into_result`] to turn that into an error.
    pub async fn run(
        &self,
        documents: Vec<FetchResult>,
        summarizer: &dyn Summarizer,
    ) -> Result<RunOutcome, CurateError> {
        let Curated { selection, stats } = self.curate(documents)?;

        let handoff = selection.handoff();
        let draft = summarizer
            .summarize(&self.profile, &handoff)
            .await
            .map_err(|e| CurateError::Collaborator(format!("{}: {e:#}", summarizer.name())))?;

        let report = self.validate(&draft);
        if !report.passed {
            tracing::warn!(target: "pipeline", summary = %report.summary(), "draft rejected");
        }
        Ok(RunOutcome {
            selection,
            draft,
            report,
            stats,
        })
    }
}
