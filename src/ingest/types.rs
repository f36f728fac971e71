// src/ingest/types.rs
use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::sources::FeedSource;

/// A feed entry exactly as a provider handed it over. Any field may be missing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawEntry {
    pub title: Option<String>,
    pub link: Option<String>,
    pub summary: Option<String>,
    pub published: Option<String>, // RFC 2822 or RFC 3339, unparsed
}

/// Uniform item produced by the normalizer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawItem {
    pub title: String,
    pub link: Option<Url>,
    pub summary: String,
    pub published_at: Option<DateTime<Utc>>, // None = unknown, sorts last
    pub source: FeedSource,
}

/// Entries retrieved for one source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedDocument {
    pub source: FeedSource,
    pub entries: Vec<RawEntry>,
}

/// Outcome of retrieving one source; failures are markers, not errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchResult {
    Document(FeedDocument),
    Failed { source: FeedSource, reason: String },
}

impl FetchResult {
    pub fn source(&self) -> &FeedSource {
        match self {
            FetchResult::Document(d) => &d.source,
            FetchResult::Failed { source, .. } => source,
        }
    }
}

/// Retrieval seam. Implementations return the raw feed body for a source.
#[async_trait::async_trait]
pub trait FeedFetcher: Send + Sync {
    async fn fetch(&self, source: &FeedSource) -> Result<String>;
    fn name(&self) -> &'static str;
}
