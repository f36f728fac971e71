// src/ingest/providers/local.rs
//! Fetchers over documents that were retrieved ahead of time.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::PathBuf;

use crate::ingest::types::FeedFetcher;
use crate::sources::FeedSource;

/// Reads `<dir>/<source-slug>.{xml,rss,atom}`.
pub struct DirFetcher {
    dir: PathBuf,
}

impl DirFetcher {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

#[async_trait]
impl FeedFetcher for DirFetcher {
    async fn fetch(&self, source: &FeedSource) -> Result<String> {
        let slug = source.slug();
        for ext in ["xml", "rss", "atom"] {
            let path = self.dir.join(format!("{slug}.{ext}"));
            if tokio::fs::try_exists(&path).await.unwrap_or(false) {
                return tokio::fs::read_to_string(&path)
                    .await
                    .with_context(|| format!("reading feed document {}", path.display()));
            }
        }
        Err(anyhow!(
            "no document for `{}` in {}",
            source.name,
            self.dir.display()
        ))
    }

    fn name(&self) -> &'static str {
        "dir"
    }
}

/// In-memory documents keyed by source name (case-insensitive).
#[derive(Default)]
pub struct FixtureFetcher {
    docs: HashMap<String, String>,
}

impl FixtureFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, source_name: &str, body: impl Into<String>) -> Self {
        self.docs
            .insert(source_name.to_ascii_lowercase(), body.into());
        self
    }
}

#[async_trait]
impl FeedFetcher for FixtureFetcher {
    async fn fetch(&self, source: &FeedSource) -> Result<String> {
        self.docs
            .get(&source.name.to_ascii_lowercase())
            .cloned()
            .ok_or_else(|| anyhow!("no fixture for `{}`", source.name))
    }

    fn name(&self) -> &'static str {
        "fixture"
    }
}
