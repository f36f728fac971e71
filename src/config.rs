// src/config.rs
//! Run configuration: dedup strategy, selection limits and scoring tables.
//!
//! TOML (preferred) or JSON. Every section is optional and falls back to the
//! built-in defaults.

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::dedup::{DedupStrategy, Deduplicator};
use crate::error::CurateError;
use crate::relevance::{RelevanceScorer, ScoringConfig};
use crate::select::SelectionConfig;

pub const ENV_CONFIG_PATH: &str = "CURATOR_CONFIG_PATH";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CuratorConfig {
    pub dedup: DedupStrategy,
    pub selection: SelectionConfig,
    pub scoring: ScoringConfig,
}

impl CuratorConfig {
    /// Cheap sanity pass over every section; the pipeline repeats it when it compiles.
    pub fn validate(&self) -> Result<(), CurateError> {
        Deduplicator::new(self.dedup)?;
        self.selection.validate()?;
        RelevanceScorer::new(self.scoring.clone())?;
        Ok(())
    }
}

/// Load config from an explicit path. Supports TOML or JSON formats.
pub fn load_config_from(path: &Path) -> Result<CuratorConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading curator config from {}", path.display()))?;
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    parse_config(&content, ext.as_str())
        .with_context(|| format!("parsing curator config {}", path.display()))
}

/// Load config using env var + fallbacks:
/// 1) $CURATOR_CONFIG_PATH
/// 2) config/curator.toml
/// 3) config/curator.json
/// 4) built-in defaults
pub fn load_config_default() -> Result<CuratorConfig> {
    if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
        let pb = PathBuf::from(p);
        if pb.exists() {
            return load_config_from(&pb);
        } else {
            return Err(anyhow!("CURATOR_CONFIG_PATH points to non-existent path"));
        }
    }
    let toml_p = PathBuf::from("config/curator.toml");
    if toml_p.exists() {
        return load_config_from(&toml_p);
    }
    let json_p = PathBuf::from("config/curator.json");
    if json_p.exists() {
        return load_config_from(&json_p);
    }
    Ok(CuratorConfig::default())
}

fn parse_config(s: &str, hint_ext: &str) -> Result<CuratorConfig> {
    if hint_ext == "json" || s.trim_start().starts_with('{') {
        return Ok(serde_json::from_str(s)?);
    }
    Ok(toml::from_str(s)?)
}
