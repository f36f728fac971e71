// src/select.rs
//! Diversity-aware top-N selection.
//!
//! Candidates are the positively scored items, ranked by score (ties: source
//! name, title, link). Greedy fill admits an item only while its source is
//! under the per-source cap. With `min_category_spread` set, a reservation
//! pass first takes the best admissible item of each not-yet-seen category.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use crate::error::CurateError;
use crate::metrics::SELECTED_TOTAL;
use crate::relevance::ScoredItem;
use crate::sources::Category;

pub const DEFAULT_TARGET_SIZE: usize = 12;
pub const DEFAULT_PER_SOURCE_CAP: usize = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionConfig {
    pub target_size: usize,
    pub per_source_cap: usize,
    pub min_category_spread: Option<usize>,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            target_size: DEFAULT_TARGET_SIZE,
            per_source_cap: DEFAULT_PER_SOURCE_CAP,
            min_category_spread: None,
        }
    }
}

impl SelectionConfig {
    pub fn validate(&self) -> Result<(), CurateError> {
        if self.target_size == 0 {
            return Err(CurateError::config("target size must be at least 1"));
        }
        if self.per_source_cap == 0 {
            return Err(CurateError::config("per-source cap must be at least 1"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SelectedItem {
    /// 1-based.
    pub rank: usize,
    pub item: ScoredItem,
}

/// Shape handed to the summarizer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HandoffRecord {
    pub rank: usize,
    pub title: String,
    pub link: Option<String>,
    pub source: String,
    pub category: Category,
    pub summary: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Selection {
    items: Vec<SelectedItem>,
}

impl Selection {
    pub fn items(&self) -> &[SelectedItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SelectedItem> {
        self.items.iter()
    }

    /// Rank of the item with this fingerprint, if selected.
    pub fn rank_of(&self, fingerprint: &str) -> Option<usize> {
        self.items
            .iter()
            .find(|s| s.item.item().fingerprint == fingerprint)
            .map(|s| s.rank)
    }

    pub fn handoff(&self) -> Vec<HandoffRecord> {
        self.items
            .iter()
            .map(|s| {
                let raw = &s.item.item().item;
                HandoffRecord {
                    rank: s.rank,
                    title: raw.title.clone(),
                    link: raw.link.as_ref().map(|u| u.to_string()),
                    source: raw.source.name.clone(),
                    category: raw.source.category,
                    summary: raw.summary.clone(),
                }
            })
            .collect()
    }

    pub fn to_handoff_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.handoff())
    }
}

#[derive(Debug, Clone, Copy)]
pub struct DiversitySelector {
    cfg: SelectionConfig,
}

impl DiversitySelector {
    pub fn new(cfg: SelectionConfig) -> Result<Self, CurateError> {
        cfg.validate()?;
        Ok(Self { cfg })
    }

    pub fn config(&self) -> SelectionConfig {
        self.cfg
    }

    /// Never fails: too few admissible items just yields a shorter selection.
    pub fn select(&self, items: Vec<ScoredItem>) -> Selection {
        let mut candidates: Vec<ScoredItem> = items
            .into_iter()
            .filter(|s| s.score().is_finite() && s.score() > 0.0)
            .collect();
        candidates.sort_by(rank_order);

        let target = self.cfg.target_size;
        let cap = self.cfg.per_source_cap;
        let mut chosen = vec![false; candidates.len()];
        let mut picked = 0usize;
        let mut per_source: HashMap<&str, usize> = HashMap::new();

        if let Some(spread) = self.cfg.min_category_spread {
            let want = spread.min(target);
            let mut seen: HashSet<Category> = HashSet::new();
            for (i, c) in candidates.iter().enumerate() {
                if seen.len() >= want {
                    break;
                }
                let used = per_source.entry(c.source_name()).or_insert(0);
                if seen.contains(&c.category()) || *used >= cap {
                    continue;
                }
                *used += 1;
                seen.insert(c.category());
                chosen[i] = true;
                picked += 1;
            }
            if seen.len() < want {
                tracing::debug!(
                    target: "select",
                    wanted = want,
                    got = seen.len(),
                    "category spread not reachable"
                );
            }
        }

        for (i, c) in candidates.iter().enumerate() {
            if picked >= target {
                break;
            }
            if chosen[i] {
                continue;
            }
            let used = per_source.entry(c.source_name()).or_insert(0);
            if *used < cap {
                *used += 1;
                chosen[i] = true;
                picked += 1;
            }
        }

        let total = candidates.len();
        let items: Vec<SelectedItem> = candidates
            .into_iter()
            .zip(chosen)
            .filter_map(|(c, keep)| keep.then_some(c))
            .enumerate()
            .map(|(i, item)| SelectedItem { rank: i + 1, item })
            .collect();

        metrics::counter!(SELECTED_TOTAL).increment(items.len() as u64);
        tracing::info!(
            target: "select",
            candidates = total,
            selected = items.len(),
            target,
            cap,
            "selection done"
        );
        Selection { items }
    }
}

impl Default for DiversitySelector {
    fn default() -> Self {
        Self {
            cfg: SelectionConfig::default(),
        }
    }
}

/// Score desc, then source name, title and link ascending.
fn rank_order(a: &ScoredItem, b: &ScoredItem) -> Ordering {
    b.score()
        .total_cmp(&a.score())
        .then_with(|| a.source_name().cmp(b.source_name()))
        .then_with(|| a.title().cmp(b.title()))
        .then_with(|| {
            let la = a.item().item.link.as_ref().map(|u| u.as_str());
            let lb = b.item().item.link.as_ref().map(|u| u.as_str());
            la.cmp(&lb)
        })
}
