// src/relevance.rs
//! Relevance scoring: weighted keyword tiers, category multipliers, compiled
//! word-boundary matchers.
//!
//! Scoring is a pure function of the item text and the [`ScoringConfig`]:
//! - every keyword counts at most once per item (stuffing does not pay),
//! - raw score = Σ tier weight of matched keywords (+ optional link bonus),
//! - final score = raw × multiplier of the item's source category.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fs;
use std::path::Path;
use tracing::debug;

use crate::dedup::CanonicalItem;
use crate::error::CurateError;
use crate::sources::Category;

pub const DEFAULT_SCORING_VERSION: &str = "2025-10";

/* ----------------------------
Config schema (from TOML)
---------------------------- */

/// Versioned scoring tables. Passed explicitly into the scorer; nothing global.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringConfig {
    pub version: String,
    pub tiers: Vec<KeywordTier>,
    /// Category label → multiplier. Unlisted categories use 1.0.
    #[serde(default)]
    pub category_multipliers: BTreeMap<String, f64>,
    /// Added to the raw score when the item carries a link.
    #[serde(default)]
    pub link_bonus: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordTier {
    pub name: String,
    pub weight: f64,
    pub terms: Vec<String>,
}

impl ScoringConfig {
    pub fn from_toml_str(s: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(s)?)
    }

    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            anyhow::anyhow!("Failed to read scoring config at {}: {}", path.display(), e)
        })?;
        Self::from_toml_str(&content)
    }

    /// Three tiers: core domain (3), compliance/regulatory (2), generic business (1).
    /// Research papers are damped so one prolific category cannot crowd the rest out.
    pub fn default_seed() -> Self {
        let tier = |name: &str, weight: f64, terms: &[&str]| KeywordTier {
            name: name.to_string(),
            weight,
            terms: terms.iter().map(|t| t.to_string()).collect(),
        };
        let mut category_multipliers = BTreeMap::new();
        category_multipliers.insert(Category::ResearchPapers.label().to_string(), 0.7);

        Self {
            version: DEFAULT_SCORING_VERSION.to_string(),
            tiers: vec![
                tier(
                    "core",
                    3.0,
                    &[
                        "trade finance",
                        "supply chain finance",
                        "letter of credit",
                        "letters of credit",
                        "documentary credit",
                        "fintech",
                        "ai",
                        "artificial intelligence",
                        "machine learning",
                        "generative ai",
                        "llm",
                        "trade",
                    ],
                ),
                tier(
                    "compliance",
                    2.0,
                    &[
                        "compliance",
                        "regulation",
                        "regulatory",
                        "kyc",
                        "aml",
                        "anti-money laundering",
                        "sanctions",
                        "fraud",
                        "basel",
                    ],
                ),
                tier(
                    "business",
                    1.0,
                    &[
                        "customer",
                        "customers",
                        "b2b",
                        "saas",
                        "partnership",
                        "funding",
                        "acquisition",
                        "launch",
                        "platform",
                        "bank",
                        "banks",
                    ],
                ),
            ],
            category_multipliers,
            link_bonus: 0.0,
        }
    }
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self::default_seed()
    }
}

/* ----------------------------
Scored output
---------------------------- */

/// A canonical item with its derived score. Read-only once built.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredItem {
    item: CanonicalItem,
    score: f64,
    matched_keywords: BTreeSet<String>,
}

impl ScoredItem {
    pub fn new(item: CanonicalItem, score: f64, matched_keywords: BTreeSet<String>) -> Self {
        Self {
            item,
            score,
            matched_keywords,
        }
    }

    pub fn item(&self) -> &CanonicalItem {
        &self.item
    }

    pub fn score(&self) -> f64 {
        self.score
    }

    pub fn matched_keywords(&self) -> &BTreeSet<String> {
        &self.matched_keywords
    }

    pub fn title(&self) -> &str {
        &self.item.item.title
    }

    pub fn source_name(&self) -> &str {
        &self.item.item.source.name
    }

    pub fn category(&self) -> Category {
        self.item.item.source.category
    }
}

/* ----------------------------
Compiled scorer
---------------------------- */

#[derive(Debug)]
struct CompiledKeyword {
    term: String,
    weight: f64,
    re: Regex,
}

/// Holds compiled matchers; build once per run.
#[derive(Debug)]
pub struct RelevanceScorer {
    cfg: ScoringConfig,
    keywords: Vec<CompiledKeyword>, // sorted by term, so summation order is fixed
    multipliers: HashMap<Category, f64>,
}

impl RelevanceScorer {
    /// Validate and compile. Any malformed table entry fails here, before items are touched.
    pub fn new(cfg: ScoringConfig) -> Result<Self, CurateError> {
        if cfg.version.trim().is_empty() {
            return Err(CurateError::config("scoring config needs a version"));
        }
        if !cfg.link_bonus.is_finite() || cfg.link_bonus < 0.0 {
            return Err(CurateError::config(format!(
                "link_bonus must be a finite non-negative number, got {}",
                cfg.link_bonus
            )));
        }

        let mut seen: HashMap<String, String> = HashMap::new();
        let mut keywords = Vec::new();
        for tier in &cfg.tiers {
            if !tier.weight.is_finite() || tier.weight <= 0.0 {
                return Err(CurateError::config(format!(
                    "tier `{}` weight must be finite and positive, got {}",
                    tier.name, tier.weight
                )));
            }
            for raw in &tier.terms {
                let term = raw.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase();
                if term.is_empty() {
                    return Err(CurateError::config(format!(
                        "tier `{}` contains an empty keyword",
                        tier.name
                    )));
                }
                if let Some(prev) = seen.insert(term.clone(), tier.name.clone()) {
                    return Err(CurateError::config(format!(
                        "keyword `{}` appears in tiers `{}` and `{}`",
                        term, prev, tier.name
                    )));
                }
                let re = keyword_regex(&term).map_err(|e| {
                    CurateError::config(format!("keyword `{}` regex error: {}", term, e))
                })?;
                keywords.push(CompiledKeyword {
                    term,
                    weight: tier.weight,
                    re,
                });
            }
        }
        if keywords.is_empty() {
            return Err(CurateError::config("keyword table is empty"));
        }
        keywords.sort_by(|a, b| a.term.cmp(&b.term));

        let mut multipliers = HashMap::new();
        for (label, &m) in &cfg.category_multipliers {
            let category = Category::from_label(label);
            if category == Category::Other && !label.trim().eq_ignore_ascii_case("other") {
                return Err(CurateError::config(format!(
                    "unknown category label `{}` in multipliers",
                    label
                )));
            }
            if !m.is_finite() || m < 0.0 {
                return Err(CurateError::config(format!(
                    "multiplier for `{}` must be finite and non-negative, got {}",
                    label, m
                )));
            }
            multipliers.insert(category, m);
        }

        Ok(Self {
            cfg,
            keywords,
            multipliers,
        })
    }

    /// Parse + validate in one step (handy for tests and tools).
    pub fn from_toml_str(toml_str: &str) -> anyhow::Result<Self> {
        let cfg = ScoringConfig::from_toml_str(toml_str)?;
        Ok(Self::new(cfg)?)
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.cfg
    }

    pub fn version(&self) -> &str {
        &self.cfg.version
    }

    pub fn multiplier_for(&self, category: Category) -> f64 {
        self.multipliers.get(&category).copied().unwrap_or(1.0)
    }

    /// Matched keywords for a piece of text (each at most once).
    pub fn matches(&self, text: &str) -> BTreeSet<String> {
        let folded = text.to_lowercase();
        self.keywords
            .iter()
            .filter(|k| k.re.is_match(&folded))
            .map(|k| k.term.clone())
            .collect()
    }

    pub fn score(&self, item: CanonicalItem) -> ScoredItem {
        let text = format!("{} {}", item.item.title, item.item.summary).to_lowercase();

        let mut raw = 0.0f64;
        let mut matched = BTreeSet::new();
        for k in &self.keywords {
            if k.re.is_match(&text) {
                raw += k.weight;
                matched.insert(k.term.clone());
            }
        }
        if item.item.link.is_some() {
            raw += self.cfg.link_bonus;
        }

        let multiplier = self.multiplier_for(item.item.source.category);
        let score = raw * multiplier;

        // Never log raw text. Only the fingerprint and a short keyword list.
        debug!(
            target: "relevance",
            id = %item.fingerprint,
            source = %item.item.source.name,
            score,
            multiplier,
            matched = ?truncate_vec(&matched.iter().collect::<Vec<_>>(), 5),
            "scored"
        );

        ScoredItem::new(item, score, matched)
    }

    pub fn score_all(&self, items: Vec<CanonicalItem>) -> Vec<ScoredItem> {
        items.into_iter().map(|c| self.score(c)).collect()
    }
}

/// Word-bounded, whitespace-tolerant matcher for an already lowercased term.
fn keyword_regex(term: &str) -> Result<Regex, regex::Error> {
    let body = term
        .split_whitespace()
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join(r"\s+");
    let is_word = |c: char| c.is_alphanumeric() || c == '_';
    let lead = if term.chars().next().is_some_and(is_word) {
        r"\b"
    } else {
        ""
    };
    let tail = if term.chars().last().is_some_and(is_word) {
        r"\b"
    } else {
        ""
    };
    Regex::new(&format!("(?i){lead}{body}{tail}"))
}

pub(crate) fn truncate_vec<T: ToString>(v: &[T], max: usize) -> Vec<String> {
    v.iter().take(max).map(|x| x.to_string()).collect()
}

/* ----------------------------
Tests
---------------------------- */
