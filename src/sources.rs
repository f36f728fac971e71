//! # Source Registry
//!
//! Static description of the feeds a run draws from. Each feed carries a
//! [`Category`] label that later drives scoring multipliers and the optional
//! category spread of the selector.
//!
//! - Loads from TOML or JSON: a mapping `category label -> [{ name, url }]`.
//! - Lookup order: `$CURATOR_SOURCES_PATH` → `config/sources.toml` →
//!   `config/sources.json` → built-in [`SourceRegistry::default_seed`].
//! - Category labels are matched case-insensitively and ignore separators, so
//!   `trade_finance_fintech`, `trade-finance-fintech` and `TradeFinanceFintech`
//!   all resolve to the same variant.

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

pub const ENV_SOURCES_PATH: &str = "CURATOR_SOURCES_PATH";

/// Topical bucket of a feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    TradeFinanceFintech,
    AiTechnology,
    ResearchPapers,
    BusinessStrategy,
    Other,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::TradeFinanceFintech,
        Category::AiTechnology,
        Category::ResearchPapers,
        Category::BusinessStrategy,
        Category::Other,
    ];

    /// Resolve a free-form label. Unknown labels fall back to `Other`.
    pub fn from_label(label: &str) -> Self {
        let key: String = label
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .map(|c| c.to_ascii_lowercase())
            .collect();
        match key.as_str() {
            "tradefinancefintech" | "tradefinance" | "fintech" => Category::TradeFinanceFintech,
            "aitechnology" | "ai" => Category::AiTechnology,
            "researchpapers" | "research" => Category::ResearchPapers,
            "businessstrategy" | "business" => Category::BusinessStrategy,
            _ => Category::Other,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Category::TradeFinanceFintech => "trade_finance_fintech",
            Category::AiTechnology => "ai_technology",
            Category::ResearchPapers => "research_papers",
            Category::BusinessStrategy => "business_strategy",
            Category::Other => "other",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl<'de> Deserialize<'de> for Category {
    fn deserialize<D: Deserializer<'de>>(d: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(d)?;
        Ok(Category::from_label(&s))
    }
}

/// One configured feed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FeedSource {
    pub name: String,
    pub url: String,
    pub category: Category,
}

impl FeedSource {
    pub fn new(name: impl Into<String>, url: impl Into<String>, category: Category) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            category,
        }
    }

    /// Filesystem-friendly identifier, e.g. "Trade Finance Global" → "trade-finance-global".
    pub fn slug(&self) -> String {
        let mut out = String::with_capacity(self.name.len());
        for ch in self.name.trim().chars() {
            if ch.is_ascii_alphanumeric() {
                out.push(ch.to_ascii_lowercase());
            } else if !out.ends_with('-') {
                out.push('-');
            }
        }
        out.trim_matches('-').to_string()
    }
}

#[derive(Debug, Deserialize)]
struct SourceEntry {
    #[serde(default)]
    name: String,
    #[serde(default)]
    url: String,
}

/// Immutable, ordered set of feeds for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceRegistry {
    sources: Vec<FeedSource>,
}

impl SourceRegistry {
    /// Build from explicit sources. Blank entries are dropped, duplicate names keep the first.
    pub fn new(sources: Vec<FeedSource>) -> Self {
        let mut seen = HashSet::new();
        let mut kept: Vec<FeedSource> = sources
            .into_iter()
            .filter(|s| !s.name.trim().is_empty() && !s.url.trim().is_empty())
            .filter(|s| seen.insert(s.name.trim().to_ascii_lowercase()))
            .collect();
        // stable: file order survives within a category
        kept.sort_by_key(|s| s.category);
        Self { sources: kept }
    }

    pub fn sources(&self) -> &[FeedSource] {
        &self.sources
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    pub fn by_category(&self, category: Category) -> impl Iterator<Item = &FeedSource> {
        self.sources.iter().filter(move |s| s.category == category)
    }

    pub fn find(&self, name: &str) -> Option<&FeedSource> {
        self.sources
            .iter()
            .find(|s| s.name.eq_ignore_ascii_case(name.trim()))
    }

    /// Built-in seed: the trade finance and fintech feeds the newsletter started
    /// from, plus a couple of AI and research feeds.
    pub fn default_seed() -> Self {
        let mut sources = Vec::new();
        for (name, url) in [
            ("GTR", "https://www.gtreview.com/rss"),
            (
                "Trade Finance Global",
                "https://www.tradefinanceglobal.com/posts/category/news/feed/",
            ),
            (
                "Trade Treasury Payments",
                "https://tradetreasurypayments.com/posts/category/news/feed",
            ),
            ("TXF", "https://www.txfnews.com/rss"),
            ("Treasury Management", "https://treasury-management.com/feed"),
            ("Finextra Research", "https://www.finextra.com/rss/headlines.aspx"),
            ("Fintech Finance News", "https://ffnews.com/feed/"),
            ("PYMNTS", "https://www.pymnts.com/feed/"),
            ("The Banker", "https://www.thebanker.com/rss"),
        ] {
            sources.push(FeedSource::new(name, url, Category::TradeFinanceFintech));
        }
        for (name, url, category) in [
            (
                "MIT Technology Review AI",
                "https://www.technologyreview.com/topic/artificial-intelligence/feed",
                Category::AiTechnology,
            ),
            (
                "arXiv cs.AI",
                "https://export.arxiv.org/rss/cs.AI",
                Category::ResearchPapers,
            ),
            (
                "Supply Chain Digital",
                "https://supplychaindigital.com/feed",
                Category::BusinessStrategy,
            ),
            (
                "Financial Times Global Trade",
                "https://www.ft.com/global-trade?format=rss",
                Category::BusinessStrategy,
            ),
        ] {
            sources.push(FeedSource::new(name, url, category));
        }
        Self::new(sources)
    }
}

/// Load the registry from an explicit path. Supports TOML or JSON formats.
pub fn load_sources_from(path: &Path) -> Result<SourceRegistry> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading sources from {}", path.display()))?;
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    parse_sources(&content, ext.as_str())
}

/// Load the registry using env var + fallbacks:
/// 1) $CURATOR_SOURCES_PATH
/// 2) config/sources.toml
/// 3) config/sources.json
/// 4) built-in seed
pub fn load_sources_default() -> Result<SourceRegistry> {
    if let Ok(p) = std::env::var(ENV_SOURCES_PATH) {
        let pb = PathBuf::from(p);
        if pb.exists() {
            return load_sources_from(&pb);
        } else {
            return Err(anyhow!("CURATOR_SOURCES_PATH points to non-existent path"));
        }
    }
    let toml_p = PathBuf::from("config/sources.toml");
    if toml_p.exists() {
        return load_sources_from(&toml_p);
    }
    let json_p = PathBuf::from("config/sources.json");
    if json_p.exists() {
        return load_sources_from(&json_p);
    }
    Ok(SourceRegistry::default_seed())
}

fn parse_sources(s: &str, hint_ext: &str) -> Result<SourceRegistry> {
    let try_toml = hint_ext == "toml" || !s.trim_start().starts_with('{');
    if try_toml {
        if let Ok(v) = parse_toml(s) {
            return Ok(v);
        }
    }
    if let Ok(v) = parse_json(s) {
        return Ok(v);
    }
    if !try_toml {
        if let Ok(v) = parse_toml(s) {
            return Ok(v);
        }
    }
    Err(anyhow!("unsupported sources format"))
}

fn parse_toml(s: &str) -> Result<SourceRegistry> {
    let v: BTreeMap<String, Vec<SourceEntry>> = toml::from_str(s)?;
    Ok(build_registry(v))
}

fn parse_json(s: &str) -> Result<SourceRegistry> {
    let v: BTreeMap<String, Vec<SourceEntry>> = serde_json::from_str(s)?;
    Ok(build_registry(v))
}

fn build_registry(map: BTreeMap<String, Vec<SourceEntry>>) -> SourceRegistry {
    let mut sources = Vec::new();
    for (label, entries) in map {
        let category = Category::from_label(&label);
        for e in entries {
            sources.push(FeedSource::new(e.name.trim(), e.url.trim(), category));
        }
    }
    SourceRegistry::new(sources)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_labels_are_lenient() {
        assert_eq!(
            Category::from_label("Trade-Finance-Fintech"),
            Category::TradeFinanceFintech
        );
        assert_eq!(Category::from_label("AITechnology"), Category::AiTechnology);
        assert_eq!(
            Category::from_label("research_papers"),
            Category::ResearchPapers
        );
        assert_eq!(Category::from_label("gardening"), Category::Other);
    }

    #[test]
    fn toml_mapping_keeps_file_order_within_category() {
        let toml = r#"
[[research_papers]]
name = "arXiv"
url = "https://export.arxiv.org/rss/cs.AI"

[[trade_finance_fintech]]
name = "GTR"
url = "https://www.gtreview.com/rss"

[[trade_finance_fintech]]
name = "TXF"
url = "https://www.txfnews.com/rss"

[[trade_finance_fintech]]
name = " "
url = "https://blank.example/rss"
"#;
        let reg = parse_toml(toml).unwrap();
        let names: Vec<&str> = reg.sources().iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["GTR", "TXF", "arXiv"]);
        assert_eq!(reg.by_category(Category::TradeFinanceFintech).count(), 2);
    }

    #[test]
    fn json_duplicates_keep_first() {
        let json = r#"{"fintech":[{"name":"PYMNTS","url":"https://a"},{"name":"pymnts","url":"https://b"}]}"#;
        let reg = parse_json(json).unwrap();
        assert_eq!(reg.len(), 1);
        assert_eq!(reg.find("PYMNTS").unwrap().url, "https://a");
    }

    #[test]
    fn slug_is_stable() {
        let s = FeedSource::new("Trade Finance Global", "https://x", Category::Other);
        assert_eq!(s.slug(), "trade-finance-global");
        let s = FeedSource::new("arXiv cs.AI", "https://x", Category::Other);
        assert_eq!(s.slug(), "arxiv-cs-ai");
    }

    #[test]
    fn seed_is_non_empty_and_categorized() {
        let reg = SourceRegistry::default_seed();
        assert!(reg.len() >= 10);
        assert!(reg.by_category(Category::ResearchPapers).count() >= 1);
    }
}
