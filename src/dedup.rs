//! Duplicate-story collapsing.
//!
//! The same story usually shows up in several feeds with slightly different
//! titles or tracking-laden links. Items are clustered when any of these hold:
//! - their normalized titles are equal,
//! - their links point at the same article (host + path + non-tracking query),
//! - (fuzzy strategy) their normalized titles are at least `threshold` similar
//!   by normalized Levenshtein distance.
//!
//! Clusters are the transitive closure of that relation, so re-running the
//! deduplicator over its own output changes nothing.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::cmp::Ordering;
use std::collections::{hash_map::Entry, BTreeMap, HashMap};
use url::Url;

use crate::error::CurateError;
use crate::ingest::types::RawItem;
use crate::metrics::DEDUP_MERGED_TOTAL;

pub const DEFAULT_FUZZY_THRESHOLD: f64 = 0.90;

/// How aggressively near-duplicates are merged.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DedupStrategy {
    /// Title key or link key must match exactly.
    Exact,
    /// Exact keys, plus title similarity >= threshold.
    Fuzzy { threshold: f64 },
}

impl Default for DedupStrategy {
    fn default() -> Self {
        DedupStrategy::Fuzzy {
            threshold: DEFAULT_FUZZY_THRESHOLD,
        }
    }
}

/// Representative of one duplicate cluster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalItem {
    pub item: RawItem,
    /// How many raw items the cluster absorbed (informational only).
    pub cluster_size: usize,
    /// Hex digest of normalized title + normalized link.
    pub fingerprint: String,
}

impl CanonicalItem {
    pub fn new(item: RawItem, cluster_size: usize) -> Self {
        let fingerprint = fingerprint(&item.title, item.link.as_ref());
        Self {
            item,
            cluster_size: cluster_size.max(1),
            fingerprint,
        }
    }

    pub fn singleton(item: RawItem) -> Self {
        Self::new(item, 1)
    }
}

/// Lowercase, punctuation to spaces, collapsed whitespace.
pub fn title_key(title: &str) -> String {
    let folded: String = title
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();
    folded.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Query parameters that only carry campaign or referrer tracking.
const TRACKING_PARAMS: &[&str] = &[
    "ref", "ref_src", "referrer", "fbclid", "gclid", "dclid", "msclkid", "mc_cid", "mc_eid",
    "igshid", "yclid", "_hsenc", "_hsmi", "cmpid",
];

fn is_tracking_param(name: &str) -> bool {
    let name = name.to_ascii_lowercase();
    name.starts_with("utm_") || TRACKING_PARAMS.contains(&name.as_str())
}

/// `host/path?query` with `www.` dropped, no trailing slash, tracking
/// parameters removed and the rest sorted. Scheme and fragment are ignored.
/// Site-root links (`/` or empty path) identify no article and yield `None`.
pub fn link_key(link: &Url) -> Option<String> {
    let host = link.host_str()?.to_ascii_lowercase();
    let host = host.strip_prefix("www.").unwrap_or(&host).to_string();
    let path = link.path().trim_end_matches('/');
    if path.is_empty() {
        return None;
    }

    let mut params: Vec<(String, String)> = link
        .query_pairs()
        .filter(|(k, _)| !is_tracking_param(k))
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    if params.is_empty() {
        return Some(format!("{host}{path}"));
    }
    params.sort();
    let query = url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(params)
        .finish();
    Some(format!("{host}{path}?{query}"))
}

/// Short, stable id for an item (first 8 bytes of SHA-256, hex).
pub fn fingerprint(title: &str, link: Option<&Url>) -> String {
    let mut hasher = Sha256::new();
    hasher.update(title_key(title).as_bytes());
    hasher.update(b"\n");
    if let Some(k) = link.and_then(link_key) {
        hasher.update(k.as_bytes());
    }
    let digest = hasher.finalize();
    let mut out = String::with_capacity(16);
    for b in digest.iter().take(8) {
        use std::fmt::Write as _;
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}

#[derive(Debug, Clone, Copy)]
pub struct Deduplicator {
    strategy: DedupStrategy,
}

impl Deduplicator {
    pub fn new(strategy: DedupStrategy) -> Result<Self, CurateError> {
        if let DedupStrategy::Fuzzy { threshold } = strategy {
            if !threshold.is_finite() || threshold <= 0.0 || threshold > 1.0 {
                return Err(CurateError::config(format!(
                    "dedup threshold must be in (0, 1], got {threshold}"
                )));
            }
        }
        Ok(Self { strategy })
    }

    pub fn strategy(&self) -> DedupStrategy {
        self.strategy
    }

    pub fn dedup(&self, items: Vec<RawItem>) -> Vec<CanonicalItem> {
        self.dedup_canonical(items.into_iter().map(CanonicalItem::singleton).collect())
    }

    /// Same as [`dedup`](Self::dedup) over already-canonical items; cluster sizes add up.
    pub fn dedup_canonical(&self, items: Vec<CanonicalItem>) -> Vec<CanonicalItem> {
        let n = items.len();
        if n == 0 {
            return Vec::new();
        }

        let titles: Vec<String> = items.iter().map(|c| title_key(&c.item.title)).collect();
        let links: Vec<Option<String>> = items
            .iter()
            .map(|c| c.item.link.as_ref().and_then(link_key))
            .collect();

        let mut sets = DisjointSet::new(n);
        let mut by_title: HashMap<&str, usize> = HashMap::new();
        let mut by_link: HashMap<&str, usize> = HashMap::new();

        for i in 0..n {
            if !titles[i].is_empty() {
                match by_title.entry(titles[i].as_str()) {
                    Entry::Occupied(e) => sets.union(*e.get(), i),
                    Entry::Vacant(e) => {
                        e.insert(i);
                    }
                }
            }
            if let Some(k) = links[i].as_deref() {
                match by_link.entry(k) {
                    Entry::Occupied(e) => sets.union(*e.get(), i),
                    Entry::Vacant(e) => {
                        e.insert(i);
                    }
                }
            }
            if let DedupStrategy::Fuzzy { threshold } = self.strategy {
                if titles[i].is_empty() {
                    continue;
                }
                for j in 0..i {
                    if titles[j].is_empty() || sets.find(i) == sets.find(j) {
                        continue;
                    }
                    if similar(&titles[i], &titles[j], threshold) {
                        sets.union(i, j);
                    }
                }
            }
        }

        let mut groups: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
        for i in 0..n {
            groups.entry(sets.find(i)).or_default().push(i);
        }

        let mut picks: Vec<(usize, usize)> = groups
            .values()
            .map(|members| {
                let canon = members
                    .iter()
                    .copied()
                    .min_by(|&a, &b| {
                        earliest_first(items[a].item.published_at, items[b].item.published_at)
                            .then(a.cmp(&b))
                    })
                    .unwrap_or(members[0]);
                let size = members.iter().map(|&m| items[m].cluster_size).sum();
                if members.len() > 1 {
                    tracing::debug!(
                        target: "dedup",
                        fingerprint = %items[canon].fingerprint,
                        merged = members.len(),
                        "collapsed duplicate cluster"
                    );
                }
                (canon, size)
            })
            .collect();
        picks.sort_by_key(|&(canon, _)| canon);

        let merged = n - picks.len();
        metrics::counter!(DEDUP_MERGED_TOTAL).increment(merged as u64);
        tracing::info!(target: "dedup", input = n, clusters = picks.len(), merged, "deduplicated");

        let mut slots: Vec<Option<CanonicalItem>> = items.into_iter().map(Some).collect();
        picks
            .into_iter()
            .filter_map(|(canon, size)| {
                slots[canon]
                    .take()
                    .map(|c| CanonicalItem::new(c.item, size))
            })
            .collect()
    }
}

impl Default for Deduplicator {
    fn default() -> Self {
        Self {
            strategy: DedupStrategy::default(),
        }
    }
}

/// Known dates before unknown ones; earlier before later.
fn earliest_first(a: Option<DateTime<Utc>>, b: Option<DateTime<Utc>>) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn similar(a: &str, b: &str, threshold: f64) -> bool {
    let (la, lb) = (a.chars().count(), b.chars().count());
    let max_len = la.max(lb);
    if max_len == 0 {
        return false;
    }
    // edit distance is at least the length gap
    let best_case = 1.0 - (la.abs_diff(lb) as f64 / max_len as f64);
    if best_case < threshold {
        return false;
    }
    strsim::normalized_levenshtein(a, b) >= threshold
}

/// Union-find over item indices; the smaller index becomes the root.
struct DisjointSet {
    parent: Vec<usize>,
}

impl DisjointSet {
    fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
        }
    }

    fn find(&mut self, mut x: usize) -> usize {
        let mut root = x;
        while self.parent[root] != root {
            root = self.parent[root];
        }
        while self.parent[x] != root {
            let next = self.parent[x];
            self.parent[x] = root;
            x = next;
        }
        root
    }

    fn union(&mut self, a: usize, b: usize) {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra != rb {
            let (lo, hi) = if ra < rb { (ra, rb) } else { (rb, ra) };
            self.parent[hi] = lo;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::{Category, FeedSource};
    use chrono::TimeZone;

    fn item(src: &str, title: &str, link: Option<&str>, day: Option<u32>) -> RawItem {
        RawItem {
            title: title.to_string(),
            link: link.map(|l| Url::parse(l).unwrap()),
            summary: String::new(),
            published_at: day.map(|d| Utc.with_ymd_and_hms(2025, 10, d, 8, 0, 0).unwrap()),
            source: FeedSource::new(src, "https://feed.example", Category::TradeFinanceFintech),
        }
    }

    #[test]
    fn keys_fold_case_punctuation_and_www() {
        assert_eq!(title_key("  Banks Adopt AI: A Guide! "), "banks adopt ai a guide");
        let u = Url::parse("https://WWW.Example.com/a/b/?utm_source=rss&fbclid=x#frag").unwrap();
        assert_eq!(link_key(&u).unwrap(), "example.com/a/b");
    }

    #[test]
    fn link_key_keeps_identifying_query_sorted() {
        let u = Url::parse("https://news.example/article.aspx?utm_medium=email&page=2&id=7").unwrap();
        assert_eq!(link_key(&u).unwrap(), "news.example/article.aspx?id=7&page=2");
        let v = Url::parse("https://news.example/article.aspx?id=7&page=2&ref=home").unwrap();
        assert_eq!(link_key(&u), link_key(&v));
    }

    #[test]
    fn site_root_links_have_no_key() {
        for l in ["https://other.example/", "https://other.example", "https://www.other.example/?utm_source=x"] {
            assert_eq!(link_key(&Url::parse(l).unwrap()), None, "{l}");
        }
    }

    #[test]
    fn earliest_published_wins_and_order_follows_canonical() {
        let d = Deduplicator::default();
        let out = d.dedup(vec![
            item("A", "Other story", None, Some(3)),
            item("B", "Same story", None, Some(5)),
            item("C", "same story", None, Some(1)),
        ]);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].item.source.name, "A");
        assert_eq!(out[1].item.source.name, "C");
        assert_eq!(out[1].cluster_size, 2);
    }

    #[test]
    fn unknown_dates_fall_back_to_first_seen() {
        let d = Deduplicator::new(DedupStrategy::Exact).unwrap();
        let out = d.dedup(vec![
            item("A", "Story", None, None),
            item("B", "Story", None, None),
        ]);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].item.source.name, "A");
    }

    #[test]
    fn link_match_merges_different_titles() {
        let d = Deduplicator::new(DedupStrategy::Exact).unwrap();
        let out = d.dedup(vec![
            item("A", "Headline one", Some("https://news.example/x"), None),
            item("B", "Completely different", Some("http://www.news.example/x/"), None),
        ]);
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn near_identical_titles_merge_only_when_fuzzy() {
        let a = "Trade finance gap widens across emerging markets in Q3";
        let b = "Trade finance gap widens across emerging markets in Q4";
        let raw = vec![item("A", a, None, None), item("B", b, None, None)];

        let fuzzy = Deduplicator::new(DedupStrategy::Fuzzy { threshold: 0.9 }).unwrap();
        assert_eq!(fuzzy.dedup(raw.clone()).len(), 1);

        let exact = Deduplicator::new(DedupStrategy::Exact).unwrap();
        assert_eq!(exact.dedup(raw).len(), 2);
    }

    #[test]
    fn threshold_out_of_range_is_a_config_error() {
        assert!(Deduplicator::new(DedupStrategy::Fuzzy { threshold: 0.0 }).is_err());
        assert!(Deduplicator::new(DedupStrategy::Fuzzy { threshold: 1.5 }).is_err());
        assert!(Deduplicator::new(DedupStrategy::Fuzzy { threshold: 1.0 }).is_ok());
    }

    #[test]
    fn union_find_roots_at_smallest_index() {
        let mut s = DisjointSet::new(4);
        s.union(3, 2);
        s.union(2, 1);
        assert_eq!(s.find(3), 1);
        assert_eq!(s.find(0), 0);
    }
}
