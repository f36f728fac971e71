// tests/dedup.rs
// Duplicate collapsing across feeds. Default strategy: fuzzy titles at 0.90
// normalized Levenshtein similarity, plus exact title/link keys.

use chrono::{TimeZone, Utc};
use rand::{rngs::StdRng, seq::SliceRandom, Rng, SeedableRng};
use url::Url;

use newsletter_curator::dedup::{DedupStrategy, Deduplicator, DEFAULT_FUZZY_THRESHOLD};
use newsletter_curator::ingest::types::RawItem;
use newsletter_curator::sources::{Category, FeedSource};

fn item(src: &str, title: &str, link: Option<&str>) -> RawItem {
    RawItem {
        title: title.to_string(),
        link: link.map(|l| Url::parse(l).unwrap()),
        summary: String::new(),
        published_at: None,
        source: FeedSource::new(src, "https://feed.example", Category::TradeFinanceFintech),
    }
}

#[test]
fn same_link_different_title_casing_is_one_item() {
    let d = Deduplicator::default();
    let out = d.dedup(vec![
        item("GTR", "Banks Pilot AI For LC Checks", Some("https://gtreview.com/news/1")),
        item("TXF", "banks pilot ai for lc checks", Some("https://gtreview.com/news/1")),
    ]);
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].cluster_size, 2);
}

#[test]
fn default_threshold_is_documented_value() {
    assert_eq!(DEFAULT_FUZZY_THRESHOLD, 0.90);
    assert_eq!(
        Deduplicator::default().strategy(),
        DedupStrategy::Fuzzy { threshold: 0.90 }
    );
}

#[test]
fn fuzzy_threshold_boundary() {
    // 40-char titles: 4 edits is similarity exactly 0.90, 5 edits is 0.875.
    let a = "a".repeat(40);
    let b = format!("{}{}", "a".repeat(36), "b".repeat(4));
    let c = format!("{}{}", "a".repeat(35), "b".repeat(5));

    let at = Deduplicator::new(DedupStrategy::Fuzzy { threshold: 0.90 }).unwrap();
    assert_eq!(at.dedup(vec![item("A", &a, None), item("B", &b, None)]).len(), 1);
    assert_eq!(at.dedup(vec![item("A", &a, None), item("B", &c, None)]).len(), 2);
}

#[test]
fn clusters_are_transitive() {
    // a~b and b~c at 0.9, a and c further apart
    let a = "a".repeat(40);
    let b = format!("{}{}", "a".repeat(36), "b".repeat(4));
    let c = format!("{}{}", "a".repeat(32), "b".repeat(8));
    let d = Deduplicator::default();
    let out = d.dedup(vec![item("A", &a, None), item("C", &c, None), item("B", &b, None)]);
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].item.source.name, "A");
    assert_eq!(out[0].cluster_size, 3);
}

#[test]
fn empty_input_gives_empty_output() {
    assert!(Deduplicator::default().dedup(Vec::new()).is_empty());
}

#[test]
fn fingerprints_are_unique_in_output() {
    let out = Deduplicator::new(DedupStrategy::Exact).unwrap().dedup(vec![
        item("A", "Story", Some("https://a.example/1")),
        item("B", "STORY!", None),
        item("C", "Another", Some("https://a.example/1?ref=c")),
        item("D", "Third", None),
    ]);
    let mut fps: Vec<&str> = out.iter().map(|c| c.fingerprint.as_str()).collect();
    let n = fps.len();
    fps.sort();
    fps.dedup();
    assert_eq!(fps.len(), n);
    assert_eq!(n, 2);
}

/// Random items drawn from a small pool of titles and links, so collisions are common.
fn random_items(rng: &mut StdRng, n: usize) -> Vec<RawItem> {
    const TITLES: [&str; 6] = [
        "Trade finance gap widens in Q3",
        "Trade finance gap widens in Q4",
        "TRADE FINANCE GAP WIDENS IN Q3!",
        "KYC utility launches",
        "New AI model for letters of credit",
        "Supply chain finance volumes grow",
    ];
    const LINKS: [&str; 4] = [
        "https://a.example/x",
        "http://www.a.example/x/",
        "https://b.example/y",
        "https://c.example/z",
    ];
    let mut out: Vec<RawItem> = (0..n)
        .map(|i| {
            let title = TITLES[rng.random_range(0..TITLES.len())];
            let link = if rng.random_range(0..3) == 0 {
                None
            } else {
                Some(LINKS[rng.random_range(0..LINKS.len())])
            };
            let mut it = item(&format!("S{i}"), title, link);
            if rng.random_range(0..2) == 0 {
                it.published_at = Some(
                    Utc.with_ymd_and_hms(2025, 10, rng.random_range(1..28), 8, 0, 0)
                        .unwrap(),
                );
            }
            it
        })
        .collect();
    out.shuffle(rng);
    out
}

#[test]
fn dedup_is_idempotent() {
    let mut rng = StdRng::seed_from_u64(0x5eed);
    for strategy in [DedupStrategy::Exact, DedupStrategy::default()] {
        let d = Deduplicator::new(strategy).unwrap();
        for _ in 0..50 {
            let n = rng.random_range(0..20);
            let once = d.dedup(random_items(&mut rng, n));
            let twice = d.dedup_canonical(once.clone());
            assert_eq!(once, twice, "strategy {:?}", strategy);
            let total: usize = once.iter().map(|c| c.cluster_size).sum();
            assert_eq!(total, n);
        }
    }
}

#[test]
fn distinct_query_ids_and_site_roots_do_not_merge() {
    let d = Deduplicator::default();
    let out = d.dedup(vec![
        item("A", "Export credit agencies back green shipping", Some("https://news.example/article.aspx?id=1")),
        item("B", "Central bank trials tokenized deposits", Some("https://news.example/article.aspx?id=2")),
        item("C", "Factoring volumes climb in Southeast Asia", Some("https://other.example/")),
        item("D", "Insurers price climate risk into trade cover", Some("https://other.example/")),
    ]);
    assert_eq!(out.len(), 4);
    assert!(out.iter().all(|c| c.cluster_size == 1));
}

#[test]
fn tracking_parameters_do_not_split_a_story() {
    let d = Deduplicator::new(DedupStrategy::Exact).unwrap();
    let out = d.dedup(vec![
        item("A", "Headline one", Some("https://news.example/article.aspx?id=1&utm_source=rss")),
        item("B", "Other wording", Some("https://www.news.example/article.aspx?fbclid=abc&id=1")),
    ]);
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].cluster_size, 2);
}
