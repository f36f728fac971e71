// tests/relevance_scoring.rs
// Hand-picked scoring cases plus a seeded determinism sweep.
// Self-contained: the tables are an inline TOML config.

use rand::{rngs::StdRng, Rng, SeedableRng};
use url::Url;

use newsletter_curator::dedup::CanonicalItem;
use newsletter_curator::ingest::types::RawItem;
use newsletter_curator::relevance::{RelevanceScorer, ScoringConfig};
use newsletter_curator::sources::{Category, FeedSource};

const TEST_TOML: &str = r#"
version = "test-2025-10"
link_bonus = 0.5

[[tiers]]
name = "core"
weight = 3.0
terms = ["trade finance", "letter of credit", "ai"]

[[tiers]]
name = "compliance"
weight = 2.0
terms = ["kyc", "anti-money laundering"]

[[tiers]]
name = "business"
weight = 1.0
terms = ["customer", "b2b"]

[category_multipliers]
research_papers = 0.5
business_strategy = 1.5
"#;

fn scorer() -> RelevanceScorer {
    RelevanceScorer::from_toml_str(TEST_TOML).expect("load test config")
}

fn canon(title: &str, summary: &str, link: Option<&str>, category: Category) -> CanonicalItem {
    CanonicalItem::singleton(RawItem {
        title: title.into(),
        link: link.map(|l| Url::parse(l).unwrap()),
        summary: summary.into(),
        published_at: None,
        source: FeedSource::new("Src", "https://feed.example", category),
    })
}

#[test]
fn handpicked_scores() {
    let s = scorer();
    let cases: &[(&str, &str, Option<&str>, Category, f64)] = &[
        ("AI for trade finance", "", None, Category::TradeFinanceFintech, 6.0),
        ("AI for trade finance", "", Some("https://x.example/1"), Category::TradeFinanceFintech, 6.5),
        ("KYC and anti-money laundering", "for B2B customer onboarding", None, Category::Other, 6.0),
        ("A new letter of credit model", "AI", None, Category::ResearchPapers, 3.0),
        ("Customer wins", "", None, Category::BusinessStrategy, 1.5),
        ("Nothing to see", "weather and sports", None, Category::TradeFinanceFintech, 0.0),
        ("Retail said", "maintenance", None, Category::AiTechnology, 0.0),
    ];
    for (title, summary, link, cat, want) in cases {
        let got = s.score(canon(title, summary, *link, *cat)).score();
        assert!(
            (got - want).abs() < 1e-9,
            "title={title:?} summary={summary:?}: want {want}, got {got}"
        );
    }
}

#[test]
fn keyword_stuffing_does_not_pay() {
    let s = scorer();
    let once = s.score(canon("AI news", "", None, Category::Other)).score();
    let stuffed = s
        .score(canon("AI AI AI news", &"ai ".repeat(50), None, Category::Other))
        .score();
    assert_eq!(once, stuffed);
}

#[test]
fn matched_keywords_are_reported() {
    let s = scorer();
    let r = s.score(canon(
        "Letter of Credit reform",
        "customer and KYC",
        None,
        Category::Other,
    ));
    let kw: Vec<&str> = r.matched_keywords().iter().map(|k| k.as_str()).collect();
    assert_eq!(kw, vec!["customer", "kyc", "letter of credit"]);
}

#[test]
fn scoring_is_deterministic() {
    const WORDS: [&str; 12] = [
        "ai", "trade", "finance", "kyc", "customer", "b2b", "letter", "of", "credit", "banks",
        "weather", "anti-money",
    ];
    let s1 = scorer();
    let s2 = scorer();
    let mut rng = StdRng::seed_from_u64(42);
    for _ in 0..200 {
        let n = rng.random_range(1..15);
        let text: Vec<&str> = (0..n)
            .map(|_| WORDS[rng.random_range(0..WORDS.len())])
            .collect();
        let title = text.join(" ");
        let cat = Category::ALL[rng.random_range(0..Category::ALL.len())];
        let a = s1.score(canon(&title, "laundering", None, cat));
        let b = s1.score(canon(&title, "laundering", None, cat));
        let c = s2.score(canon(&title, "laundering", None, cat));
        assert_eq!(a.score().to_bits(), b.score().to_bits());
        assert_eq!(a.score().to_bits(), c.score().to_bits());
        assert_eq!(a.matched_keywords(), c.matched_keywords());
    }
}

#[test]
fn malformed_tables_fail_at_construction() {
    let bad = [
        // blank version
        "version = \" \"\n[[tiers]]\nname=\"a\"\nweight=1.0\nterms=[\"x\"]\n",
        // empty table
        "version = \"v\"\ntiers = []\n",
        // empty term
        "version = \"v\"\n[[tiers]]\nname=\"a\"\nweight=1.0\nterms=[\"  \"]\n",
        // negative weight
        "version = \"v\"\n[[tiers]]\nname=\"a\"\nweight=-1.0\nterms=[\"x\"]\n",
        // negative multiplier
        "version = \"v\"\n[[tiers]]\nname=\"a\"\nweight=1.0\nterms=[\"x\"]\n[category_multipliers]\nother=-0.5\n",
    ];
    for toml in bad {
        assert!(RelevanceScorer::from_toml_str(toml).is_err(), "accepted: {toml}");
    }
}

#[test]
fn default_seed_prefers_domain_news() {
    let s = RelevanceScorer::new(ScoringConfig::default_seed()).unwrap();
    let domain = s
        .score(canon(
            "AI speeds up letter of credit checks",
            "",
            None,
            Category::TradeFinanceFintech,
        ))
        .score();
    let generic = s
        .score(canon("Bank opens new branch", "", None, Category::TradeFinanceFintech))
        .score();
    let paper = s
        .score(canon(
            "AI speeds up letter of credit checks",
            "",
            None,
            Category::ResearchPapers,
        ))
        .score();
    assert!(domain > generic);
    assert!(paper < domain);
    assert!(generic > 0.0);
}
