// src/ingest/mod.rs
pub mod health;
pub mod providers;
pub mod types;

use crate::ingest::providers::rss::parse_document;
use crate::ingest::types::{FeedDocument, FeedFetcher, FetchResult, RawEntry, RawItem};
use crate::metrics::{
    ensure_metrics_described, ENTRIES_SKIPPED_TOTAL, ENTRIES_TOTAL, FEED_ERRORS_TOTAL,
};
use crate::sources::{FeedSource, SourceRegistry};
use chrono::{DateTime, Utc};
use metrics::counter;
use std::sync::Arc;
use tokio::task::JoinSet;
use url::Url;

pub const TITLE_MAX_CHARS: usize = 300;
pub const SUMMARY_MAX_CHARS: usize = 1_500;

/// Normalize text: decode entities, strip tags, fold quotes, collapse whitespace.
pub fn normalize_text(s: &str) -> String {
    normalize_text_capped(s, SUMMARY_MAX_CHARS)
}

pub fn normalize_text_capped(s: &str, max_chars: usize) -> String {
    // 1) HTML entity decode
    let mut out = html_escape::decode_html_entities(s).to_string();

    // 2) Strip HTML tags
    static RE_TAGS: once_cell::sync::OnceCell<regex::Regex> = once_cell::sync::OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| regex::Regex::new(r"(?is)</?[^>]+>").unwrap());
    out = re_tags.replace_all(&out, " ").to_string();

    // 3) Normalize “ ” ‘ ’ « » to ASCII quotes
    out = out
        .replace(['\u{201C}', '\u{201D}', '\u{00AB}', '\u{00BB}'], "\"")
        .replace(['\u{2018}', '\u{2019}'], "'");

    // 4) Collapse whitespace
    static RE_WS: once_cell::sync::OnceCell<regex::Regex> = once_cell::sync::OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| regex::Regex::new(r"\s+").unwrap());
    out = re_ws.replace_all(&out, " ").to_string();
    out = out.trim().to_string();

    // 5) Length cap
    if out.chars().count() > max_chars {
        out = out.chars().take(max_chars).collect();
        out = out.trim_end().to_string();
    }

    out
}

/// Accepts RFC 2822 (RSS) and RFC 3339 (Atom). Anything else is "unknown".
pub fn parse_published(raw: &str) -> Option<DateTime<Utc>> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    DateTime::parse_from_rfc2822(s)
        .or_else(|_| DateTime::parse_from_rfc3339(s))
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Absolute http(s) link; relative links resolve against the feed URL.
pub fn parse_link(raw: &str, source: &FeedSource) -> Option<Url> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    let url = match Url::parse(s) {
        Ok(u) => u,
        Err(url::ParseError::RelativeUrlWithoutBase) => Url::parse(&source.url).ok()?.join(s).ok()?,
        Err(_) => return None,
    };
    matches!(url.scheme(), "http" | "https").then_some(url)
}

/// One entry → one item, or `None` when it has neither a title nor a usable link.
pub fn normalize_entry(entry: RawEntry, source: &FeedSource) -> Option<RawItem> {
    let title = entry
        .title
        .as_deref()
        .map(|t| normalize_text_capped(t, TITLE_MAX_CHARS))
        .unwrap_or_default();
    let link = entry.link.as_deref().and_then(|l| parse_link(l, source));
    if title.is_empty() && link.is_none() {
        return None;
    }
    Some(RawItem {
        title,
        link,
        summary: entry
            .summary
            .as_deref()
            .map(normalize_text)
            .unwrap_or_default(),
        published_at: entry.published.as_deref().and_then(parse_published),
        source: source.clone(),
    })
}

/// Items plus the bookkeeping of what was dropped on the way.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizeOutcome {
    pub items: Vec<RawItem>,
    pub entries_seen: usize,
    pub skipped: usize,
    pub feeds_failed: usize,
}

/// Normalize every document in the given order. Failures are counted, never raised.
pub fn normalize_documents(results: Vec<FetchResult>) -> NormalizeOutcome {
    ensure_metrics_described();

    let mut out = NormalizeOutcome::default();
    for res in results {
        match res {
            FetchResult::Document(FeedDocument { source, entries }) => {
                out.entries_seen += entries.len();
                for entry in entries {
                    match normalize_entry(entry, &source) {
                        Some(item) => out.items.push(item),
                        None => out.skipped += 1,
                    }
                }
            }
            FetchResult::Failed { source, reason } => {
                tracing::warn!(target: "ingest", source = %source.name, %reason, "feed failed");
                out.feeds_failed += 1;
            }
        }
    }

    counter!(ENTRIES_TOTAL).increment(out.entries_seen as u64);
    counter!(ENTRIES_SKIPPED_TOTAL).increment(out.skipped as u64);
    counter!(FEED_ERRORS_TOTAL).increment(out.feeds_failed as u64);
    tracing::info!(
        target: "ingest",
        kept = out.items.len(),
        skipped = out.skipped,
        feeds_failed = out.feeds_failed,
        "normalized feed entries"
    );
    out
}

/// Fetch and parse every registered source concurrently.
/// Results come back in registry order, whatever order the fetches finish in.
pub async fn collect_documents(
    registry: &SourceRegistry,
    fetcher: Arc<dyn FeedFetcher>,
) -> Vec<FetchResult> {
    let sources = registry.sources().to_vec();
    let mut slots: Vec<Option<FetchResult>> = vec![None; sources.len()];

    let mut set = JoinSet::new();
    for (idx, source) in sources.iter().cloned().enumerate() {
        let fetcher = Arc::clone(&fetcher);
        set.spawn(async move {
            let res = match fetcher.fetch(&source).await {
                Ok(body) => match parse_document(&body) {
                    Ok(entries) => FetchResult::Document(FeedDocument { source, entries }),
                    Err(e) => FetchResult::Failed {
                        source,
                        reason: format!("{e:#}"),
                    },
                },
                Err(e) => FetchResult::Failed {
                    source,
                    reason: format!("{e:#}"),
                },
            };
            (idx, res)
        });
    }

    while let Some(joined) = set.join_next().await {
        match joined {
            Ok((idx, res)) => slots[idx] = Some(res),
            Err(e) => tracing::warn!(target: "ingest", error = ?e, "fetch task aborted"),
        }
    }

    slots
        .into_iter()
        .zip(sources)
        .map(|(slot, source)| {
            slot.unwrap_or_else(|| FetchResult::Failed {
                source,
                reason: "fetch task aborted".to_string(),
            })
        })
        .collect()
}
