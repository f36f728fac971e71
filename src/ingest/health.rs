// src/ingest/health.rs
//! Per-feed health report over collected documents.
//!
//! A feed is working when its document parsed and carried at least one entry.

use serde::Serialize;

use crate::ingest::normalize_text_capped;
use crate::ingest::types::{FeedDocument, FetchResult};
use crate::sources::Category;

pub const SAMPLE_TITLE_MAX_CHARS: usize = 50;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FeedStatus {
    Working {
        entries: usize,
        sample_title: Option<String>,
    },
    Broken {
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeedHealth {
    pub name: String,
    pub url: String,
    pub category: Category,
    #[serde(flatten)]
    pub status: FeedStatus,
}

impl FeedHealth {
    pub fn is_working(&self) -> bool {
        matches!(self.status, FeedStatus::Working { .. })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HealthReport {
    pub working: usize,
    pub broken: usize,
    pub feeds: Vec<FeedHealth>,
}

impl HealthReport {
    /// Registry order is kept.
    pub fn from_results(results: &[FetchResult]) -> Self {
        let feeds: Vec<FeedHealth> = results.iter().map(feed_health).collect();
        let working = feeds.iter().filter(|f| f.is_working()).count();
        for f in feeds.iter().filter(|f| !f.is_working()) {
            if let FeedStatus::Broken { reason } = &f.status {
                tracing::warn!(target: "ingest", source = %f.name, %reason, "feed broken");
            }
        }
        Self {
            working,
            broken: feeds.len() - working,
            feeds,
        }
    }

    pub fn broken_feeds(&self) -> impl Iterator<Item = &FeedHealth> {
        self.feeds.iter().filter(|f| !f.is_working())
    }
}

fn feed_health(result: &FetchResult) -> FeedHealth {
    let source = result.source();
    let status = match result {
        FetchResult::Failed { reason, .. } => FeedStatus::Broken {
            reason: reason.clone(),
        },
        FetchResult::Document(FeedDocument { entries, .. }) if entries.is_empty() => {
            FeedStatus::Broken {
                reason: "feed has no entries".to_string(),
            }
        }
        FetchResult::Document(FeedDocument { entries, .. }) => FeedStatus::Working {
            entries: entries.len(),
            sample_title: entries
                .iter()
                .filter_map(|e| e.title.as_deref())
                .map(|t| normalize_text_capped(t, SAMPLE_TITLE_MAX_CHARS))
                .find(|t| !t.is_empty()),
        },
    };
    FeedHealth {
        name: source.name.clone(),
        url: source.url.clone(),
        category: source.category,
        status,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::types::RawEntry;
    use crate::sources::FeedSource;

    fn src(name: &str) -> FeedSource {
        FeedSource::new(name, "https://feed.example/rss", Category::Other)
    }

    #[test]
    fn empty_and_failed_feeds_are_broken() {
        let report = HealthReport::from_results(&[
            FetchResult::Document(FeedDocument {
                source: src("Empty"),
                entries: Vec::new(),
            }),
            FetchResult::Failed {
                source: src("Down"),
                reason: "HTTP 404".into(),
            },
        ]);
        assert_eq!((report.working, report.broken), (0, 2));
        let names: Vec<&str> = report.broken_feeds().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["Empty", "Down"]);
    }

    #[test]
    fn sample_title_is_first_non_blank_title_capped() {
        let long = "Banks &amp; insurers pilot AI for letter of credit checks across Asia";
        let report = HealthReport::from_results(&[FetchResult::Document(FeedDocument {
            source: src("GTR"),
            entries: vec![
                RawEntry {
                    title: Some("   ".into()),
                    ..Default::default()
                },
                RawEntry {
                    title: Some(long.into()),
                    ..Default::default()
                },
            ],
        })]);
        match &report.feeds[0].status {
            FeedStatus::Working {
                entries,
                sample_title,
            } => {
                assert_eq!(*entries, 2);
                let t = sample_title.as_deref().unwrap();
                assert!(t.starts_with("Banks & insurers pilot AI"));
                assert!(t.chars().count() <= SAMPLE_TITLE_MAX_CHARS);
            }
            other => panic!("unexpected status: {other:?}"),
        }
    }
}
