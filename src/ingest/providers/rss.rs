// src/ingest/providers/rss.rs
//! RSS 2.0, RSS 1.0 (RDF) and Atom documents → `RawEntry` records.
//!
//! Parsing is lenient on purpose: any field may be absent and the normalizer
//! decides later whether an entry is usable.

use anyhow::{anyhow, Context, Result};
use metrics::histogram;
use quick_xml::de::from_str;
use serde::Deserialize;

use crate::ingest::types::RawEntry;

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}

#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(rename = "item", default)]
    item: Vec<RssItem>,
}

/// RSS 1.0 keeps items next to the channel instead of inside it.
#[derive(Debug, Deserialize)]
struct Rdf {
    #[serde(rename = "item", default)]
    item: Vec<RssItem>,
}

#[derive(Debug, Deserialize)]
struct RssItem {
    title: Option<String>,
    link: Option<String>,
    description: Option<String>,
    #[serde(rename = "pubDate")]
    pub_date: Option<String>,
    #[serde(rename = "dc:date")]
    dc_date: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AtomFeed {
    #[serde(rename = "entry", default)]
    entry: Vec<AtomEntry>,
}

#[derive(Debug, Deserialize)]
struct AtomEntry {
    title: Option<AtomText>,
    #[serde(rename = "link", default)]
    links: Vec<AtomLink>,
    summary: Option<AtomText>,
    content: Option<AtomText>,
    published: Option<String>,
    updated: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AtomText {
    #[serde(rename = "$text", default)]
    value: String,
}

#[derive(Debug, Deserialize)]
struct AtomLink {
    #[serde(rename = "@href")]
    href: Option<String>,
    #[serde(rename = "@rel")]
    rel: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flavor {
    Rss,
    Rdf,
    Atom,
}

fn sniff(xml: &str) -> Option<Flavor> {
    if xml.contains("<rss") {
        Some(Flavor::Rss)
    } else if xml.contains("<rdf:RDF") {
        Some(Flavor::Rdf)
    } else if xml.contains("<feed") {
        Some(Flavor::Atom)
    } else {
        None
    }
}

/// Parse one feed body. Errors mean the whole document is unusable.
pub fn parse_document(xml: &str) -> Result<Vec<RawEntry>> {
    let t0 = std::time::Instant::now();
    let xml_clean = scrub_html_entities_for_xml(xml);

    let out = match sniff(&xml_clean) {
        Some(Flavor::Rss) => {
            let rss: Rss = from_str(&xml_clean).context("parsing rss xml")?;
            rss.channel.item.into_iter().map(from_rss).collect()
        }
        Some(Flavor::Rdf) => {
            let rdf: Rdf = from_str(&xml_clean).context("parsing rdf xml")?;
            rdf.item.into_iter().map(from_rss).collect()
        }
        Some(Flavor::Atom) => {
            let feed: AtomFeed = from_str(&xml_clean).context("parsing atom xml")?;
            feed.entry.into_iter().map(from_atom).collect()
        }
        None => return Err(anyhow!("document is neither RSS nor Atom")),
    };

    let ms = t0.elapsed().as_secs_f64() * 1_000.0;
    histogram!(crate::metrics::PARSE_MS).record(ms);
    Ok(out)
}

fn from_rss(it: RssItem) -> RawEntry {
    RawEntry {
        title: it.title,
        link: it.link.map(|l| l.trim().to_string()),
        summary: it.description,
        published: it.pub_date.or(it.dc_date),
    }
}

fn from_atom(e: AtomEntry) -> RawEntry {
    let link = e
        .links
        .iter()
        .find(|l| matches!(l.rel.as_deref(), None | Some("alternate")))
        .or_else(|| e.links.first())
        .and_then(|l| l.href.clone());
    RawEntry {
        title: e.title.map(|t| t.value),
        link,
        summary: e.summary.or(e.content).map(|t| t.value),
        published: e.published.or(e.updated),
    }
}

/// Feeds routinely use HTML entities that are not valid XML.
fn scrub_html_entities_for_xml(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&ndash;", "-")
        .replace("&mdash;", "-")
        .replace("&ldquo;", "\"")
        .replace("&rdquo;", "\"")
        .replace("&lsquo;", "'")
        .replace("&rsquo;", "'")
        .replace("&hellip;", "...")
}
