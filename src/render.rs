// src/render.rs
//! Issue assembly and Markdown → Slack mrkdwn text.
//!
//! An issue is the summarizer's body under a dated title, closed by a review
//! disclaimer. The Slack text is rendered from the assembled issue:
//! - `#` headings become bold lines, known sections get an emoji prefix
//! - `- ` bullets become `• `
//! - `[text](url)` links become `<url|text>`

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;

pub const ISSUE_TITLE: &str = "MitiMind";
pub const REVIEW_DISCLAIMER: &str = "Auto-draft by AI agent, please review before publishing.";
pub const DEFAULT_FOOTER: &str = "_Read the full issue in Confluence once published._";

static RE_HEADING: Lazy<Regex> = Lazy::new(|| Regex::new(r"^#{1,6}\s+(.*)$").unwrap());
static RE_DASH_BULLET: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*-\s+").unwrap());
static RE_MD_LINK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[([^\]]+)\]\((https?://[^)]+)\)").unwrap());

const SECTION_EMOJI: &[(&str, &str)] = &[
    ("ai in trade finance", "📢"),
    ("tip of the week", "💡"),
    ("internal spotlight", "🔍"),
    ("quick hits", "⚡"),
    ("market intelligence", "📊"),
    ("market outlook", "🔭"),
    ("mitimind", "\u{1F5DE}\u{FE0F}"),
    ("newsletter", "\u{1F5DE}\u{FE0F}"),
];

fn with_emoji(title: &str) -> String {
    let lower = title.to_lowercase();
    SECTION_EMOJI
        .iter()
        .find(|(key, _)| lower.contains(key))
        .map(|(_, emoji)| format!("{emoji} {title}"))
        .unwrap_or_else(|| title.to_string())
}

#[derive(Debug, Clone, Default)]
pub struct SlackRenderer {
    footer: Option<String>,
}

impl SlackRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_footer(mut self, footer: impl Into<String>) -> Self {
        self.footer = Some(footer.into());
        self
    }

    pub fn render(&self, markdown: &str) -> String {
        let mut out: Vec<String> = Vec::new();
        for line in markdown.lines() {
            if let Some(c) = RE_HEADING.captures(line) {
                out.push(format!("*{}*", with_emoji(c[1].trim())));
                continue;
            }
            let line = RE_DASH_BULLET.replace(line, "• ");
            out.push(RE_MD_LINK.replace_all(&line, "<$2|$1>").into_owned());
        }
        let mut text = out.join("\n");
        if let Some(footer) = &self.footer {
            text.push_str("\n\n");
            text.push_str(footer);
        }
        text
    }
}

/// `# MitiMind – <date>` + body + disclaimer.
pub fn assemble_issue(body: &str, date: NaiveDate) -> String {
    format!(
        "# {ISSUE_TITLE} \u{2013} {}\n\n{}\n\n{REVIEW_DISCLAIMER}\n",
        date.format("%Y-%m-%d"),
        body.trim()
    )
}

/// Both publishable forms of one issue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedIssue {
    pub date: NaiveDate,
    pub markdown: String,
    pub slack: String,
}

impl RenderedIssue {
    /// `<date>.md`
    pub fn markdown_file_name(&self) -> String {
        format!("{}.md", self.date.format("%Y-%m-%d"))
    }

    /// `<date>_slack.txt`
    pub fn slack_file_name(&self) -> String {
        format!("{}_slack.txt", self.date.format("%Y-%m-%d"))
    }
}

pub fn render_issue(body: &str, date: NaiveDate, slack: &SlackRenderer) -> RenderedIssue {
    let markdown = assemble_issue(body, date);
    let slack = slack.render(&markdown);
    RenderedIssue {
        date,
        markdown,
        slack,
    }
}
