// src/quality.rs
//! Structural quality gate for generated drafts.
//!
//! A draft is plain text (Markdown or Slack flavoured). Only its surface is
//! inspected:
//! - headings: `# ...` lines, bold-only lines (`**X**`, `__X__`). Slack `*X*`
//!   lines count only when the draft has no `#` heading; in Markdown they are
//!   emphasis.
//! - links: distinct `http(s)` URLs anywhere in the text
//! - bullets: lines starting with `-`, `*`, `+` or `•` followed by whitespace,
//!   except thematic breaks (`* * *`, `- - -`)
//! - words: `\b\w+\b`
//!
//! Hard rules fail the report. The word target is advisory: it is logged and
//! recorded but never flips `passed`.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::error::CurateError;
use crate::metrics::{ensure_metrics_described, GATE_FAILURES_TOTAL, GATE_RUNS_TOTAL};

pub const RULE_MIN_LINKS: &str = "min_links";
pub const RULE_REQUIRED_SECTIONS: &str = "required_sections";
pub const RULE_BULLET_COUNT: &str = "bullet_count";
pub const RULE_WORD_COUNT: &str = "word_count";

// closing `#` run only counts after whitespace, so `# C#` keeps its title
static RE_MD_HEADING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^#{1,6}\s+(.+?)(?:\s+#+)?\s*$").unwrap());
static RE_BOLD_HEADING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:\*\*(.+?)\*\*|__(.+?)__):?$").unwrap());
static RE_SLACK_HEADING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\*([^*\s][^*]*)\*:?$").unwrap());
static RE_LINK: Lazy<Regex> = Lazy::new(|| Regex::new(r#"https?://[^\s<>()\[\]|"']+"#).unwrap());
static RE_BULLET: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*[-*+•]\s+\S").unwrap());
static RE_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\w+\b").unwrap());

/// Rule set for one run profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualityRules {
    pub min_links: usize,
    #[serde(default)]
    pub required_sections: Vec<String>,
    pub min_bullets: usize,
    pub max_bullets: usize,
    /// Count bullets only under the heading containing this name.
    #[serde(default)]
    pub bullet_section: Option<String>,
    #[serde(default)]
    pub min_words: Option<usize>,
    #[serde(default)]
    pub max_words: Option<usize>,
}

impl QualityRules {
    pub fn validate(&self) -> Result<(), CurateError> {
        if self.min_bullets > self.max_bullets {
            return Err(CurateError::config(format!(
                "bullet range is empty: {}..={}",
                self.min_bullets, self.max_bullets
            )));
        }
        if let (Some(lo), Some(hi)) = (self.min_words, self.max_words) {
            if lo > hi {
                return Err(CurateError::config(format!(
                    "word range is empty: {lo}..={hi}"
                )));
            }
        }
        if self.required_sections.iter().any(|s| s.trim().is_empty()) {
            return Err(CurateError::config("required section names must not be blank"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    pub rule: String,
    pub detail: String,
}

impl Violation {
    fn new(rule: &str, detail: impl Into<String>) -> Self {
        Self {
            rule: rule.to_string(),
            detail: detail.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub passed: bool,
    pub violations: Vec<Violation>,
    pub advisories: Vec<Violation>,
}

impl Default for ValidationReport {
    fn default() -> Self {
        Self {
            passed: true,
            violations: Vec::new(),
            advisories: Vec::new(),
        }
    }
}

impl ValidationReport {
    pub fn violates(&self, rule: &str) -> bool {
        self.violations.iter().any(|v| v.rule == rule)
    }

    /// One line for logs and error messages.
    pub fn summary(&self) -> String {
        if self.violations.is_empty() {
            return match self.advisories.len() {
                0 => "passed".to_string(),
                n => format!("passed with {n} advisory note(s)"),
            };
        }
        self.violations
            .iter()
            .map(|v| format!("{}: {}", v.rule, v.detail))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// Surface features extracted from a draft.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DraftStructure {
    pub headings: Vec<String>,
    pub links: BTreeSet<String>,
    /// Bullets before the first heading.
    pub preamble_bullets: usize,
    /// Bullet count per heading, same order as `headings`.
    pub section_bullets: Vec<usize>,
    pub words: usize,
}

impl DraftStructure {
    pub fn parse(text: &str) -> Self {
        let mut out = DraftStructure::default();
        let slack_style = !text.lines().any(|l| RE_MD_HEADING.is_match(l.trim()));

        for line in text.lines() {
            let trimmed = line.trim();
            if is_thematic_break(trimmed) {
                continue;
            }
            if let Some(h) = heading_text(trimmed, slack_style) {
                out.headings.push(h);
                out.section_bullets.push(0);
                continue;
            }
            if RE_BULLET.is_match(line) {
                match out.section_bullets.last_mut() {
                    Some(n) => *n += 1,
                    None => out.preamble_bullets += 1,
                }
            }
        }

        for m in RE_LINK.find_iter(text) {
            let url = m
                .as_str()
                .trim_end_matches(['.', ',', ';', ':', '!', '?', '*', '_']);
            out.links.insert(url.to_string());
        }
        out.words = RE_WORD.find_iter(text).count();
        out
    }

    pub fn bullets(&self) -> usize {
        self.preamble_bullets + self.section_bullets.iter().sum::<usize>()
    }

    pub fn has_section(&self, name: &str) -> bool {
        self.section_index(name).is_some()
    }

    /// Bullets under the first heading containing `name`; `None` if absent.
    pub fn bullets_in(&self, name: &str) -> Option<usize> {
        self.section_index(name).map(|i| self.section_bullets[i])
    }

    fn section_index(&self, name: &str) -> Option<usize> {
        let needle = name.trim().to_lowercase();
        self.headings
            .iter()
            .position(|h| h.to_lowercase().contains(&needle))
    }
}

/// A line made only of list markers and spaces (`* * *`, `- - -`, `***`).
fn is_thematic_break(line: &str) -> bool {
    !line.is_empty()
        && line
            .chars()
            .all(|c| c.is_whitespace() || matches!(c, '-' | '*' | '_' | '+' | '•'))
}

fn heading_text(line: &str, slack_style: bool) -> Option<String> {
    if let Some(c) = RE_MD_HEADING.captures(line) {
        return Some(c[1].trim().to_string());
    }
    if let Some(c) = RE_BOLD_HEADING.captures(line) {
        return c
            .get(1)
            .or_else(|| c.get(2))
            .map(|m| m.as_str().trim().to_string());
    }
    if !slack_style {
        return None;
    }
    RE_SLACK_HEADING
        .captures(line)
        .map(|c| c[1].trim().to_string())
}

#[derive(Debug, Clone)]
pub struct QualityGate {
    rules: QualityRules,
}

impl QualityGate {
    pub fn new(rules: QualityRules) -> Result<Self, CurateError> {
        rules.validate()?;
        Ok(Self { rules })
    }

    pub fn rules(&self) -> &QualityRules {
        &self.rules
    }

    pub fn evaluate(&self, draft: &str) -> ValidationReport {
        ensure_metrics_described();
        let s = DraftStructure::parse(draft);
        let r = &self.rules;
        let mut violations = Vec::new();
        let mut advisories = Vec::new();

        if s.links.len() < r.min_links {
            violations.push(Violation::new(
                RULE_MIN_LINKS,
                format!(
                    "found {} distinct links, need at least {}",
                    s.links.len(),
                    r.min_links
                ),
            ));
        }

        for section in &r.required_sections {
            if !s.has_section(section) {
                violations.push(Violation::new(
                    RULE_REQUIRED_SECTIONS,
                    format!("missing section heading '{}'", section.trim()),
                ));
            }
        }

        let (bullets, scope) = match &r.bullet_section {
            Some(name) => (s.bullets_in(name).unwrap_or(0), format!(" in '{}'", name.trim())),
            None => (s.bullets(), String::new()),
        };
        if bullets < r.min_bullets || bullets > r.max_bullets {
            violations.push(Violation::new(
                RULE_BULLET_COUNT,
                format!(
                    "found {bullets} bullets{scope}, expected {}..={}",
                    r.min_bullets, r.max_bullets
                ),
            ));
        }

        if let Some(max) = r.max_words.filter(|&m| s.words > m) {
            advisories.push(Violation::new(
                RULE_WORD_COUNT,
                format!("{} words, target at most {max}", s.words),
            ));
        }
        if let Some(min) = r.min_words.filter(|&m| s.words < m) {
            advisories.push(Violation::new(
                RULE_WORD_COUNT,
                format!("{} words, target at least {min}", s.words),
            ));
        }
        for a in &advisories {
            tracing::warn!(target: "quality", rule = %a.rule, detail = %a.detail, "advisory");
        }

        let report = ValidationReport {
            passed: violations.is_empty(),
            violations,
            advisories,
        };

        metrics::counter!(GATE_RUNS_TOTAL).increment(1);
        if !report.passed {
            metrics::counter!(GATE_FAILURES_TOTAL).increment(1);
        }
        tracing::info!(
            target: "quality",
            passed = report.passed,
            links = s.links.len(),
            bullets,
            words = s.words,
            "draft evaluated"
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules() -> QualityRules {
        QualityRules {
            min_links: 2,
            required_sections: vec!["Quick Hits".into()],
            min_bullets: 1,
            max_bullets: 3,
            bullet_section: Some("Quick Hits".into()),
            min_words: None,
            max_words: Some(30),
        }
    }

    #[test]
    fn parses_markdown_headings() {
        let s = DraftStructure::parse(
            "# Title #\n**Bold Section**\n*just emphasis*\n__Under__:\n* not a heading\n",
        );
        assert_eq!(s.headings, vec!["Title", "Bold Section", "Under"]);
        assert_eq!(s.bullets(), 1);
    }

    #[test]
    fn single_star_lines_are_headings_only_in_slack_drafts() {
        let s = DraftStructure::parse("*⚡ Quick Hits*\n• a\n*Tip*:\n");
        assert_eq!(s.headings, vec!["⚡ Quick Hits", "Tip"]);
        assert_eq!(s.bullets_in("quick hits"), Some(1));
    }

    #[test]
    fn closing_hashes_need_leading_space() {
        let s = DraftStructure::parse("# C#\n## Quick Hits ##\n### F# notes\n");
        assert_eq!(s.headings, vec!["C#", "Quick Hits", "F# notes"]);
    }

    #[test]
    fn thematic_breaks_are_not_bullets() {
        let s = DraftStructure::parse("- a\n* * *\n- - -\n***\n___\n- b\n");
        assert_eq!(s.bullets(), 2);
        assert!(s.headings.is_empty());
    }

    #[test]
    fn links_are_distinct_across_syntaxes() {
        let s = DraftStructure::parse(
            "[a](https://x.example/a) and <https://x.example/a|a>, see https://y.example/b.",
        );
        let v: Vec<&str> = s.links.iter().map(|l| l.as_str()).collect();
        assert_eq!(v, vec!["https://x.example/a", "https://y.example/b"]);
    }

    #[test]
    fn bullets_scoped_to_named_section() {
        let s = DraftStructure::parse("- stray\n## Quick Hits\n- a\n• b\n## Next\n- c\n");
        assert_eq!(s.preamble_bullets, 1);
        assert_eq!(s.bullets_in("quick hits"), Some(2));
        assert_eq!(s.bullets(), 4);
    }

    #[test]
    fn word_target_is_advisory_only() {
        let gate = QualityGate::new(rules()).unwrap();
        let long = format!(
            "## Quick Hits\n- https://a.example\n- https://b.example\n{}",
            "word ".repeat(50)
        );
        let r = gate.evaluate(&long);
        assert!(r.passed, "{:?}", r);
        assert_eq!(r.advisories.len(), 1);
        assert_eq!(r.advisories[0].rule, RULE_WORD_COUNT);
        assert_eq!(r.summary(), "passed with 1 advisory note(s)");
    }

    #[test]
    fn missing_section_and_bullets_are_violations() {
        let gate = QualityGate::new(rules()).unwrap();
        let r = gate.evaluate("## Other\n- https://a.example\n- https://b.example\n");
        assert!(!r.passed);
        assert!(r.violates(RULE_REQUIRED_SECTIONS));
        assert!(r.violates(RULE_BULLET_COUNT));
        assert!(!r.violates(RULE_MIN_LINKS));
    }

    #[test]
    fn inverted_ranges_are_config_errors() {
        let mut r = rules();
        r.min_bullets = 5;
        assert!(QualityGate::new(r).is_err());
    }
}
