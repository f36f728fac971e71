// src/profile.rs
//! Run profiles: one closed set of modes, each bundling its template,
//! quality rules and (optionally) its own target size.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::quality::QualityRules;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum RunMode {
    /// Weekly newsletter issue.
    Scheduled,
    /// On-demand market report.
    Manual,
    /// Short briefing for smoke runs.
    Test,
}

impl fmt::Display for RunMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RunMode::Scheduled => "scheduled",
            RunMode::Manual => "manual",
            RunMode::Test => "test",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Template {
    Newsletter,
    MarketReport,
    Briefing,
}

impl Template {
    /// Section headings the draft must carry, in reading order.
    pub fn sections(self) -> &'static [&'static str] {
        match self {
            Template::Newsletter => &["AI in Trade Finance", "Tip of the Week", "Quick Hits"],
            Template::MarketReport => &[
                "Market Intelligence",
                "Industry Impact",
                "Customer Opportunities",
                "Competitive Landscape",
                "Market Outlook",
            ],
            Template::Briefing => &["Headline", "Bullets"],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub mode: RunMode,
    pub template: Template,
    pub rules: QualityRules,
    /// Overrides the configured selection size when set.
    pub target_size: Option<usize>,
}

impl Profile {
    pub fn for_mode(mode: RunMode) -> Self {
        let sections = |t: Template| t.sections().iter().map(|s| s.to_string()).collect();
        match mode {
            RunMode::Scheduled => Self {
                mode,
                template: Template::Newsletter,
                rules: QualityRules {
                    min_links: 3,
                    required_sections: sections(Template::Newsletter),
                    min_bullets: 3,
                    max_bullets: 5,
                    bullet_section: Some("Quick Hits".to_string()),
                    min_words: None,
                    max_words: Some(400),
                },
                target_size: None,
            },
            RunMode::Manual => Self {
                mode,
                template: Template::MarketReport,
                rules: QualityRules {
                    min_links: 3,
                    required_sections: sections(Template::MarketReport),
                    min_bullets: 3,
                    max_bullets: 15,
                    bullet_section: None,
                    min_words: None,
                    max_words: Some(900),
                },
                target_size: None,
            },
            RunMode::Test => Self {
                mode,
                template: Template::Briefing,
                rules: QualityRules {
                    min_links: 3,
                    required_sections: sections(Template::Briefing),
                    min_bullets: 3,
                    max_bullets: 5,
                    bullet_section: None,
                    min_words: None,
                    max_words: Some(250),
                },
                target_size: Some(3),
            },
        }
    }

    /// Plain-language brief for the summarizer, derived from the rules.
    pub fn instructions(&self) -> String {
        let mut out = format!(
            "Write a {} with these sections, in order: {}.",
            match self.template {
                Template::Newsletter => "newsletter issue",
                Template::MarketReport => "market report",
                Template::Briefing => "briefing",
            },
            self.template.sections().join(", ")
        );
        if let Some(max) = self.rules.max_words {
            out.push_str(&format!(" Stay under {max} words."));
        }
        out.push_str(&format!(
            " Include at least {} distinct source links next to the claims they support.",
            self.rules.min_links
        ));
        match &self.rules.bullet_section {
            Some(sec) => out.push_str(&format!(
                " Use {}-{} bullets under {sec}.",
                self.rules.min_bullets, self.rules.max_bullets
            )),
            None => out.push_str(&format!(
                " Use {}-{} bullets in total.",
                self.rules.min_bullets, self.rules.max_bullets
            )),
        }
        out
    }
}
