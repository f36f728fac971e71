// tests/render_slack.rs
use chrono::NaiveDate;
use newsletter_curator::profile::{Profile, RunMode};
use newsletter_curator::quality::QualityGate;
use newsletter_curator::render::{render_issue, SlackRenderer, DEFAULT_FOOTER, REVIEW_DISCLAIMER};

const MD: &str = "\
# MitiMind - 2025-10-06

## AI in Trade Finance
Banks pilot AI for LC checks ([GTR](https://www.gtreview.com/news/ai-lc-checks)).

## Tip of the Week
Try the KYC utility ([TXF](https://www.txfnews.com/news/kyc-utility)).

## Quick Hits
- Agents in back offices ([MIT](https://www.technologyreview.com/x))
- LLMs read bills of lading
- Supply chain finance grows
";

#[test]
fn newsletter_markdown_converts_to_slack() {
    let out = SlackRenderer::new().with_footer(DEFAULT_FOOTER).render(MD);

    assert!(out.starts_with("*\u{1F5DE}\u{FE0F} MitiMind - 2025-10-06*"));
    assert!(out.contains("*📢 AI in Trade Finance*"));
    assert!(out.contains("*💡 Tip of the Week*"));
    assert!(out.contains("*⚡ Quick Hits*"));
    assert!(out.contains("(<https://www.gtreview.com/news/ai-lc-checks|GTR>)"));
    assert!(out.contains("\n• LLMs read bills of lading\n"));
    assert!(!out.contains("](http"));
    assert!(out.ends_with(DEFAULT_FOOTER));
}

#[test]
fn slack_rendering_keeps_the_draft_valid() {
    let gate = QualityGate::new(Profile::for_mode(RunMode::Scheduled).rules).unwrap();
    assert!(gate.evaluate(MD).passed);
    let slack = SlackRenderer::new().render(MD);
    let r = gate.evaluate(&slack);
    assert!(r.passed, "{}", r.summary());
}

#[test]
fn assembled_issue_is_dated_disclaimed_and_renders_to_slack() {
    let date = NaiveDate::from_ymd_opt(2025, 10, 6).unwrap();
    let body = MD.split_once("\n\n").unwrap().1;
    let issue = render_issue(body, date, &SlackRenderer::new().with_footer(DEFAULT_FOOTER));

    assert!(issue.markdown.starts_with("# MitiMind \u{2013} 2025-10-06\n\n## AI in Trade Finance"));
    assert!(issue.markdown.trim_end().ends_with(REVIEW_DISCLAIMER));
    assert_eq!(issue.markdown_file_name(), "2025-10-06.md");
    assert_eq!(issue.slack_file_name(), "2025-10-06_slack.txt");

    assert!(issue
        .slack
        .starts_with("*\u{1F5DE}\u{FE0F} MitiMind \u{2013} 2025-10-06*"));
    let disclaimer_at = issue.slack.find(REVIEW_DISCLAIMER).unwrap();
    let footer_at = issue.slack.find(DEFAULT_FOOTER).unwrap();
    assert!(disclaimer_at < footer_at);

    let gate = QualityGate::new(Profile::for_mode(RunMode::Scheduled).rules).unwrap();
    let r = gate.evaluate(&issue.markdown);
    assert!(r.passed, "{}", r.summary());
}
