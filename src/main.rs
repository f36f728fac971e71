//! newsletter-curator: command-line entrypoint.
//!
//! - `select`   feed documents on disk → ranked hand-off JSON
//! - `validate` draft file → quality report JSON
//! - `slack`    Markdown draft → Slack text
//! - `assemble` gated draft body → dated issue (`<date>.md` + `<date>_slack.txt`)
//! - `check`    feed documents on disk → per-feed health report JSON
//!
//! Exit codes: 0 ok, 1 config/collaborator error, 2 empty result, 3 quality gate failure.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use newsletter_curator::config::{load_config_default, load_config_from};
use newsletter_curator::error::{CurateError, EXIT_FAILURE, EXIT_OK, EXIT_QUALITY_GATE};
use newsletter_curator::ingest::collect_documents;
use newsletter_curator::ingest::health::HealthReport;
use newsletter_curator::ingest::providers::local::DirFetcher;
use newsletter_curator::render::{render_issue, SlackRenderer, DEFAULT_FOOTER};
use newsletter_curator::sources::{load_sources_default, load_sources_from};
use newsletter_curator::{Pipeline, Profile, QualityGate, RunMode};

const DEFAULT_LOG_FILTER: &str =
    "warn,ingest=info,dedup=info,select=info,quality=info,pipeline=info";

#[derive(Parser, Debug)]
#[command(name = "newsletter-curator", version, about = "Curate feeds and gate newsletter drafts")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Curate feed documents into a ranked selection (JSON on stdout).
    Select {
        #[arg(long, value_enum, default_value_t = RunMode::Scheduled)]
        mode: RunMode,
        /// Directory holding one `<source-slug>.xml` document per feed.
        #[arg(long)]
        feeds: PathBuf,
        #[arg(long)]
        sources: Option<PathBuf>,
        #[arg(long)]
        config: Option<PathBuf>,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Check a draft against the mode's quality rules (report JSON on stdout).
    Validate {
        #[arg(long, value_enum, default_value_t = RunMode::Scheduled)]
        mode: RunMode,
        draft: PathBuf,
    },
    /// Convert a Markdown draft to Slack text.
    Slack {
        draft: PathBuf,
        #[arg(long)]
        out: Option<PathBuf>,
        #[arg(long)]
        no_footer: bool,
    },
    /// Gate a draft body, then write the dated issue and its Slack text.
    Assemble {
        #[arg(long, value_enum, default_value_t = RunMode::Scheduled)]
        mode: RunMode,
        draft: PathBuf,
        /// Defaults to today (local time).
        #[arg(long)]
        issue_date: Option<NaiveDate>,
        #[arg(long, default_value = "newsletter")]
        out_dir: PathBuf,
        #[arg(long)]
        no_footer: bool,
    },
    /// Report which feeds parse and carry entries (JSON on stdout).
    Check {
        #[arg(long)]
        feeds: PathBuf,
        #[arg(long)]
        sources: Option<PathBuf>,
    },
}

/// Logs go to stderr; stdout carries command output only.
/// `CURATOR_LOG_FORMAT=json` switches to JSON lines.
fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let json = std::env::var("CURATOR_LOG_FORMAT")
        .ok()
        .is_some_and(|v| v.eq_ignore_ascii_case("json"));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(fmt::layer().compact().with_writer(std::io::stderr))
            .init();
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env in local/dev; no-op when absent.
    let _ = dotenvy::dotenv();
    init_tracing();

    let cli = Cli::parse();
    let code = match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            let code = e
                .downcast_ref::<CurateError>()
                .map(CurateError::exit_code)
                .unwrap_or(EXIT_FAILURE);
            tracing::error!(error = %format!("{e:#}"), code, "run failed");
            eprintln!("error: {e:#}");
            code
        }
    };
    ExitCode::from(code as u8)
}

async fn run(cli: Cli) -> Result<i32> {
    match cli.command {
        Command::Select {
            mode,
            feeds,
            sources,
            config,
            out,
        } => {
            let registry = match sources {
                Some(p) => load_sources_from(&p)?,
                None => load_sources_default()?,
            };
            let config = match config {
                Some(p) => load_config_from(&p)?,
                None => load_config_default()?,
            };
            let pipeline = Pipeline::new(config, Profile::for_mode(mode))?;

            let fetcher = Arc::new(DirFetcher::new(feeds));
            let documents = collect_documents(&registry, fetcher).await;
            let curated = pipeline.curate(documents)?;

            let json = curated
                .selection
                .to_handoff_json()
                .context("serializing selection")?;
            write_output(out.as_deref(), &json)?;
            Ok(EXIT_OK)
        }
        Command::Validate { mode, draft } => {
            let text = read_draft(&draft)?;
            let gate = QualityGate::new(Profile::for_mode(mode).rules)?;
            let report = gate.evaluate(&text);
            let json = serde_json::to_string_pretty(&report).context("serializing report")?;
            write_output(None, &json)?;
            Ok(if report.passed {
                EXIT_OK
            } else {
                EXIT_QUALITY_GATE
            })
        }
        Command::Slack {
            draft,
            out,
            no_footer,
        } => {
            let text = read_draft(&draft)?;
            let mut renderer = SlackRenderer::new();
            if !no_footer {
                renderer = renderer.with_footer(DEFAULT_FOOTER);
            }
            write_output(out.as_deref(), &renderer.render(&text))?;
            Ok(EXIT_OK)
        }
        Command::Assemble {
            mode,
            draft,
            issue_date,
            out_dir,
            no_footer,
        } => {
            let body = read_draft(&draft)?;
            let report = QualityGate::new(Profile::for_mode(mode).rules)?.evaluate(&body);
            if !report.passed {
                return Err(CurateError::QualityGate(report).into());
            }

            let date = issue_date.unwrap_or_else(|| chrono::Local::now().date_naive());
            let mut renderer = SlackRenderer::new();
            if !no_footer {
                renderer = renderer.with_footer(DEFAULT_FOOTER);
            }
            let issue = render_issue(&body, date, &renderer);
            let md_path = out_dir.join(issue.markdown_file_name());
            let slack_path = out_dir.join(issue.slack_file_name());
            write_output(Some(&md_path), &issue.markdown)?;
            write_output(Some(&slack_path), &issue.slack)?;
            tracing::info!(
                target: "pipeline",
                md = %md_path.display(),
                slack = %slack_path.display(),
                "issue written"
            );
            Ok(EXIT_OK)
        }
        Command::Check { feeds, sources } => {
            let registry = match sources {
                Some(p) => load_sources_from(&p)?,
                None => load_sources_default()?,
            };
            let documents = collect_documents(&registry, Arc::new(DirFetcher::new(feeds))).await;
            let report = HealthReport::from_results(&documents);
            let json = serde_json::to_string_pretty(&report).context("serializing health report")?;
            write_output(None, &json)?;
            Ok(if report.working == 0 {
                EXIT_FAILURE
            } else {
                EXIT_OK
            })
        }
    }
}

fn read_draft(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("reading draft {}", path.display()))
}

fn write_output(path: Option<&Path>, body: &str) -> Result<()> {
    match path {
        Some(p) => {
            if let Some(dir) = p.parent().filter(|d| !d.as_os_str().is_empty()) {
                std::fs::create_dir_all(dir)
                    .with_context(|| format!("creating {}", dir.display()))?;
            }
            std::fs::write(p, body).with_context(|| format!("writing {}", p.display()))
        }
        None => {
            println!("{body}");
            Ok(())
        }
    }
}
