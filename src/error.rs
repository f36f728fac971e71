//! Pipeline error taxonomy.

use thiserror::Error;

use crate::quality::ValidationReport;

/// Process exit codes of the `newsletter-curator` binary.
pub const EXIT_OK: i32 = 0;
pub const EXIT_FAILURE: i32 = 1;
pub const EXIT_EMPTY_RESULT: i32 = 2;
pub const EXIT_QUALITY_GATE: i32 = 3;

/// Everything a run can fail with. Per-entry and per-feed problems are not
/// errors: they are counted in `CurateStats` and the run goes on.
#[derive(Error, Debug)]
pub enum CurateError {
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("no usable items: {entries} entries seen, {unique} unique after dedup, none scored above zero")]
    EmptyResult { entries: usize, unique: usize },

    #[error("quality gate rejected the draft: {}", .0.summary())]
    QualityGate(ValidationReport),

    #[error("summarizer failed: {0}")]
    Collaborator(String),
}

impl CurateError {
    pub fn config(msg: impl Into<String>) -> Self {
        CurateError::Config(msg.into())
    }

    pub fn is_empty_result(&self) -> bool {
        matches!(self, CurateError::EmptyResult { .. })
    }

    pub fn exit_code(&self) -> i32 {
        match self {
            CurateError::EmptyResult { .. } => EXIT_EMPTY_RESULT,
            CurateError::QualityGate(_) => EXIT_QUALITY_GATE,
            CurateError::Config(_) | CurateError::Collaborator(_) => EXIT_FAILURE,
        }
    }
}
