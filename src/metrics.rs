//! Metric names and one-time descriptions.
//!
//! The library only records through the `metrics` facade. Installing a
//! recorder/exporter is up to the embedding binary.

use metrics::{describe_counter, describe_histogram};
use once_cell::sync::OnceCell;

pub const ENTRIES_TOTAL: &str = "curate_entries_total";
pub const ENTRIES_SKIPPED_TOTAL: &str = "curate_entries_skipped_total";
pub const FEED_ERRORS_TOTAL: &str = "curate_feed_errors_total";
pub const DEDUP_MERGED_TOTAL: &str = "curate_dedup_merged_total";
pub const SELECTED_TOTAL: &str = "curate_selected_total";
pub const GATE_RUNS_TOTAL: &str = "quality_gate_runs_total";
pub const GATE_FAILURES_TOTAL: &str = "quality_gate_failures_total";
pub const PARSE_MS: &str = "ingest_parse_ms";

/// One-time metrics registration (so series carry descriptions once a recorder exists).
pub fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(ENTRIES_TOTAL, "Feed entries seen by the normalizer.");
        describe_counter!(
            ENTRIES_SKIPPED_TOTAL,
            "Entries dropped for missing both title and link."
        );
        describe_counter!(FEED_ERRORS_TOTAL, "Feed documents that failed to fetch or parse.");
        describe_counter!(
            DEDUP_MERGED_TOTAL,
            "Items folded into another item's duplicate cluster."
        );
        describe_counter!(SELECTED_TOTAL, "Items admitted by the diversity selector.");
        describe_counter!(GATE_RUNS_TOTAL, "Quality gate evaluations.");
        describe_counter!(
            GATE_FAILURES_TOTAL,
            "Quality gate evaluations with at least one hard violation."
        );
        describe_histogram!(PARSE_MS, "Feed document parse time in milliseconds.");
    });
}
