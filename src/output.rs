//! CLI output formatting for the build and check commands.
//!
//! # Output Format
//!
//! ## Build
//!
//! ```text
//! 12 items (10 canonical, 2 translations, 1 draft)
//! Cache: 8 cached, 4 read (12 total)
//! Wrote 23 files, skipped 1
//! ```
//!
//! Problem lines appear only when there is something to say:
//!
//! ```text
//! 2 unreadable files skipped
//! 1 item with missing fields (see `pressa check`)
//! ```
//!
//! ## Check
//!
//! ```text
//! Checked 12 items
//! posts/hello.md: missing required field: date
//! posts/bad.md: TOML front matter: expected `=` after key
//! 2 problems
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure, no I/O and no side effects.

use crate::pipeline::{BuildSummary, CheckReport};

/// `1 item`, `2 items`. Good enough for the nouns we print.
fn count(n: usize, noun: &str) -> String {
    if n == 1 {
        format!("1 {noun}")
    } else {
        format!("{n} {noun}s")
    }
}

// ============================================================================
// Build summary
// ============================================================================

/// Format the end-of-build summary.
pub fn format_build_summary(summary: &BuildSummary) -> Vec<String> {
    let total = summary.canonical + summary.translations;
    let mut breakdown = vec![
        format!("{} canonical", summary.canonical),
        count(summary.translations, "translation"),
    ];
    if summary.drafts > 0 {
        breakdown.push(count(summary.drafts, "draft"));
    }

    let mut lines = vec![
        format!("{} ({})", count(total, "item"), breakdown.join(", ")),
        format!("Cache: {}", summary.cache_stats),
        format!(
            "Wrote {}, skipped {}",
            count(summary.files_written, "file"),
            summary.files_skipped
        ),
    ];

    if summary.read_errors > 0 {
        lines.push(format!(
            "{} skipped",
            count(summary.read_errors, "unreadable file")
        ));
    }
    if summary.invalid_items > 0 {
        lines.push(format!(
            "{} with missing fields (see `pressa check`)",
            count(summary.invalid_items, "item")
        ));
    }
    lines
}

/// Print the build summary to stdout.
pub fn print_build_summary(summary: &BuildSummary) {
    for line in format_build_summary(summary) {
        println!("{line}");
    }
}

// ============================================================================
// Check report
// ============================================================================

/// Format the check report: one line per problem, prefixed by source path.
pub fn format_check_report(report: &CheckReport) -> Vec<String> {
    let mut lines = vec![format!("Checked {}", count(report.items, "item"))];
    for (path, problem) in &report.problems {
        lines.push(format!("{}: {}", path.display(), problem));
    }
    if report.is_clean() {
        lines.push("No problems found".to_string());
    } else {
        lines.push(count(report.problems.len(), "problem"));
    }
    lines
}

/// Print the check report to stdout.
pub fn print_check_report(report: &CheckReport) {
    for line in format_check_report(report) {
        println!("{line}");
    }
}

// ============================================================================
// Tests
// ============================================================================
