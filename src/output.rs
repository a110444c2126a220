//! CLI output formatting for the export summary.
//!
//! Progress while the run is underway goes through `tracing`; this module
//! renders the end-of-run summary printed to stdout. Output is recipe-first:
//! each line leads with the recipe name, and the files written for it follow
//! as indented context, relative to their output directories.
//!
//! ```text
//! Exported
//! 001 Weeknight Dal
//!     Markdown: weeknight-dal.md
//!     Archive: Weeknight Dal.paprikarecipe
//! 002 Banana Bread
//!     Markdown: banana-bread.md
//!     Archive: Banana Bread.paprikarecipe
//!     Photo: unavailable
//!
//! Failed
//! 001 Apple Pie
//!     archive: IO error: Is a directory (os error 21)
//!
//! 2 exported, 1 failed (3 changed of 120 recipes)
//! ```
//!
//! Each output has a `format_*` function returning lines, for tests, and a
//! `print_*` wrapper that writes them to stdout.

use crate::export::ExportReport;
use std::path::Path;

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// A written path relative to its output directory, for display.
fn relative(path: &Path, root: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .display()
        .to_string()
}

/// Format the summary of an export run.
pub fn format_report(report: &ExportReport, markdown_root: &Path, archive_root: &Path) -> Vec<String> {
    let mut lines = Vec::new();

    if !report.exported.is_empty() {
        lines.push("Exported".to_string());
        for (i, recipe) in report.exported.iter().enumerate() {
            lines.push(format!("{} {}", format_index(i + 1), recipe.name));
            lines.push(format!(
                "    Markdown: {}",
                relative(&recipe.markdown, markdown_root)
            ));
            lines.push(format!(
                "    Archive: {}",
                relative(&recipe.archive, archive_root)
            ));
            if recipe.photo_unavailable {
                lines.push("    Photo: unavailable".to_string());
            }
        }
        lines.push(String::new());
    }

    if !report.failures.is_empty() {
        lines.push("Failed".to_string());
        let mut position = 0;
        let mut previous: Option<&str> = None;
        for failure in &report.failures {
            // Both artifacts of one recipe group under a single header.
            if previous != Some(failure.name.as_str()) {
                position += 1;
                lines.push(format!("{} {}", format_index(position), failure.name));
                previous = Some(&failure.name);
            }
            lines.push(format!("    {}: {}", failure.artifact, failure.error));
        }
        lines.push(String::new());
    }

    lines.push(report.to_string());
    lines
}

pub fn print_report(report: &ExportReport, markdown_root: &Path, archive_root: &Path) {
    for line in format_report(report, markdown_root, archive_root) {
        println!("{line}");
    }
}
