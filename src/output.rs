//! CLI output formatting for all pipeline stages.
//!
//! # Information-First Display
//!
//! Every entity (notes directory, part, chapter, section, entry) leads with
//! its positional index and title. Filesystem paths are secondary context on
//! indented `Source:` lines, shown relative to the journal root.
//!
//! # Output Format
//!
//! ## Scan
//!
//! ```text
//! Notes directories
//! 001 alpha/_notes (2 notes)
//!     Metadata: part "Thesis", chapter "Background"
//!     001 2023-01-05.pdf
//!     002 2023-02-10_14-30-00.pdf
//! 002 beta/_notes (1 note)
//!     001 2024-01-01.pdf
//! ```
//!
//! ## Tree
//!
//! ```text
//! 001 2024
//!     001 January
//!         001 Week 01
//!             001 01. January 2024 -- 00:00
//!                 Source: beta/_notes/2024-01-01.pdf
//! 1 entry in total
//! ```
//!
//! ## Build
//!
//! ```text
//! Found 3 notes in 2 directories, 3 selected
//! Cache: 1 cached, 1 exported, 1 failed (3 total)
//! Failed exports
//!     alpha/_notes/sketch.odt
//!         Command 'soffice ...' failed (exit status: 1): ...
//! Wrote journal.tex (3 entries)
//! ```
//!
//! # Architecture
//!
//! Each report has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O, no side effects.

use crate::journal::BuildReport;
use crate::metadata::DirectoryMetadata;
use crate::tree::DocumentTree;
use crate::types::NoteDirectory;
use std::path::Path;

// ============================================================================
// Shared display helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// `1 note`, `2 notes`.
fn counted(n: usize, singular: &str, plural: &str) -> String {
    if n == 1 {
        format!("{n} {singular}")
    } else {
        format!("{n} {plural}")
    }
}

/// Path relative to `root` when below it, otherwise as given.
fn display_path(path: &Path, root: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .to_string_lossy()
        .to_string()
}

/// `part "Thesis", chapter "Background"`; `None` for an empty mapping.
fn metadata_summary(metadata: &DirectoryMetadata) -> Option<String> {
    let fields: Vec<String> = [
        ("part", &metadata.part),
        ("chapter", &metadata.chapter),
        ("section", &metadata.section),
    ]
    .into_iter()
    .filter_map(|(key, value)| value.as_ref().map(|v| format!("{key} \"{v}\"")))
    .collect();
    (!fields.is_empty()).then(|| fields.join(", "))
}

// ============================================================================
// Scan output
// ============================================================================

/// Format the discovered notes directories with their notes.
pub fn format_scan_output(directories: &[NoteDirectory], root: &Path) -> Vec<String> {
    let mut lines = vec!["Notes directories".to_string()];
    if directories.is_empty() {
        lines.push(format!("{}(none)", indent(1)));
        return lines;
    }

    for (i, dir) in directories.iter().enumerate() {
        lines.push(format!(
            "{} {} ({})",
            format_index(i + 1),
            display_path(&dir.path, root),
            counted(dir.notes.len(), "note", "notes")
        ));
        if let Some(summary) = dir.metadata.as_ref().and_then(metadata_summary) {
            lines.push(format!("{}Metadata: {}", indent(1), summary));
        }
        for (j, note) in dir.notes.iter().enumerate() {
            let name = note
                .path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();
            lines.push(format!("{}{} {}", indent(1), format_index(j + 1), name));
        }
    }
    lines
}

pub fn print_scan_output(directories: &[NoteDirectory], root: &Path) {
    for line in format_scan_output(directories, root) {
        println!("{}", line);
    }
}

// ============================================================================
// Tree output
// ============================================================================

/// Format the document outline.
///
/// Untitled chapters and sections show as `(no chapter)` / `(no section)`.
pub fn format_tree_outline(tree: &DocumentTree, root: &Path) -> Vec<String> {
    let mut lines = Vec::new();
    for (p, part) in tree.parts.iter().enumerate() {
        lines.push(format!("{} {}", format_index(p + 1), part.title));
        for (c, chapter) in part.chapters.iter().enumerate() {
            let title = chapter.title.as_deref().unwrap_or("(no chapter)");
            lines.push(format!("{}{} {}", indent(1), format_index(c + 1), title));
            for (s, section) in chapter.sections.iter().enumerate() {
                let title = section.title.as_deref().unwrap_or("(no section)");
                lines.push(format!("{}{} {}", indent(2), format_index(s + 1), title));
                for (e, entry) in section.entries.iter().enumerate() {
                    lines.push(format!(
                        "{}{} {}",
                        indent(3),
                        format_index(e + 1),
                        entry.label
                    ));
                    lines.push(format!(
                        "{}Source: {}",
                        indent(4),
                        display_path(&entry.note, root)
                    ));
                }
            }
        }
    }
    lines.push(format!(
        "{} in total",
        counted(tree.entry_count(), "entry", "entries")
    ));
    lines
}

pub fn print_tree_outline(tree: &DocumentTree, root: &Path) {
    for line in format_tree_outline(tree, root) {
        println!("{}", line);
    }
}

// ============================================================================
// Build output
// ============================================================================

/// Format the summary of a full build.
pub fn format_build_report(report: &BuildReport, root: &Path) -> Vec<String> {
    let mut lines = vec![
        format!(
            "Found {} in {}, {} selected",
            counted(report.notes, "note", "notes"),
            counted(report.directories, "directory", "directories"),
            report.selected
        ),
        format!("Cache: {}", report.render.stats),
    ];

    if !report.render.failures.is_empty() {
        lines.push("Failed exports".to_string());
        for failure in &report.render.failures {
            lines.push(format!("{}{}", indent(1), display_path(&failure.note, root)));
            lines.push(format!("{}{}", indent(2), failure.error));
        }
    }

    lines.push(format!(
        "Wrote {} ({})",
        display_path(&report.document, root),
        counted(report.tree.entry_count(), "entry", "entries")
    ));
    lines
}

pub fn print_build_report(report: &BuildReport, root: &Path) {
    for line in format_build_report(report, root) {
        println!("{}", line);
    }
}
