//! Shared test utilities for the journalmk test suite.
//!
//! Entry builders plus document-tree lookups and title extractors.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tree = tree::build(vec![entry(at(2023, 3, 14, 9, 0))], &options)?;
//! let part = find_part(&tree, "2023");
//! assert_eq!(chapter_titles(part), vec!["March"]);
//! ```

use chrono::{NaiveDate, NaiveDateTime};
use std::path::{Path, PathBuf};

use crate::cache;
use crate::metadata::DirectoryMetadata;
use crate::tree::{Chapter, DocumentTree, Part};
use crate::types::Entry;

// =========================================================================
// Entry builders
// =========================================================================

/// Local date-time at minute precision. Panics on an invalid date.
pub fn at(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|d| d.and_hms_opt(hour, minute, 0))
        .unwrap_or_else(|| panic!("invalid test date {year}-{month}-{day} {hour}:{minute}"))
}

/// Entry without metadata, its note named after the timestamp.
pub fn entry(ts: NaiveDateTime) -> Entry {
    let note = format!("/notes/_notes/{}.pdf", ts.format("%Y-%m-%d_%H-%M-%S"));
    build_entry(ts, PathBuf::from(note), None)
}

/// Entry without metadata at an explicit note path.
pub fn entry_at_path(ts: NaiveDateTime, note: &str) -> Entry {
    build_entry(ts, PathBuf::from(note), None)
}

/// Entry carrying directory metadata.
pub fn entry_with(ts: NaiveDateTime, metadata: DirectoryMetadata) -> Entry {
    let mut e = entry(ts);
    e.metadata = Some(metadata);
    e
}

/// Metadata declaring a part and optionally a chapter and section.
pub fn declared(part: &str, chapter: Option<&str>, section: Option<&str>) -> DirectoryMetadata {
    DirectoryMetadata {
        part: Some(part.to_string()),
        chapter: chapter.map(str::to_string),
        section: section.map(str::to_string),
    }
}

fn build_entry(ts: NaiveDateTime, note: PathBuf, metadata: Option<DirectoryMetadata>) -> Entry {
    Entry {
        label: ts.format("%d. %B %Y -- %H:%M").to_string(),
        artifact: cache::artifact_path(Path::new("/cache"), &note),
        note,
        timestamp: ts,
        metadata,
    }
}

// =========================================================================
// Tree lookups (panic with a clear message on miss)
// =========================================================================

/// Find the first part with the given title. Panics if not found.
pub fn find_part<'a>(tree: &'a DocumentTree, title: &str) -> &'a Part {
    tree.parts
        .iter()
        .find(|p| p.title == title)
        .unwrap_or_else(|| panic!("part '{title}' not found. Available: {:?}", part_titles(tree)))
}

// =========================================================================
// Title extractors
// =========================================================================

pub fn part_titles(tree: &DocumentTree) -> Vec<&str> {
    tree.parts.iter().map(|p| p.title.as_str()).collect()
}

/// Chapter titles in order; untitled chapters show as `""`.
pub fn chapter_titles(part: &Part) -> Vec<&str> {
    part.chapters
        .iter()
        .map(|c| c.title.as_deref().unwrap_or(""))
        .collect()
}

/// Section titles in order; untitled sections show as `""`.
pub fn section_titles(chapter: &Chapter) -> Vec<&str> {
    chapter
        .sections
        .iter()
        .map(|s| s.title.as_deref().unwrap_or(""))
        .collect()
}
