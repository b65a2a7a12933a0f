//! Metadata grouping with a time-derived fallback.
//!
//! Entries whose directory declares a `part` go where the metadata says.
//! Everything else lands in the "Unsorted" part, grouped by year and then by
//! month:
//!
//! ```text
//! Thesis                      ← declared parts, alphabetical
//! ├─ (no chapter)             ← declared at part level only, always first
//! ├─ Background
//! │  ├─ (no section)
//! │  └─ Related work
//! └─ Methods
//! Unsorted                    ← front or back, per layout.unsorted_position
//! ├─ 2024                     ← by recency, newest first by default
//! │  └─ March 2024
//! └─ 2023
//! ```

use super::{
    BuildOptions, Chapter, DocumentTree, Part, Section, Shelf, sort_by_recency, sort_entries,
};
use crate::config::UnsortedPosition;
use crate::metadata::Placement;
use crate::timestamp::format_timestamp;
use crate::types::Entry;

/// Title of the part collecting entries without a declared part.
pub const UNSORTED_PART: &str = "Unsorted";
/// Chapter pattern for unsorted entries.
pub const FALLBACK_CHAPTER_FORMAT: &str = "%Y";
/// Section pattern for unsorted entries.
pub const FALLBACK_SECTION_FORMAT: &str = "%B %Y";

type Sections = Shelf<Vec<Entry>>;
type Chapters = Shelf<Sections>;

pub fn build(entries: Vec<Entry>, options: &BuildOptions) -> DocumentTree {
    let mut shelf: Shelf<Chapters> = Shelf::default();
    for entry in entries {
        let (part, chapter, section) = match Placement::of(entry.metadata.as_ref()) {
            Placement::Declared {
                part,
                chapter,
                section,
            } => (Some(part), chapter, section),
            Placement::Fallback => (
                None,
                Some(format_timestamp(entry.timestamp, FALLBACK_CHAPTER_FORMAT)),
                Some(format_timestamp(entry.timestamp, FALLBACK_SECTION_FORMAT)),
            ),
        };
        shelf.slot(part).slot(chapter).slot(section).push(entry);
    }

    let parts = shelf
        .into_ordered(options.unsorted_position)
        .into_iter()
        .map(|(title, chapters)| match title {
            Some(title) => Part {
                title,
                chapters: declared_chapters(chapters),
            },
            None => Part {
                title: UNSORTED_PART.to_string(),
                chapters: unsorted_chapters(chapters, options.unsorted_newest_first),
            },
        })
        .collect();

    DocumentTree { parts }
}

/// Alphabetical, with the untitled chapter (and section) first.
fn declared_chapters(chapters: Chapters) -> Vec<Chapter> {
    chapters
        .into_ordered(UnsortedPosition::Front)
        .into_iter()
        .map(|(title, sections)| Chapter {
            title,
            sections: declared_sections(sections),
        })
        .collect()
}

fn declared_sections(sections: Sections) -> Vec<Section> {
    sections
        .into_ordered(UnsortedPosition::Front)
        .into_iter()
        .map(|(title, mut entries)| {
            sort_entries(&mut entries);
            Section { title, entries }
        })
        .collect()
}

fn unsorted_chapters(chapters: Chapters, newest_first: bool) -> Vec<Chapter> {
    let mut chapters = declared_chapters(chapters);
    for chapter in &mut chapters {
        sort_by_recency(&mut chapter.sections, Section::latest, newest_first);
    }
    sort_by_recency(&mut chapters, Chapter::latest, newest_first);
    chapters
}
