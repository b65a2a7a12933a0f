//! Document-tree construction.
//!
//! Groups the flat list of [`Entry`] values into the four-level structure the
//! emitter writes out:
//!
//! ```text
//! Part ─┬─ Chapter ─┬─ Section ─┬─ Entry
//!       │           │           └─ Entry
//!       │           └─ Section ─── Entry
//!       └─ Chapter ─── ...
//! ```
//!
//! Two policies produce the same shape:
//!
//! - [`chronological`]: year → month → ISO week, newest first at every level.
//! - [`topological`]: user-declared part/chapter/section from directory
//!   metadata, with time-derived grouping under "Unsorted" for everything else.
//!
//! Chapter and section titles are optional. A missing title means "no finer
//! grouping": the entries were declared at the part (or chapter) level only.
//!
//! Grouping never drops or duplicates an entry. [`build`] verifies this by
//! counting, and a mismatch is reported as [`BuildError::EntryCountMismatch`].
//! That error points at a defect in the grouping code, not at bad input.

pub mod chronological;
pub mod topological;

use crate::config::{FormatsConfig, JournalConfig, JournalType, UnsortedPosition};
use crate::types::Entry;
use chrono::NaiveDateTime;
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum BuildError {
    #[error("Internal error: grouped {found} entries but received {expected}")]
    EntryCountMismatch { expected: usize, found: usize },
}

/// The complete, ordered journal outline.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentTree {
    pub parts: Vec<Part>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Part {
    pub title: String,
    pub chapters: Vec<Chapter>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chapter {
    pub title: Option<String>,
    pub sections: Vec<Section>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub title: Option<String>,
    pub entries: Vec<Entry>,
}

impl DocumentTree {
    /// Every entry in document order.
    pub fn entries(&self) -> impl Iterator<Item = &Entry> {
        self.parts.iter().flat_map(Part::entries)
    }

    pub fn entry_count(&self) -> usize {
        self.entries().count()
    }
}

impl Part {
    pub fn entries(&self) -> impl Iterator<Item = &Entry> {
        self.chapters.iter().flat_map(Chapter::entries)
    }

    /// Timestamp of the most recent entry.
    pub fn latest(&self) -> Option<NaiveDateTime> {
        self.chapters.iter().filter_map(Chapter::latest).max()
    }
}

impl Chapter {
    pub fn entries(&self) -> impl Iterator<Item = &Entry> {
        self.sections.iter().flat_map(|s| s.entries.iter())
    }

    pub fn latest(&self) -> Option<NaiveDateTime> {
        self.sections.iter().filter_map(Section::latest).max()
    }
}

impl Section {
    pub fn latest(&self) -> Option<NaiveDateTime> {
        self.entries.iter().map(|e| e.timestamp).max()
    }
}

/// Everything the builder needs from the configuration.
#[derive(Debug, Clone, Default)]
pub struct BuildOptions {
    pub journal_type: JournalType,
    pub formats: FormatsConfig,
    pub unsorted_position: UnsortedPosition,
    pub unsorted_newest_first: bool,
}

impl BuildOptions {
    pub fn from_config(config: &JournalConfig) -> Self {
        Self {
            journal_type: config.journal_type,
            formats: config.formats.clone(),
            unsorted_position: config.layout.unsorted_position,
            unsorted_newest_first: config.layout.unsorted_newest_first,
        }
    }
}

/// Group `entries` into a document tree under the configured policy.
pub fn build(entries: Vec<Entry>, options: &BuildOptions) -> Result<DocumentTree, BuildError> {
    let expected = entries.len();
    let tree = match options.journal_type {
        JournalType::Chronological => chronological::build(entries, &options.formats),
        JournalType::Topological => topological::build(entries, options),
    };
    verify_count(expected, &tree)?;
    Ok(tree)
}

fn verify_count(expected: usize, tree: &DocumentTree) -> Result<(), BuildError> {
    let found = tree.entry_count();
    if found != expected {
        return Err(BuildError::EntryCountMismatch { expected, found });
    }
    Ok(())
}

/// Sort entries newest first; ties broken by note path for stable output.
pub(crate) fn sort_entries(entries: &mut [Entry]) {
    entries.sort_by(|a, b| {
        b.timestamp
            .cmp(&a.timestamp)
            .then_with(|| a.note.cmp(&b.note))
    });
}

/// Stable sort by each item's latest timestamp.
pub(crate) fn sort_by_recency<T>(
    items: &mut [T],
    latest: impl Fn(&T) -> Option<NaiveDateTime>,
    newest_first: bool,
) {
    items.sort_by(|a, b| {
        let ord = latest(a).cmp(&latest(b));
        if newest_first { ord.reverse() } else { ord }
    });
}

/// Named buckets in key order plus one designated loose bucket.
///
/// The loose bucket holds whatever has no key at this level: the "Unsorted"
/// part among parts, or the entries declared without a chapter/section
/// within a part. Its position in the ordered output is explicit instead of
/// being encoded as a sentinel key.
#[derive(Debug)]
pub(crate) struct Shelf<V> {
    named: BTreeMap<String, V>,
    loose: Option<V>,
}

impl<V> Default for Shelf<V> {
    fn default() -> Self {
        Self {
            named: BTreeMap::new(),
            loose: None,
        }
    }
}

impl<V: Default> Shelf<V> {
    /// The bucket for `key`, created on first use; `None` is the loose bucket.
    pub(crate) fn slot(&mut self, key: Option<String>) -> &mut V {
        match key {
            Some(key) => self.named.entry(key).or_default(),
            None => self.loose.get_or_insert_with(V::default),
        }
    }
}

impl<V> Shelf<V> {
    /// Named buckets in key order, with the loose bucket placed at `loose_at`.
    pub(crate) fn into_ordered(self, loose_at: UnsortedPosition) -> Vec<(Option<String>, V)> {
        let mut ordered: Vec<(Option<String>, V)> = self
            .named
            .into_iter()
            .map(|(key, value)| (Some(key), value))
            .collect();
        if let Some(loose) = self.loose {
            match loose_at {
                UnsortedPosition::Front => ordered.insert(0, (None, loose)),
                UnsortedPosition::Back => ordered.push((None, loose)),
            }
        }
        ordered
    }
}
