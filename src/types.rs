//! Shared types passed between pipeline stages.
//!
//! Scanning produces [`NoteDirectory`] values holding [`Note`]s. Selection
//! turns the notes that pass every filter into [`Entry`] values. Those are
//! what the tree builder groups and the emitter writes out.

use crate::metadata::DirectoryMetadata;
use chrono::NaiveDateTime;
use std::path::PathBuf;
use std::time::SystemTime;

/// One source file found in a notes directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Note {
    /// Absolute path of the note.
    pub path: PathBuf,
    /// The configured extension this note matched; selects the export command.
    pub extension: String,
    pub modified: SystemTime,
    /// Creation time, or the modification time where the filesystem has none.
    pub created: SystemTime,
}

impl Note {
    /// File name without the matched extension.
    ///
    /// `2024-03-14.tar.gz` with extension `tar.gz` yields `2024-03-14`.
    pub fn stem(&self) -> String {
        let name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        name.strip_suffix(&format!(".{}", self.extension))
            .map(str::to_string)
            .unwrap_or(name)
    }
}

/// A discovered notes directory with its notes, sorted by file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteDirectory {
    pub path: PathBuf,
    pub metadata: Option<DirectoryMetadata>,
    pub notes: Vec<Note>,
}

/// The unit the document-tree builder groups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// Timestamp formatted with the configured datetime pattern.
    pub label: String,
    pub note: PathBuf,
    pub artifact: PathBuf,
    pub timestamp: NaiveDateTime,
    pub metadata: Option<DirectoryMetadata>,
}

impl Entry {
    /// Artifact file stem; doubles as a unique LaTeX label suffix.
    pub fn artifact_stem(&self) -> String {
        self.artifact
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default()
    }
}
