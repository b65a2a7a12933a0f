//! Notes discovery.
//!
//! Stage 1 of the journal pipeline. Walks the project tree below the root,
//! collects notes directories, and lists the convertible notes inside each.
//!
//! ```text
//! projects/                        # root_directory
//! ├── project_a/
//! │   ├── src/
//! │   └── _notes/                  # notes directory (name configured)
//! │       ├── journalmk.json       # optional placement metadata
//! │       ├── 2024-03-14.xopp      # note (extension has an export command)
//! │       ├── 2024-03-14.xopp~     # ignored: no export command
//! │       └── plot.py              # note, dated by creation time
//! └── archive/                     # excluded directory: never walked
//!     └── _notes/
//! ```
//!
//! With an empty `notes_directory_names` list every directory below the root
//! is a notes directory. Directories are visited in file-name order and notes
//! are sorted by file name, so repeated runs see the same sequence.

use crate::metadata::{self, MetadataError};
use crate::types::{Note, NoteDirectory};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Directory walk failed: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("Metadata error: {0}")]
    Metadata(#[from] MetadataError),
    #[error("'{0}' is not a directory")]
    RootNotDirectory(PathBuf),
}

/// Filters applied during discovery.
#[derive(Debug, Clone, Default)]
pub struct ScanOptions {
    /// Names of notes directories; empty = every directory below the root.
    pub notes_directory_names: Vec<String>,
    /// Absolute paths whose subtrees are skipped.
    pub exclude_directories: Vec<PathBuf>,
    /// Extensions that have an export command.
    pub extensions: Vec<String>,
    /// File-name endings that are never notes.
    pub exclude_note_endings: Vec<String>,
}

/// Discover every notes directory below `root` with its metadata and notes.
pub fn scan(root: &Path, options: &ScanOptions) -> Result<Vec<NoteDirectory>, ScanError> {
    let dirs = find_note_directories(root, options)?;
    let mut found = Vec::with_capacity(dirs.len());
    for path in dirs {
        let notes = find_notes(&path, options)?;
        let metadata = metadata::load(&path)?;
        debug!(dir = %path.display(), notes = notes.len(), has_metadata = metadata.is_some(), "notes directory");
        found.push(NoteDirectory {
            path,
            metadata,
            notes,
        });
    }
    Ok(found)
}

/// Walk `root` and return the notes directories in walk order.
pub fn find_note_directories(root: &Path, options: &ScanOptions) -> Result<Vec<PathBuf>, ScanError> {
    if !root.is_dir() {
        return Err(ScanError::RootNotDirectory(root.to_path_buf()));
    }

    let walker = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !is_excluded(e.path(), &options.exclude_directories));

    let mut dirs = Vec::new();
    for entry in walker {
        let entry = entry?;
        if entry.depth() == 0 || !entry.file_type().is_dir() {
            continue;
        }
        let name = entry.file_name().to_string_lossy();
        if options.notes_directory_names.is_empty()
            || options.notes_directory_names.iter().any(|n| *n == name)
        {
            dirs.push(entry.into_path());
        }
    }
    Ok(dirs)
}

fn is_excluded(path: &Path, excluded: &[PathBuf]) -> bool {
    excluded.iter().any(|ex| path.starts_with(ex))
}

/// List the notes directly inside `dir`, sorted by file name.
///
/// A file is a note when its name ends in `.<ext>` for a configured extension
/// and does not end in any excluded ending. When several extensions match,
/// the longest one wins (`plot.py` over `py`).
pub fn find_notes(dir: &Path, options: &ScanOptions) -> Result<Vec<Note>, ScanError> {
    let mut paths: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_file())
        .collect();
    paths.sort();

    let mut notes = Vec::new();
    for path in paths {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        if options
            .exclude_note_endings
            .iter()
            .any(|ending| name.ends_with(ending.as_str()))
        {
            continue;
        }
        let Some(extension) = match_extension(&name, &options.extensions) else {
            continue;
        };

        let meta = fs::metadata(&path)?;
        let modified = meta.modified()?;
        let created = meta.created().unwrap_or(modified);
        notes.push(Note {
            path,
            extension: extension.to_string(),
            modified,
            created,
        });
    }
    Ok(notes)
}

fn match_extension<'a>(name: &str, extensions: &'a [String]) -> Option<&'a str> {
    extensions
        .iter()
        .filter(|ext| {
            name.len() > ext.len() + 1
                && name.ends_with(ext.as_str())
                && name[..name.len() - ext.len()].ends_with('.')
        })
        .max_by_key(|ext| ext.len())
        .map(String::as_str)
}
