//! The journal pipeline.
//!
//! Wires the stages into one run:
//!
//! ```text
//! scan ──→ select ──→ render ──→ tree ──→ emit ──→ journal.tex
//!  │         │          │          │        │
//!  │         │          │          │        └─ preamble from template or built-in
//!  │         │          │          └─ chronological / topological grouping
//!  │         │          └─ cache check, conversion of stale notes
//!  │         └─ timestamp resolution, period filter, artifact paths
//!  └─ notes directories, notes, directory metadata
//! ```
//!
//! Every path in the configuration is resolved against a base directory,
//! normally the directory of the config file. Typesetting and viewing are
//! left to the caller; see [`crate::typeset`].

use crate::cache;
use crate::config::{ConfigError, JournalConfig, resolve_path};
use crate::convert::Converter;
use crate::emit::{self, EmitError, EmitOptions};
use crate::render::{self, RenderError, RenderReport};
use crate::scan::{self, ScanError, ScanOptions};
use crate::timestamp::{self, Period};
use crate::tree::{self, BuildError, BuildOptions, DocumentTree};
use crate::types::{Entry, Note, NoteDirectory};
use chrono::{Local, NaiveDateTime};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum JournalError {
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
    #[error("Scan error: {0}")]
    Scan(#[from] ScanError),
    #[error("Render error: {0}")]
    Render(#[from] RenderError),
    #[error("Build error: {0}")]
    Build(#[from] BuildError),
    #[error("Emit error: {0}")]
    Emit(#[from] EmitError),
}

/// Configured locations, resolved to absolute paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JournalPaths {
    pub root: PathBuf,
    pub exclude: Vec<PathBuf>,
    pub cache_dir: PathBuf,
    pub document: PathBuf,
    pub template: PathBuf,
}

impl JournalPaths {
    pub fn resolve(config: &JournalConfig, base: &Path) -> Self {
        Self {
            root: config.root_path(base),
            exclude: config.exclude_paths(base),
            cache_dir: resolve_path(base, &config.output.cache_directory),
            document: resolve_path(base, &config.output.document),
            template: resolve_path(base, &config.output.template),
        }
    }
}

/// A note that passed the period filter, with the entry it becomes.
#[derive(Debug)]
pub struct Selected<'a> {
    pub note: &'a Note,
    pub entry: Entry,
}

/// Run-time switches for [`build`].
#[derive(Debug, Clone, Copy)]
pub struct BuildSettings {
    /// Skip notes whose artifact is up to date.
    pub use_cache: bool,
    /// Reference point for `period.last_minutes`.
    pub now: NaiveDateTime,
}

impl BuildSettings {
    pub fn new(use_cache: bool) -> Self {
        Self {
            use_cache,
            now: Local::now().naive_local(),
        }
    }
}

/// Result of the document stages, without conversion.
#[derive(Debug)]
pub struct Outline {
    pub directories: Vec<NoteDirectory>,
    pub tree: DocumentTree,
}

/// What a full build did.
#[derive(Debug)]
pub struct BuildReport {
    pub directories: usize,
    pub notes: usize,
    /// Notes inside the period; each one is an entry in the tree.
    pub selected: usize,
    pub render: RenderReport,
    pub tree: DocumentTree,
    pub document: PathBuf,
}

/// Scan options for the configured tree.
///
/// The cache directory is always excluded so exported PDFs never come back as
/// notes, unless it contains the root itself.
pub fn scan_options(config: &JournalConfig, paths: &JournalPaths) -> ScanOptions {
    let mut exclude_directories = paths.exclude.clone();
    if !paths.root.starts_with(&paths.cache_dir) {
        exclude_directories.push(paths.cache_dir.clone());
    }
    ScanOptions {
        notes_directory_names: config.notes_directory_names.clone(),
        exclude_directories,
        extensions: config.note_extensions(),
        exclude_note_endings: config.exclude_note_endings.clone(),
    }
}

/// Discover notes directories and their notes.
pub fn discover(
    config: &JournalConfig,
    paths: &JournalPaths,
) -> Result<Vec<NoteDirectory>, JournalError> {
    Ok(scan::scan(&paths.root, &scan_options(config, paths))?)
}

/// Resolve timestamps, apply the period, and turn surviving notes into entries.
pub fn select<'a>(
    directories: &'a [NoteDirectory],
    config: &JournalConfig,
    period: &Period,
    cache_dir: &Path,
) -> Vec<Selected<'a>> {
    let mut selected = Vec::new();
    for dir in directories {
        for note in &dir.notes {
            let ts = timestamp::resolve(
                &note.stem(),
                timestamp::local_time(note.created),
                &config.datetime_filename_formats,
            );
            if !period.contains(ts) {
                debug!(note = %note.path.display(), %ts, "outside period");
                continue;
            }
            selected.push(Selected {
                note,
                entry: Entry {
                    label: timestamp::format_timestamp(ts, &config.formats.datetime_format),
                    note: note.path.clone(),
                    artifact: cache::artifact_path(cache_dir, &note.path),
                    timestamp: ts,
                    metadata: dir.metadata.clone(),
                },
            });
        }
    }
    selected
}

/// Scan, select, and group without converting anything.
pub fn outline(
    config: &JournalConfig,
    base: &Path,
    now: NaiveDateTime,
) -> Result<Outline, JournalError> {
    let paths = JournalPaths::resolve(config, base);
    let period = config.period.resolve(now)?;
    let directories = discover(config, &paths)?;
    let entries = select(&directories, config, &period, &paths.cache_dir)
        .into_iter()
        .map(|s| s.entry)
        .collect();
    let tree = tree::build(entries, &BuildOptions::from_config(config))?;
    Ok(Outline { directories, tree })
}

/// Run the pipeline up to and including writing the LaTeX document.
pub fn build(
    config: &JournalConfig,
    base: &Path,
    converter: &dyn Converter,
    settings: &BuildSettings,
) -> Result<BuildReport, JournalError> {
    let paths = JournalPaths::resolve(config, base);
    let period = config.period.resolve(settings.now)?;

    let directories = discover(config, &paths)?;
    let notes = directories.iter().map(|d| d.notes.len()).sum();

    let selected = select(&directories, config, &period, &paths.cache_dir);
    let to_render: Vec<&Note> = selected.iter().map(|s| s.note).collect();
    let render = render::render(&to_render, &paths.cache_dir, converter, settings.use_cache)?;

    let entries: Vec<Entry> = selected.into_iter().map(|s| s.entry).collect();
    let selected = entries.len();
    let tree = tree::build(entries, &BuildOptions::from_config(config))?;

    let preamble = emit::load_preamble(&paths.template)?;
    let options = EmitOptions {
        collapse_single_entry_sections: config.layout.collapse_single_entry_sections,
    };
    let document = emit::emit(&tree, &preamble, &options);
    emit::write_document(&paths.document, &document)?;

    Ok(BuildReport {
        directories: directories.len(),
        notes,
        selected,
        render,
        tree,
        document: paths.document,
    })
}
