//! PDF export of selected notes.
//!
//! Stage 2 of the journal pipeline. For every note that made it past the
//! filters, consult the [`cache`](crate::cache) and run the
//! [`Converter`] only for notes whose artifact is missing or stale.
//!
//! Conversions run in parallel on the rayon pool configured by
//! `processing.max_processes`. Each note owns a unique artifact path, so no
//! two conversions touch the same file. Results are collected in input order,
//! which keeps the report deterministic.
//!
//! A failing conversion never aborts the run: it is recorded as a
//! [`RenderFailure`] and the remaining notes are still processed.

use crate::cache::{self, CacheStats};
use crate::convert::{ConvertError, Converter};
use crate::types::Note;
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Cannot create cache directory {0}: {1}")]
    CacheDir(PathBuf, #[source] std::io::Error),
}

/// A note whose export failed.
#[derive(Debug)]
pub struct RenderFailure {
    pub note: PathBuf,
    pub error: ConvertError,
}

/// Outcome of the render stage.
#[derive(Debug, Default)]
pub struct RenderReport {
    pub stats: CacheStats,
    pub failures: Vec<RenderFailure>,
}

enum Outcome {
    Cached,
    Rendered,
    Failed(ConvertError),
}

/// Export every stale note into `cache_dir`.
///
/// With `use_cache == false` every note is exported regardless of artifact age.
pub fn render(
    notes: &[&Note],
    cache_dir: &Path,
    converter: &dyn Converter,
    use_cache: bool,
) -> Result<RenderReport, RenderError> {
    std::fs::create_dir_all(cache_dir)
        .map_err(|e| RenderError::CacheDir(cache_dir.to_path_buf(), e))?;

    let outcomes: Vec<Outcome> = notes
        .par_iter()
        .map(|note| {
            let artifact = cache::artifact_path(cache_dir, &note.path);
            if use_cache && !cache::needs_render(note.modified, &artifact) {
                debug!(note = %note.path.display(), "artifact up to date");
                return Outcome::Cached;
            }
            match converter.convert(note, &artifact) {
                Ok(()) => Outcome::Rendered,
                Err(error) => {
                    warn!(note = %note.path.display(), %error, "export failed");
                    Outcome::Failed(error)
                }
            }
        })
        .collect();

    let mut report = RenderReport::default();
    for (note, outcome) in notes.iter().zip(outcomes) {
        match outcome {
            Outcome::Cached => report.stats.hit(),
            Outcome::Rendered => report.stats.render(),
            Outcome::Failed(error) => {
                report.stats.fail();
                report.failures.push(RenderFailure {
                    note: note.path.clone(),
                    error,
                });
            }
        }
    }
    Ok(report)
}
