//! PDF conversion cache for incremental builds.
//!
//! Exporting a note to PDF means shelling out to an external tool (Xournal++,
//! LibreOffice, a plotting script), which is by far the slowest part of a run.
//! This module decides, note by note, whether the cached PDF from a previous
//! run can be reused.
//!
//! ## Cache keys
//!
//! Every note maps to one artifact path inside the cache directory:
//!
//! ```text
//! <cache_dir>/<first 30 hex chars of SHA-224(absolute note path)>.pdf
//! ```
//!
//! The key is derived from the note's *identity* (its path), not its contents,
//! so the mapping is stable across runs and the cache directory stays flat no
//! matter what characters the original file name contains.
//!
//! ## Staleness
//!
//! An artifact is valid iff it exists **and** its modification time is not
//! older than the note's. Editing a note bumps its mtime past the artifact's,
//! which triggers a re-export on the next run. Stale artifacts are never
//! deleted; the next conversion overwrites them in place.
//!
//! ## Bypassing the cache
//!
//! Pass `--no-cache` to `build` to re-export every note regardless of
//! artifact age.

use sha2::{Digest, Sha224};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Length of the hex digest prefix used as the artifact file stem.
const KEY_LEN: usize = 30;

/// Cache key for a note: a truncated SHA-224 hex digest of its path.
pub fn cache_key(note: &Path) -> String {
    let digest = Sha224::digest(note.to_string_lossy().as_bytes());
    let mut key = format!("{:x}", digest);
    key.truncate(KEY_LEN);
    key
}

/// Artifact path for a note inside `cache_dir`.
pub fn artifact_path(cache_dir: &Path, note: &Path) -> PathBuf {
    cache_dir.join(format!("{}.pdf", cache_key(note)))
}

/// True when the artifact is missing or older than the note.
pub fn needs_render(note_modified: SystemTime, artifact: &Path) -> bool {
    match std::fs::metadata(artifact).and_then(|m| m.modified()) {
        Ok(artifact_modified) => artifact_modified < note_modified,
        Err(_) => true,
    }
}

/// Summary of cache performance for a build run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub cached: u32,
    pub rendered: u32,
    pub failed: u32,
}

impl CacheStats {
    pub fn hit(&mut self) {
        self.cached += 1;
    }

    pub fn render(&mut self) {
        self.rendered += 1;
    }

    pub fn fail(&mut self) {
        self.failed += 1;
    }

    pub fn total(&self) -> u32 {
        self.cached + self.rendered + self.failed
    }
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.cached > 0 {
            write!(f, "{} cached, {} exported", self.cached, self.rendered)?;
        } else {
            write!(f, "{} exported", self.rendered)?;
        }
        if self.failed > 0 {
            write!(f, ", {} failed", self.failed)?;
        }
        if self.cached > 0 || self.failed > 0 {
            write!(f, " ({} total)", self.total())?;
        }
        Ok(())
    }
}
