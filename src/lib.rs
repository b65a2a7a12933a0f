//! # journalmk
//!
//! Assembles a single PDF journal from note files scattered over a project
//! tree. Notes live in notes directories (`_notes/` by default); each one is
//! exported to PDF, grouped into parts, chapters and sections, and included
//! in a generated LaTeX document with a table of contents.
//!
//! # Architecture: One Pass, Five Stages
//!
//! ```text
//! 1. Scan     project tree  →  notes directories, notes, metadata
//! 2. Select   notes         →  entries (timestamp, label, artifact path)
//! 3. Render   entries       →  tmp/<hash>.pdf        (only stale ones)
//! 4. Build    entries       →  document tree
//! 5. Emit     tree          →  journal.tex
//! ```
//!
//! Typesetting (`latexmk`) and opening the result are done by the binary
//! after stage 5. Stages 2, 4 and 5 are pure, which keeps the grouping and
//! emission logic testable without touching the filesystem or running any
//! export tool.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`journal`] | The pipeline: wires every stage into one run |
//! | [`scan`] | Stage 1: walks the project tree, finds notes directories and notes |
//! | [`timestamp`] | Stage 2: file-name timestamps with creation-time fallback, period filter |
//! | [`render`] | Stage 3: parallel export of stale notes, failure collection |
//! | [`tree`] | Stage 4: chronological and topological grouping |
//! | [`emit`] | Stage 5: LaTeX serialization of the document tree |
//! | [`cache`] | Artifact paths, staleness check, cache statistics |
//! | [`convert`] | The `Converter` seam and the command-template implementation |
//! | [`metadata`] | `journalmk.json` loading and placement resolution |
//! | [`config`] | `journalmk.toml` loading, merging over stock defaults, validation |
//! | [`typeset`] | `latexmk` invocation and the platform PDF viewer |
//! | [`types`] | Types shared between stages (`Note`, `NoteDirectory`, `Entry`) |
//! | [`output`] | CLI output formatting for scan, tree and build reports |
//!
//! # Design Decisions
//!
//! ## Content-Addressed Export Cache
//!
//! A note's PDF lives at `tmp/<first 30 hex chars of SHA-224(note path)>.pdf`.
//! The name is stable across runs and flat, whatever characters the original
//! file name contains. A note is re-exported only when its artifact is
//! missing or older than the note, so an unchanged project rebuilds without
//! running a single export command and produces a byte-identical document.
//!
//! ## Two Grouping Policies, One Tree Shape
//!
//! Chronological journals group by year, month and ISO week. Topological
//! journals follow the `part`/`chapter`/`section` declared in each notes
//! directory's `journalmk.json`; directories without a part end up in an
//! "Unsorted" part grouped by year and month. Both produce the same
//! [`tree::DocumentTree`], so the emitter has no policy-specific code.
//!
//! ## External Tools Behind Commands
//!
//! Export tools differ per note format and per machine. Instead of linking
//! any of them, every extension maps to a command template in the config:
//!
//! ```text
//! [export_commands]
//! xopp = "xournalpp {note} --create-pdf={pdf}"
//! ```
//!
//! The [`convert::Converter`] trait is the seam; tests substitute a converter
//! that writes placeholder PDFs.

pub mod cache;
pub mod config;
pub mod convert;
pub mod emit;
pub mod journal;
pub mod metadata;
pub mod output;
pub mod render;
pub mod scan;
pub mod timestamp;
pub mod tree;
pub mod typeset;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
