//! Directory metadata for topological journals.
//!
//! A notes directory may carry a `journalmk.json` marker declaring where its
//! notes belong in the document:
//!
//! ```json
//! { "part": "Thesis", "chapter": "Background", "section": "Related work" }
//! ```
//!
//! Every key is optional and unknown keys are ignored. The metadata applies
//! to every note in the directory.
//!
//! A directory without a marker has *no* metadata (`None`), which is not the
//! same as a marker with an empty object (`Some` with every field unset).
//! Both end up in the fallback placement, but only the loader's caller can
//! tell them apart.
//!
//! ## Placement
//!
//! The builder never inspects the raw mapping. Each entry's metadata is
//! resolved once into a [`Placement`]:
//!
//! | metadata                       | placement                               |
//! |--------------------------------|-----------------------------------------|
//! | none                           | `Fallback`                              |
//! | present, no `part`             | `Fallback`                              |
//! | present, with `part`           | `Declared { part, chapter?, section? }` |

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the marker file inside a notes directory.
pub const METADATA_FILENAME: &str = "journalmk.json";

#[derive(Error, Debug)]
pub enum MetadataError {
    #[error("IO error reading {0}: {1}")]
    Io(PathBuf, #[source] std::io::Error),
    #[error("Malformed metadata in {0}: {1}")]
    Json(PathBuf, #[source] serde_json::Error),
}

/// User-declared hierarchy placement for a notes directory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub part: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chapter: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
}

/// Load the marker file from `dir`.
///
/// Returns `Ok(None)` when the directory has no marker. A marker that exists
/// but cannot be read or parsed is an error.
pub fn load(dir: &Path) -> Result<Option<DirectoryMetadata>, MetadataError> {
    let path = dir.join(METADATA_FILENAME);
    if !path.is_file() {
        return Ok(None);
    }
    let content = std::fs::read_to_string(&path).map_err(|e| MetadataError::Io(path.clone(), e))?;
    let metadata = serde_json::from_str(&content).map_err(|e| MetadataError::Json(path, e))?;
    Ok(Some(metadata))
}

/// Where an entry goes in a topological journal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Placement {
    /// The directory declared at least a part.
    Declared {
        part: String,
        chapter: Option<String>,
        section: Option<String>,
    },
    /// No usable metadata: group by time under "Unsorted".
    Fallback,
}

impl Placement {
    pub fn of(metadata: Option<&DirectoryMetadata>) -> Self {
        match metadata {
            Some(DirectoryMetadata {
                part: Some(part),
                chapter,
                section,
            }) => Placement::Declared {
                part: part.clone(),
                chapter: chapter.clone(),
                section: section.clone(),
            },
            _ => Placement::Fallback,
        }
    }
}
