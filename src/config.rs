//! Journal configuration.
//!
//! Handles loading, validating, and merging `journalmk.toml`. Stock defaults
//! are the base layer; the user's file only needs the keys it wants to
//! override. The merged result is validated once and then passed by reference
//! to every pipeline stage. There is no global configuration state.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! root_directory = "."                  # Project tree to search for notes
//! notes_directory_names = ["_notes"]    # Empty list = every subdirectory
//! exclude_directories = []              # Subtrees to skip entirely
//! exclude_note_endings = []             # e.g. [".autosave.xopp"]
//! datetime_filename_formats = ["%Y-%m-%d_%H-%M-%S", "%Y-%m-%d"]
//! journal_type = "chronological"        # or "topological"
//!
//! [formats]
//! datetime_format = "%d. %B %Y -- %H:%M"
//! week_format = "Week %V"
//! month_format = "%B"
//! year_format = "%Y"
//!
//! [period]
//! # start = "2024-01-01--00-00"
//! # end = "2024-12-31--23-59"
//! # last_minutes = 10080
//!
//! [export_commands]
//! pdf = "cp {note} {pdf}"
//!
//! [inplace_export_commands]
//! # odt = "soffice --headless --convert-to pdf --outdir {outdir} {note}"
//!
//! [layout]
//! unsorted_position = "back"
//! unsorted_newest_first = true
//! collapse_single_entry_sections = false
//!
//! [output]
//! cache_directory = "tmp"
//! document = "journal.tex"
//! template = "journal_template.tex"
//!
//! [typeset]
//! command = ["latexmk", "-norc", "-pdf"]
//! open = true
//!
//! [processing]
//! # max_processes = 4
//! ```
//!
//! Relative paths are resolved against the directory holding the config file.
//! Unknown keys are rejected to catch typos early. The two command tables
//! do not merge with the stock `pdf` entry: declaring either one replaces
//! both.

use crate::timestamp::Period;
use chrono::format::{Item, StrftimeItems};
use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default name of the configuration file.
pub const CONFIG_FILENAME: &str = "journalmk.toml";

/// Date format accepted by `period.start` and `period.end`.
pub const PERIOD_DATE_FORMAT: &str = "%Y-%m-%d--%H-%M";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Journal configuration loaded from `journalmk.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct JournalConfig {
    /// Project tree searched for notes directories.
    pub root_directory: String,
    /// Names of notes directories. Empty means every directory below the root.
    pub notes_directory_names: Vec<String>,
    /// Directories (and everything beneath them) that are never searched.
    pub exclude_directories: Vec<String>,
    /// File-name endings that disqualify an otherwise convertible note.
    pub exclude_note_endings: Vec<String>,
    /// strftime patterns tried against each note's file stem, in order.
    pub datetime_filename_formats: Vec<String>,
    /// Grouping policy for the document tree.
    pub journal_type: JournalType,
    /// Label patterns for each tree level.
    pub formats: FormatsConfig,
    /// Optional time window; notes outside it are skipped.
    pub period: PeriodConfig,
    /// Extension → command writing the PDF straight to `{pdf}`.
    pub export_commands: BTreeMap<String, String>,
    /// Extension → command writing `<stem>.pdf` into `{outdir}`.
    pub inplace_export_commands: BTreeMap<String, String>,
    pub layout: LayoutConfig,
    pub output: OutputConfig,
    pub typeset: TypesetConfig,
    pub processing: ProcessingConfig,
}

impl Default for JournalConfig {
    fn default() -> Self {
        Self {
            root_directory: ".".to_string(),
            notes_directory_names: vec!["_notes".to_string()],
            exclude_directories: Vec::new(),
            exclude_note_endings: Vec::new(),
            datetime_filename_formats: vec![
                "%Y-%m-%d_%H-%M-%S".to_string(),
                "%Y-%m-%d".to_string(),
            ],
            journal_type: JournalType::default(),
            formats: FormatsConfig::default(),
            period: PeriodConfig::default(),
            export_commands: BTreeMap::from([("pdf".to_string(), "cp {note} {pdf}".to_string())]),
            inplace_export_commands: BTreeMap::new(),
            layout: LayoutConfig::default(),
            output: OutputConfig::default(),
            typeset: TypesetConfig::default(),
            processing: ProcessingConfig::default(),
        }
    }
}

impl JournalConfig {
    /// Validate patterns, commands, and the period window.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for pattern in &self.datetime_filename_formats {
            validate_pattern("datetime_filename_formats", pattern)?;
        }
        validate_pattern("formats.datetime_format", &self.formats.datetime_format)?;
        validate_pattern("formats.week_format", &self.formats.week_format)?;
        validate_pattern("formats.month_format", &self.formats.month_format)?;
        validate_pattern("formats.year_format", &self.formats.year_format)?;

        if self.export_commands.is_empty() && self.inplace_export_commands.is_empty() {
            return Err(ConfigError::Validation(
                "at least one export command must be configured".into(),
            ));
        }
        for (ext, command) in &self.export_commands {
            if self.inplace_export_commands.contains_key(ext) {
                return Err(ConfigError::Validation(format!(
                    "extension '{ext}' is configured in both export_commands and inplace_export_commands"
                )));
            }
            require_placeholders("export_commands", ext, command, &["{note}", "{pdf}"])?;
        }
        for (ext, command) in &self.inplace_export_commands {
            require_placeholders(
                "inplace_export_commands",
                ext,
                command,
                &["{note}", "{outdir}"],
            )?;
        }

        if self.typeset.command.is_empty() {
            return Err(ConfigError::Validation(
                "typeset.command must not be empty".into(),
            ));
        }

        // Surfaces bad dates before any filesystem work.
        self.period.resolve(NaiveDateTime::default())?;
        Ok(())
    }

    /// Resolve `root_directory` against `base` (the config file's directory).
    pub fn root_path(&self, base: &Path) -> PathBuf {
        resolve_path(base, &self.root_directory)
    }

    /// Resolve every `exclude_directories` entry against `base`.
    pub fn exclude_paths(&self, base: &Path) -> Vec<PathBuf> {
        self.exclude_directories
            .iter()
            .map(|dir| resolve_path(base, dir))
            .collect()
    }

    /// Every extension that has a conversion command: direct exports first,
    /// then in-place ones.
    pub fn note_extensions(&self) -> Vec<String> {
        self.export_commands
            .keys()
            .chain(self.inplace_export_commands.keys())
            .cloned()
            .collect()
    }
}

fn validate_pattern(key: &str, pattern: &str) -> Result<(), ConfigError> {
    if StrftimeItems::new(pattern).any(|item| matches!(item, Item::Error)) {
        return Err(ConfigError::Validation(format!(
            "{key}: invalid datetime pattern '{pattern}'"
        )));
    }
    Ok(())
}

fn require_placeholders(
    table: &str,
    ext: &str,
    command: &str,
    placeholders: &[&str],
) -> Result<(), ConfigError> {
    for placeholder in placeholders {
        if !command.contains(placeholder) {
            return Err(ConfigError::Validation(format!(
                "{table}.{ext} must contain {placeholder}"
            )));
        }
    }
    Ok(())
}

/// Join a configured path onto `base` unless it is already absolute.
pub fn resolve_path(base: &Path, configured: &str) -> PathBuf {
    let path = Path::new(configured);
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    };
    std::path::absolute(&joined).unwrap_or(joined)
}

/// Grouping policy for the document tree.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JournalType {
    /// Year → month → ISO week.
    #[default]
    Chronological,
    /// Directory metadata, with a time-derived "Unsorted" fallback.
    Topological,
}

/// strftime patterns used to label each level of the document tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FormatsConfig {
    /// Label of an individual entry.
    pub datetime_format: String,
    /// Chronological section label.
    pub week_format: String,
    /// Chronological chapter label.
    pub month_format: String,
    /// Chronological part label.
    pub year_format: String,
}

impl Default for FormatsConfig {
    fn default() -> Self {
        Self {
            datetime_format: "%d. %B %Y -- %H:%M".to_string(),
            week_format: "Week %V".to_string(),
            month_format: "%B".to_string(),
            year_format: "%Y".to_string(),
        }
    }
}

/// Time window selecting which notes make it into the journal.
///
/// Either give explicit `start`/`end` bounds (each optional, inclusive) or
/// `last_minutes` for a window ending at the time of the run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PeriodConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_minutes: Option<u64>,
}

impl PeriodConfig {
    /// Turn the configured window into a [`Period`] relative to `now`.
    pub fn resolve(&self, now: NaiveDateTime) -> Result<Period, ConfigError> {
        if let Some(minutes) = self.last_minutes {
            if self.start.is_some() || self.end.is_some() {
                return Err(ConfigError::Validation(
                    "period.last_minutes cannot be combined with period.start/end".into(),
                ));
            }
            let minutes = i64::try_from(minutes).map_err(|_| {
                ConfigError::Validation("period.last_minutes is too large".into())
            })?;
            let start = Duration::try_minutes(minutes)
                .and_then(|span| now.checked_sub_signed(span))
                .ok_or_else(|| {
                    ConfigError::Validation("period.last_minutes is too large".into())
                })?;
            return Ok(Period::new(Some(start), Some(now)));
        }

        let start = parse_period_date("period.start", self.start.as_deref())?;
        let end = parse_period_date("period.end", self.end.as_deref())?;
        if let (Some(s), Some(e)) = (start, end)
            && s > e
        {
            return Err(ConfigError::Validation(
                "period.start must not be after period.end".into(),
            ));
        }
        Ok(Period::new(start, end))
    }
}

fn parse_period_date(key: &str, value: Option<&str>) -> Result<Option<NaiveDateTime>, ConfigError> {
    value
        .map(|v| {
            NaiveDateTime::parse_from_str(v, PERIOD_DATE_FORMAT).map_err(|e| {
                ConfigError::Validation(format!(
                    "{key}: '{v}' does not match {PERIOD_DATE_FORMAT} ({e})"
                ))
            })
        })
        .transpose()
}

/// Where the "Unsorted" part goes relative to the declared parts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnsortedPosition {
    Front,
    #[default]
    Back,
}

/// Document layout choices.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LayoutConfig {
    /// Position of the topological "Unsorted" part.
    pub unsorted_position: UnsortedPosition,
    /// Order the "Unsorted" part's chapters and sections newest first.
    pub unsorted_newest_first: bool,
    /// Let a section holding a single entry use that entry as its heading.
    pub collapse_single_entry_sections: bool,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            unsorted_position: UnsortedPosition::Back,
            unsorted_newest_first: true,
            collapse_single_entry_sections: false,
        }
    }
}

/// Output file locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    /// Directory holding the cached per-note PDFs.
    pub cache_directory: String,
    /// Generated LaTeX source.
    pub document: String,
    /// Optional preamble replacing the built-in one when the file exists.
    pub template: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            cache_directory: "tmp".to_string(),
            document: "journal.tex".to_string(),
            template: "journal_template.tex".to_string(),
        }
    }
}

/// Typesetting of the generated document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TypesetConfig {
    /// Program and arguments; the document path is appended.
    pub command: Vec<String>,
    /// Open the finished PDF in the platform viewer.
    pub open: bool,
}

impl Default for TypesetConfig {
    fn default() -> Self {
        Self {
            command: vec!["latexmk".into(), "-norc".into(), "-pdf".into()],
            open: true,
        }
    }
}

/// Parallel conversion settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of conversions running at once.
    /// When absent, defaults to the number of CPU cores.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)`, never less than one
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config
        .max_processes
        .map(|n| n.clamp(1, cores))
        .unwrap_or(cores)
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(JournalConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load a config file as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Tables describing the full set of export commands.
///
/// An overlay naming either of them replaces both base tables instead of
/// merging into them, so a user config owns the complete command set.
const COMMAND_TABLES: [&str; 2] = ["export_commands", "inplace_export_commands"];

/// Drop the base command tables when `overlay` declares any of them.
fn strip_replaced_commands(base: toml::Value, overlay: &toml::Value) -> toml::Value {
    let declares_commands = overlay
        .as_table()
        .is_some_and(|t| COMMAND_TABLES.iter().any(|key| t.contains_key(*key)));
    match base {
        toml::Value::Table(mut table) if declares_commands => {
            for key in COMMAND_TABLES {
                table.remove(key);
            }
            toml::Value::Table(table)
        }
        other => other,
    }
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
///
/// Command tables are the exception to key-by-key merging: see
/// [`COMMAND_TABLES`].
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<JournalConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(strip_replaced_commands(base, &ov), ov),
        None => base,
    };
    let config: JournalConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load the config at `path` on top of the stock defaults.
pub fn load_config(path: &Path) -> Result<JournalConfig, ConfigError> {
    let base = stock_defaults_value();
    let overlay = load_raw_config(path)?;
    resolve_config(base, overlay)
}

/// Returns a fully-commented stock `journalmk.toml`.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# journalmk Configuration
# =======================
# All settings are optional. Values shown below are the defaults.
# Relative paths are resolved against the directory holding this file.
# Unknown keys will cause an error.

# Project tree searched for notes directories.
root_directory = "."

# Names of notes directories anywhere below the root.
# An empty list treats every subdirectory as a notes directory.
notes_directory_names = ["_notes"]

# Subtrees that are never searched.
exclude_directories = []

# File-name endings that are never converted (e.g. editor autosaves).
exclude_note_endings = []

# strftime patterns tried against each note's file stem, in order.
# Notes matching none of them are dated by their file creation time.
datetime_filename_formats = ["%Y-%m-%d_%H-%M-%S", "%Y-%m-%d"]

# "chronological": year -> month -> week
# "topological":   part/chapter/section from journalmk.json in each notes
#                  directory; directories without one land in "Unsorted".
journal_type = "chronological"

# ---------------------------------------------------------------------------
# Labels (strftime patterns)
# ---------------------------------------------------------------------------
[formats]
datetime_format = "%d. %B %Y -- %H:%M"
week_format = "Week %V"
month_format = "%B"
year_format = "%Y"

# ---------------------------------------------------------------------------
# Time window
# ---------------------------------------------------------------------------
[period]
# Inclusive bounds, either may be omitted.
# start = "2024-01-01--00-00"
# end = "2024-12-31--23-59"
# Or: everything from the last N minutes.
# last_minutes = 10080

# ---------------------------------------------------------------------------
# PDF export
# ---------------------------------------------------------------------------
# Declaring either command table replaces both stock tables, so list every
# extension you want collected.
# Commands writing the PDF straight to {pdf}.
[export_commands]
pdf = "cp {note} {pdf}"
# xopp = "xournalpp {note} --create-pdf={pdf}"

# Commands writing <stem>.pdf into {outdir}; journalmk moves it into the cache.
[inplace_export_commands]
# odt = "soffice --headless --convert-to pdf --outdir {outdir} {note}"

# ---------------------------------------------------------------------------
# Layout
# ---------------------------------------------------------------------------
[layout]
# "front" or "back": where the topological "Unsorted" part goes.
unsorted_position = "back"
# Newest chapters and sections first inside "Unsorted".
unsorted_newest_first = true
# A section holding one note uses that note as its table-of-contents entry.
collapse_single_entry_sections = false

# ---------------------------------------------------------------------------
# Output
# ---------------------------------------------------------------------------
[output]
cache_directory = "tmp"
document = "journal.tex"
# Replaces the built-in preamble when the file exists.
template = "journal_template.tex"

# ---------------------------------------------------------------------------
# Typesetting
# ---------------------------------------------------------------------------
[typeset]
command = ["latexmk", "-norc", "-pdf"]
open = true

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel conversions.
# Omit to auto-detect (= number of CPU cores).
# max_processes = 4
"##
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    #[test]
    fn default_config_values() {
        let config = JournalConfig::default();
        assert_eq!(config.root_directory, ".");
        assert_eq!(config.notes_directory_names, vec!["_notes"]);
        assert_eq!(config.journal_type, JournalType::Chronological);
        assert_eq!(config.formats.week_format, "Week %V");
        assert_eq!(config.output.cache_directory, "tmp");
        assert_eq!(config.layout.unsorted_position, UnsortedPosition::Back);
        assert!(!config.layout.collapse_single_entry_sections);
    }

    #[test]
    fn validate_default_config_passes() {
        assert!(JournalConfig::default().validate().is_ok());
    }

    #[test]
    fn parse_partial_config() {
        let config: JournalConfig = toml::from_str(
            r#"
journal_type = "topological"

[formats]
month_format = "%B %Y"
"#,
        )
        .unwrap();
        assert_eq!(config.journal_type, JournalType::Topological);
        assert_eq!(config.formats.month_format, "%B %Y");
        // Unspecified defaults preserved
        assert_eq!(config.formats.year_format, "%Y");
        assert_eq!(config.output.document, "journal.tex");
    }

    #[test]
    fn unsupported_journal_type_rejected() {
        let result: Result<JournalConfig, _> = toml::from_str(r#"journal_type = "tree""#);
        assert!(result.is_err());
    }

    #[test]
    fn unknown_key_rejected() {
        let result: Result<JournalConfig, _> = toml::from_str(r#"root_dir = "x""#);
        assert!(result.is_err());
    }

    #[test]
    fn unknown_nested_key_rejected() {
        let result: Result<JournalConfig, _> = toml::from_str(
            r#"
[layout]
unsorted_first = true
"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn note_extensions_cover_both_command_tables() {
        let mut config = JournalConfig::default();
        config
            .inplace_export_commands
            .insert("odt".into(), "soffice {note} --outdir {outdir}".into());
        assert_eq!(config.note_extensions(), vec!["pdf", "odt"]);
    }

    // =========================================================================
    // Validation
    // =========================================================================

    #[test]
    fn validate_rejects_invalid_label_pattern() {
        let mut config = JournalConfig::default();
        config.formats.week_format = "Week %Q".into();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Validation(msg)) if msg.contains("week_format")
        ));
    }

    #[test]
    fn validate_rejects_invalid_filename_pattern() {
        let mut config = JournalConfig::default();
        config.datetime_filename_formats.push("%Y-%".into());
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_requires_some_export_command() {
        let mut config = JournalConfig::default();
        config.export_commands.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_command_without_placeholder() {
        let mut config = JournalConfig::default();
        config
            .export_commands
            .insert("xopp".into(), "xournalpp {note}".into());
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Validation(msg)) if msg.contains("{pdf}")
        ));
    }

    #[test]
    fn validate_rejects_extension_in_both_tables() {
        let mut config = JournalConfig::default();
        config
            .inplace_export_commands
            .insert("pdf".into(), "x {note} {outdir}".into());
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_empty_typeset_command() {
        let mut config = JournalConfig::default();
        config.typeset.command.clear();
        assert!(config.validate().is_err());
    }

    // =========================================================================
    // Period
    // =========================================================================

    #[test]
    fn period_unbounded_by_default() {
        let period = PeriodConfig::default().resolve(at(2024, 1, 1, 0, 0)).unwrap();
        assert_eq!(period, Period::new(None, None));
    }

    #[test]
    fn period_explicit_bounds() {
        let config = PeriodConfig {
            start: Some("2023-01-01--00-00".into()),
            end: Some("2023-06-30--23-59".into()),
            last_minutes: None,
        };
        let period = config.resolve(at(2024, 1, 1, 0, 0)).unwrap();
        assert_eq!(
            period,
            Period::new(Some(at(2023, 1, 1, 0, 0)), Some(at(2023, 6, 30, 23, 59)))
        );
    }

    #[test]
    fn period_last_minutes_ends_now() {
        let now = at(2024, 3, 10, 12, 0);
        let config = PeriodConfig {
            last_minutes: Some(90),
            ..Default::default()
        };
        let period = config.resolve(now).unwrap();
        assert_eq!(period, Period::new(Some(at(2024, 3, 10, 10, 30)), Some(now)));
    }

    #[test]
    fn period_last_minutes_conflicts_with_bounds() {
        let config = PeriodConfig {
            start: Some("2023-01-01--00-00".into()),
            end: None,
            last_minutes: Some(5),
        };
        assert!(config.resolve(at(2024, 1, 1, 0, 0)).is_err());
    }

    #[test]
    fn period_rejects_malformed_date() {
        let config = PeriodConfig {
            start: Some("2023-01-01".into()),
            ..Default::default()
        };
        assert!(config.resolve(at(2024, 1, 1, 0, 0)).is_err());
    }

    #[test]
    fn period_rejects_inverted_bounds() {
        let config = PeriodConfig {
            start: Some("2024-01-01--00-00".into()),
            end: Some("2023-01-01--00-00".into()),
            last_minutes: None,
        };
        assert!(config.resolve(at(2024, 1, 1, 0, 0)).is_err());
    }

    // =========================================================================
    // Processing
    // =========================================================================

    #[test]
    fn effective_threads_auto() {
        let threads = effective_threads(&ProcessingConfig::default());
        let cores = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        assert_eq!(threads, cores);
    }

    #[test]
    fn effective_threads_user_constrains_down() {
        let config = ProcessingConfig {
            max_processes: Some(1),
        };
        assert_eq!(effective_threads(&config), 1);
    }

    #[test]
    fn effective_threads_never_zero() {
        let config = ProcessingConfig {
            max_processes: Some(0),
        };
        assert_eq!(effective_threads(&config), 1);
    }

    // =========================================================================
    // merge_toml / loading
    // =========================================================================

    #[test]
    fn merge_toml_table_merge() {
        let base: toml::Value = toml::from_str(
            r#"
[layout]
unsorted_position = "back"
unsorted_newest_first = true
"#,
        )
        .unwrap();
        let overlay: toml::Value = toml::from_str(
            r#"
[layout]
unsorted_position = "front"
"#,
        )
        .unwrap();
        let merged = merge_toml(base, overlay);
        let layout = merged.get("layout").unwrap();
        assert_eq!(layout.get("unsorted_position").unwrap().as_str(), Some("front"));
        assert_eq!(layout.get("unsorted_newest_first").unwrap().as_bool(), Some(true));
    }

    #[test]
    fn merge_toml_array_replaced_not_appended() {
        let base: toml::Value = toml::from_str(r#"names = ["_notes"]"#).unwrap();
        let overlay: toml::Value = toml::from_str(r#"names = ["notes", "sketches"]"#).unwrap();
        let merged = merge_toml(base, overlay);
        let names = merged.get("names").unwrap().as_array().unwrap();
        assert_eq!(names.len(), 2);
    }

    #[test]
    fn load_config_returns_default_when_no_file() {
        let tmp = TempDir::new().unwrap();
        let config = load_config(&tmp.path().join(CONFIG_FILENAME)).unwrap();
        assert_eq!(config.journal_type, JournalType::Chronological);
        assert_eq!(config.export_commands.len(), 1);
    }

    #[test]
    fn load_config_reads_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(CONFIG_FILENAME);
        fs::write(
            &path,
            r#"
journal_type = "topological"
notes_directory_names = ["notes"]

[export_commands]
xopp = "xournalpp {note} --create-pdf={pdf}"

[layout]
unsorted_position = "front"
"#,
        )
        .unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.journal_type, JournalType::Topological);
        assert_eq!(config.notes_directory_names, vec!["notes"]);
        // Command tables replace the stock set: no implicit pdf command
        assert_eq!(
            config.export_commands.keys().collect::<Vec<_>>(),
            vec!["xopp"]
        );
        assert_eq!(config.layout.unsorted_position, UnsortedPosition::Front);
        assert!(config.layout.unsorted_newest_first);
    }

    #[test]
    fn load_config_inplace_table_alone_replaces_stock_commands() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(CONFIG_FILENAME);
        fs::write(
            &path,
            r#"
[inplace_export_commands]
pdf = "pdftk {note} output {outdir}"
"#,
        )
        .unwrap();

        let config = load_config(&path).unwrap();
        assert!(config.export_commands.is_empty());
        assert_eq!(
            config.inplace_export_commands.get("pdf").map(String::as_str),
            Some("pdftk {note} output {outdir}")
        );
    }

    #[test]
    fn load_config_without_commands_keeps_stock_pdf() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(CONFIG_FILENAME);
        fs::write(&path, "journal_type = \"topological\"\n").unwrap();

        let config = load_config(&path).unwrap();
        assert!(config.export_commands.contains_key("pdf"));
    }

    #[test]
    fn load_config_invalid_toml_is_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(CONFIG_FILENAME);
        fs::write(&path, "journal_type = ").unwrap();
        assert!(matches!(load_config(&path), Err(ConfigError::Toml(_))));
    }

    #[test]
    fn load_config_validates_values() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(CONFIG_FILENAME);
        fs::write(
            &path,
            r#"
[period]
start = "yesterday"
"#,
        )
        .unwrap();
        assert!(matches!(load_config(&path), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn stock_config_toml_roundtrips_to_defaults() {
        let config: JournalConfig = toml::from_str(stock_config_toml()).unwrap();
        let defaults = JournalConfig::default();
        assert_eq!(config.root_directory, defaults.root_directory);
        assert_eq!(
            config.datetime_filename_formats,
            defaults.datetime_filename_formats
        );
        assert_eq!(config.formats.datetime_format, defaults.formats.datetime_format);
        assert_eq!(config.export_commands, defaults.export_commands);
        assert_eq!(config.typeset.command, defaults.typeset.command);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn resolve_path_keeps_absolute() {
        let tmp = TempDir::new().unwrap();
        let abs = tmp.path().join("notes");
        assert_eq!(resolve_path(Path::new("/elsewhere"), abs.to_str().unwrap()), abs);
    }

    #[test]
    fn resolve_path_joins_relative() {
        let tmp = TempDir::new().unwrap();
        assert_eq!(resolve_path(tmp.path(), "tmp"), tmp.path().join("tmp"));
    }
}
