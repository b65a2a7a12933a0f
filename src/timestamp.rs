//! Timestamp resolution for notes.
//!
//! Every note gets exactly one point in time. The file stem is tried against
//! the configured strftime patterns in order, and the first successful parse
//! wins:
//!
//! ```text
//! 2024-03-14_09-30-00.xopp   with "%Y-%m-%d_%H-%M-%S"  →  2024-03-14 09:30:00
//! 2024-03-14.pdf             with "%Y-%m-%d"           →  2024-03-14 00:00:00
//! whiteboard.jpg             (no pattern matches)      →  file creation time
//! ```
//!
//! A pattern that only carries date fields resolves to midnight. Parse
//! failures never propagate; the creation time is the last resort.

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime};
use std::fmt::Write;
use std::time::SystemTime;

/// Resolve a note's timestamp from its file stem, falling back to `created`.
pub fn resolve(stem: &str, created: NaiveDateTime, patterns: &[String]) -> NaiveDateTime {
    patterns
        .iter()
        .find_map(|pattern| parse_stem(stem, pattern))
        .unwrap_or(created)
}

fn parse_stem(stem: &str, pattern: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(stem, pattern)
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(stem, pattern)
                .ok()
                .map(|date| date.and_time(chrono::NaiveTime::MIN))
        })
}

/// Format `ts` with a strftime pattern.
///
/// Patterns are validated when the config is loaded; should an invalid one
/// slip through anyway, the ISO representation is returned instead of
/// panicking.
pub fn format_timestamp(ts: NaiveDateTime, pattern: &str) -> String {
    let mut out = String::new();
    match write!(out, "{}", ts.format(pattern)) {
        Ok(()) => out,
        Err(_) => ts.to_string(),
    }
}

/// Convert a filesystem time into local wall-clock time.
pub fn local_time(time: SystemTime) -> NaiveDateTime {
    DateTime::<Local>::from(time).naive_local()
}

/// Inclusive time window; either bound may be open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Period {
    pub start: Option<NaiveDateTime>,
    pub end: Option<NaiveDateTime>,
}

impl Period {
    pub fn new(start: Option<NaiveDateTime>, end: Option<NaiveDateTime>) -> Self {
        Self { start, end }
    }

    /// True when `ts` lies inside the window.
    pub fn contains(&self, ts: NaiveDateTime) -> bool {
        self.start.is_none_or(|start| ts >= start) && self.end.is_none_or(|end| ts <= end)
    }
}
