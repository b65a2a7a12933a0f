//! Calendar grouping: year → month → ISO week.
//!
//! Every entry is keyed by its own timestamp:
//!
//! ```text
//! part     calendar year
//! chapter  calendar month within that year
//! section  ISO (year, week) within that month
//! ```
//!
//! A week straddling a month or year boundary is therefore split at the
//! boundary, and each section nests inside exactly one chapter. Titles are
//! the configured patterns applied to the group's latest entry, and groups
//! at every level are ordered latest first.

use super::{Chapter, DocumentTree, Part, Section, sort_by_recency, sort_entries};
use crate::config::FormatsConfig;
use crate::timestamp::format_timestamp;
use crate::types::Entry;
use chrono::Datelike;
use std::collections::BTreeMap;

type Weeks = BTreeMap<(i32, u32), Vec<Entry>>;
type Months = BTreeMap<u32, Weeks>;

pub fn build(entries: Vec<Entry>, formats: &FormatsConfig) -> DocumentTree {
    let mut years: BTreeMap<i32, Months> = BTreeMap::new();
    for entry in entries {
        let ts = entry.timestamp;
        let week = ts.iso_week();
        years
            .entry(ts.year())
            .or_default()
            .entry(ts.month())
            .or_default()
            .entry((week.year(), week.week()))
            .or_default()
            .push(entry);
    }

    let mut parts: Vec<Part> = years
        .into_values()
        .filter_map(|months| {
            let mut chapters: Vec<Chapter> = months
                .into_values()
                .filter_map(|weeks| {
                    let mut sections: Vec<Section> = weeks
                        .into_values()
                        .filter_map(|entries| section(entries, formats))
                        .collect();
                    sort_by_recency(&mut sections, Section::latest, true);
                    let latest = sections.first()?.latest()?;
                    Some(Chapter {
                        title: Some(format_timestamp(latest, &formats.month_format)),
                        sections,
                    })
                })
                .collect();
            sort_by_recency(&mut chapters, Chapter::latest, true);
            let latest = chapters.first()?.latest()?;
            Some(Part {
                title: format_timestamp(latest, &formats.year_format),
                chapters,
            })
        })
        .collect();
    sort_by_recency(&mut parts, Part::latest, true);

    DocumentTree { parts }
}

fn section(mut entries: Vec<Entry>, formats: &FormatsConfig) -> Option<Section> {
    sort_entries(&mut entries);
    let latest = entries.first()?.timestamp;
    Some(Section {
        title: Some(format_timestamp(latest, &formats.week_format)),
        entries,
    })
}
