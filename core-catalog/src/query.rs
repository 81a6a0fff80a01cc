//! Query API over catalog snapshots.
//!
//! Everything here is a pure function of its input: records are cloned out of
//! the snapshot, never mutated in place, and absent fields fall back to safe
//! defaults instead of failing.

use crate::error::CatalogError;
use crate::models::{Category, ObjectRecord};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Field used as the primary sort criterion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    Size,
    Date,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl FromStr for SortKey {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "size" => Ok(SortKey::Size),
            "date" => Ok(SortKey::Date),
            _ => Err(CatalogError::InvalidSortKey(s.to_string())),
        }
    }
}

impl FromStr for SortDirection {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" => Ok(SortDirection::Asc),
            "desc" => Ok(SortDirection::Desc),
            _ => Err(CatalogError::InvalidSortDirection(s.to_string())),
        }
    }
}

/// A sort key and direction pair, matching the presets a picker offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SortOrder {
    pub key: SortKey,
    pub direction: SortDirection,
}

impl SortOrder {
    pub const NEWEST_FIRST: SortOrder = SortOrder::new(SortKey::Date, SortDirection::Desc);
    pub const OLDEST_FIRST: SortOrder = SortOrder::new(SortKey::Date, SortDirection::Asc);
    pub const LARGEST_FIRST: SortOrder = SortOrder::new(SortKey::Size, SortDirection::Desc);
    pub const SMALLEST_FIRST: SortOrder = SortOrder::new(SortKey::Size, SortDirection::Asc);

    /// Presets in picker order.
    pub const PRESETS: [SortOrder; 4] = [
        SortOrder::NEWEST_FIRST,
        SortOrder::OLDEST_FIRST,
        SortOrder::LARGEST_FIRST,
        SortOrder::SMALLEST_FIRST,
    ];

    pub const fn new(key: SortKey, direction: SortDirection) -> Self {
        Self { key, direction }
    }

    pub fn label(&self) -> &'static str {
        match (self.key, self.direction) {
            (SortKey::Date, SortDirection::Desc) => "Newest First",
            (SortKey::Date, SortDirection::Asc) => "Oldest First",
            (SortKey::Size, SortDirection::Desc) => "Largest First",
            (SortKey::Size, SortDirection::Asc) => "Smallest First",
        }
    }
}

impl Default for SortOrder {
    fn default() -> Self {
        SortOrder::NEWEST_FIRST
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let key = match self.key {
            SortKey::Size => "size",
            SortKey::Date => "date",
        };
        let direction = match self.direction {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        };
        write!(f, "{}-{}", key, direction)
    }
}

impl FromStr for SortOrder {
    type Err = CatalogError;

    /// Parses `date-desc`, `date-asc`, `size-desc` or `size-asc`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || CatalogError::InvalidSortOption(s.to_string());
        let (key, direction) = s.trim().split_once('-').ok_or_else(invalid)?;
        Ok(SortOrder {
            key: key.parse().map_err(|_| invalid())?,
            direction: direction.parse().map_err(|_| invalid())?,
        })
    }
}

/// Records whose display name contains `term`, ignoring case.
///
/// An empty term keeps every record.
pub fn filter<'a, I>(records: I, term: &str) -> Vec<ObjectRecord>
where
    I: IntoIterator<Item = &'a ObjectRecord>,
{
    if term.is_empty() {
        return records.into_iter().cloned().collect();
    }

    let needle = term.to_lowercase();
    records
        .into_iter()
        .filter(|record| record.display_name().to_lowercase().contains(&needle))
        .cloned()
        .collect()
}

/// Returns a sorted copy of `records`.
///
/// Ties on the primary field fall back to ascending key in both directions,
/// so ascending output is the reverse of descending output except inside
/// tie groups. A missing date sorts as the Unix epoch.
pub fn sort(records: &[ObjectRecord], key: SortKey, direction: SortDirection) -> Vec<ObjectRecord> {
    let mut sorted = records.to_vec();
    sorted.sort_by(|a, b| compare(a, b, key, direction));
    sorted
}

fn compare(a: &ObjectRecord, b: &ObjectRecord, key: SortKey, direction: SortDirection) -> Ordering {
    let primary = match key {
        SortKey::Size => a.size_bytes().cmp(&b.size_bytes()),
        SortKey::Date => date_or_epoch(a).cmp(&date_or_epoch(b)),
    };
    let primary = match direction {
        SortDirection::Asc => primary,
        SortDirection::Desc => primary.reverse(),
    };
    primary.then_with(|| a.key().cmp(b.key()))
}

fn date_or_epoch(record: &ObjectRecord) -> DateTime<Utc> {
    record.last_modified().unwrap_or_default()
}

/// Filtered, sorted records split by category.
///
/// [`Category::Other`] has no section and is dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CategorizedView {
    pub images: Vec<ObjectRecord>,
    pub videos: Vec<ObjectRecord>,
    pub audios: Vec<ObjectRecord>,
    pub documents: Vec<ObjectRecord>,
}

impl CategorizedView {
    pub fn section(&self, category: Category) -> &[ObjectRecord] {
        match category {
            Category::Image => &self.images,
            Category::Video => &self.videos,
            Category::Audio => &self.audios,
            Category::Document => &self.documents,
            Category::Other => &[],
        }
    }

    pub fn total(&self) -> usize {
        self.images.len() + self.videos.len() + self.audios.len() + self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

/// Splits records into sections, keeping their relative order.
pub fn categorize(records: Vec<ObjectRecord>) -> CategorizedView {
    let mut view = CategorizedView::default();
    for record in records {
        match record.category() {
            Category::Image => view.images.push(record),
            Category::Video => view.videos.push(record),
            Category::Audio => view.audios.push(record),
            Category::Document => view.documents.push(record),
            Category::Other => {}
        }
    }
    view
}

/// Filter, sort and categorize in one pass, as a listing screen needs.
pub fn list_categorized<'a, I>(records: I, term: &str, order: SortOrder) -> CategorizedView
where
    I: IntoIterator<Item = &'a ObjectRecord>,
{
    let matched = filter(records, term);
    categorize(sort(&matched, order.key, order.direction))
}

/// Human-readable size in base 1024, e.g. `0 B`, `1.5 KB`, `2 MB`.
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];

    if bytes == 0 {
        return "0 B".to_string();
    }

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    let rounded = format!("{:.2}", value);
    let trimmed = rounded.trim_end_matches('0').trim_end_matches('.');
    format!("{} {}", trimmed, UNITS[unit])
}
