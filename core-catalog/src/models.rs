//! Domain models for the object catalog
//!
//! Records are always built through constructors that run the classifier, so
//! a record's category can never drift from its key.

use crate::classifier::classify;
use bridge_traits::ObjectSummary;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

// =============================================================================
// Category
// =============================================================================

/// Coarse content class derived from an object's extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Image,
    Video,
    Audio,
    Document,
    Other,
}

impl Category {
    /// All categories in classification precedence order.
    pub const ALL: [Category; 5] = [
        Category::Image,
        Category::Video,
        Category::Audio,
        Category::Document,
        Category::Other,
    ];

    /// Section heading used by presentation layers.
    pub fn label(&self) -> &'static str {
        match self {
            Category::Image => "Images",
            Category::Video => "Videos",
            Category::Audio => "Audios",
            Category::Document => "Documents",
            Category::Other => "Other",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            Category::Image => "🖼",
            Category::Video => "🎬",
            Category::Audio => "🎵",
            Category::Document => "📄",
            Category::Other => "📁",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Category::Image => "image",
            Category::Video => "video",
            Category::Audio => "audio",
            Category::Document => "document",
            Category::Other => "other",
        };
        f.write_str(name)
    }
}

// =============================================================================
// ObjectRecord
// =============================================================================

/// One known object in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ObjectRecord {
    key: String,
    display_name: String,
    size_bytes: u64,
    last_modified: Option<DateTime<Utc>>,
    category: Category,
}

impl ObjectRecord {
    /// Builds a record, deriving the display name and category from `key`.
    pub fn new(
        key: impl Into<String>,
        size_bytes: u64,
        last_modified: Option<DateTime<Utc>>,
    ) -> Self {
        let key = key.into();
        let category = classify(&key);
        Self {
            display_name: key.clone(),
            key,
            size_bytes,
            last_modified,
            category,
        }
    }

    /// Ingests one listing entry. A missing size counts as zero.
    pub fn from_summary(summary: &ObjectSummary) -> Self {
        Self::new(
            summary.key.clone(),
            summary.size.unwrap_or(0),
            summary.last_modified,
        )
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn size_bytes(&self) -> u64 {
        self.size_bytes
    }

    pub fn last_modified(&self) -> Option<DateTime<Utc>> {
        self.last_modified
    }

    pub fn category(&self) -> Category {
        self.category
    }
}

impl From<ObjectSummary> for ObjectRecord {
    fn from(summary: ObjectSummary) -> Self {
        Self::new(summary.key, summary.size.unwrap_or(0), summary.last_modified)
    }
}

// =============================================================================
// CatalogSnapshot
// =============================================================================

/// Immutable view of the whole catalog at one instant.
///
/// Cloning is cheap; the map is shared until the store's next write.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogSnapshot {
    records: Arc<HashMap<String, ObjectRecord>>,
}

impl CatalogSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn from_shared(records: Arc<HashMap<String, ObjectRecord>>) -> Self {
        Self { records }
    }

    pub(crate) fn into_shared(self) -> Arc<HashMap<String, ObjectRecord>> {
        self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&ObjectRecord> {
        self.records.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.records.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ObjectRecord> {
        self.records.values()
    }

    /// Keys in ascending order.
    pub fn sorted_keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.records.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }
}

impl FromIterator<ObjectRecord> for CatalogSnapshot {
    /// Later records replace earlier ones with the same key.
    fn from_iter<I: IntoIterator<Item = ObjectRecord>>(iter: I) -> Self {
        let records = iter
            .into_iter()
            .map(|record| (record.key.clone(), record))
            .collect::<HashMap<_, _>>();
        Self {
            records: Arc::new(records),
        }
    }
}

impl<'a> IntoIterator for &'a CatalogSnapshot {
    type Item = &'a ObjectRecord;
    type IntoIter = std::collections::hash_map::Values<'a, String, ObjectRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.values()
    }
}
