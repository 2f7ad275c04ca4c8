//! The page record, the unit of synchronization.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Timestamp layout used by manifests and persisted state,
/// e.g. `2024-01-01 00:00:00 +0000`.
pub const MODIFIED_FORMAT: &str = "%Y-%m-%d %H:%M:%S %z";

/// A single page from a manifest.
///
/// Serializes to the flat JSON document body sent to the search index and
/// stored in the per-manifest sync state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    /// Identity of the page within an index.
    pub url: String,

    /// Last modification time, normalized to UTC.
    #[serde(with = "modified_format")]
    pub modified: DateTime<Utc>,

    pub title: String,
    pub content: String,
    pub path: String,

    /// Page type, also used as the document type on upsert.
    #[serde(rename = "type")]
    pub page_type: String,

    /// Categories in manifest order.
    pub categories: Vec<String>,

    /// Tags. Manifests currently carry exactly one tag per record.
    pub tags: Vec<String>,
}

impl Page {
    /// True if this record was modified strictly after `other`.
    ///
    /// Equal timestamps count as unchanged.
    pub fn is_newer_than(&self, other: &Page) -> bool {
        self.modified > other.modified
    }
}

/// Parse a `modified` value in [`MODIFIED_FORMAT`] into UTC.
pub fn parse_modified(value: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_str(value, MODIFIED_FORMAT).map(|dt| dt.with_timezone(&Utc))
}

mod modified_format {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    use super::{MODIFIED_FORMAT, parse_modified};

    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.format(MODIFIED_FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse_modified(&raw).map_err(serde::de::Error::custom)
    }
}
