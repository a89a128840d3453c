//! Types for the program-guide catalog.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Ordinal ranking of the best encoding found for an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkQuality {
    Low = 1,
    Medium = 2,
    High = 3,
}

impl LinkQuality {
    /// Integer stored in the `link_quality` column.
    pub fn as_i64(self) -> i64 {
        self as i64
    }

    pub fn from_i64(value: i64) -> Option<Self> {
        match value {
            1 => Some(Self::Low),
            2 => Some(Self::Medium),
            3 => Some(Self::High),
            _ => None,
        }
    }
}

/// One program-guide row after decompression and link resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// Broadcaster (e.g., "ARD", "KiKA").
    pub channel: String,
    /// Series / topic.
    pub series: String,
    /// Episode title. A handful of feed rows genuinely have none.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    /// Size of the medium-quality video in MB.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_mb: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Best playable link derived from `url` and `hd_url`.
    pub link: String,
    pub link_quality: LinkQuality,
    /// Medium-quality source URL as given by the feed.
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtitle_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rtmp_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub small_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rtmp_small_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hd_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rtmp_hd_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub utc_timestamp: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub history_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub geo: Option<String>,
    pub is_new: bool,
}

/// Summary of one feed ingestion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    /// Data rows read (header excluded).
    pub rows_read: u64,
    /// Rows stored in the catalog.
    pub stored: u64,
    /// Rows dropped because their link is a streaming manifest.
    pub discarded_manifest: u64,
}

/// A cached liveness verdict.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityRecord {
    pub uri: String,
    pub works: bool,
    /// Unix epoch seconds of the last probe.
    pub last_checked: i64,
}

/// Catalog statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogStats {
    pub total_entries: u64,
    pub distinct_series: u64,
    pub high_quality_entries: u64,
    pub cached_links: u64,
    pub working_cached_links: u64,
}

/// Errors raised while decoding the feed. Any of them aborts the whole load.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FeedError {
    #[error("Feed is empty")]
    Empty,

    #[error("Malformed feed line {line}: {reason}")]
    MalformedLine { line: usize, reason: String },

    #[error("Feed header has no '{0}' column")]
    MissingColumn(&'static str),

    #[error("Feed line {line} has no value for required field '{field}'")]
    MissingField { line: usize, field: &'static str },

    #[error("Feed line {line} has an invalid HD variant '{value}'")]
    InvalidHdVariant { line: usize, value: String },
}

/// Errors for catalog operations.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Feed error: {0}")]
    Feed(#[from] FeedError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<rusqlite::Error> for CatalogError {
    fn from(e: rusqlite::Error) -> Self {
        CatalogError::Database(e.to_string())
    }
}
