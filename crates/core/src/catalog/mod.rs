//! Program-guide catalog - the authoritative list of broadcast videos.
//!
//! The catalog is rebuilt wholesale from the broadcaster feed on every
//! ingest. It also owns a durable cache of link liveness verdicts, which
//! survives re-ingestion.

mod availability;
mod feed;
mod sqlite;
mod types;

pub use availability::AvailabilityCache;
pub use feed::{resolve_link, DecodedRow, FeedDecoder, ResolvedLink, MANIFEST_EXTENSION};
pub use sqlite::SqliteCatalog;
pub use types::*;

use async_trait::async_trait;

/// Read access to the catalog, as used by the matcher.
///
/// All lookups return entries in feed order. "Nothing found" is an empty
/// vector, never an error.
#[async_trait]
pub trait VideoCatalog: Send + Sync {
    /// Entries whose title equals `title` exactly.
    fn find_by_title(&self, title: &str, series: Option<&str>) -> Result<Vec<CatalogEntry>, CatalogError>;

    /// Entries whose title contains `fragment` (case-sensitive).
    fn find_by_title_fragment(
        &self,
        fragment: &str,
        series: Option<&str>,
    ) -> Result<Vec<CatalogEntry>, CatalogError>;

    /// All entries that have a title, optionally restricted to one series.
    fn entries(&self, series: Option<&str>) -> Result<Vec<CatalogEntry>, CatalogError>;

    /// Distinct series names containing `fragment`, sorted.
    fn series_matching(&self, fragment: &str) -> Result<Vec<String>, CatalogError>;

    /// Whether `link` currently serves a video, answered from the
    /// availability cache when a fresh verdict exists.
    async fn check_liveness(&self, link: &str) -> Result<bool, CatalogError>;

    /// Get catalog statistics.
    fn stats(&self) -> Result<CatalogStats, CatalogError>;
}
