//! Testing utilities and mock implementations.
//!
//! This module provides a scripted liveness probe and fixture builders so the
//! catalog, matcher and pipeline can be exercised without network access.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use vidcanon_core::testing::{fixtures, MockProbe};
//! use vidcanon_core::SqliteCatalog;
//!
//! let probe = Arc::new(MockProbe::new());
//! let catalog = SqliteCatalog::in_memory(probe.clone())?;
//! catalog.ingest(fixtures::feed(&[fixtures::feed_row("ARD", "Show", "Title", "http://x/a.mp4")]))?;
//! ```

mod mock_probe;

pub use mock_probe::MockProbe;

/// Test fixtures and helper functions.
pub mod fixtures {
    use crate::observation::{Reachability, VideoObservation};

    /// Header used by [`feed_row`].
    pub const FEED_HEADER: &str = r#"["Sender","Thema","Titel","Url","Url HD","neu"]"#;

    /// One feed data line matching [`FEED_HEADER`] without an HD variant.
    pub fn feed_row(channel: &str, series: &str, title: &str, url: &str) -> String {
        serde_json::json!([channel, series, title, url, "", "false"]).to_string()
    }

    /// One feed data line matching [`FEED_HEADER`] with an HD variant.
    pub fn feed_row_hd(channel: &str, series: &str, title: &str, url: &str, hd: &str) -> String {
        serde_json::json!([channel, series, title, url, hd, "false"]).to_string()
    }

    /// A complete feed: [`FEED_HEADER`] followed by `rows`.
    pub fn feed(rows: &[String]) -> Vec<String> {
        std::iter::once(FEED_HEADER.to_string())
            .chain(rows.iter().cloned())
            .collect()
    }

    /// An observation with a direct link and thumbnail/shortname derived
    /// from the title.
    pub fn direct(title: &str, series: &str, link: &str) -> VideoObservation {
        observation(title, series, Reachability::Direct(link.to_string()))
    }

    /// An observation with the given reachability.
    pub fn observation(title: &str, series: &str, reachability: Reachability) -> VideoObservation {
        let slug = title.to_lowercase().replace(' ', "-");
        VideoObservation {
            thumbnail: format!("thumbnails/{}.jpg", slug),
            title: title.to_string(),
            series: series.to_string(),
            shortname: slug,
            reachability,
        }
    }
}
