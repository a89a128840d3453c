//! Scraped video observations and the canonical records fused from them.

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// How a video can be reached, with the one link that goes with it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "url", rename_all = "snake_case")]
pub enum Reachability {
    /// A link to the video file itself.
    Direct(String),
    /// A page the video can be watched on, but not hotlinked.
    WatchPage(String),
    /// The video is gone; the link is a suggested search.
    Unavailable(String),
}

impl Reachability {
    /// The link, whatever its kind.
    pub fn value(&self) -> &str {
        match self {
            Reachability::Direct(url)
            | Reachability::WatchPage(url)
            | Reachability::Unavailable(url) => url,
        }
    }

    pub fn kind(&self) -> ReachabilityKind {
        match self {
            Reachability::Direct(_) => ReachabilityKind::Direct,
            Reachability::WatchPage(_) => ReachabilityKind::WatchPage,
            Reachability::Unavailable(_) => ReachabilityKind::Unavailable,
        }
    }
}

/// Tag of a [`Reachability`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReachabilityKind {
    Direct,
    WatchPage,
    Unavailable,
}

impl ReachabilityKind {
    /// Higher is better: Direct > WatchPage > Unavailable.
    pub fn priority(self) -> u8 {
        match self {
            ReachabilityKind::Direct => 3,
            ReachabilityKind::WatchPage => 2,
            ReachabilityKind::Unavailable => 1,
        }
    }
}

/// One video as a scraper saw it, after link resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoObservation {
    /// Local thumbnail reference.
    pub thumbnail: String,
    pub title: String,
    /// Empty when the source did not say.
    #[serde(default)]
    pub series: String,
    pub shortname: String,
    pub reachability: Reachability,
}

impl VideoObservation {
    /// Content fingerprint. Equal fingerprints mean equal observations.
    pub fn id(&self) -> ObservationId {
        let mut hasher = Sha256::new();
        for field in [
            self.thumbnail.as_str(),
            self.title.as_str(),
            self.shortname.as_str(),
            self.series.as_str(),
            self.reachability.value(),
        ] {
            hasher.update((field.len() as u64).to_le_bytes());
            hasher.update(field.as_bytes());
        }
        ObservationId(format!("{:x}", hasher.finalize()))
    }
}

/// SHA-256 hex fingerprint of an observation's content.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObservationId(String);

impl ObservationId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ObservationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The single record representing one duplicate cluster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalVideo {
    pub title: String,
    pub thumbnail: String,
    pub shortname: String,
    pub series: String,
    pub reachability: Reachability,
}

impl From<VideoObservation> for CanonicalVideo {
    fn from(observation: VideoObservation) -> Self {
        Self {
            title: observation.title,
            thumbnail: observation.thumbnail,
            shortname: observation.shortname,
            series: observation.series,
            reachability: observation.reachability,
        }
    }
}

/// A scraped item before its link is resolved against the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrapedItem {
    /// Title exactly as the source printed it.
    pub original_title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub series: Option<String>,
    pub thumbnail: String,
    pub shortname: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> VideoObservation {
        VideoObservation {
            thumbnail: "thumbnails/wal.jpg".to_string(),
            title: "Der Wal".to_string(),
            series: "Die Sendung mit der Maus".to_string(),
            shortname: "wal".to_string(),
            reachability: Reachability::Direct("http://x/wal.mp4".to_string()),
        }
    }

    #[test]
    fn test_reachability_value_and_kind() {
        let r = Reachability::WatchPage("http://x/page".to_string());
        assert_eq!(r.value(), "http://x/page");
        assert_eq!(r.kind(), ReachabilityKind::WatchPage);
    }

    #[test]
    fn test_priority_order() {
        assert!(ReachabilityKind::Direct.priority() > ReachabilityKind::WatchPage.priority());
        assert!(ReachabilityKind::WatchPage.priority() > ReachabilityKind::Unavailable.priority());
    }

    #[test]
    fn test_fingerprint_is_content_based() {
        let a = sample();
        let b = sample();
        assert_eq!(a.id(), b.id());
        assert_eq!(a.id().as_str().len(), 64);
        assert!(a
            .id()
            .as_str()
            .chars()
            .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));

        let mut c = sample();
        c.shortname = "wal-2".to_string();
        assert_ne!(a.id(), c.id());
    }

    #[test]
    fn test_fingerprint_ignores_reachability_kind() {
        let a = sample();
        let mut b = sample();
        b.reachability = Reachability::WatchPage("http://x/wal.mp4".to_string());
        assert_eq!(a.id(), b.id());
    }

    #[test]
    fn test_fingerprint_fields_do_not_run_together() {
        let mut a = sample();
        a.title = "Der".to_string();
        a.shortname = "Walwal".to_string();
        let mut b = sample();
        b.title = "DerWal".to_string();
        b.shortname = "wal".to_string();
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_reachability_serialization() {
        let json = serde_json::to_value(Reachability::Direct("http://x/a.mp4".to_string())).unwrap();
        assert_eq!(json["kind"], "direct");
        assert_eq!(json["url"], "http://x/a.mp4");
    }

    #[test]
    fn test_scraped_item_series_is_optional() {
        let item: ScrapedItem = serde_json::from_str(
            r#"{"original_title": "3. Der Wal", "thumbnail": "t.jpg", "shortname": "wal-3"}"#,
        )
        .unwrap();
        assert!(item.series.is_none());
    }
}
