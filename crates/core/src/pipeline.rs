//! From a pool of resolved observations to the sorted canonical catalog.

use tracing::info;

use crate::config::{DedupStrategy, PipelineConfig};
use crate::dedup::{cluster, deduplicate_sorted, fuse};
use crate::observation::{CanonicalVideo, VideoObservation};

/// Deduplicates a complete observation pool.
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// Collapse duplicates, fill in the default series, and sort by title.
    ///
    /// Runs on the whole pool at once; observations arriving later need a
    /// new run.
    pub fn run(&self, observations: Vec<VideoObservation>) -> Vec<CanonicalVideo> {
        let pool_size = observations.len();

        let mut videos: Vec<CanonicalVideo> = match self.config.dedup {
            DedupStrategy::Cluster => cluster(&observations).iter().map(fuse).collect(),
            DedupStrategy::Window => deduplicate_sorted(observations, self.config.window_size)
                .into_iter()
                .map(CanonicalVideo::from)
                .collect(),
        };

        if let Some(default_series) = &self.config.default_series {
            for video in videos.iter_mut().filter(|v| v.series.is_empty()) {
                video.series = default_series.clone();
            }
        }

        videos.sort_by(|a, b| a.title.cmp(&b.title));

        info!(
            "Deduplicated {} observations into {} videos ({:?})",
            pool_size,
            videos.len(),
            self.config.dedup
        );
        videos
    }
}
