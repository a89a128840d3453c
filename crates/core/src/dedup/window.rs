//! Sliding-window removal of exact duplicates.
//!
//! A cheaper alternative to clustering for sources whose duplicates agree on
//! title and link. Nothing is fused: of each run of duplicates the last one
//! in title order is kept.

use tracing::debug;

use crate::observation::VideoObservation;

/// Default number of neighbouring observations compared, including the
/// observation itself.
pub const DEFAULT_WINDOW: usize = 3;

fn is_duplicate(a: &VideoObservation, b: &VideoObservation) -> bool {
    a.title == b.title && a.reachability.value() == b.reachability.value()
}

/// Sort by title and drop every observation that duplicates one of the next
/// `window - 1` observations.
pub fn deduplicate_sorted(mut observations: Vec<VideoObservation>, window: usize) -> Vec<VideoObservation> {
    observations.sort_by(|a, b| a.title.cmp(&b.title));

    let before = observations.len();
    let lookahead = window.saturating_sub(1);
    let kept: Vec<VideoObservation> = observations
        .iter()
        .enumerate()
        .filter(|(index, observation)| {
            let end = (index + 1 + lookahead).min(observations.len());
            !observations[index + 1..end]
                .iter()
                .any(|later| is_duplicate(observation, later))
        })
        .map(|(_, observation)| observation.clone())
        .collect();

    debug!("Window dedup kept {} of {} observations", kept.len(), before);
    kept
}
