//! Cascading title matcher.
//!
//! Resolves an observed title to catalog entries by trying the strategies in
//! [`STRATEGIES`] from strictest to loosest, first restricted to the observed
//! series and then without that restriction. The first strategy that finds
//! anything decides the result; nothing from later strategies is merged in.
//!
//! Candidates are ordered by link quality and filtered down to links that
//! currently work.

mod strategy;

pub use strategy::{Strategy, STRATEGIES};

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::catalog::{CatalogEntry, CatalogError, VideoCatalog};
use crate::metrics::MATCHER_HITS;
use crate::text::clean_title;
use strategy::MatchQuery;

/// Whether a strategy ran restricted to the observed series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeriesPhase {
    WithSeries,
    AnySeries,
}

impl SeriesPhase {
    pub fn label(&self) -> &'static str {
        match self {
            SeriesPhase::WithSeries => "with_series",
            SeriesPhase::AnySeries => "any_series",
        }
    }
}

/// The step of the cascade that produced a hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrategyHit {
    pub strategy: Strategy,
    pub phase: SeriesPhase,
}

/// Result of [`CascadingMatcher::search_detailed`].
#[derive(Debug, Clone, Default)]
pub struct MatchOutcome {
    /// `None` when no strategy found anything.
    pub strategy: Option<StrategyHit>,
    /// Working candidates, lowest link quality first.
    pub candidates: Vec<CatalogEntry>,
}

/// Matches observed titles against a catalog.
pub struct CascadingMatcher {
    catalog: Arc<dyn VideoCatalog>,
}

impl CascadingMatcher {
    pub fn new(catalog: Arc<dyn VideoCatalog>) -> Self {
        Self { catalog }
    }

    /// Working catalog entries for an observed video.
    ///
    /// `title` is cleaned before matching; `original_title` is used verbatim.
    /// An empty result means nothing matched or nothing matched works.
    pub async fn search(
        &self,
        title: &str,
        original_title: Option<&str>,
        series: Option<&str>,
    ) -> Result<Vec<CatalogEntry>, CatalogError> {
        Ok(self
            .search_detailed(title, original_title, series)
            .await?
            .candidates)
    }

    /// Like [`search`](Self::search), also reporting the deciding strategy.
    pub async fn search_detailed(
        &self,
        title: &str,
        original_title: Option<&str>,
        series: Option<&str>,
    ) -> Result<MatchOutcome, CatalogError> {
        let query = MatchQuery {
            original_title: original_title.map(|t| t.trim().to_string()),
            clean_title: clean_title(title),
        };
        let series = series.map(str::trim).filter(|s| !s.is_empty());

        let Some((hit, mut candidates)) = self.find_candidates(&query, series)? else {
            MATCHER_HITS.with_label_values(&["none", "none"]).inc();
            debug!("No catalog match for '{}'", query.clean_title);
            return Ok(MatchOutcome::default());
        };

        MATCHER_HITS
            .with_label_values(&[hit.strategy.name(), hit.phase.label()])
            .inc();
        debug!(
            "'{}' matched {} entries via {} ({})",
            query.clean_title,
            candidates.len(),
            hit.strategy.name(),
            hit.phase.label()
        );

        // Stable, so feed order survives within a quality tier
        candidates.sort_by_key(|entry| entry.link_quality);

        let mut working = Vec::with_capacity(candidates.len());
        for entry in candidates {
            if self.catalog.check_liveness(&entry.link).await? {
                working.push(entry);
            } else {
                debug!("Dropping dead link {}", entry.link);
            }
        }

        Ok(MatchOutcome {
            strategy: Some(hit),
            candidates: working,
        })
    }

    /// Walk the cascade and stop at the first non-empty result.
    fn find_candidates(
        &self,
        query: &MatchQuery,
        series: Option<&str>,
    ) -> Result<Option<(StrategyHit, Vec<CatalogEntry>)>, CatalogError> {
        let phases = [
            (SeriesPhase::WithSeries, series),
            (SeriesPhase::AnySeries, None),
        ];

        for (phase, constraint) in phases {
            if phase == SeriesPhase::WithSeries && constraint.is_none() {
                continue;
            }
            for strategy in STRATEGIES {
                let hits = strategy.run(self.catalog.as_ref(), query, constraint)?;
                if !hits.is_empty() {
                    return Ok(Some((StrategyHit { strategy, phase }, hits)));
                }
            }
        }

        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{LinkQuality, SqliteCatalog};
    use crate::probe::ProbeOutcome;
    use crate::testing::{fixtures, MockProbe};

    fn setup(rows: &[String]) -> (CascadingMatcher, Arc<MockProbe>) {
        let probe = Arc::new(MockProbe::new());
        let catalog = SqliteCatalog::in_memory(probe.clone()).unwrap();
        catalog.ingest(fixtures::feed(rows)).unwrap();
        (CascadingMatcher::new(Arc::new(catalog)), probe)
    }

    fn links(entries: &[CatalogEntry]) -> Vec<&str> {
        entries.iter().map(|e| e.link.as_str()).collect()
    }

    #[tokio::test]
    async fn test_strict_hit_short_circuits_looser_strategies() {
        let (matcher, probe) = setup(&[
            fixtures::feed_row_hd("ARD", "Maus", "Der Wal", "http://x/exact.mp4", "_hd"),
            fixtures::feed_row("", "", "Der Wal und der Hai", "http://x/loose.mp4"),
        ]);

        let outcome = matcher
            .search_detailed("Der Wal", None, Some("Maus"))
            .await
            .unwrap();

        assert_eq!(
            outcome.strategy,
            Some(StrategyHit {
                strategy: Strategy::CleanTitle,
                phase: SeriesPhase::WithSeries,
            })
        );
        assert_eq!(links(&outcome.candidates), vec!["http://x/exact.mp4_hd"]);
        // The looser candidate is never even probed
        assert_eq!(probe.probe_count("http://x/loose.mp4"), 0);
    }

    #[tokio::test]
    async fn test_original_title_wins_over_clean_title() {
        let (matcher, _) = setup(&[
            fixtures::feed_row("ARD", "Maus", "Der Wal", "http://x/clean.mp4"),
            fixtures::feed_row("", "", "3. Der Wal", "http://x/original.mp4"),
        ]);

        let outcome = matcher
            .search_detailed("3. Der Wal", Some("3. Der Wal"), Some("Maus"))
            .await
            .unwrap();
        assert_eq!(outcome.strategy.unwrap().strategy, Strategy::OriginalTitle);
        assert_eq!(links(&outcome.candidates), vec!["http://x/original.mp4"]);
    }

    #[tokio::test]
    async fn test_series_phase_runs_all_strategies_first() {
        let (matcher, _) = setup(&[
            fixtures::feed_row("ARD", "Other", "Der Wal", "http://x/other.mp4"),
            fixtures::feed_row("WDR", "Maus", "Spezial: Der Wal im Meer", "http://x/maus.mp4"),
        ]);

        // Exact title exists only outside the series; the loose in-series hit wins
        let outcome = matcher
            .search_detailed("Der Wal", None, Some("Maus"))
            .await
            .unwrap();
        assert_eq!(
            outcome.strategy,
            Some(StrategyHit {
                strategy: Strategy::CleanTitleFragment,
                phase: SeriesPhase::WithSeries,
            })
        );
        assert_eq!(links(&outcome.candidates), vec!["http://x/maus.mp4"]);
    }

    #[tokio::test]
    async fn test_falls_back_to_any_series() {
        let (matcher, _) = setup(&[fixtures::feed_row(
            "ARD",
            "Other",
            "Der Wal",
            "http://x/other.mp4",
        )]);

        let outcome = matcher
            .search_detailed("Der Wal", None, Some("Maus"))
            .await
            .unwrap();
        assert_eq!(outcome.strategy.unwrap().phase, SeriesPhase::AnySeries);
        assert_eq!(outcome.candidates.len(), 1);
    }

    #[tokio::test]
    async fn test_token_subset_match() {
        let (matcher, _) = setup(&[fixtures::feed_row(
            "ARD",
            "Maus",
            "Der große Wal Spezial",
            "http://x/wal.mp4",
        )]);

        let outcome = matcher
            .search_detailed("Spezial: Der Wal", None, None)
            .await
            .unwrap();
        assert_eq!(
            outcome.strategy.unwrap().strategy,
            Strategy::PrefixFreeTokenSubset
        );
        assert_eq!(links(&outcome.candidates), vec!["http://x/wal.mp4"]);
    }

    #[tokio::test]
    async fn test_candidates_sorted_by_quality_then_filtered() {
        let (matcher, probe) = setup(&[
            fixtures::feed_row_hd("ARD", "Maus", "Der Wal", "http://x/a.mp4", "_hd"),
            fixtures::feed_row("", "", "Der Wal", "http://x/b.mp4"),
            fixtures::feed_row("", "", "Der Wal", "http://x/c.mp4"),
        ]);
        probe.set_outcome("http://x/b.mp4", ProbeOutcome::Broken { status: 404 });

        let candidates = matcher.search("Der Wal", None, Some("Maus")).await.unwrap();

        assert_eq!(links(&candidates), vec!["http://x/c.mp4", "http://x/a.mp4_hd"]);
        assert_eq!(candidates[0].link_quality, LinkQuality::Medium);
        assert_eq!(candidates[1].link_quality, LinkQuality::High);
        // Liveness is checked in sorted order
        assert_eq!(
            probe.calls(),
            vec!["http://x/b.mp4", "http://x/c.mp4", "http://x/a.mp4_hd"]
        );
    }

    #[tokio::test]
    async fn test_hit_with_only_dead_links_is_empty() {
        let (matcher, probe) = setup(&[
            fixtures::feed_row("ARD", "Maus", "Der Wal", "http://x/dead.mp4"),
            fixtures::feed_row("", "", "Der Wal und der Hai", "http://x/alive.mp4"),
        ]);
        probe.set_outcome("http://x/dead.mp4", ProbeOutcome::Broken { status: 410 });

        let outcome = matcher
            .search_detailed("Der Wal", None, Some("Maus"))
            .await
            .unwrap();
        // The deciding strategy found only a dead link; no fallback happens
        assert_eq!(outcome.strategy.unwrap().strategy, Strategy::CleanTitle);
        assert!(outcome.candidates.is_empty());
    }

    #[tokio::test]
    async fn test_exhaustion_is_empty_not_error() {
        let (matcher, probe) = setup(&[fixtures::feed_row(
            "ARD",
            "Maus",
            "Der Wal",
            "http://x/wal.mp4",
        )]);

        let outcome = matcher
            .search_detailed("Das Krokodil", None, Some("Maus"))
            .await
            .unwrap();
        assert!(outcome.strategy.is_none());
        assert!(outcome.candidates.is_empty());
        assert!(probe.calls().is_empty());
    }

    #[tokio::test]
    async fn test_episode_number_is_cleaned() {
        let (matcher, _) = setup(&[fixtures::feed_row(
            "ARD",
            "Maus",
            "Der Wal",
            "http://x/wal.mp4",
        )]);

        let candidates = matcher.search(" 12. Der Wal", None, None).await.unwrap();
        assert_eq!(candidates.len(), 1);
    }
}
