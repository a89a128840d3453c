//! Link resolution for scraped items.
//!
//! Each scraped item is matched against the catalog. The first working
//! candidate becomes a direct link; without one the item is kept as
//! unavailable with a suggested search link, so it still shows up in the
//! output.

use std::sync::Arc;

use futures::stream::{self, StreamExt};
use tracing::{debug, info};

use crate::catalog::CatalogError;
use crate::config::ResolverConfig;
use crate::matcher::CascadingMatcher;
use crate::observation::{Reachability, ScrapedItem, VideoObservation};
use crate::text::{category_shortname, clean_title, strip_numeric_suffix};

/// Turns scraped items into link-resolved observations.
pub struct ObservationResolver {
    matcher: Arc<CascadingMatcher>,
    config: ResolverConfig,
}

impl ObservationResolver {
    pub fn new(matcher: Arc<CascadingMatcher>, config: ResolverConfig) -> Self {
        Self { matcher, config }
    }

    /// Resolve one item.
    pub async fn resolve(&self, item: &ScrapedItem) -> Result<VideoObservation, CatalogError> {
        let original_title = item.original_title.trim();
        let title = clean_title(original_title);

        let mut shortname = strip_numeric_suffix(item.shortname.trim());
        if shortname.is_empty() {
            shortname = category_shortname(&title);
        }

        // The matcher cleans the raw title itself, once
        let candidates = self
            .matcher
            .search(original_title, Some(original_title), item.series.as_deref())
            .await?;

        let reachability = match candidates.into_iter().next() {
            Some(best) => Reachability::Direct(best.link),
            None => {
                debug!(title = %title, "No working catalog link, suggesting a search");
                Reachability::Unavailable(self.search_url(&title))
            }
        };

        Ok(VideoObservation {
            thumbnail: item.thumbnail.clone(),
            title,
            series: item.series.clone().unwrap_or_default(),
            shortname,
            reachability,
        })
    }

    /// Resolve all items with at most `workers` matcher calls in flight.
    /// Output order follows input order.
    pub async fn resolve_all(&self, items: &[ScrapedItem]) -> Result<Vec<VideoObservation>, CatalogError> {
        let results: Vec<Result<VideoObservation, CatalogError>> = stream::iter(items)
            .map(|item| self.resolve(item))
            .buffered(self.config.workers.max(1))
            .collect()
            .await;

        let observations = results.into_iter().collect::<Result<Vec<_>, _>>()?;
        let unavailable = observations
            .iter()
            .filter(|o| matches!(o.reachability, Reachability::Unavailable(_)))
            .count();
        info!(
            "Resolved {} items, {} without a working link",
            observations.len(),
            unavailable
        );
        Ok(observations)
    }

    fn search_url(&self, title: &str) -> String {
        format!("{}{}", self.config.search_url_base, urlencoding::encode(title))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::SqliteCatalog;
    use crate::probe::ProbeOutcome;
    use crate::testing::{fixtures, MockProbe};

    fn setup(rows: &[String]) -> (ObservationResolver, Arc<MockProbe>) {
        let probe = Arc::new(MockProbe::new());
        let catalog = SqliteCatalog::in_memory(probe.clone()).unwrap();
        catalog.ingest(fixtures::feed(rows)).unwrap();
        let matcher = Arc::new(CascadingMatcher::new(Arc::new(catalog)));
        (ObservationResolver::new(matcher, ResolverConfig::default()), probe)
    }

    fn item(original_title: &str, series: Option<&str>, shortname: &str) -> ScrapedItem {
        ScrapedItem {
            original_title: original_title.to_string(),
            series: series.map(String::from),
            thumbnail: "thumbnails/x.jpg".to_string(),
            shortname: shortname.to_string(),
        }
    }

    #[tokio::test]
    async fn test_resolves_to_direct_link() {
        let (resolver, _) = setup(&[fixtures::feed_row(
            "ARD",
            "Maus",
            "Der Wal",
            "http://x/wal.mp4",
        )]);

        let observation = resolver
            .resolve(&item(" 7. Der Wal ", Some("Maus"), "der-wal-7"))
            .await
            .unwrap();

        assert_eq!(observation.title, "Der Wal");
        assert_eq!(observation.series, "Maus");
        assert_eq!(observation.shortname, "der-wal");
        assert_eq!(
            observation.reachability,
            Reachability::Direct("http://x/wal.mp4".to_string())
        );
    }

    #[tokio::test]
    async fn test_title_is_cleaned_once() {
        let (resolver, _) = setup(&[
            fixtures::feed_row("ARD", "Maus", "Foo", "http://x/foo.mp4"),
            fixtures::feed_row("", "", "2. Foo", "http://x/two-foo.mp4"),
        ]);

        let observation = resolver
            .resolve(&item("1. 2. Foo", Some("Maus"), "foo"))
            .await
            .unwrap();

        assert_eq!(observation.title, "2. Foo");
        assert_eq!(
            observation.reachability,
            Reachability::Direct("http://x/two-foo.mp4".to_string())
        );
    }

    #[tokio::test]
    async fn test_unmatched_item_gets_search_link() {
        let (resolver, _) = setup(&[fixtures::feed_row(
            "ARD",
            "Maus",
            "Der Wal",
            "http://x/wal.mp4",
        )]);

        let observation = resolver
            .resolve(&item("Das Krokodil & der Hai", None, "krokodil"))
            .await
            .unwrap();

        assert_eq!(
            observation.reachability,
            Reachability::Unavailable(
                "https://mediathekviewweb.de/#query=Das%20Krokodil%20%26%20der%20Hai".to_string()
            )
        );
        assert_eq!(observation.series, "");
    }

    #[tokio::test]
    async fn test_dead_links_count_as_unmatched() {
        let (resolver, probe) = setup(&[fixtures::feed_row(
            "ARD",
            "Maus",
            "Der Wal",
            "http://x/wal.mp4",
        )]);
        probe.set_outcome("http://x/wal.mp4", ProbeOutcome::Broken { status: 404 });

        let observation = resolver.resolve(&item("Der Wal", None, "wal")).await.unwrap();
        assert!(matches!(observation.reachability, Reachability::Unavailable(_)));
    }

    #[tokio::test]
    async fn test_missing_shortname_falls_back_to_title() {
        let (resolver, _) = setup(&[]);
        let observation = resolver.resolve(&item("Der Wal!", None, "")).await.unwrap();
        assert_eq!(observation.shortname, "derwal");
    }

    #[tokio::test]
    async fn test_resolve_all_keeps_input_order() {
        let (resolver, _) = setup(&[
            fixtures::feed_row("ARD", "Maus", "Der Wal", "http://x/wal.mp4"),
            fixtures::feed_row("", "", "Der Hai", "http://x/hai.mp4"),
        ]);

        let items = vec![
            item("Der Hai", Some("Maus"), "hai"),
            item("Unbekannt", Some("Maus"), "unbekannt"),
            item("Der Wal", Some("Maus"), "wal"),
        ];
        let observations = resolver.resolve_all(&items).await.unwrap();

        let links: Vec<_> = observations.iter().map(|o| o.reachability.value()).collect();
        assert_eq!(
            links,
            vec![
                "http://x/hai.mp4",
                "https://mediathekviewweb.de/#query=Unbekannt",
                "http://x/wal.mp4"
            ]
        );
    }
}
