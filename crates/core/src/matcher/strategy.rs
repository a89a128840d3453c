//! The fixed table of match strategies, strictest first.

use serde::{Deserialize, Serialize};

use crate::catalog::{CatalogEntry, CatalogError, VideoCatalog};
use crate::text::{prefix_free, tokenize};

/// One way of looking up an observed title in the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Catalog title equals the title as the source printed it.
    OriginalTitle,
    /// Catalog title equals the cleaned title.
    CleanTitle,
    /// Catalog title contains the cleaned title.
    CleanTitleFragment,
    /// Catalog title contains the cleaned title minus any `"Prefix: "`.
    PrefixFreeFragment,
    /// Every word of the prefix-free title appears in the catalog title.
    PrefixFreeTokenSubset,
}

/// Strategies in the order they are tried.
pub const STRATEGIES: [Strategy; 5] = [
    Strategy::OriginalTitle,
    Strategy::CleanTitle,
    Strategy::CleanTitleFragment,
    Strategy::PrefixFreeFragment,
    Strategy::PrefixFreeTokenSubset,
];

/// Titles a search runs with.
#[derive(Debug, Clone)]
pub(crate) struct MatchQuery {
    pub original_title: Option<String>,
    pub clean_title: String,
}

impl Strategy {
    pub fn name(&self) -> &'static str {
        match self {
            Strategy::OriginalTitle => "original_title",
            Strategy::CleanTitle => "clean_title",
            Strategy::CleanTitleFragment => "clean_title_fragment",
            Strategy::PrefixFreeFragment => "prefix_free_fragment",
            Strategy::PrefixFreeTokenSubset => "prefix_free_token_subset",
        }
    }

    /// Run this strategy. An empty result means "no hit".
    pub(crate) fn run(
        &self,
        catalog: &dyn VideoCatalog,
        query: &MatchQuery,
        series: Option<&str>,
    ) -> Result<Vec<CatalogEntry>, CatalogError> {
        if *self == Strategy::OriginalTitle {
            return match query.original_title.as_deref() {
                Some(original) if !original.is_empty() => catalog.find_by_title(original, series),
                _ => Ok(Vec::new()),
            };
        }

        if query.clean_title.is_empty() {
            return Ok(Vec::new());
        }

        match self {
            Strategy::OriginalTitle => Ok(Vec::new()),
            Strategy::CleanTitle => catalog.find_by_title(&query.clean_title, series),
            Strategy::CleanTitleFragment => catalog.find_by_title_fragment(&query.clean_title, series),
            Strategy::PrefixFreeFragment => {
                let fragment = prefix_free(&query.clean_title);
                if fragment.is_empty() {
                    return Ok(Vec::new());
                }
                catalog.find_by_title_fragment(fragment, series)
            }
            Strategy::PrefixFreeTokenSubset => {
                let wanted = tokenize(prefix_free(&query.clean_title));
                if wanted.is_empty() {
                    return Ok(Vec::new());
                }
                let hits = catalog
                    .entries(series)?
                    .into_iter()
                    .filter(|entry| {
                        entry
                            .title
                            .as_deref()
                            .is_some_and(|title| wanted.is_subset(&tokenize(title)))
                    })
                    .collect();
                Ok(hits)
            }
        }
    }
}
