//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Feed ingestion (rows stored, manifests dropped)
//! - Liveness checks (cache hits, probe outcomes)
//! - Matcher strategy hits
//! - Duplicate clustering

use once_cell::sync::Lazy;
use prometheus::{IntCounter, IntCounterVec, Opts};

// =============================================================================
// Catalog
// =============================================================================

/// Feed rows by outcome.
pub static FEED_ROWS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("vidcanon_feed_rows_total", "Total feed rows ingested"),
        &["outcome"], // "stored", "manifest"
    )
    .expect("valid metric definition")
});

/// Liveness checks by how they were answered.
pub static LIVENESS_CHECKS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("vidcanon_liveness_checks_total", "Total link liveness checks"),
        &["outcome"], // "cache_hit", "probe_ok", "probe_dead", "probe_unreachable"
    )
    .expect("valid metric definition")
});

// =============================================================================
// Matcher
// =============================================================================

/// Matcher searches by the strategy that answered them.
pub static MATCHER_HITS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("vidcanon_matcher_hits_total", "Matcher searches by deciding strategy"),
        &["strategy", "phase"], // phase: "with_series", "any_series", "none"
    )
    .expect("valid metric definition")
});

// =============================================================================
// Deduplication
// =============================================================================

/// Duplicate clusters formed.
pub static CLUSTERS_FORMED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new("vidcanon_clusters_formed_total", "Total duplicate clusters formed")
        .expect("valid metric definition")
});

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        Box::new(FEED_ROWS.clone()),
        Box::new(LIVENESS_CHECKS.clone()),
        Box::new(MATCHER_HITS.clone()),
        Box::new(CLUSTERS_FORMED.clone()),
    ]
}
