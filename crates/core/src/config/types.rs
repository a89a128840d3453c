use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub feed: FeedConfig,
    #[serde(default)]
    pub availability: AvailabilityConfig,
    #[serde(default)]
    pub resolver: ResolverConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
}

/// Database configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("vidcanon.db")
}

/// Program-guide feed location
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FeedConfig {
    #[serde(default = "default_feed_path")]
    pub path: PathBuf,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            path: default_feed_path(),
        }
    }
}

fn default_feed_path() -> PathBuf {
    PathBuf::from("filmliste.txt")
}

/// Liveness cache and probe settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AvailabilityConfig {
    /// Cached verdicts older than this many calendar months are re-probed.
    #[serde(default = "default_max_age_months")]
    pub max_age_months: u32,
    /// Timeout for a single HEAD request.
    #[serde(default = "default_probe_timeout")]
    pub probe_timeout_secs: u32,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for AvailabilityConfig {
    fn default() -> Self {
        Self {
            max_age_months: default_max_age_months(),
            probe_timeout_secs: default_probe_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

fn default_max_age_months() -> u32 {
    1
}

fn default_probe_timeout() -> u32 {
    10
}

fn default_user_agent() -> String {
    format!("vidcanon/{}", env!("CARGO_PKG_VERSION"))
}

/// Observation resolver settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ResolverConfig {
    /// Number of matcher calls in flight at once.
    #[serde(default = "default_workers")]
    pub workers: usize,
    /// Prefix of the search link offered for videos without a catalog match.
    #[serde(default = "default_search_url_base")]
    pub search_url_base: String,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            search_url_base: default_search_url_base(),
        }
    }
}

fn default_workers() -> usize {
    4
}

fn default_search_url_base() -> String {
    "https://mediathekviewweb.de/#query=".to_string()
}

/// How duplicate observations are collapsed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DedupStrategy {
    /// Transitive clustering followed by majority fusion.
    #[default]
    Cluster,
    /// Sliding window over the title-sorted pool, dropping exact duplicates.
    Window,
}

/// Deduplication and output settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PipelineConfig {
    #[serde(default)]
    pub dedup: DedupStrategy,
    /// Only used by [`DedupStrategy::Window`].
    #[serde(default = "default_window_size")]
    pub window_size: usize,
    /// Series assigned to canonical videos that ended up without one.
    #[serde(default)]
    pub default_series: Option<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            dedup: DedupStrategy::default(),
            window_size: default_window_size(),
            default_series: None,
        }
    }
}

fn default_window_size() -> usize {
    3
}
