pub mod catalog;
pub mod config;
pub mod dedup;
pub mod matcher;
pub mod metrics;
pub mod observation;
pub mod pipeline;
pub mod probe;
pub mod resolve;
pub mod testing;
pub mod text;

pub use catalog::{
    resolve_link, AvailabilityCache, AvailabilityRecord, CatalogEntry, CatalogError, CatalogStats,
    FeedError, IngestReport, LinkQuality, SqliteCatalog, VideoCatalog,
};
pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, DedupStrategy,
    PipelineConfig, ResolverConfig,
};
pub use dedup::{cluster, deduplicate_sorted, fuse, DuplicateCluster};
pub use matcher::{CascadingMatcher, MatchOutcome, SeriesPhase, Strategy, StrategyHit, STRATEGIES};
pub use observation::{
    CanonicalVideo, ObservationId, Reachability, ReachabilityKind, ScrapedItem, VideoObservation,
};
pub use pipeline::Pipeline;
pub use probe::{HttpProbe, LivenessProbe, ProbeError, ProbeOutcome};
pub use resolve::ObservationResolver;
