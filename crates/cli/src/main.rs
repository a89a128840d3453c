use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use prometheus::{Encoder, Registry, TextEncoder};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use vidcanon_core::{
    load_config, metrics, validate_config, CascadingMatcher, HttpProbe, ObservationResolver,
    Pipeline, ScrapedItem, SqliteCatalog, VideoCatalog,
};

const USAGE: &str = "usage: vidcanon <scraped-items.json> [metrics-output.prom]";

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Logs go to stderr, stdout carries the result
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let mut args = std::env::args().skip(1);
    let items_path = args.next().map(PathBuf::from).ok_or_else(|| anyhow!(USAGE))?;
    let metrics_path = args.next().map(PathBuf::from);

    let config_path = std::env::var("VIDCANON_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    info!("Loading configuration from {:?}", config_path);
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;
    validate_config(&config).context("Configuration validation failed")?;
    info!("Database path: {:?}", config.database.path);

    let registry = Registry::new();
    for metric in metrics::all_metrics() {
        registry
            .register(metric)
            .context("Failed to register metrics")?;
    }

    let probe = Arc::new(
        HttpProbe::new(&config.availability).context("Failed to create liveness probe")?,
    );
    let catalog = SqliteCatalog::open(&config.database.path, probe)
        .context("Failed to open catalog")?
        .with_max_age_months(config.availability.max_age_months);

    let report = catalog
        .ingest_file(&config.feed.path)
        .with_context(|| format!("Failed to ingest feed {:?}", config.feed.path))?;
    info!(
        "Catalog ready: {} entries ({} manifest-only rows dropped)",
        report.stored, report.discarded_manifest
    );

    let items = read_items(&items_path)?;
    info!("Resolving {} scraped items", items.len());

    let catalog = Arc::new(catalog);
    let matcher = Arc::new(CascadingMatcher::new(
        Arc::clone(&catalog) as Arc<dyn VideoCatalog>
    ));
    let resolver = ObservationResolver::new(matcher, config.resolver.clone());
    let observations = resolver
        .resolve_all(&items)
        .await
        .context("Failed to resolve scraped items")?;
    drop(resolver);

    let videos = Pipeline::new(config.pipeline.clone()).run(observations);
    println!(
        "{}",
        serde_json::to_string_pretty(&videos).context("Failed to serialize videos")?
    );

    let stats = catalog.stats().context("Failed to read catalog stats")?;
    info!(
        "Done: {} videos, {} of {} cached links working",
        videos.len(),
        stats.working_cached_links,
        stats.cached_links
    );

    if let Some(path) = metrics_path {
        write_metrics(&registry, &path)?;
    }

    Arc::try_unwrap(catalog)
        .map_err(|_| anyhow!("Catalog still in use at shutdown"))?
        .close()
        .context("Failed to close catalog")?;

    Ok(())
}

fn read_items(path: &Path) -> Result<Vec<ScrapedItem>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read scraped items from {:?}", path))?;
    serde_json::from_str(&raw).with_context(|| format!("Invalid scraped items in {:?}", path))
}

fn write_metrics(registry: &Registry, path: &Path) -> Result<()> {
    let mut buffer = Vec::new();
    TextEncoder::new()
        .encode(&registry.gather(), &mut buffer)
        .context("Failed to encode metrics")?;
    std::fs::write(path, buffer).with_context(|| format!("Failed to write metrics to {:?}", path))?;
    info!("Metrics written to {:?}", path);
    Ok(())
}
