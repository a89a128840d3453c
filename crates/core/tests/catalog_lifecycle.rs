//! End-to-end tests from feed ingestion to canonical videos.
//!
//! These tests exercise the full path with a scripted liveness probe:
//! - Feed decoding and storage on disk
//! - Matching scraped items and filtering dead links
//! - Clustering and fusion of observations from several sources
//! - Liveness verdicts persisting across catalog reopen and re-ingest

use std::path::Path;
use std::sync::Arc;

use tempfile::TempDir;

use vidcanon_core::{
    testing::{fixtures, MockProbe},
    CascadingMatcher, ObservationResolver, Pipeline, PipelineConfig, ProbeOutcome, Reachability,
    ResolverConfig, ScrapedItem, SqliteCatalog, VideoCatalog, VideoObservation,
};

const FEED: &str = r#"["Sender","Thema","Titel","Datum","Dauer","Url","Url HD","Url Klein","neu","Geo"]
["ARD","Die Sendung mit der Maus","Der Wal","01.03.2024","00:30:00","https://media.example/maus/wal.mp4","27|wal_hd.mp4","","false","DE"]
["","","Spezial: Der Elefant","02.03.2024","00:29:00","http://media.example/maus/elefant.mp4","","","true",""]
["","","Live","","","https://media.example/maus/live.m3u8","","","false",""]
["WDR","Wissen macht Ah!","Der Wal","03.03.2024","00:25:00","http://media.example/ah/wal.mp4","","","false",""]
["","","Der Igel","04.03.2024","00:25:00","http://media.example/ah/igel.mp4","","","false",""]"#;

struct Harness {
    catalog: Arc<SqliteCatalog>,
    probe: Arc<MockProbe>,
    _dir: TempDir,
}

impl Harness {
    fn new() -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let probe = Arc::new(MockProbe::new());
        let catalog = open_with_feed(dir.path(), probe.clone());
        Self {
            catalog: Arc::new(catalog),
            probe,
            _dir: dir,
        }
    }

    fn resolver(&self) -> ObservationResolver {
        let matcher = Arc::new(CascadingMatcher::new(
            Arc::clone(&self.catalog) as Arc<dyn VideoCatalog>
        ));
        ObservationResolver::new(matcher, ResolverConfig::default())
    }
}

fn open_with_feed(dir: &Path, probe: Arc<MockProbe>) -> SqliteCatalog {
    let feed_path = dir.join("filmliste.txt");
    std::fs::write(&feed_path, FEED).expect("Failed to write feed");

    let catalog =
        SqliteCatalog::open(&dir.join("catalog.db"), probe).expect("Failed to open catalog");
    let report = catalog.ingest_file(&feed_path).expect("Failed to ingest feed");
    assert_eq!(report.rows_read, 5);
    assert_eq!(report.stored, 4);
    assert_eq!(report.discarded_manifest, 1);
    catalog
}

fn item(title: &str, series: Option<&str>, shortname: &str) -> ScrapedItem {
    ScrapedItem {
        original_title: title.to_string(),
        series: series.map(String::from),
        thumbnail: format!("thumbnails/{}.jpg", shortname),
        shortname: shortname.to_string(),
    }
}

#[tokio::test]
async fn test_hd_splice_and_series_scoped_match() {
    let harness = Harness::new();

    let candidates = CascadingMatcher::new(Arc::clone(&harness.catalog) as Arc<dyn VideoCatalog>)
        .search("Der Wal", None, Some("Die Sendung mit der Maus"))
        .await
        .unwrap();

    assert_eq!(candidates.len(), 1);
    assert_eq!(candidates[0].link, "http://media.example/maus/wal_hd.mp4");
    assert_eq!(candidates[0].geo.as_deref(), Some("DE"));
}

#[tokio::test]
async fn test_scraped_items_to_canonical_videos() {
    let harness = Harness::new();
    harness.probe.set_outcome(
        "http://media.example/ah/igel.mp4",
        ProbeOutcome::Broken { status: 404 },
    );

    let resolver = harness.resolver();
    let items = vec![
        item("1. Der Wal", Some("Die Sendung mit der Maus"), "der-wal-1"),
        item("Der Elefant", Some("Die Sendung mit der Maus"), "elefant"),
        item("Der Igel", Some("Wissen macht Ah!"), "igel"),
    ];
    let mut observations = resolver.resolve_all(&items).await.unwrap();

    // A second source saw the whale without series and with a watch page
    observations.push(VideoObservation {
        thumbnail: "thumbnails/wal-page.jpg".to_string(),
        title: "Der Wal".to_string(),
        series: String::new(),
        shortname: "wal".to_string(),
        reachability: Reachability::WatchPage("http://maus.example/wal".to_string()),
    });
    observations.push(fixtures::observation(
        "Der Elefant",
        "Die Sendung mit der Maus",
        Reachability::Direct("http://media.example/maus/elefant.mp4".to_string()),
    ));

    let videos = Pipeline::new(PipelineConfig::default()).run(observations);
    let titles: Vec<_> = videos.iter().map(|v| v.title.as_str()).collect();
    assert_eq!(titles, vec!["Der Elefant", "Der Igel", "Der Wal"]);

    let elefant = &videos[0];
    assert_eq!(
        elefant.reachability,
        Reachability::Direct("http://media.example/maus/elefant.mp4".to_string())
    );

    let igel = &videos[1];
    assert_eq!(
        igel.reachability,
        Reachability::Unavailable("https://mediathekviewweb.de/#query=Der%20Igel".to_string())
    );

    let wal = &videos[2];
    assert_eq!(wal.series, "Die Sendung mit der Maus");
    assert_eq!(wal.shortname, "der-wal");
    assert_eq!(
        wal.reachability,
        Reachability::Direct("http://media.example/maus/wal_hd.mp4".to_string())
    );
}

#[tokio::test]
async fn test_liveness_verdicts_survive_reopen() {
    let dir = TempDir::new().unwrap();

    let probe = Arc::new(MockProbe::new());
    let catalog = open_with_feed(dir.path(), probe.clone());
    assert!(catalog
        .check_liveness("http://media.example/ah/igel.mp4")
        .await
        .unwrap());
    catalog.close().unwrap();

    // Reopen and re-ingest: the entries are rebuilt, the verdict is not
    let probe = Arc::new(MockProbe::new());
    let catalog = open_with_feed(dir.path(), probe.clone());
    assert!(catalog
        .check_liveness("http://media.example/ah/igel.mp4")
        .await
        .unwrap());
    assert!(probe.calls().is_empty());

    let stats = catalog.stats().unwrap();
    assert_eq!(stats.total_entries, 4);
    assert_eq!(stats.cached_links, 1);
}
