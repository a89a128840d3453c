//! SQLite-backed program-guide catalog.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use rusqlite::{params, Connection, ToSql};
use tracing::{debug, info};

use super::availability::AvailabilityCache;
use super::feed::{DecodedRow, FeedDecoder};
use super::{CatalogEntry, CatalogError, CatalogStats, FeedError, IngestReport, LinkQuality, VideoCatalog};
use crate::metrics::FEED_ROWS;
use crate::probe::LivenessProbe;

const ENTRY_COLUMNS: &str = "channel, series, title, date, time, duration, size_mb, description,
     link, link_quality, url, website, subtitle_url, rtmp_url, small_url, rtmp_small_url,
     hd_url, rtmp_hd_url, utc_timestamp, history_url, geo, is_new";

/// Lock the shared connection, turning a poisoned lock into an error.
pub(super) fn lock_conn(conn: &Mutex<Connection>) -> Result<MutexGuard<'_, Connection>, CatalogError> {
    conn.lock()
        .map_err(|_| CatalogError::Internal("catalog connection lock poisoned".to_string()))
}

/// SQLite-backed catalog.
///
/// Built once at startup, shared by reference (or `Arc`) with the matcher,
/// and released with [`SqliteCatalog::close`]. The `videos` table is rebuilt
/// on every [`SqliteCatalog::ingest`]; the availability cache persists.
pub struct SqliteCatalog {
    conn: Arc<Mutex<Connection>>,
    availability: AvailabilityCache,
}

impl SqliteCatalog {
    /// Open (or create) the catalog database at `path`.
    pub fn open(path: &Path, probe: Arc<dyn LivenessProbe>) -> Result<Self, CatalogError> {
        let conn = Connection::open(path)?;
        Self::from_connection(conn, probe)
    }

    /// Create an in-memory catalog (useful for testing).
    pub fn in_memory(probe: Arc<dyn LivenessProbe>) -> Result<Self, CatalogError> {
        let conn = Connection::open_in_memory()?;
        Self::from_connection(conn, probe)
    }

    fn from_connection(conn: Connection, probe: Arc<dyn LivenessProbe>) -> Result<Self, CatalogError> {
        Self::initialize_schema(&conn)?;
        AvailabilityCache::initialize_schema(&conn)?;
        let conn = Arc::new(Mutex::new(conn));
        Ok(Self {
            availability: AvailabilityCache::new(Arc::clone(&conn), probe),
            conn,
        })
    }

    /// Override the cache freshness window (default: one month).
    pub fn with_max_age_months(mut self, months: u32) -> Self {
        self.availability = self.availability.with_max_age_months(months);
        self
    }

    fn initialize_schema(conn: &Connection) -> Result<(), CatalogError> {
        conn.execute_batch(Self::VIDEOS_SCHEMA)?;
        Ok(())
    }

    const VIDEOS_SCHEMA: &'static str = r#"
        CREATE TABLE IF NOT EXISTS videos (
            channel TEXT NOT NULL,
            series TEXT NOT NULL,
            title TEXT,
            date TEXT,
            time TEXT,
            duration TEXT,
            size_mb INTEGER,
            description TEXT,
            link TEXT NOT NULL,
            link_quality INTEGER NOT NULL,
            url TEXT NOT NULL,
            website TEXT,
            subtitle_url TEXT,
            rtmp_url TEXT,
            small_url TEXT,
            rtmp_small_url TEXT,
            hd_url TEXT,
            rtmp_hd_url TEXT,
            utc_timestamp INTEGER,
            history_url TEXT,
            geo TEXT,
            is_new INTEGER NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_videos_title ON videos(title);
        CREATE INDEX IF NOT EXISTS idx_videos_series ON videos(series);
    "#;

    /// Access the liveness cache.
    pub fn availability(&self) -> &AvailabilityCache {
        &self.availability
    }

    /// Replace the catalog contents with the given feed.
    ///
    /// The whole feed is decoded before anything is written, so a decoding
    /// error leaves the previous contents untouched.
    pub fn ingest<I, S>(&self, lines: I) -> Result<IngestReport, CatalogError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut report = IngestReport::default();
        let mut entries = Vec::new();

        let mut lines = lines
            .into_iter()
            .enumerate()
            .filter(|(_, line)| !line.as_ref().trim().is_empty());
        let (_, header) = lines.next().ok_or(FeedError::Empty)?;
        let mut decoder = FeedDecoder::from_header(header.as_ref())?;

        for (index, line) in lines {
            report.rows_read += 1;
            match decoder.decode_row(index + 1, line.as_ref())? {
                DecodedRow::Playable(entry) => entries.push(*entry),
                DecodedRow::Manifest { link } => {
                    debug!("Discarding manifest link {}", link);
                    report.discarded_manifest += 1;
                }
            }
        }

        let mut conn = lock_conn(&self.conn)?;
        let tx = conn.transaction()?;
        tx.execute_batch("DROP TABLE IF EXISTS videos;")?;
        tx.execute_batch(Self::VIDEOS_SCHEMA)?;
        {
            let mut stmt = tx.prepare(&format!(
                "INSERT INTO videos ({}) VALUES
                 (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11,
                  ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20, ?21, ?22)",
                ENTRY_COLUMNS
            ))?;
            for entry in &entries {
                stmt.execute(params![
                    &entry.channel,
                    &entry.series,
                    &entry.title,
                    &entry.date,
                    &entry.time,
                    &entry.duration,
                    &entry.size_mb,
                    &entry.description,
                    &entry.link,
                    entry.link_quality.as_i64(),
                    &entry.url,
                    &entry.website,
                    &entry.subtitle_url,
                    &entry.rtmp_url,
                    &entry.small_url,
                    &entry.rtmp_small_url,
                    &entry.hd_url,
                    &entry.rtmp_hd_url,
                    &entry.utc_timestamp,
                    &entry.history_url,
                    &entry.geo,
                    entry.is_new,
                ])?;
            }
        }
        tx.commit()?;

        report.stored = entries.len() as u64;
        FEED_ROWS.with_label_values(&["stored"]).inc_by(report.stored);
        FEED_ROWS
            .with_label_values(&["manifest"])
            .inc_by(report.discarded_manifest);
        info!(
            "Ingested feed: {} rows read, {} stored, {} manifests discarded",
            report.rows_read, report.stored, report.discarded_manifest
        );

        Ok(report)
    }

    /// Read the feed from a file and [`ingest`](Self::ingest) it.
    pub fn ingest_file(&self, path: &Path) -> Result<IngestReport, CatalogError> {
        info!("Reading feed from {:?}", path);
        let file = File::open(path)
            .map_err(|e| CatalogError::Internal(format!("cannot open {:?}: {}", path, e)))?;
        let lines = BufReader::new(file)
            .lines()
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| CatalogError::Internal(format!("cannot read {:?}: {}", path, e)))?;
        self.ingest(lines)
    }

    /// Release the database connection.
    pub fn close(self) -> Result<(), CatalogError> {
        let Self { conn, availability } = self;
        drop(availability);
        let conn = Arc::try_unwrap(conn)
            .map_err(|_| CatalogError::Internal("catalog connection still shared".to_string()))?
            .into_inner()
            .map_err(|_| CatalogError::Internal("catalog connection lock poisoned".to_string()))?;
        conn.close().map_err(|(_, e)| CatalogError::Database(e.to_string()))?;
        info!("Catalog closed");
        Ok(())
    }

    fn query_entries(
        &self,
        condition: &str,
        series: Option<&str>,
        args: &[&dyn ToSql],
    ) -> Result<Vec<CatalogEntry>, CatalogError> {
        let conn = lock_conn(&self.conn)?;

        let mut sql = format!("SELECT {} FROM videos WHERE {}", ENTRY_COLUMNS, condition);
        let mut bound: Vec<&dyn ToSql> = args.to_vec();
        if let Some(series) = &series {
            sql.push_str(&format!(" AND series = ?{}", bound.len() + 1));
            bound.push(series);
        }
        sql.push_str(" ORDER BY rowid");

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(bound.as_slice(), Self::row_to_entry)?;

        let mut entries = Vec::new();
        for row in rows {
            entries.push(row?);
        }
        Ok(entries)
    }

    fn row_to_entry(row: &rusqlite::Row) -> rusqlite::Result<CatalogEntry> {
        let quality: i64 = row.get(9)?;
        let link_quality = LinkQuality::from_i64(quality)
            .ok_or(rusqlite::Error::IntegralValueOutOfRange(9, quality))?;

        Ok(CatalogEntry {
            channel: row.get(0)?,
            series: row.get(1)?,
            title: row.get(2)?,
            date: row.get(3)?,
            time: row.get(4)?,
            duration: row.get(5)?,
            size_mb: row.get(6)?,
            description: row.get(7)?,
            link: row.get(8)?,
            link_quality,
            url: row.get(10)?,
            website: row.get(11)?,
            subtitle_url: row.get(12)?,
            rtmp_url: row.get(13)?,
            small_url: row.get(14)?,
            rtmp_small_url: row.get(15)?,
            hd_url: row.get(16)?,
            rtmp_hd_url: row.get(17)?,
            utc_timestamp: row.get(18)?,
            history_url: row.get(19)?,
            geo: row.get(20)?,
            is_new: row.get(21)?,
        })
    }
}

#[async_trait]
impl VideoCatalog for SqliteCatalog {
    fn find_by_title(&self, title: &str, series: Option<&str>) -> Result<Vec<CatalogEntry>, CatalogError> {
        self.query_entries("title = ?1", series, &[&title])
    }

    fn find_by_title_fragment(
        &self,
        fragment: &str,
        series: Option<&str>,
    ) -> Result<Vec<CatalogEntry>, CatalogError> {
        self.query_entries("instr(title, ?1) > 0", series, &[&fragment])
    }

    fn entries(&self, series: Option<&str>) -> Result<Vec<CatalogEntry>, CatalogError> {
        self.query_entries("title IS NOT NULL", series, &[])
    }

    fn series_matching(&self, fragment: &str) -> Result<Vec<String>, CatalogError> {
        let conn = lock_conn(&self.conn)?;
        let mut stmt = conn.prepare(
            "SELECT DISTINCT series FROM videos WHERE instr(series, ?1) > 0 ORDER BY series",
        )?;
        let rows = stmt.query_map(params![fragment], |row| row.get(0))?;

        let mut series = Vec::new();
        for row in rows {
            series.push(row?);
        }
        Ok(series)
    }

    async fn check_liveness(&self, link: &str) -> Result<bool, CatalogError> {
        self.availability.check(link).await
    }

    fn stats(&self) -> Result<CatalogStats, CatalogError> {
        let conn = lock_conn(&self.conn)?;

        let total_entries: u64 = conn.query_row("SELECT COUNT(*) FROM videos", [], |row| row.get(0))?;

        let distinct_series: u64 =
            conn.query_row("SELECT COUNT(DISTINCT series) FROM videos", [], |row| row.get(0))?;

        let high_quality_entries: u64 = conn.query_row(
            "SELECT COUNT(*) FROM videos WHERE link_quality = ?",
            params![LinkQuality::High.as_i64()],
            |row| row.get(0),
        )?;

        let cached_links: u64 =
            conn.query_row("SELECT COUNT(*) FROM availability_cache", [], |row| row.get(0))?;

        let working_cached_links: u64 = conn.query_row(
            "SELECT COUNT(*) FROM availability_cache WHERE works = 1",
            [],
            |row| row.get(0),
        )?;

        Ok(CatalogStats {
            total_entries,
            distinct_series,
            high_quality_entries,
            cached_links,
            working_cached_links,
        })
    }
}
