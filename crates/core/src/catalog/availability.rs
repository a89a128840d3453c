//! Durable cache of link liveness verdicts.
//!
//! A verdict is reused while it is younger than the freshness window; after
//! that the link is probed again. Negative verdicts are cached too.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Months, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, warn};

use super::sqlite::lock_conn;
use super::{AvailabilityRecord, CatalogError};
use crate::metrics::LIVENESS_CHECKS;
use crate::probe::{LivenessProbe, ProbeOutcome};

const DEFAULT_MAX_AGE_MONTHS: u32 = 1;

/// Liveness cache sharing the catalog's connection.
pub struct AvailabilityCache {
    conn: Arc<Mutex<Connection>>,
    probe: Arc<dyn LivenessProbe>,
    max_age: Months,
    /// One async lock per URI currently being probed.
    inflight: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl AvailabilityCache {
    pub(super) fn new(conn: Arc<Mutex<Connection>>, probe: Arc<dyn LivenessProbe>) -> Self {
        Self {
            conn,
            probe,
            max_age: Months::new(DEFAULT_MAX_AGE_MONTHS),
            inflight: Mutex::new(HashMap::new()),
        }
    }

    pub(super) fn with_max_age_months(mut self, months: u32) -> Self {
        self.max_age = Months::new(months);
        self
    }

    pub(super) fn initialize_schema(conn: &Connection) -> Result<(), CatalogError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS availability_cache (
                uri TEXT PRIMARY KEY,
                works INTEGER NOT NULL,
                last_checked INTEGER NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_availability_last_checked
                ON availability_cache(last_checked);
            "#,
        )?;
        Ok(())
    }

    /// Whether `uri` currently works, probing if the cached verdict is
    /// missing or stale.
    pub async fn check(&self, uri: &str) -> Result<bool, CatalogError> {
        self.check_at(uri, Utc::now()).await
    }

    /// [`check`](Self::check) with an explicit clock.
    pub async fn check_at(&self, uri: &str, now: DateTime<Utc>) -> Result<bool, CatalogError> {
        let cutoff = self.cutoff(now);

        if let Some(works) = self.fresh_verdict(uri, cutoff)? {
            LIVENESS_CHECKS.with_label_values(&["cache_hit"]).inc();
            debug!("Cache hit for {}: works={}", uri, works);
            return Ok(works);
        }

        let slot = self.claim_slot(uri)?;
        let _probing = slot.lock.lock().await;

        // Another caller may have probed this URI while we waited.
        if let Some(works) = self.fresh_verdict(uri, cutoff)? {
            LIVENESS_CHECKS.with_label_values(&["cache_hit"]).inc();
            return Ok(works);
        }

        let outcome = self.probe.probe(uri).await;
        LIVENESS_CHECKS.with_label_values(&[outcome.label()]).inc();
        match &outcome {
            ProbeOutcome::Works => debug!("{} works", uri),
            ProbeOutcome::Broken { status } => debug!("{} answered {}", uri, status),
            ProbeOutcome::Unreachable { reason } => {
                warn!(
                    "{} probe could not reach {}, caching as not working: {}",
                    self.probe.name(),
                    uri,
                    reason
                )
            }
        }

        let works = outcome.works();
        self.upsert(&AvailabilityRecord {
            uri: uri.to_string(),
            works,
            last_checked: now.timestamp(),
        })?;

        Ok(works)
    }

    /// The cached record for `uri`, fresh or not.
    pub fn lookup(&self, uri: &str) -> Result<Option<AvailabilityRecord>, CatalogError> {
        let conn = lock_conn(&self.conn)?;
        let record = conn
            .query_row(
                "SELECT uri, works, last_checked FROM availability_cache WHERE uri = ?",
                params![uri],
                |row| {
                    Ok(AvailabilityRecord {
                        uri: row.get(0)?,
                        works: row.get(1)?,
                        last_checked: row.get(2)?,
                    })
                },
            )
            .optional()?;
        Ok(record)
    }

    /// Insert or replace the verdict for a URI.
    pub fn upsert(&self, record: &AvailabilityRecord) -> Result<(), CatalogError> {
        let conn = lock_conn(&self.conn)?;
        conn.execute(
            "INSERT INTO availability_cache (uri, works, last_checked) VALUES (?, ?, ?)
             ON CONFLICT(uri) DO UPDATE SET
                works = excluded.works,
                last_checked = excluded.last_checked",
            params![&record.uri, record.works, record.last_checked],
        )?;
        Ok(())
    }

    /// Number of verdicts that are still fresh at `now`.
    pub fn fresh_count(&self, now: DateTime<Utc>) -> Result<u64, CatalogError> {
        let conn = lock_conn(&self.conn)?;
        let count: u64 = conn.query_row(
            "SELECT COUNT(*) FROM availability_cache WHERE last_checked > ?",
            params![self.cutoff(now)],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Verdicts checked at or before this epoch second are stale.
    fn cutoff(&self, now: DateTime<Utc>) -> i64 {
        now.checked_sub_months(self.max_age)
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
            .timestamp()
    }

    fn fresh_verdict(&self, uri: &str, cutoff: i64) -> Result<Option<bool>, CatalogError> {
        let conn = lock_conn(&self.conn)?;
        let works = conn
            .query_row(
                "SELECT works FROM availability_cache WHERE uri = ? AND last_checked > ?",
                params![uri, cutoff],
                |row| row.get(0),
            )
            .optional()?;
        Ok(works)
    }

    /// Register interest in probing `uri`; the returned slot gives the
    /// per-URI lock back when dropped.
    fn claim_slot<'a>(&'a self, uri: &'a str) -> Result<InflightSlot<'a>, CatalogError> {
        let mut inflight = self
            .inflight
            .lock()
            .map_err(|_| CatalogError::Internal("probe lock map poisoned".to_string()))?;
        let lock = Arc::clone(inflight.entry(uri.to_string()).or_default());
        Ok(InflightSlot {
            cache: self,
            uri,
            lock,
        })
    }
}

/// A caller's hold on the per-URI probe lock.
///
/// Dropping it removes the map entry once no other caller holds the same
/// lock, including on early error returns.
struct InflightSlot<'a> {
    cache: &'a AvailabilityCache,
    uri: &'a str,
    lock: Arc<tokio::sync::Mutex<()>>,
}

impl Drop for InflightSlot<'_> {
    fn drop(&mut self) {
        let Ok(mut inflight) = self.cache.inflight.lock() else {
            return;
        };
        let idle = inflight
            .get(self.uri)
            .is_some_and(|held| Arc::ptr_eq(held, &self.lock) && Arc::strong_count(held) <= 2);
        if idle {
            inflight.remove(self.uri);
        }
    }
}
