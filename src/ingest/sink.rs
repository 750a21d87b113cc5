//! Persistence sink: durable SQLite store for samples and classified events.
//!
//! WAL mode so external readers can query while ingestion writes, prepared
//! statements for insert throughput, idempotent schema setup, and one
//! transaction per ingested line so a sample and its events become visible
//! together.

use std::path::{Path, PathBuf};

use rusqlite::{Connection, OpenFlags, params};

use crate::core::errors::{DtpError, Result};
use crate::core::retry::{RetryOutcome, RetryPolicy};
use crate::ingest::classifier::{EventKind, EventRecord};
use crate::stream::sample::{TelemetrySample, format_ts};

/// Durable store handle for the ingestion run.
#[derive(Debug)]
pub struct TelemetrySink {
    conn: Connection,
    path: PathBuf,
}

impl TelemetrySink {
    /// Open the store directly. Fails fast; use [`Self::connect`] on the
    /// ingestion path where the store may not be available yet.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|source| DtpError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_CREATE
                | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        apply_pragmas(&conn)?;

        Ok(Self {
            conn,
            path: path.to_path_buf(),
        })
    }

    /// Open the store, retrying per `retry_policy` while it is unavailable.
    ///
    /// Transient availability is the expected startup condition for a
    /// long-running pipeline; the default policy never gives up. Returns
    /// `Ok(None)` when `cancel` fires during the wait.
    pub fn connect(
        path: &Path,
        retry_policy: &RetryPolicy,
        cancel: impl Fn() -> bool,
    ) -> Result<Option<Self>> {
        retry_policy.run_cancellable("durable store", cancel, || match Self::open(path) {
            Ok(sink) => RetryOutcome::Ready(sink),
            Err(e) => RetryOutcome::NotYet(e.to_string()),
        })
    }

    /// Path to the database file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Idempotently create the sample and event tables. Safe on every start.
    pub fn ensure_schema(&self) -> Result<()> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS telemetry (
                ts TEXT NOT NULL,
                vehicle_id TEXT NOT NULL,
                speed_kmh REAL NOT NULL,
                rpm INTEGER NOT NULL,
                throttle_pct REAL NOT NULL,
                brake_pct REAL NOT NULL,
                steer_deg REAL NOT NULL,
                g_lat REAL NOT NULL,
                g_lon REAL NOT NULL
            );

            CREATE TABLE IF NOT EXISTS events (
                ts TEXT NOT NULL,
                vehicle_id TEXT NOT NULL,
                event_type TEXT NOT NULL
            );",
        )?;
        Ok(())
    }

    /// Best-effort range-scan indexes on (vehicle_id, ts).
    ///
    /// The time-partitioned-storage upgrade from the store side; must never
    /// fail the pipeline. Returns whether the indexes are in place.
    pub fn apply_range_scan_indexes(&self) -> bool {
        let result = self.conn.execute_batch(
            "CREATE INDEX IF NOT EXISTS idx_telemetry_vehicle_ts
                ON telemetry (vehicle_id, ts DESC);
             CREATE INDEX IF NOT EXISTS idx_events_vehicle_ts
                ON events (vehicle_id, ts DESC);",
        );
        match result {
            Ok(()) => true,
            Err(e) => {
                eprintln!("[DTP-SINK] range-scan index setup skipped: {e}");
                false
            }
        }
    }

    /// Insert one telemetry row.
    pub fn insert_sample(&self, sample: &TelemetrySample) -> Result<()> {
        self.conn
            .prepare_cached(
                "INSERT INTO telemetry (
                    ts, vehicle_id, speed_kmh, rpm, throttle_pct,
                    brake_pct, steer_deg, g_lat, g_lon
                ) VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9)",
            )?
            .execute(params![
                format_ts(sample.ts),
                sample.vehicle_id,
                sample.speed_kmh,
                sample.rpm,
                sample.throttle_pct,
                sample.brake_pct,
                sample.steer_deg,
                sample.g_lat,
                sample.g_lon,
            ])?;
        Ok(())
    }

    /// Insert one event row.
    pub fn insert_event(&self, record: &EventRecord) -> Result<()> {
        self.conn
            .prepare_cached(
                "INSERT INTO events (ts, vehicle_id, event_type) VALUES (?1,?2,?3)",
            )?
            .execute(params![
                format_ts(record.ts),
                record.vehicle_id,
                record.kind.as_str(),
            ])?;
        Ok(())
    }

    /// Persist one ingested line: the sample row, then one event row per
    /// kind, committed together. Any failure aborts the whole line.
    pub fn persist(&mut self, sample: &TelemetrySample, events: &[EventKind]) -> Result<()> {
        let tx = self.conn.transaction()?;
        tx.prepare_cached(
            "INSERT INTO telemetry (
                ts, vehicle_id, speed_kmh, rpm, throttle_pct,
                brake_pct, steer_deg, g_lat, g_lon
            ) VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9)",
        )?
        .execute(params![
            format_ts(sample.ts),
            sample.vehicle_id,
            sample.speed_kmh,
            sample.rpm,
            sample.throttle_pct,
            sample.brake_pct,
            sample.steer_deg,
            sample.g_lat,
            sample.g_lon,
        ])?;
        for kind in events {
            tx.prepare_cached("INSERT INTO events (ts, vehicle_id, event_type) VALUES (?1,?2,?3)")?
                .execute(params![
                    format_ts(sample.ts),
                    sample.vehicle_id,
                    kind.as_str(),
                ])?;
        }
        tx.commit()?;
        Ok(())
    }

    /// Count of telemetry rows (diagnostics/tests).
    pub fn sample_count(&self) -> Result<i64> {
        let count = self
            .conn
            .query_row("SELECT COUNT(*) FROM telemetry", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Event-type labels for a vehicle, oldest first (diagnostics/tests).
    pub fn event_types_for(&self, vehicle_id: &str) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT event_type FROM events WHERE vehicle_id = ?1 ORDER BY rowid ASC",
        )?;
        let rows = stmt
            .query_map(params![vehicle_id], |row| row.get(0))?
            .collect::<std::result::Result<Vec<String>, _>>()?;
        Ok(rows)
    }

    /// Check that WAL mode is active (for diagnostics).
    #[must_use]
    pub fn is_wal_mode(&self) -> bool {
        self.conn
            .query_row("PRAGMA journal_mode", [], |row| row.get::<_, String>(0))
            .map(|mode| mode.eq_ignore_ascii_case("wal"))
            .unwrap_or(false)
    }
}

fn apply_pragmas(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "PRAGMA journal_mode = WAL;
         PRAGMA synchronous = NORMAL;
         PRAGMA busy_timeout = 5000;",
    )?;
    Ok(())
}
