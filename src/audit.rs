use std::path::Path;

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::backup::Backup;
use rusqlite::{Connection, Row};
use tracing::{debug, info};

use crate::error::StoreError;
use crate::models::{AuditLogEntry, CheckResult};

pub const DEFAULT_HISTORY_LIMIT: usize = 20;

pub const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS dq_audit_log (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    run_id TEXT NOT NULL,
    check_name TEXT NOT NULL,
    status TEXT NOT NULL,
    severity TEXT NOT NULL,
    failed_rows INTEGER NOT NULL,
    sample_ids TEXT NOT NULL,
    created_at_utc TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_dq_audit_log_created ON dq_audit_log (created_at_utc);
CREATE INDEX IF NOT EXISTS idx_dq_audit_log_run ON dq_audit_log (run_id);
";

const ENTRY_COLUMNS: &str =
    "id, run_id, check_name, status, severity, failed_rows, sample_ids, created_at_utc";

type StoreResult<T> = std::result::Result<T, StoreError>;

/// Append-only log of check results, one row per (run, check).
pub struct AuditStore {
    conn: Connection,
}

impl AuditStore {
    pub fn open(db_path: &Path) -> StoreResult<Self> {
        let conn = Connection::open(db_path).map_err(StoreError::Open)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")
            .map_err(StoreError::Open)?;
        Ok(Self { conn })
    }

    #[cfg(test)]
    pub fn open_in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory().map_err(StoreError::Open)?;
        Ok(Self { conn })
    }

    pub fn ensure_schema(&self) -> StoreResult<()> {
        self.conn.execute_batch(SCHEMA).map_err(StoreError::Schema)
    }

    /// Appends one entry per result, all stamped with the current instant.
    pub fn persist(&mut self, run_id: &str, results: &[CheckResult]) -> StoreResult<()> {
        self.persist_at(run_id, results, Utc::now())
    }

    /// Appends the run inside a single transaction. If any insert fails the
    /// transaction is dropped uncommitted and nothing from this call remains.
    pub fn persist_at(
        &mut self,
        run_id: &str,
        results: &[CheckResult],
        created_at: DateTime<Utc>,
    ) -> StoreResult<()> {
        let stamp = created_at.to_rfc3339_opts(SecondsFormat::Micros, true);
        let wrap = |source: rusqlite::Error| StoreError::Persist {
            run_id: run_id.to_string(),
            source,
        };

        let tx = self.conn.transaction().map_err(wrap)?;
        {
            let mut stmt = tx
                .prepare(
                    "INSERT INTO dq_audit_log \
                     (run_id, check_name, status, severity, failed_rows, sample_ids, created_at_utc) \
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                )
                .map_err(wrap)?;
            for result in results {
                stmt.execute(rusqlite::params![
                    run_id,
                    result.check_name,
                    result.status,
                    result.severity,
                    result.failed_rows as i64,
                    result.sample_ids.join(","),
                    stamp,
                ])
                .map_err(wrap)?;
                debug!(run_id, check = result.check_name.as_str(), "appended audit entry");
            }
        }
        tx.commit().map_err(wrap)?;

        info!(run_id, entries = results.len(), created_at_utc = stamp.as_str(), "persisted run");
        Ok(())
    }

    /// Most recent entries first. When two runs share a timestamp the later
    /// insert wins; entries within a run keep check order.
    pub fn history(&self, limit: usize) -> StoreResult<Vec<AuditLogEntry>> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let mut stmt = self
            .conn
            .prepare(&format!(
                "SELECT {ENTRY_COLUMNS} FROM dq_audit_log l \
                 ORDER BY created_at_utc DESC, \
                 (SELECT min(id) FROM dq_audit_log r \
                  WHERE r.run_id = l.run_id AND r.created_at_utc = l.created_at_utc) DESC, \
                 id ASC LIMIT ?1"
            ))
            .map_err(StoreError::History)?;
        let rows = stmt
            .query_map([limit], entry_from_row)
            .map_err(StoreError::History)?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(StoreError::History)?;
        Ok(rows)
    }

    pub fn run_entries(&self, run_id: &str) -> StoreResult<Vec<AuditLogEntry>> {
        let mut stmt = self
            .conn
            .prepare(&format!(
                "SELECT {ENTRY_COLUMNS} FROM dq_audit_log WHERE run_id = ?1 ORDER BY id"
            ))
            .map_err(StoreError::History)?;
        let rows = stmt
            .query_map([run_id], entry_from_row)
            .map_err(StoreError::History)?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(StoreError::History)?;
        Ok(rows)
    }

    pub fn entry_count(&self) -> StoreResult<i64> {
        self.conn
            .query_row("SELECT count(*) FROM dq_audit_log", [], |r| r.get(0))
            .map_err(StoreError::History)
    }

    pub fn run_count(&self) -> StoreResult<i64> {
        self.conn
            .query_row("SELECT count(DISTINCT run_id) FROM dq_audit_log", [], |r| r.get(0))
            .map_err(StoreError::History)
    }

    pub fn backup(&self, dest_path: &Path) -> StoreResult<()> {
        let mut dest = Connection::open(dest_path).map_err(StoreError::Backup)?;
        let backup = Backup::new(&self.conn, &mut dest).map_err(StoreError::Backup)?;
        backup
            .run_to_completion(100, std::time::Duration::from_millis(10), None)
            .map_err(StoreError::Backup)
    }
}

fn entry_from_row(row: &Row<'_>) -> rusqlite::Result<AuditLogEntry> {
    Ok(AuditLogEntry {
        id: row.get(0)?,
        run_id: row.get(1)?,
        check_name: row.get(2)?,
        status: row.get(3)?,
        severity: row.get(4)?,
        failed_rows: row.get(5)?,
        sample_ids: row.get(6)?,
        created_at_utc: row.get(7)?,
    })
}
