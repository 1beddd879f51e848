//! DuckDB-backed report store.

use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use duckdb::{Connection, params};
use tracing::info;

use crate::StoreError;
use crate::report::{HISTORY_LIMIT, NewReport, ReportStore, StoredReport, next_id, validate_user};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS reports (
    id         VARCHAR PRIMARY KEY,
    user_id    VARCHAR NOT NULL,
    title      VARCHAR,
    created_at VARCHAR NOT NULL,
    response   VARCHAR NOT NULL
);
";

/// Reports in a single `reports` table, the response kept as JSON text.
///
/// Supports both in-memory and persistent (file-backed) modes. Use
/// [`open`](Self::open) for in-memory and [`open_persistent`](Self::open_persistent)
/// for a database that survives process restarts.
pub struct DuckStore {
    conn: Mutex<Connection>,
}

type ReportRow = (String, String, Option<String>, String, String);

impl DuckStore {
    /// Open an in-memory DuckDB database.
    pub fn open() -> Result<Self, StoreError> {
        Self::init(Connection::open_in_memory()?)
    }

    /// Open or create a persistent DuckDB database at the given path.
    pub fn open_persistent(path: &Path) -> Result<Self, StoreError> {
        let store = Self::init(Connection::open(path)?)?;
        info!(path = %path.display(), "opened report database");
        Ok(store)
    }

    fn init(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>, StoreError> {
        self.conn
            .lock()
            .map_err(|_| StoreError::Other("report database lock poisoned".into()))
    }

    /// Number of stored reports across all users.
    pub fn report_count(&self) -> Result<usize, StoreError> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row("SELECT count(*) FROM reports", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

fn read_row(row: &duckdb::Row<'_>) -> duckdb::Result<ReportRow> {
    Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?))
}

fn into_report(row: ReportRow) -> Result<StoredReport, StoreError> {
    let (id, user_id, title, created_at, response) = row;
    let created_at = DateTime::parse_from_rfc3339(&created_at)
        .map_err(|e| StoreError::Other(format!("bad created_at for report {id}: {e}")))?
        .with_timezone(&Utc);
    Ok(StoredReport {
        id,
        user_id,
        title,
        created_at,
        response: serde_json::from_str(&response)?,
    })
}

#[async_trait]
impl ReportStore for DuckStore {
    async fn save_report(&self, user_id: &str, report: &NewReport) -> Result<String, StoreError> {
        let user_id = validate_user(user_id)?;
        let created_at = Utc::now();
        let id = next_id(created_at);
        let response = serde_json::to_string(&report.response)?;

        self.lock()?.execute(
            "INSERT INTO reports (id, user_id, title, created_at, response) VALUES (?, ?, ?, ?, ?)",
            params![
                id,
                user_id,
                report.title,
                created_at.to_rfc3339_opts(SecondsFormat::Micros, true),
                response
            ],
        )?;

        info!(user_id, id = %id, "saved report");
        Ok(id)
    }

    async fn list_reports(&self, user_id: &str) -> Result<Vec<StoredReport>, StoreError> {
        let user_id = validate_user(user_id)?;
        let rows: Vec<ReportRow> = {
            let conn = self.lock()?;
            let mut stmt = conn.prepare(
                "SELECT id, user_id, title, created_at, response FROM reports \
                 WHERE user_id = ? ORDER BY created_at DESC, id DESC LIMIT ?",
            )?;
            let rows = stmt.query_map(params![user_id, HISTORY_LIMIT as i64], read_row)?;
            let rows = rows.collect::<Result<Vec<_>, _>>()?;
            rows
        };
        rows.into_iter().map(into_report).collect()
    }

    async fn get_report(&self, user_id: &str, id: &str) -> Result<StoredReport, StoreError> {
        let user_id = validate_user(user_id)?;
        let row: Option<ReportRow> = {
            let conn = self.lock()?;
            let mut stmt = conn.prepare(
                "SELECT id, user_id, title, created_at, response FROM reports \
                 WHERE user_id = ? AND id = ?",
            )?;
            let mut rows = stmt.query_map(params![user_id, id], read_row)?;
            let row = rows.next().transpose()?;
            row
        };
        match row {
            Some(row) => into_report(row),
            None => Err(StoreError::NotFound(id.to_string())),
        }
    }
}
